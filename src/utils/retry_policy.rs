// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BackoffSettings;
use crate::utils::errors::ErrorClass;
use std::time::Duration;

/// 退避策略配置
///
/// 普通瞬时错误和限流错误使用不同的初始退避时间，共享同一个重试上限
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大重试次数（重试上限）
    pub max_retries: u32,
    /// 瞬时错误的初始退避时间
    pub initial_backoff: Duration,
    /// 限流错误的初始退避时间
    pub rate_limit_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(2),
            rate_limit_backoff: Duration::from_secs(10),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            enable_jitter: false,
        }
    }
}

impl RetryPolicy {
    /// 创建标准重试策略
    pub fn standard() -> Self {
        Self::default()
    }

    /// 从配置创建
    pub fn from_settings(settings: &BackoffSettings, max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(settings.transient_initial_ms),
            rate_limit_backoff: Duration::from_millis(settings.rate_limit_initial_ms),
            max_backoff: Duration::from_secs(settings.max_backoff_secs),
            backoff_multiplier: settings.multiplier,
            jitter_factor: settings.jitter_factor,
            enable_jitter: settings.enable_jitter,
        }
    }

    /// 无等待策略，测试中使用
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
            enable_jitter: false,
        }
    }

    /// 计算第 `attempt` 次重试（从 1 开始）的退避时间
    pub fn calculate_backoff(&self, attempt: u32, class: ErrorClass) -> Duration {
        let initial = match class {
            ErrorClass::RateLimit => self.rate_limit_backoff,
            _ => self.initial_backoff,
        };

        let exponent = attempt.max(1).saturating_sub(1) as i32;
        let backoff_secs = initial.as_secs_f64() * self.backoff_multiplier.powi(exponent);

        // 限制最大退避时间，限流退避不低于其初始值
        let mut capped_backoff = backoff_secs.min(self.max_backoff.as_secs_f64());
        if class == ErrorClass::RateLimit {
            capped_backoff = capped_backoff.max(initial.as_secs_f64());
        }

        let final_backoff = if self.enable_jitter && capped_backoff > 0.0 {
            let jitter_range = capped_backoff * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..=jitter_range);
            (capped_backoff + jitter).max(0.0)
        } else {
            capped_backoff
        };

        Duration::from_secs_f64(final_backoff)
    }

    /// 是否应该重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}
