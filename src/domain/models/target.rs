// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 采集目标（关键字组）
///
/// 描述“采集什么、多久采集一次”的持久化配置，同时记录累计计数。
/// 只能通过目标注册表的写路径修改；调度器和爬取执行器只读取。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionTarget {
    /// 目标名称，全局唯一
    #[serde(alias = "group_name")]
    pub name: String,
    /// 关键字列表，不能为空
    pub keywords: Vec<String>,
    /// 是否处于采集状态
    #[serde(alias = "is_collecting")]
    pub collecting: bool,
    /// 采集间隔（小时）
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u32,
    /// 每次运行请求的记录总数
    #[serde(default = "default_quota")]
    pub quota: u32,
    /// 上次运行时间
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
    /// 累计采集数量
    #[serde(default, alias = "data_count")]
    pub collected_count: u64,
    /// 累计预警数量（负面评论）
    #[serde(default)]
    pub warning_count: u64,
    /// 立即执行标记，被调度器消费一次后重置
    #[serde(default)]
    pub immediate: bool,
    /// 创建时间
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_interval_hours() -> u32 {
    1
}

fn default_quota() -> u32 {
    100
}

impl CollectionTarget {
    /// 创建新的采集目标
    pub fn new(name: impl Into<String>, keywords: Vec<String>, interval_hours: u32, quota: u32) -> Self {
        Self {
            name: name.into(),
            keywords,
            collecting: true,
            interval_hours,
            quota,
            last_run_at: None,
            collected_count: 0,
            warning_count: 0,
            immediate: false,
            created_at: Utc::now(),
        }
    }

    /// 调度周期，最少一小时
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_hours.max(1)) * 3600)
    }
}

/// 目标更新内容
///
/// 所有字段可选，未提供的字段保持不变
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetUpdate {
    pub keywords: Option<Vec<String>>,
    pub collecting: Option<bool>,
    pub interval_hours: Option<u32>,
    pub quota: Option<u32>,
    pub immediate: Option<bool>,
}

impl TargetUpdate {
    /// 将更新应用到目标上
    pub fn apply(self, target: &mut CollectionTarget) {
        if let Some(keywords) = self.keywords {
            target.keywords = keywords;
        }
        if let Some(collecting) = self.collecting {
            target.collecting = collecting;
        }
        if let Some(interval_hours) = self.interval_hours {
            target.interval_hours = interval_hours;
        }
        if let Some(quota) = self.quota {
            target.quota = quota;
        }
        if let Some(immediate) = self.immediate {
            target.immediate = immediate;
        }
    }
}
