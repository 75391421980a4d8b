// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 配额分配错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuotaError {
    /// 没有关键字，不能创建任务
    #[error("invalid quota: keyword list cannot be empty")]
    NoKeywords,
    /// 请求总量为 0
    #[error("invalid quota: total must be positive")]
    ZeroQuota,
}

/// 将请求总量分配到各个关键字
///
/// 除最后一个关键字外均分得 `max(total / n, 1)`，
/// 整除余数由最后一个关键字吸收。每个关键字至少分到 1。
///
/// # 参数
///
/// * `total` - 请求的记录总数
/// * `keywords` - 有序关键字列表
///
/// # 返回值
///
/// 与关键字同序同长的配额列表
pub fn allocate_quota<S: AsRef<str>>(total: u32, keywords: &[S]) -> Result<Vec<u32>, QuotaError> {
    if keywords.is_empty() {
        return Err(QuotaError::NoKeywords);
    }
    if total == 0 {
        return Err(QuotaError::ZeroQuota);
    }

    let n = keywords.len() as u32;
    let base = (total / n).max(1);
    let mut allocation = vec![base; keywords.len()];

    let previous = base.saturating_mul(n - 1);
    let last = total.saturating_sub(previous).max(base);
    if let Some(slot) = allocation.last_mut() {
        *slot = last;
    }

    Ok(allocation)
}
