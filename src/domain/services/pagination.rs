// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::record::{CandidateSource, PaginationCursor, RawRecord};
use crate::engines::traits::CommentFetcher;
use crate::utils::retry_policy::RetryPolicy;
use metrics::counter;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// 分页结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 调用方不需要任何记录
    NothingWanted,
    /// 已满足需求数量
    QuotaMet,
    /// 达到目标页数
    PageCap,
    /// 返回了空页
    EmptyPage,
    /// 没有续传令牌
    NoMorePages,
    /// 令牌未变化或已被消费过
    CursorStalled,
    /// 单页重试耗尽
    RetriesExhausted,
    /// 总尝试次数耗尽
    AttemptBudget,
    /// 协作方致命错误
    Fatal,
}

/// 单个内容源的分页结果
#[derive(Debug, Clone)]
pub struct PaginationOutcome {
    pub records: Vec<RawRecord>,
    pub pages_fetched: u32,
    /// 总重试次数
    pub retries: u32,
    /// 被跳过的异常条目
    pub skipped: u32,
    pub stop: StopReason,
    pub errors: Vec<String>,
}

impl PaginationOutcome {
    fn new(stop: StopReason) -> Self {
        Self {
            records: Vec::new(),
            pages_fetched: 0,
            retries: 0,
            skipped: 0,
            stop,
            errors: Vec::new(),
        }
    }
}

/// 分页引擎
///
/// 针对一个候选内容源按游标翻页拉取评论。终止条件：
/// 达到目标页数、空页、无续传令牌、令牌停滞、重试耗尽或致命错误。
/// 总拉取次数不超过 `目标页数 + 重试上限`。
pub struct PaginationEngine {
    fetcher: Arc<dyn CommentFetcher>,
    policy: RetryPolicy,
    page_size: u32,
    max_pages: u32,
    request_interval: Duration,
}

impl PaginationEngine {
    pub fn new(
        fetcher: Arc<dyn CommentFetcher>,
        policy: RetryPolicy,
        page_size: u32,
        max_pages: u32,
        request_interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            policy,
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
            request_interval,
        }
    }

    /// 计算目标页数：ceil(wanted / page_size)，不超过页数上限
    pub fn target_pages(&self, wanted: usize) -> u32 {
        let pages = (wanted as u64).div_ceil(u64::from(self.page_size));
        pages.min(u64::from(self.max_pages)) as u32
    }

    /// 为一个内容源拉取最多 `wanted` 条记录
    pub async fn collect(&self, source: &CandidateSource, wanted: usize) -> PaginationOutcome {
        if wanted == 0 {
            return PaginationOutcome::new(StopReason::NothingWanted);
        }

        let target_pages = self.target_pages(wanted);
        let max_attempts = target_pages + self.policy.max_retries;
        let mut outcome = PaginationOutcome::new(StopReason::PageCap);
        let mut cursor = PaginationCursor::start();
        let mut consumed: HashSet<String> = HashSet::new();
        let mut attempts = 0u32;

        loop {
            if cursor.pages >= target_pages {
                outcome.stop = StopReason::PageCap;
                break;
            }
            if attempts >= max_attempts {
                outcome.stop = StopReason::AttemptBudget;
                break;
            }
            if cursor.pages > 0 && cursor.retries == 0 && !self.request_interval.is_zero() {
                sleep(self.request_interval).await;
            }

            attempts += 1;
            match self.fetcher.fetch_page(&source.source_id, &cursor.token).await {
                Ok(page) => {
                    cursor.pages += 1;
                    outcome.pages_fetched += 1;
                    outcome.skipped += page.skipped;
                    counter!("crawl_pages_fetched_total").increment(1);

                    if page.items.is_empty() {
                        outcome.stop = StopReason::EmptyPage;
                        break;
                    }

                    outcome.records.extend(page.items.into_iter().map(|mut record| {
                        record.source_label = source.label.clone();
                        record.source_title = source.title.clone();
                        record
                    }));

                    if outcome.records.len() >= wanted {
                        outcome.stop = StopReason::QuotaMet;
                        break;
                    }

                    match page.next_cursor {
                        None => {
                            outcome.stop = StopReason::NoMorePages;
                            break;
                        }
                        Some(next) if next.is_empty() => {
                            outcome.stop = StopReason::NoMorePages;
                            break;
                        }
                        Some(next) if next == cursor.token || consumed.contains(&next) => {
                            debug!(source_id = %source.source_id, "cursor did not advance, stopping");
                            outcome.stop = StopReason::CursorStalled;
                            break;
                        }
                        Some(next) => {
                            consumed.insert(std::mem::take(&mut cursor.token));
                            cursor.advance(next);
                        }
                    }
                }
                Err(e) if !e.is_retryable() => {
                    warn!(source_id = %source.source_id, "fetch aborted: {}", e);
                    outcome.errors.push(e.to_string());
                    outcome.stop = StopReason::Fatal;
                    break;
                }
                Err(e) => {
                    cursor.retries += 1;
                    outcome.retries += 1;
                    outcome.errors.push(e.to_string());
                    counter!("crawl_fetch_retries_total", "class" => e.class().as_str()).increment(1);

                    if !self.policy.should_retry(cursor.retries) {
                        warn!(
                            source_id = %source.source_id,
                            retries = cursor.retries,
                            "retry ceiling reached, giving up on source: {}",
                            e
                        );
                        outcome.stop = StopReason::RetriesExhausted;
                        break;
                    }

                    let backoff = self.policy.calculate_backoff(cursor.retries, e.class());
                    debug!(
                        source_id = %source.source_id,
                        retries = cursor.retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying page after error: {}",
                        e
                    );
                    sleep(backoff).await;
                }
            }
        }

        outcome.records.truncate(wanted);
        outcome
    }
}

#[cfg(test)]
#[path = "pagination_test.rs"]
mod tests;
