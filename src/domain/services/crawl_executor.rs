// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::CrawlSettings;
use crate::domain::models::crawl_job::{CrawlJob, CrawlSummary, KeywordOutcome};
use crate::domain::models::record::{CandidateSource, RawRecord};
use crate::domain::services::candidate_ranker::CandidateRanker;
use crate::domain::services::pagination::{PaginationEngine, StopReason};
use crate::domain::services::quota_allocator::{allocate_quota, QuotaError};
use crate::engines::traits::{CommentFetcher, SourceSearcher};
use crate::utils::errors::CollectorError;
use crate::utils::retry_policy::RetryPolicy;
use metrics::counter;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// 一次爬取任务的产出
#[derive(Debug, Clone)]
pub struct CrawlExecution {
    pub records: Vec<RawRecord>,
    pub summary: CrawlSummary,
}

/// 爬取任务执行器
///
/// 对任务中的每个关键字：搜索候选、排序、逐个候选翻页直到配额满足或候选耗尽。
/// 单个关键字的失败只降低产量，不会让整个任务失败。
pub struct CrawlJobExecutor {
    searcher: Arc<dyn SourceSearcher>,
    pagination: PaginationEngine,
    ranker: CandidateRanker,
    policy: RetryPolicy,
    search_pages: u32,
    min_engagement: u64,
    request_interval: Duration,
}

impl CrawlJobExecutor {
    pub fn new(
        searcher: Arc<dyn SourceSearcher>,
        fetcher: Arc<dyn CommentFetcher>,
        settings: &CrawlSettings,
        policy: RetryPolicy,
    ) -> Self {
        let request_interval = Duration::from_millis(settings.request_interval_ms);
        Self {
            searcher,
            pagination: PaginationEngine::new(
                fetcher,
                policy.clone(),
                settings.page_size,
                settings.max_pages,
                request_interval,
            ),
            ranker: CandidateRanker::new(settings.min_source_size, settings.max_candidates),
            policy,
            search_pages: settings.search_pages.max(1),
            min_engagement: settings.min_engagement,
            request_interval,
        }
    }

    /// 执行爬取任务
    ///
    /// 只有配额无法分配（没有关键字或配额为 0）时返回错误
    #[instrument(skip(self, job), fields(job_id = %job.id, target = %job.target_name))]
    pub async fn execute(&self, job: &CrawlJob) -> Result<CrawlExecution, QuotaError> {
        let allocation = allocate_quota(job.quota, &job.keywords)?;

        let mut records = Vec::new();
        let mut outcomes = Vec::with_capacity(job.keywords.len());

        for (keyword, allocated) in job.keywords.iter().zip(allocation) {
            let (mut collected, outcome) = self.collect_keyword(keyword, allocated).await;
            if outcome.shortfall() > 0 {
                warn!(
                    keyword = %keyword,
                    allocated = outcome.allocated,
                    collected = outcome.collected,
                    "keyword quota not met"
                );
            }
            records.append(&mut collected);
            outcomes.push(outcome);
        }

        let summary = CrawlSummary {
            job_id: job.id,
            target_name: job.target_name.clone(),
            requested: job.quota,
            collected: records.len() as u32,
            keywords: outcomes,
            batch_id: None,
            errors: Vec::new(),
        };
        info!(
            collected = summary.collected,
            requested = summary.requested,
            errors = summary.error_count(),
            "crawl job finished"
        );

        Ok(CrawlExecution { records, summary })
    }

    async fn collect_keyword(&self, keyword: &str, allocated: u32) -> (Vec<RawRecord>, KeywordOutcome) {
        let mut outcome = KeywordOutcome {
            keyword: keyword.to_string(),
            allocated,
            ..Default::default()
        };

        let candidates = self.search_candidates(keyword, &mut outcome).await;

        // 互动量不足的候选直接跳过，不占用候选名额
        let (engaged, low): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| c.popularity_or_zero() >= self.min_engagement);
        outcome.candidates_skipped = low.len() as u32;
        let ranked = self.ranker.rank(engaged);
        debug!(keyword = %keyword, candidates = ranked.len(), "candidates ranked");

        let mut records = Vec::new();
        let mut needed = allocated as usize;

        for candidate in &ranked {
            if needed == 0 {
                break;
            }
            if outcome.candidates_tried > 0 && !self.request_interval.is_zero() {
                sleep(self.request_interval).await;
            }
            outcome.candidates_tried += 1;

            let page_outcome = self.pagination.collect(candidate, needed).await;
            outcome.retries += page_outcome.retries;
            outcome.malformed_items += page_outcome.skipped;
            if matches!(
                page_outcome.stop,
                StopReason::Fatal | StopReason::RetriesExhausted | StopReason::AttemptBudget
            ) {
                outcome.errors.extend(
                    page_outcome
                        .errors
                        .into_iter()
                        .map(|e| format!("{}: {}", candidate.label, e)),
                );
            }

            let got = page_outcome.records.len();
            needed = needed.saturating_sub(got);
            records.extend(page_outcome.records.into_iter().map(|mut record| {
                record.keyword = keyword.to_string();
                record
            }));
            debug!(
                keyword = %keyword,
                source = %candidate.label,
                got,
                needed,
                stop = ?page_outcome.stop,
                "candidate done"
            );
        }

        outcome.collected = records.len() as u32;
        counter!("crawl_records_collected_total").increment(records.len() as u64);
        (records, outcome)
    }

    /// 请求搜索结果页，按内容源去重
    async fn search_candidates(&self, keyword: &str, outcome: &mut KeywordOutcome) -> Vec<CandidateSource> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for page in 1..=self.search_pages {
            match self.search_with_retry(keyword, page, outcome).await {
                Ok(found) if found.is_empty() => break,
                Ok(found) => {
                    candidates.extend(found.into_iter().filter(|c| seen.insert(c.source_id.clone())));
                }
                Err(e) => {
                    outcome.errors.push(format!("search page {}: {}", page, e));
                    break;
                }
            }
        }

        candidates
    }

    async fn search_with_retry(
        &self,
        keyword: &str,
        page: u32,
        outcome: &mut KeywordOutcome,
    ) -> Result<Vec<CandidateSource>, CollectorError> {
        let mut attempt = 0u32;
        loop {
            match self.searcher.search(keyword, page).await {
                Ok(found) => return Ok(found),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    outcome.retries += 1;
                    counter!("crawl_search_retries_total", "class" => e.class().as_str()).increment(1);
                    if !self.policy.should_retry(attempt) {
                        return Err(e);
                    }
                    let backoff = self.policy.calculate_backoff(attempt, e.class());
                    warn!(
                        keyword = %keyword,
                        page,
                        attempt,
                        "search failed, retrying in {:?}: {}",
                        backoff,
                        e
                    );
                    sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "crawl_executor_test.rs"]
mod tests;
