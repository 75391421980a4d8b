// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SentimentSettings;
use crate::domain::models::sentiment::{BatchStatus, BatchSummary, SentimentBatch, SentimentLabel};
use crate::domain::repositories::result_store::ResultStore;
use crate::domain::repositories::target_repository::RepositoryError;
use crate::domain::services::target_registry::TargetRegistry;
use crate::engines::traits::{FatalCodeSet, SentimentClassifier};
use crate::queue::pipeline::PipelineContext;
use crate::utils::errors::{CollectorError, WorkerError};
use crate::utils::text_processing::truncate_chars;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 单条文本送去分类的最大字符数
const MAX_TEXT_CHARS: usize = 1000;

/// 情感分析工作器参数
#[derive(Debug, Clone)]
pub struct SentimentWorkerConfig {
    pub fatal_codes: FatalCodeSet,
    pub checkpoint_every: usize,
    pub call_interval: Duration,
    pub batch_timeout: Duration,
}

impl From<&SentimentSettings> for SentimentWorkerConfig {
    fn from(settings: &SentimentSettings) -> Self {
        Self {
            fatal_codes: FatalCodeSet::new(settings.fatal_codes.iter().copied()),
            checkpoint_every: settings.checkpoint_every.max(1),
            call_interval: Duration::from_millis(settings.call_interval_ms),
            batch_timeout: Duration::from_secs(settings.batch_timeout_secs),
        }
    }
}

/// 情感分析工作器
///
/// 逐条分类批次中尚未分类的记录。致命错误立即终止批次并保存进度，
/// 失败的那条记录保持未分类；其他单条错误记为 Unknown 后继续。
pub struct SentimentWorker {
    classifier: Arc<dyn SentimentClassifier>,
    pipeline: Arc<PipelineContext>,
    results: Arc<dyn ResultStore>,
    registry: Arc<TargetRegistry>,
    config: SentimentWorkerConfig,
}

impl SentimentWorker {
    pub fn new(
        classifier: Arc<dyn SentimentClassifier>,
        pipeline: Arc<PipelineContext>,
        results: Arc<dyn ResultStore>,
        registry: Arc<TargetRegistry>,
        config: SentimentWorkerConfig,
    ) -> Self {
        Self {
            classifier,
            pipeline,
            results,
            registry,
            config,
        }
    }
}

#[async_trait]
impl Worker for SentimentWorker {
    type Job = SentimentBatch;

    #[instrument(skip(self, batch), fields(batch_id = %batch.batch_id, job_id = %batch.job_id, target = %batch.target_name))]
    async fn process(&self, batch: SentimentBatch) -> Result<(), WorkerError> {
        self.pipeline.set_batch_status(batch.batch_id, BatchStatus::Running);
        let started = Instant::now();
        let deadline = started + self.config.batch_timeout;

        let mut stored = self
            .results
            .load_batch(&batch.storage_key)
            .await
            .map_err(|e| WorkerError::RepositoryError(e.to_string()))?
            .ok_or_else(|| {
                WorkerError::RepositoryError(format!("batch {} not found", batch.storage_key))
            })?;

        let mut summary = BatchSummary::new(batch.batch_id, stored.records.len());
        summary.already_classified = stored.records.len() - stored.unclassified_count();
        info!(
            total = summary.total,
            already_classified = summary.already_classified,
            "sentiment batch started"
        );

        let mut since_checkpoint = 0usize;
        let mut calls = 0u32;

        for index in 0..stored.records.len() {
            if stored.records[index].sentiment.is_some() {
                continue;
            }
            if Instant::now() >= deadline {
                warn!(processed = summary.processed, "batch time limit reached");
                summary.errors.push(format!(
                    "batch time limit of {}s reached, {} records left unclassified",
                    self.config.batch_timeout.as_secs(),
                    stored.unclassified_count()
                ));
                break;
            }

            let record = &stored.records[index].record;
            let content = record.content.trim();
            let label = if content.is_empty() {
                let e = CollectorError::RecordData(format!("comment {} has no text", record.comment_id));
                summary.errors.push(e.to_string());
                SentimentLabel::Unknown
            } else {
                if calls > 0 && !self.config.call_interval.is_zero() {
                    sleep(self.config.call_interval).await;
                }
                calls += 1;
                match self.classifier.classify(truncate_chars(content, MAX_TEXT_CHARS)).await {
                    Ok(response) => SentimentLabel::from_code(response.sentiment),
                    Err(e) if self.config.fatal_codes.is_fatal(&e) => {
                        warn!(comment_id = %record.comment_id, "fatal classifier error, stopping batch: {}", e);
                        summary.fatal_error = Some(e.to_string());
                        break;
                    }
                    Err(e) => {
                        summary.errors.push(format!("{}: {}", record.comment_id, e));
                        SentimentLabel::Unknown
                    }
                }
            };

            stored.records[index].sentiment = Some(label);
            summary.record(label);
            counter!("sentiment_records_total", "label" => label.to_string()).increment(1);

            since_checkpoint += 1;
            if since_checkpoint >= self.config.checkpoint_every {
                since_checkpoint = 0;
                if let Err(e) = self.results.save_batch(&stored).await {
                    warn!("checkpoint failed: {}", e);
                }
            }
        }

        self.results
            .save_batch(&stored)
            .await
            .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;

        if summary.negative > 0 {
            if let Err(e) = self
                .registry
                .add_warnings(&batch.target_name, summary.negative as u64)
                .await
            {
                warn!("failed to update warning count: {}", e);
            }
        }

        histogram!("sentiment_batch_duration_seconds").record(started.elapsed().as_secs_f64());
        info!(
            processed = summary.processed,
            positive = summary.positive,
            negative = summary.negative,
            neutral = summary.neutral,
            unknown = summary.unknown,
            errors = summary.errors.len(),
            "sentiment batch finished"
        );

        let status = match summary.fatal_error.clone() {
            Some(error) => {
                counter!("sentiment_batches_total", "status" => "failed").increment(1);
                BatchStatus::Failed { summary, error }
            }
            None => {
                counter!("sentiment_batches_total", "status" => "completed").increment(1);
                BatchStatus::Completed(summary)
            }
        };
        self.pipeline.set_batch_status(batch.batch_id, status);
        Ok(())
    }

    fn on_failure(&self, batch_id: Uuid, error: String) {
        counter!("sentiment_batches_total", "status" => "failed").increment(1);
        self.pipeline.set_batch_status(
            batch_id,
            BatchStatus::Failed {
                summary: BatchSummary::new(batch_id, 0),
                error,
            },
        );
    }

    fn job_id(batch: &SentimentBatch) -> Uuid {
        batch.batch_id
    }

    fn name(&self) -> &str {
        "sentiment-worker"
    }
}

/// 将存储中仍有未分类记录的批次重新放入情感分析队列
///
/// 启动时调用，续跑崩溃、致命错误或超时留下的批次。已写入的标签（包括 Unknown）不会重新分类。
pub async fn requeue_unfinished_batches(
    results: &dyn ResultStore,
    pipeline: &PipelineContext,
) -> Result<usize, RepositoryError> {
    let mut requeued = 0;
    for (storage_key, stored) in results.list_unfinished().await? {
        let batch = SentimentBatch {
            batch_id: stored.batch_id,
            job_id: stored.job_id,
            target_name: stored.target_name.clone(),
            storage_key,
        };
        match pipeline.enqueue_sentiment(batch) {
            Ok(_) => {
                requeued += 1;
                info!(
                    batch_id = %stored.batch_id,
                    target = %stored.target_name,
                    unclassified = stored.unclassified_count(),
                    "unfinished sentiment batch requeued"
                );
            }
            Err(e) => warn!(batch_id = %stored.batch_id, "failed to requeue batch: {}", e),
        }
    }
    Ok(requeued)
}

#[cfg(test)]
#[path = "sentiment_worker_test.rs"]
mod tests;
