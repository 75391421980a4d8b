// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_job::{CrawlJob, JobStatus};
use crate::domain::models::sentiment::{SentimentBatch, StoredBatch};
use crate::domain::repositories::result_store::ResultStore;
use crate::domain::repositories::target_repository::RepositoryError;
use crate::domain::services::crawl_executor::CrawlJobExecutor;
use crate::domain::services::target_registry::TargetRegistry;
use crate::queue::pipeline::PipelineContext;
use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use chrono::Utc;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 爬取工作器
///
/// 串行执行爬取任务；产出的记录保存为批次并交给情感分析队列
pub struct CrawlWorker {
    executor: Arc<CrawlJobExecutor>,
    pipeline: Arc<PipelineContext>,
    results: Arc<dyn ResultStore>,
    registry: Arc<TargetRegistry>,
}

impl CrawlWorker {
    pub fn new(
        executor: Arc<CrawlJobExecutor>,
        pipeline: Arc<PipelineContext>,
        results: Arc<dyn ResultStore>,
        registry: Arc<TargetRegistry>,
    ) -> Self {
        Self {
            executor,
            pipeline,
            results,
            registry,
        }
    }
}

#[async_trait]
impl Worker for CrawlWorker {
    type Job = CrawlJob;

    #[instrument(skip(self, job), fields(job_id = %job.id, target = %job.target_name, trigger = %job.trigger))]
    async fn process(&self, job: CrawlJob) -> Result<(), WorkerError> {
        self.pipeline.set_status(job.id, JobStatus::Running);
        let started = Instant::now();
        info!(keywords = job.keywords.len(), quota = job.quota, "crawl job started");

        let execution = self
            .executor
            .execute(&job)
            .await
            .map_err(|e| WorkerError::InternalError(e.to_string()))?;
        let mut summary = execution.summary;

        if !execution.records.is_empty() {
            let batch = StoredBatch::new(Uuid::new_v4(), job.id, &job.target_name, execution.records);
            let storage_key = self
                .results
                .save_batch(&batch)
                .await
                .map_err(|e| WorkerError::RepositoryError(e.to_string()))?;
            let sentiment_batch = SentimentBatch {
                batch_id: batch.batch_id,
                job_id: job.id,
                target_name: job.target_name.clone(),
                storage_key,
            };
            match self.pipeline.enqueue_sentiment(sentiment_batch) {
                Ok(batch_id) => summary.batch_id = Some(batch_id),
                Err(e) => {
                    warn!("records saved but sentiment batch not enqueued: {}", e);
                    summary
                        .errors
                        .push(format!("sentiment batch {} not enqueued: {}", batch.batch_id, e));
                }
            }
        }

        match self
            .registry
            .record_run(&job.target_name, u64::from(summary.collected), Utc::now())
            .await
        {
            Ok(_) => {}
            Err(RepositoryError::NotFound(_)) => {
                debug!("job target not registered, counters not updated");
            }
            Err(e) => warn!("failed to update target counters: {}", e),
        }

        histogram!("crawl_job_duration_seconds").record(started.elapsed().as_secs_f64());
        counter!("crawl_jobs_total", "status" => "completed").increment(1);
        info!(
            collected = summary.collected,
            shortfall = summary.shortfall(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "crawl job completed"
        );
        self.pipeline.set_status(job.id, JobStatus::Completed(summary));
        Ok(())
    }

    fn on_failure(&self, job_id: Uuid, error: String) {
        counter!("crawl_jobs_total", "status" => "failed").increment(1);
        self.pipeline.set_status(job_id, JobStatus::Failed(error));
    }

    fn job_id(job: &CrawlJob) -> Uuid {
        job.id
    }

    fn name(&self) -> &str {
        "crawl-worker"
    }
}
