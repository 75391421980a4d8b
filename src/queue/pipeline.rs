// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_job::{CrawlJob, JobStatus, JobTrigger};
use crate::domain::models::sentiment::{BatchStatus, SentimentBatch};
use crate::queue::task_queue::{channel, QueueError, QueueReceiver, TaskQueue};
use dashmap::DashMap;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// 两条流水线的消费端，分别交给唯一的工作器
pub struct PipelineReceivers {
    pub crawl: QueueReceiver<CrawlJob>,
    pub sentiment: QueueReceiver<SentimentBatch>,
}

/// 流水线上下文
///
/// 持有两个队列的发送端和两张状态表，显式传递给调度器、工作器和 HTTP 层。
/// 状态表除入队时写入 Pending 外，只由对应的工作器写入。
pub struct PipelineContext {
    crawl_queue: TaskQueue<CrawlJob>,
    sentiment_queue: TaskQueue<SentimentBatch>,
    job_status: DashMap<Uuid, JobStatus>,
    batch_status: DashMap<Uuid, BatchStatus>,
}

impl PipelineContext {
    pub fn new() -> (Arc<Self>, PipelineReceivers) {
        let (crawl_queue, crawl) = channel("crawl");
        let (sentiment_queue, sentiment) = channel("sentiment");
        let context = Arc::new(Self {
            crawl_queue,
            sentiment_queue,
            job_status: DashMap::new(),
            batch_status: DashMap::new(),
        });
        (context, PipelineReceivers { crawl, sentiment })
    }

    /// 提交爬取任务
    ///
    /// 关键字和配额在此刻被复制进任务；不做去重，每次调用生成新的任务 ID
    pub fn enqueue_crawl(
        &self,
        target_name: &str,
        keywords: &[String],
        quota: u32,
        trigger: JobTrigger,
    ) -> Result<Uuid, QueueError> {
        if keywords.is_empty() || keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(QueueError::InvalidJob(
                "keywords must be a non-empty list of non-blank strings".into(),
            ));
        }
        if quota == 0 {
            return Err(QueueError::InvalidJob("quota must be positive".into()));
        }

        let job = CrawlJob::new(target_name, keywords.to_vec(), quota, trigger);
        let job_id = job.id;
        self.job_status.insert(job_id, JobStatus::Pending);
        if let Err(e) = self.crawl_queue.enqueue(job) {
            self.job_status.remove(&job_id);
            return Err(e);
        }

        counter!("crawl_jobs_enqueued_total", "trigger" => trigger.to_string()).increment(1);
        info!(job_id = %job_id, target = %target_name, %trigger, "crawl job enqueued");
        Ok(job_id)
    }

    /// 查询爬取任务状态
    pub fn get_status(&self, job_id: Uuid) -> Option<JobStatus> {
        self.job_status.get(&job_id).map(|s| s.value().clone())
    }

    /// 提交情感分析批次
    pub fn enqueue_sentiment(&self, batch: SentimentBatch) -> Result<Uuid, QueueError> {
        let batch_id = batch.batch_id;
        self.batch_status.insert(batch_id, BatchStatus::Pending);
        if let Err(e) = self.sentiment_queue.enqueue(batch) {
            self.batch_status.remove(&batch_id);
            return Err(e);
        }
        debug!(batch_id = %batch_id, "sentiment batch enqueued");
        Ok(batch_id)
    }

    /// 查询情感分析批次状态
    pub fn get_batch_status(&self, batch_id: Uuid) -> Option<BatchStatus> {
        self.batch_status.get(&batch_id).map(|s| s.value().clone())
    }

    pub fn pending_crawl_jobs(&self) -> usize {
        self.crawl_queue.len()
    }

    pub(crate) fn set_status(&self, job_id: Uuid, status: JobStatus) {
        self.job_status.insert(job_id, status);
    }

    pub(crate) fn set_batch_status(&self, batch_id: Uuid, status: BatchStatus) {
        self.batch_status.insert(batch_id, status);
    }
}
