// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::crawl_request::CrawlRequestDto;
use crate::application::dto::target_request::normalize_keywords;
use crate::application::use_cases::UseCaseError;
use crate::domain::models::crawl_job::{JobStatus, JobTrigger};
use crate::domain::models::sentiment::BatchStatus;
use crate::domain::services::target_registry::TargetRegistry;
use crate::queue::pipeline::PipelineContext;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct CrawlUseCase {
    pipeline: Arc<PipelineContext>,
    registry: Arc<TargetRegistry>,
}

impl CrawlUseCase {
    pub fn new(pipeline: Arc<PipelineContext>, registry: Arc<TargetRegistry>) -> Self {
        Self { pipeline, registry }
    }

    /// 手动提交爬取任务
    ///
    /// 请求中缺省的关键字和配额取自已注册的目标；两者都给出时目标可以不存在
    pub async fn submit(&self, request: CrawlRequestDto) -> Result<Uuid, UseCaseError> {
        request.validate()?;

        let (keywords, quota) = match (request.keywords, request.quota) {
            (Some(keywords), Some(quota)) => (keywords, quota),
            (keywords, quota) => {
                let target = self
                    .registry
                    .get(&request.target_name)
                    .await?
                    .ok_or_else(|| UseCaseError::NotFound(request.target_name.clone()))?;
                (
                    keywords.unwrap_or(target.keywords),
                    quota.unwrap_or(target.quota),
                )
            }
        };

        let keywords = normalize_keywords(keywords);
        if keywords.is_empty() {
            return Err(UseCaseError::Validation(
                "keywords cannot be empty".to_string(),
            ));
        }

        let job_id =
            self.pipeline
                .enqueue_crawl(&request.target_name, &keywords, quota, JobTrigger::Manual)?;
        Ok(job_id)
    }

    pub fn job_status(&self, job_id: Uuid) -> Result<JobStatus, UseCaseError> {
        self.pipeline
            .get_status(job_id)
            .ok_or_else(|| UseCaseError::NotFound(format!("job {}", job_id)))
    }

    pub fn batch_status(&self, batch_id: Uuid) -> Result<BatchStatus, UseCaseError> {
        self.pipeline
            .get_batch_status(batch_id)
            .ok_or_else(|| UseCaseError::NotFound(format!("batch {}", batch_id)))
    }
}
