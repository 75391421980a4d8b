// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::target_request::{CreateTargetDto, TargetListDto, UpdateTargetDto};
use crate::application::use_cases::UseCaseError;
use crate::domain::models::target::CollectionTarget;
use crate::domain::services::target_registry::TargetRegistry;
use crate::queue::scheduler::TargetScheduler;
use std::sync::Arc;
use tracing::warn;
use validator::Validate;

/// 目标管理用例
///
/// 写入注册表后同步调度器，立即执行标记在此被消费
pub struct TargetUseCase {
    registry: Arc<TargetRegistry>,
    scheduler: Arc<TargetScheduler>,
}

impl TargetUseCase {
    pub fn new(registry: Arc<TargetRegistry>, scheduler: Arc<TargetScheduler>) -> Self {
        Self {
            registry,
            scheduler,
        }
    }

    /// 列出目标
    ///
    /// `name` 按名称子串过滤（不区分大小写），没有匹配时返回 NotFound
    pub async fn list(&self, name: Option<&str>) -> Result<TargetListDto, UseCaseError> {
        let needle = name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_lowercase);
        let targets: Vec<CollectionTarget> = self
            .registry
            .list()
            .await?
            .into_iter()
            .filter(|t| {
                needle
                    .as_deref()
                    .map_or(true, |n| t.name.to_lowercase().contains(n))
            })
            .collect();
        if needle.is_some() && targets.is_empty() {
            return Err(UseCaseError::NotFound(name.unwrap_or_default().trim().to_string()));
        }

        Ok(TargetListDto {
            total_data_count: targets.iter().map(|t| t.collected_count).sum(),
            total_warning_count: targets.iter().map(|t| t.warning_count).sum(),
            targets,
        })
    }

    pub async fn create(&self, request: CreateTargetDto) -> Result<CollectionTarget, UseCaseError> {
        request.validate()?;
        let created = self.registry.create(request.into_target()).await?;
        self.activate(&created).await;
        Ok(self.registry.get(&created.name).await?.unwrap_or(created))
    }

    pub async fn update(&self, name: &str, request: UpdateTargetDto) -> Result<CollectionTarget, UseCaseError> {
        request.validate()?;
        let updated = self.registry.update(name, request.into()).await?;
        self.activate(&updated).await;
        Ok(self.registry.get(name).await?.unwrap_or(updated))
    }

    pub async fn delete(&self, name: &str) -> Result<(), UseCaseError> {
        self.registry.delete(name).await?;
        self.scheduler.cancel(name);
        Ok(())
    }

    async fn activate(&self, target: &CollectionTarget) {
        self.scheduler.register(target);
        if target.immediate {
            if let Err(e) = self.scheduler.consume_immediate(&target.name).await {
                warn!(target = %target.name, "failed to consume immediate flag: {}", e);
            }
        }
    }
}
