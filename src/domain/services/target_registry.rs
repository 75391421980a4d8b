// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::{CollectionTarget, TargetUpdate};
use crate::domain::repositories::target_repository::{RepositoryError, TargetRepository};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// 目标注册表
///
/// 采集目标的唯一写入口。所有修改都是“读取全部 → 修改 → 全量写回”，
/// 由内部互斥锁串行化，避免爬取工作器和 HTTP 请求互相覆盖计数。
pub struct TargetRegistry {
    repository: Arc<dyn TargetRepository>,
    write_lock: Mutex<()>,
}

impl TargetRegistry {
    pub fn new(repository: Arc<dyn TargetRepository>) -> Self {
        Self {
            repository,
            write_lock: Mutex::new(()),
        }
    }

    /// 列出全部目标
    pub async fn list(&self) -> Result<Vec<CollectionTarget>, RepositoryError> {
        self.repository.load_targets().await
    }

    /// 按名称查找目标
    pub async fn get(&self, name: &str) -> Result<Option<CollectionTarget>, RepositoryError> {
        let targets = self.repository.load_targets().await?;
        Ok(targets.into_iter().find(|t| t.name == name))
    }

    /// 创建目标，名称必须唯一
    pub async fn create(&self, target: CollectionTarget) -> Result<CollectionTarget, RepositoryError> {
        validate(&target)?;
        let _guard = self.write_lock.lock().await;
        let mut targets = self.repository.load_targets().await?;
        if targets.iter().any(|t| t.name == target.name) {
            return Err(RepositoryError::AlreadyExists(target.name));
        }
        targets.push(target.clone());
        self.repository.save_targets(&targets).await?;
        info!(target_name = %target.name, "target created");
        Ok(target)
    }

    /// 更新目标的可编辑字段
    pub async fn update(&self, name: &str, update: TargetUpdate) -> Result<CollectionTarget, RepositoryError> {
        self.modify(name, |target| {
            update.apply(target);
            validate(target)
        })
        .await
    }

    /// 删除目标
    pub async fn delete(&self, name: &str) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut targets = self.repository.load_targets().await?;
        let before = targets.len();
        targets.retain(|t| t.name != name);
        if targets.len() == before {
            return Err(RepositoryError::NotFound(name.to_string()));
        }
        self.repository.save_targets(&targets).await?;
        info!(target_name = %name, "target deleted");
        Ok(())
    }

    /// 记录一次运行：累加采集数量并更新运行时间
    pub async fn record_run(
        &self,
        name: &str,
        collected: u64,
        at: DateTime<Utc>,
    ) -> Result<CollectionTarget, RepositoryError> {
        self.modify(name, |target| {
            target.collected_count = target.collected_count.saturating_add(collected);
            target.last_run_at = Some(at);
            Ok(())
        })
        .await
    }

    /// 累加预警数量
    pub async fn add_warnings(&self, name: &str, count: u64) -> Result<CollectionTarget, RepositoryError> {
        self.modify(name, |target| {
            target.warning_count = target.warning_count.saturating_add(count);
            Ok(())
        })
        .await
    }

    /// 消费立即执行标记
    ///
    /// 标记为真时清除并返回 true；同一标记只会被消费一次
    pub async fn take_immediate(&self, name: &str) -> Result<bool, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut targets = self.repository.load_targets().await?;
        let Some(target) = targets.iter_mut().find(|t| t.name == name) else {
            return Ok(false);
        };
        if !target.immediate {
            return Ok(false);
        }
        target.immediate = false;
        self.repository.save_targets(&targets).await?;
        debug!(target_name = %name, "immediate flag consumed");
        Ok(true)
    }

    async fn modify<F>(&self, name: &str, f: F) -> Result<CollectionTarget, RepositoryError>
    where
        F: FnOnce(&mut CollectionTarget) -> Result<(), RepositoryError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut targets = self.repository.load_targets().await?;
        let target = targets
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))?;
        f(target)?;
        let updated = target.clone();
        self.repository.save_targets(&targets).await?;
        Ok(updated)
    }
}

fn validate(target: &CollectionTarget) -> Result<(), RepositoryError> {
    if target.name.trim().is_empty() {
        return Err(RepositoryError::Invalid("target name cannot be empty".into()));
    }
    if target.keywords.is_empty() || target.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(RepositoryError::Invalid(
            "keywords must be a non-empty list of non-blank strings".into(),
        ));
    }
    if target.quota == 0 {
        return Err(RepositoryError::Invalid("quota must be positive".into()));
    }
    Ok(())
}
