// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::sentiment::StoredBatch;
use crate::domain::repositories::result_store::ResultStore;
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::domain::repositories::target_repository::RepositoryError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

const BATCH_PREFIX: &str = "batches";

/// 基于存储仓库的结果存储实现
///
/// 每个批次保存为 `batches/{target}/{batch_id}.json`
pub struct JsonResultStore {
    storage: Arc<dyn StorageRepository>,
}

impl JsonResultStore {
    pub fn new(storage: Arc<dyn StorageRepository>) -> Self {
        Self { storage }
    }

    /// 批次的存储句柄
    pub fn batch_key(batch: &StoredBatch) -> String {
        format!(
            "{}/{}/{}.json",
            BATCH_PREFIX,
            sanitize_segment(&batch.target_name),
            batch.batch_id
        )
    }
}

/// 目标名称作为路径段时去掉分隔符
fn sanitize_segment(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '.' => '_',
            other => other,
        })
        .collect()
}

#[async_trait]
impl ResultStore for JsonResultStore {
    async fn save_batch(&self, batch: &StoredBatch) -> Result<String, RepositoryError> {
        let key = Self::batch_key(batch);
        let bytes = serde_json::to_vec(batch)?;
        self.storage.save(&key, &bytes).await?;
        Ok(key)
    }

    async fn load_batch(&self, storage_key: &str) -> Result<Option<StoredBatch>, RepositoryError> {
        match self.storage.get(storage_key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn list_batches(&self, target_name: &str) -> Result<Vec<StoredBatch>, RepositoryError> {
        let prefix = format!("{}/{}/", BATCH_PREFIX, sanitize_segment(target_name));
        // 不同名称可能映射到同一目录
        Ok(self
            .load_under(&prefix)
            .await?
            .into_iter()
            .map(|(_, batch)| batch)
            .filter(|batch| batch.target_name == target_name)
            .collect())
    }

    async fn list_unfinished(&self) -> Result<Vec<(String, StoredBatch)>, RepositoryError> {
        let prefix = format!("{}/", BATCH_PREFIX);
        Ok(self
            .load_under(&prefix)
            .await?
            .into_iter()
            .filter(|(_, batch)| batch.unclassified_count() > 0)
            .collect())
    }
}

impl JsonResultStore {
    async fn load_under(&self, prefix: &str) -> Result<Vec<(String, StoredBatch)>, RepositoryError> {
        let mut batches = Vec::new();
        for key in self.storage.list(prefix).await? {
            match self.load_batch(&key).await {
                Ok(Some(batch)) => batches.push((key, batch)),
                Ok(None) => {}
                // 单个损坏文件不影响其余批次
                Err(e) => warn!(key = %key, "skipping unreadable batch: {}", e),
            }
        }
        batches.sort_by_key(|(_, b)| b.created_at);
        Ok(batches)
    }
}
