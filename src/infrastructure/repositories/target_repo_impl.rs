// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::CollectionTarget;
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::domain::repositories::target_repository::{RepositoryError, TargetRepository};
use async_trait::async_trait;
use std::sync::Arc;

/// 基于存储仓库的目标仓库实现
///
/// 全部目标序列化为一个 JSON 数组保存在 `key` 下
pub struct JsonTargetRepository {
    storage: Arc<dyn StorageRepository>,
    key: String,
}

impl JsonTargetRepository {
    pub fn new(storage: Arc<dyn StorageRepository>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }
}

#[async_trait]
impl TargetRepository for JsonTargetRepository {
    async fn load_targets(&self) -> Result<Vec<CollectionTarget>, RepositoryError> {
        match self.storage.get(&self.key).await? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                Ok(serde_json::from_slice(&bytes)?)
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn save_targets(&self, targets: &[CollectionTarget]) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(targets)?;
        self.storage.save(&self.key, &bytes).await?;
        Ok(())
    }
}
