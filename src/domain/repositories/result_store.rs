// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::sentiment::StoredBatch;
use crate::domain::repositories::target_repository::RepositoryError;
use async_trait::async_trait;

/// 结果存储特质
///
/// 保存爬取批次以及情感分析的进度
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// 保存批次（覆盖），返回存储句柄
    async fn save_batch(&self, batch: &StoredBatch) -> Result<String, RepositoryError>;

    /// 按存储句柄读取批次
    async fn load_batch(&self, storage_key: &str) -> Result<Option<StoredBatch>, RepositoryError>;

    /// 列出某个目标的全部批次
    async fn list_batches(&self, target_name: &str) -> Result<Vec<StoredBatch>, RepositoryError>;

    /// 列出仍有未分类记录的批次及其存储句柄，按创建时间排序
    async fn list_unfinished(&self) -> Result<Vec<(String, StoredBatch)>, RepositoryError>;
}
