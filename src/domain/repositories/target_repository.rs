// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::CollectionTarget;
use crate::domain::repositories::storage_repository::StorageError;
use async_trait::async_trait;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 底层存储错误
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// 序列化或反序列化失败
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 记录未找到
    #[error("Record not found: {0}")]
    NotFound(String),
    /// 记录已存在
    #[error("Record already exists: {0}")]
    AlreadyExists(String),
    /// 数据不合法
    #[error("Invalid data: {0}")]
    Invalid(String),
}

/// 目标仓库特质
///
/// 整体读写目标列表，写入是全量覆盖
#[async_trait]
pub trait TargetRepository: Send + Sync {
    /// 读取全部目标，不存在时返回空列表
    async fn load_targets(&self) -> Result<Vec<CollectionTarget>, RepositoryError>;

    /// 保存全部目标
    async fn save_targets(&self, targets: &[CollectionTarget]) -> Result<(), RepositoryError>;
}
