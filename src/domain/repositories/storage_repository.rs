// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 存储错误
    #[error("Storage error: {0}")]
    Other(String),
}

/// 存储仓库特质
///
/// 以键值方式保存原始字节，键使用 `/` 分隔的层级路径
#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// 使用指定键保存数据，已存在则覆盖
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// 根据键检索数据
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// 根据键删除数据，键不存在时不报错
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// 检查指定键是否存在
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// 列出指定前缀下的所有键，按字典序返回
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}
