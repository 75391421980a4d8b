// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 错误类别，决定退避策略和传播方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// 网络抖动，短退避后重试
    Transient,
    /// 限流，长退避后重试
    RateLimit,
    /// 协议解析失败，按瞬时错误处理
    Decode,
    /// 致命错误，立即放弃当前工作单元
    Fatal,
    /// 单条数据错误，跳过该条继续
    RecordData,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Transient => "transient",
            ErrorClass::RateLimit => "rate_limit",
            ErrorClass::Decode => "decode",
            ErrorClass::Fatal => "fatal",
            ErrorClass::RecordData => "record_data",
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorClass::Transient | ErrorClass::RateLimit | ErrorClass::Decode
        )
    }
}

/// 采集协作方（搜索 / 评论拉取）错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectorError {
    #[error("网络错误: {0}")]
    TransientNetwork(String),

    #[error("触发限流: {0}")]
    RateLimited(String),

    #[error("响应解析失败: {0}")]
    ProtocolDecode(String),

    #[error("协作方致命错误: {0}")]
    FatalCollaborator(String),

    #[error("数据错误: {0}")]
    RecordData(String),
}

impl CollectorError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CollectorError::TransientNetwork(_) => ErrorClass::Transient,
            CollectorError::RateLimited(_) => ErrorClass::RateLimit,
            CollectorError::ProtocolDecode(_) => ErrorClass::Decode,
            CollectorError::FatalCollaborator(_) => ErrorClass::Fatal,
            CollectorError::RecordData(_) => ErrorClass::RecordData,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class().is_retryable()
    }
}

impl From<reqwest::Error> for CollectorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CollectorError::ProtocolDecode(e.to_string())
        } else if e.status().is_some_and(|s| s.as_u16() == 429) {
            CollectorError::RateLimited(e.to_string())
        } else if e.is_builder() {
            CollectorError::FatalCollaborator(e.to_string())
        } else {
            CollectorError::TransientNetwork(e.to_string())
        }
    }
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    RepositoryError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}
