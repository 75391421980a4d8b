// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::record::{CandidateSource, CommentPage};
use crate::utils::errors::CollectorError;
use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

/// 内容源搜索协作方
#[async_trait]
pub trait SourceSearcher: Send + Sync {
    /// 按关键字搜索第 `page` 页（从 1 开始）的候选内容源
    async fn search(&self, keyword: &str, page: u32) -> Result<Vec<CandidateSource>, CollectorError>;

    /// 协作方名称
    fn name(&self) -> &'static str;
}

/// 评论拉取协作方
///
/// 游标是不透明令牌，原样往返，不做解释
#[async_trait]
pub trait CommentFetcher: Send + Sync {
    /// 拉取一页评论，空游标表示第一页
    async fn fetch_page(&self, source_id: &str, cursor: &str) -> Result<CommentPage, CollectorError>;

    fn name(&self) -> &'static str;
}

/// 分类服务返回结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierResponse {
    /// 情感码，缺失表示服务未给出结果
    pub sentiment: Option<i64>,
    /// 置信度
    pub confidence: Option<f64>,
}

/// 分类服务错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// 服务返回的错误码
    #[error("classifier error {code}: {message}")]
    Api { code: i64, message: String },

    /// 鉴权失败（凭据无效或被吊销）
    #[error("classifier authentication failed: {0}")]
    Auth(String),

    /// 传输层错误
    #[error("classifier transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ClassifierError {
    fn from(e: reqwest::Error) -> Self {
        ClassifierError::Transport(e.to_string())
    }
}

/// 情感分类协作方
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassifierResponse, ClassifierError>;

    fn name(&self) -> &'static str;
}

/// 致命错误码集合
///
/// 命中集合的错误会中止当前批次，其余错误只影响单条记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalCodeSet {
    codes: HashSet<i64>,
}

impl FatalCodeSet {
    pub fn new(codes: impl IntoIterator<Item = i64>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    pub fn is_fatal(&self, error: &ClassifierError) -> bool {
        match error {
            ClassifierError::Api { code, .. } => self.codes.contains(code),
            ClassifierError::Auth(_) => true,
            ClassifierError::Transport(_) => false,
        }
    }
}

impl Default for FatalCodeSet {
    /// 配额耗尽、QPS 超限、权限不足、令牌失效等
    fn default() -> Self {
        Self::new([6, 17, 18, 19, 110, 111])
    }
}
