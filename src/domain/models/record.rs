// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 默认平台标记
pub const PLATFORM_BILIBILI: &str = "bilibili";

/// 候选内容源（视频）
///
/// 由搜索协作方发现，每个任务内临时存在
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSource {
    /// 内容源ID（用于拉取评论）
    pub source_id: String,
    /// 展示用标识（如 BV 号）
    pub label: String,
    /// 标题
    pub title: String,
    /// 热度指标，缺失视为 0
    pub popularity: Option<u64>,
    /// 规模信号（声明的评论数），即估计容量
    pub size_signal: u64,
}

impl CandidateSource {
    pub fn popularity_or_zero(&self) -> u64 {
        self.popularity.unwrap_or(0)
    }
}

/// 分页游标
///
/// 生命周期限定在一次分页引擎调用内，从不持久化
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    /// 不透明的续传令牌，空串表示从头开始
    pub token: String,
    /// 已获取的页数
    pub pages: u32,
    /// 当前页的连续重试次数
    pub retries: u32,
}

impl PaginationCursor {
    pub fn start() -> Self {
        Self::default()
    }

    /// 前进到下一页，并重置重试计数
    pub fn advance(&mut self, token: String) {
        self.token = token;
        self.retries = 0;
    }
}

/// 评论作者信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub user_id: String,
    pub user_name: String,
    pub gender: String,
    pub level: u32,
    pub ip_location: String,
}

/// 原始评论记录
///
/// 由分页引擎产生，被情感分析队列消费一次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub source_id: String,
    #[serde(default)]
    pub source_label: String,
    #[serde(default)]
    pub source_title: String,
    pub comment_id: String,
    pub author: AuthorInfo,
    pub content: String,
    /// 点赞数
    pub likes: u64,
    pub published_at: DateTime<Utc>,
    pub platform: String,
    /// 产出该记录的关键字
    #[serde(default)]
    pub keyword: String,
}

/// 一页评论
#[derive(Debug, Clone, Default)]
pub struct CommentPage {
    pub items: Vec<RawRecord>,
    /// 下一页令牌，None 表示没有更多页
    pub next_cursor: Option<String>,
    /// 解析失败而被跳过的条目数
    pub skipped: u32,
}
