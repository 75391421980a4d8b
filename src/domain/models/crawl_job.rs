// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 爬取任务
///
/// 目标在入队时刻的不可变快照。关键字和配额被复制进任务，
/// 之后对目标的编辑不会影响已经入队的任务。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlJob {
    /// 任务唯一标识符，每次入队生成
    pub id: Uuid,
    /// 所属目标名称
    pub target_name: String,
    /// 关键字快照
    pub keywords: Vec<String>,
    /// 请求配额快照
    pub quota: u32,
    /// 触发来源
    pub trigger: JobTrigger,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl CrawlJob {
    pub fn new(target_name: impl Into<String>, keywords: Vec<String>, quota: u32, trigger: JobTrigger) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_name: target_name.into(),
            keywords,
            quota,
            trigger,
            created_at: Utc::now(),
        }
    }
}

/// 任务触发来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobTrigger {
    /// 定时器触发
    Scheduled,
    /// 目标的立即执行标记触发
    Immediate,
    /// 手动提交
    Manual,
}

impl fmt::Display for JobTrigger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobTrigger::Scheduled => write!(f, "scheduled"),
            JobTrigger::Immediate => write!(f, "immediate"),
            JobTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// 任务状态
///
/// 状态转换：Pending → Running → Completed/Failed，不会回到 Pending。
/// 重试只发生在 Running 内部的页/记录粒度。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed(CrawlSummary),
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}

/// 单个关键字的爬取结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordOutcome {
    pub keyword: String,
    /// 分配到的配额
    pub allocated: u32,
    /// 实际采集数量
    pub collected: u32,
    /// 实际尝试的候选数量
    pub candidates_tried: u32,
    /// 因互动量不足被跳过的候选数量
    pub candidates_skipped: u32,
    /// 翻页重试次数
    pub retries: u32,
    /// 被丢弃的异常评论条数
    pub malformed_items: u32,
    /// 错误信息
    pub errors: Vec<String>,
}

impl KeywordOutcome {
    /// 未满足的配额
    pub fn shortfall(&self) -> u32 {
        self.allocated.saturating_sub(self.collected)
    }
}

/// 一次爬取任务的结果汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub job_id: Uuid,
    pub target_name: String,
    pub requested: u32,
    pub collected: u32,
    pub keywords: Vec<KeywordOutcome>,
    /// 交给情感分析队列的批次
    pub batch_id: Option<Uuid>,
    /// 任务级错误（不属于某个关键字）
    #[serde(default)]
    pub errors: Vec<String>,
}

impl CrawlSummary {
    pub fn shortfall(&self) -> u32 {
        self.keywords.iter().map(KeywordOutcome::shortfall).sum()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len() + self.keywords.iter().map(|k| k.errors.len()).sum::<usize>()
    }
}
