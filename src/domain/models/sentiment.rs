// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::record::RawRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 情感标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Unknown,
}

impl SentimentLabel {
    /// 将分类服务返回的情感码映射为标签
    ///
    /// 0 = 负面，1 = 中性，2 = 正面，其余为未知
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => SentimentLabel::Negative,
            Some(1) => SentimentLabel::Neutral,
            Some(2) => SentimentLabel::Positive,
            _ => SentimentLabel::Unknown,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Negative => write!(f, "negative"),
            SentimentLabel::Neutral => write!(f, "neutral"),
            SentimentLabel::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for SentimentLabel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            "unknown" => Ok(SentimentLabel::Unknown),
            _ => Err(()),
        }
    }
}

/// 已存储的记录
///
/// `sentiment` 为 None 表示尚未分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub record: RawRecord,
    #[serde(default)]
    pub sentiment: Option<SentimentLabel>,
}

impl StoredRecord {
    pub fn unclassified(record: RawRecord) -> Self {
        Self {
            record,
            sentiment: None,
        }
    }
}

/// 已分类记录，终态实体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRecord<'a> {
    pub record: &'a RawRecord,
    pub sentiment: SentimentLabel,
}

/// 一次爬取任务产出的记录批次（持久化形式）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBatch {
    pub batch_id: Uuid,
    pub job_id: Uuid,
    pub target_name: String,
    pub created_at: DateTime<Utc>,
    pub records: Vec<StoredRecord>,
}

impl StoredBatch {
    pub fn new(batch_id: Uuid, job_id: Uuid, target_name: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            batch_id,
            job_id,
            target_name: target_name.into(),
            created_at: Utc::now(),
            records: records.into_iter().map(StoredRecord::unclassified).collect(),
        }
    }

    /// 已分类的记录
    pub fn classified(&self) -> impl Iterator<Item = ClassifiedRecord<'_>> {
        self.records.iter().filter_map(|r| {
            r.sentiment.map(|sentiment| ClassifiedRecord {
                record: &r.record,
                sentiment,
            })
        })
    }

    pub fn unclassified_count(&self) -> usize {
        self.records.iter().filter(|r| r.sentiment.is_none()).count()
    }
}

/// 情感分析队列中的批次引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentBatch {
    pub batch_id: Uuid,
    pub job_id: Uuid,
    pub target_name: String,
    /// 结果存储中的句柄
    pub storage_key: String,
}

/// 批次处理汇总
///
/// 不变式：processed = positive + negative + neutral + unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub total: usize,
    /// 之前已完成分类（断点续跑）的记录数
    pub already_classified: usize,
    pub processed: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub unknown: usize,
    pub errors: Vec<String>,
    pub fatal_error: Option<String>,
}

impl BatchSummary {
    pub fn new(batch_id: Uuid, total: usize) -> Self {
        Self {
            batch_id,
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, label: SentimentLabel) {
        self.processed += 1;
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Unknown => self.unknown += 1,
        }
    }
}

/// 批次状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Running,
    Completed(BatchSummary),
    Failed {
        summary: BatchSummary,
        error: String,
    },
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed(_) | BatchStatus::Failed { .. })
    }
}
