// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::record::RawRecord;
use crate::domain::models::sentiment::SentimentLabel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub target: Option<String>,
}

/// 名称 / 数值对，数值可以是计数或百分比
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// 舆情汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummaryDto {
    pub total: u64,
    /// 平台占比（百分比）
    pub platform_share: Vec<NamedValue>,
    /// 情感占比（百分比）
    pub sentiment_share: Vec<NamedValue>,
    /// 情感计数
    pub sentiment_counts: Vec<NamedValue>,
    pub last_7_days: Vec<DailyCount>,
    pub last_14_days: Vec<DailyCount>,
    pub last_30_days: Vec<DailyCount>,
}

/// 记录筛选条件，日期为闭区间
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct FilterRequestDto {
    pub target: Option<String>,
    pub sentiment: Option<SentimentLabel>,
    pub platform: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredRecord {
    #[serde(flatten)]
    pub record: RawRecord,
    pub sentiment: SentimentLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResponseDto {
    pub total_data_count: u64,
    pub today_new_count: u64,
    pub positive_count: u64,
    pub negative_count: u64,
    pub records: Vec<FilteredRecord>,
}
