// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::analytics::{
    AnalyticsSummaryDto, DailyCount, FilterRequestDto, FilterResponseDto, FilteredRecord,
    NamedValue,
};
use crate::application::use_cases::UseCaseError;
use crate::domain::models::sentiment::{ClassifiedRecord, SentimentLabel, StoredBatch};
use crate::domain::repositories::result_store::ResultStore;
use crate::domain::services::target_registry::TargetRegistry;
use chrono::{Days, Local, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;
use validator::Validate;

/// 舆情统计用例
///
/// 只统计已完成分类的记录，日期按评论发布时间的本地日期计算
pub struct AnalyticsUseCase {
    results: Arc<dyn ResultStore>,
    registry: Arc<TargetRegistry>,
}

impl AnalyticsUseCase {
    pub fn new(results: Arc<dyn ResultStore>, registry: Arc<TargetRegistry>) -> Self {
        Self { results, registry }
    }

    pub async fn summary(&self, target: Option<&str>) -> Result<AnalyticsSummaryDto, UseCaseError> {
        let batches = self.load_batches(target).await?;
        Ok(summarize(
            batches.iter().flat_map(StoredBatch::classified),
            Local::now().date_naive(),
        ))
    }

    pub async fn filter(&self, request: FilterRequestDto) -> Result<FilterResponseDto, UseCaseError> {
        request.validate()?;
        if let (Some(start), Some(end)) = (request.start_date, request.end_date) {
            if start > end {
                return Err(UseCaseError::Validation(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }
        let batches = self.load_batches(request.target.as_deref()).await?;
        Ok(filter_records(
            batches.iter().flat_map(StoredBatch::classified),
            &request,
            Local::now().date_naive(),
        ))
    }

    async fn load_batches(&self, target: Option<&str>) -> Result<Vec<StoredBatch>, UseCaseError> {
        let names = match target {
            Some(name) => vec![name.to_string()],
            None => self
                .registry
                .list()
                .await?
                .into_iter()
                .map(|t| t.name)
                .collect(),
        };

        let mut batches = Vec::new();
        for name in names {
            batches.extend(self.results.list_batches(&name).await?);
        }
        Ok(batches)
    }
}

fn record_date(record: &ClassifiedRecord<'_>) -> NaiveDate {
    record.record.published_at.with_timezone(&Local).date_naive()
}

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 10000.0).round() / 100.0
}

fn shares(counts: &BTreeMap<String, u64>, total: u64) -> Vec<NamedValue> {
    counts
        .iter()
        .map(|(name, &count)| NamedValue {
            name: name.clone(),
            value: percentage(count, total),
        })
        .collect()
}

/// 统计平台占比、情感占比和近 7/14/30 天的每日数量
pub fn summarize<'a>(
    records: impl Iterator<Item = ClassifiedRecord<'a>>,
    today: NaiveDate,
) -> AnalyticsSummaryDto {
    let mut total = 0u64;
    let mut platforms: BTreeMap<String, u64> = BTreeMap::new();
    let mut sentiments: BTreeMap<String, u64> = BTreeMap::new();
    let mut daily: BTreeMap<NaiveDate, u64> = BTreeMap::new();

    for record in records {
        total += 1;
        *platforms.entry(record.record.platform.clone()).or_default() += 1;
        *sentiments.entry(record.sentiment.to_string()).or_default() += 1;
        *daily.entry(record_date(&record)).or_default() += 1;
    }

    let window = |days: u64| -> Vec<DailyCount> {
        let since = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        daily
            .range(since..)
            .map(|(&date, &count)| DailyCount { date, count })
            .collect()
    };

    AnalyticsSummaryDto {
        total,
        platform_share: shares(&platforms, total),
        sentiment_share: shares(&sentiments, total),
        sentiment_counts: sentiments
            .iter()
            .map(|(name, &count)| NamedValue {
                name: name.clone(),
                value: count as f64,
            })
            .collect(),
        last_7_days: window(7),
        last_14_days: window(14),
        last_30_days: window(30),
    }
}

/// 按条件筛选记录并统计正负面和当天新增数量
pub fn filter_records<'a>(
    records: impl Iterator<Item = ClassifiedRecord<'a>>,
    request: &FilterRequestDto,
    today: NaiveDate,
) -> FilterResponseDto {
    let mut response = FilterResponseDto {
        total_data_count: 0,
        today_new_count: 0,
        positive_count: 0,
        negative_count: 0,
        records: Vec::new(),
    };
    let offset = request.offset.unwrap_or(0);
    let limit = request.limit.unwrap_or(usize::MAX);

    for record in records {
        let date = record_date(&record);
        if request.start_date.is_some_and(|start| date < start)
            || request.end_date.is_some_and(|end| date > end)
            || request
                .platform
                .as_deref()
                .is_some_and(|p| record.record.platform != p)
            || request.sentiment.is_some_and(|s| record.sentiment != s)
        {
            continue;
        }

        let index = response.total_data_count as usize;
        response.total_data_count += 1;
        match record.sentiment {
            SentimentLabel::Positive => response.positive_count += 1,
            SentimentLabel::Negative => response.negative_count += 1,
            _ => {}
        }
        if date == today {
            response.today_new_count += 1;
        }
        if index >= offset && response.records.len() < limit {
            response.records.push(FilteredRecord {
                record: record.record.clone(),
                sentiment: record.sentiment,
            });
        }
    }

    response
}
