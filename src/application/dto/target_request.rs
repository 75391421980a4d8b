// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::{CollectionTarget, TargetUpdate};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateTargetDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub keywords: Vec<String>,
    pub collecting: Option<bool>,
    #[validate(range(min = 1, max = 720))]
    pub interval_hours: Option<u32>,
    #[validate(range(min = 1, max = 100000))]
    pub quota: Option<u32>,
    pub immediate: Option<bool>,
}

impl CreateTargetDto {
    pub fn into_target(self) -> CollectionTarget {
        let mut target = CollectionTarget::new(
            self.name.trim(),
            normalize_keywords(self.keywords),
            self.interval_hours.unwrap_or(1),
            self.quota.unwrap_or(100),
        );
        target.collecting = self.collecting.unwrap_or(true);
        target.immediate = self.immediate.unwrap_or(false);
        target
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct UpdateTargetDto {
    #[validate(length(min = 1, max = 50))]
    pub keywords: Option<Vec<String>>,
    pub collecting: Option<bool>,
    #[validate(range(min = 1, max = 720))]
    pub interval_hours: Option<u32>,
    #[validate(range(min = 1, max = 100000))]
    pub quota: Option<u32>,
    pub immediate: Option<bool>,
}

impl From<UpdateTargetDto> for TargetUpdate {
    fn from(dto: UpdateTargetDto) -> Self {
        TargetUpdate {
            keywords: dto.keywords.map(normalize_keywords),
            collecting: dto.collecting,
            interval_hours: dto.interval_hours,
            quota: dto.quota,
            immediate: dto.immediate,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TargetQuery {
    pub name: Option<String>,
}

/// 目标列表及汇总计数
#[derive(Debug, Deserialize, Serialize)]
pub struct TargetListDto {
    pub targets: Vec<CollectionTarget>,
    pub total_data_count: u64,
    pub total_warning_count: u64,
}

/// 去掉首尾空白和重复关键字，保持原顺序
pub fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect()
}
