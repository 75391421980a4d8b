// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 手动提交爬取任务
///
/// 未提供关键字或配额时使用已注册目标的配置
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CrawlRequestDto {
    #[validate(length(min = 1, max = 100))]
    pub target_name: String,
    #[validate(length(min = 1, max = 50))]
    pub keywords: Option<Vec<String>>,
    #[validate(range(min = 1, max = 100000))]
    pub quota: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CrawlAcceptedDto {
    pub job_id: Uuid,
}
