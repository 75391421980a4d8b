// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Query},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::application::dto::analytics::{FilterRequestDto, SummaryQuery};
use crate::application::use_cases::analytics_use_case::AnalyticsUseCase;
use crate::presentation::errors::AppError;

/// 舆情汇总
pub async fn summary(
    Extension(use_case): Extension<Arc<AnalyticsUseCase>>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(use_case.summary(query.target.as_deref()).await?))
}

/// 按条件筛选已分类记录
pub async fn filter(
    Extension(use_case): Extension<Arc<AnalyticsUseCase>>,
    Json(payload): Json<FilterRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(use_case.filter(payload).await?))
}
