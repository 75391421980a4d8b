// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::dto::crawl_request::{CrawlAcceptedDto, CrawlRequestDto};
use crate::application::use_cases::crawl_use_case::CrawlUseCase;
use crate::presentation::errors::AppError;

/// 提交爬取任务
pub async fn create_crawl(
    Extension(use_case): Extension<Arc<CrawlUseCase>>,
    Json(payload): Json<CrawlRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    let job_id = use_case.submit(payload).await?;
    Ok((StatusCode::ACCEPTED, Json(CrawlAcceptedDto { job_id })))
}

/// 查询爬取任务状态
pub async fn get_crawl_status(
    Extension(use_case): Extension<Arc<CrawlUseCase>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(use_case.job_status(id)?))
}

/// 查询情感分析批次状态
pub async fn get_batch_status(
    Extension(use_case): Extension<Arc<CrawlUseCase>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(use_case.batch_status(id)?))
}
