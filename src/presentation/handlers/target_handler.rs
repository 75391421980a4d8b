// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::application::dto::target_request::{CreateTargetDto, TargetQuery, UpdateTargetDto};
use crate::application::use_cases::target_use_case::TargetUseCase;
use crate::presentation::errors::AppError;

pub async fn list_targets(
    Extension(use_case): Extension<Arc<TargetUseCase>>,
    Query(query): Query<TargetQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(use_case.list(query.name.as_deref()).await?))
}

pub async fn create_target(
    Extension(use_case): Extension<Arc<TargetUseCase>>,
    Json(payload): Json<CreateTargetDto>,
) -> Result<impl IntoResponse, AppError> {
    let target = use_case.create(payload).await?;
    Ok((StatusCode::CREATED, Json(target)))
}

pub async fn update_target(
    Extension(use_case): Extension<Arc<TargetUseCase>>,
    Path(name): Path<String>,
    Json(payload): Json<UpdateTargetDto>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(use_case.update(&name, payload).await?))
}

pub async fn delete_target(
    Extension(use_case): Extension<Arc<TargetUseCase>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    use_case.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
