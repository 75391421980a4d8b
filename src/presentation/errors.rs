// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::application::use_cases::UseCaseError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_message = self.0.to_string();

        let status = match self.0.downcast_ref::<UseCaseError>() {
            Some(UseCaseError::Validation(_)) => StatusCode::BAD_REQUEST,
            Some(UseCaseError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(UseCaseError::Conflict(_)) => StatusCode::CONFLICT,
            Some(UseCaseError::Queue(crate::queue::task_queue::QueueError::InvalidJob(_))) => {
                StatusCode::BAD_REQUEST
            }
            Some(_) | None => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("request failed: {:#}", self.0);
        }

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
