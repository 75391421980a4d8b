// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::target_repository::RepositoryError;
use crate::queue::task_queue::QueueError;
use thiserror::Error;

pub mod analytics_use_case;
pub mod crawl_use_case;
pub mod target_use_case;

/// 用例层错误
#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl From<RepositoryError> for UseCaseError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(name) => UseCaseError::NotFound(name),
            RepositoryError::AlreadyExists(name) => {
                UseCaseError::Conflict(format!("{} already exists", name))
            }
            RepositoryError::Invalid(msg) => UseCaseError::Validation(msg),
            other => UseCaseError::Repository(other),
        }
    }
}

impl From<validator::ValidationErrors> for UseCaseError {
    fn from(e: validator::ValidationErrors) -> Self {
        UseCaseError::Validation(e.to_string())
    }
}
