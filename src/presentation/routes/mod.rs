// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::analytics_use_case::AnalyticsUseCase;
use crate::application::use_cases::crawl_use_case::CrawlUseCase;
use crate::application::use_cases::target_use_case::TargetUseCase;
use crate::presentation::handlers::{analytics_handler, crawl_handler, target_handler};
use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由，处理器依赖通过 `Extension` 注入
pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version))
        .route("/v1/crawl", post(crawl_handler::create_crawl))
        .route("/v1/crawl/{id}", get(crawl_handler::get_crawl_status))
        .route("/v1/batches/{id}", get(crawl_handler::get_batch_status))
        .route(
            "/v1/targets",
            get(target_handler::list_targets).post(target_handler::create_target),
        )
        .route(
            "/v1/targets/{name}",
            put(target_handler::update_target).delete(target_handler::delete_target),
        )
        .route("/v1/analytics/summary", get(analytics_handler::summary))
        .route("/v1/analytics/filter", post(analytics_handler::filter))
}

/// 注入用例并挂载请求追踪
pub fn build_router(
    crawl: Arc<CrawlUseCase>,
    targets: Arc<TargetUseCase>,
    analytics: Arc<AnalyticsUseCase>,
) -> Router {
    routes()
        .layer(Extension(crawl))
        .layer(Extension(targets))
        .layer(Extension(analytics))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
