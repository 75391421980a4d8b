// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use yuqing::application::use_cases::analytics_use_case::AnalyticsUseCase;
use yuqing::application::use_cases::crawl_use_case::CrawlUseCase;
use yuqing::application::use_cases::target_use_case::TargetUseCase;
use yuqing::config::settings::Settings;
use yuqing::domain::repositories::result_store::ResultStore;
use yuqing::domain::services::crawl_executor::CrawlJobExecutor;
use yuqing::domain::services::target_registry::TargetRegistry;
use yuqing::engines::baidu_nlp::BaiduSentimentClient;
use yuqing::engines::bilibili::BilibiliClient;
use yuqing::infrastructure::metrics::init_metrics;
use yuqing::infrastructure::repositories::result_store_impl::JsonResultStore;
use yuqing::infrastructure::repositories::target_repo_impl::JsonTargetRepository;
use yuqing::infrastructure::storage::create_storage_repository;
use yuqing::presentation::routes;
use yuqing::queue::pipeline::PipelineContext;
use yuqing::queue::scheduler::TargetScheduler;
use yuqing::utils::retry_policy::RetryPolicy;
use yuqing::utils::telemetry;
use yuqing::workers::crawl_worker::CrawlWorker;
use yuqing::workers::manager::WorkerManager;
use yuqing::workers::sentiment_worker::{
    requeue_unfinished_batches, SentimentWorker, SentimentWorkerConfig,
};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting yuqing...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    init_metrics(&settings.metrics);

    // 3. Storage, registry and result store
    let storage = create_storage_repository(&settings.storage)?;
    let registry = Arc::new(TargetRegistry::new(Arc::new(JsonTargetRepository::new(
        storage.clone(),
        settings.registry.key.clone(),
    ))));
    let results: Arc<dyn ResultStore> = Arc::new(JsonResultStore::new(storage));
    info!("Registry loaded with {} targets", registry.list().await?.len());

    // 4. Queues
    let (pipeline, receivers) = PipelineContext::new();

    // 5. Collaborators
    let bilibili = Arc::new(BilibiliClient::new(&settings.bilibili)?);
    let classifier = Arc::new(BaiduSentimentClient::new(&settings.baidu)?);
    let executor = Arc::new(CrawlJobExecutor::new(
        bilibili.clone(),
        bilibili,
        &settings.crawl,
        RetryPolicy::from_settings(&settings.backoff, settings.crawl.retry_ceiling),
    ));

    // 6. Workers and scheduler
    let crawl_worker = CrawlWorker::new(
        executor,
        pipeline.clone(),
        results.clone(),
        registry.clone(),
    );
    let sentiment_worker = SentimentWorker::new(
        classifier,
        pipeline.clone(),
        results.clone(),
        registry.clone(),
        SentimentWorkerConfig::from(&settings.sentiment),
    );
    let scheduler = TargetScheduler::new(
        registry.clone(),
        pipeline.clone(),
        settings.scheduler.enabled,
        Duration::from_secs(settings.scheduler.resync_interval_secs),
    );

    let mut worker_manager = WorkerManager::new(scheduler.clone());
    worker_manager.start_workers(receivers, crawl_worker, sentiment_worker);
    match requeue_unfinished_batches(results.as_ref(), &pipeline).await {
        Ok(count) => info!("Requeued {} unfinished sentiment batches", count),
        Err(e) => error!("Failed to scan unfinished sentiment batches: {}", e),
    }
    worker_manager.start_scheduler().await;

    // 7. Start HTTP server
    let app = routes::build_router(
        Arc::new(CrawlUseCase::new(pipeline, registry.clone())),
        Arc::new(TargetUseCase::new(registry.clone(), scheduler)),
        Arc::new(AnalyticsUseCase::new(results, registry)),
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { worker_manager.wait_for_shutdown().await })
        .await?;

    info!("yuqing stopped");
    Ok(())
}
