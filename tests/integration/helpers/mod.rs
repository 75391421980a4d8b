// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use uuid::Uuid;
use yuqing::application::use_cases::analytics_use_case::AnalyticsUseCase;
use yuqing::application::use_cases::crawl_use_case::CrawlUseCase;
use yuqing::application::use_cases::target_use_case::TargetUseCase;
use yuqing::config::settings::Settings;
use yuqing::domain::models::crawl_job::JobStatus;
use yuqing::domain::models::record::{AuthorInfo, CandidateSource, CommentPage, RawRecord};
use yuqing::domain::models::sentiment::BatchStatus;
use yuqing::domain::repositories::result_store::ResultStore;
use yuqing::domain::services::crawl_executor::CrawlJobExecutor;
use yuqing::domain::services::target_registry::TargetRegistry;
use yuqing::engines::traits::{
    ClassifierError, ClassifierResponse, CommentFetcher, FatalCodeSet, SentimentClassifier,
    SourceSearcher,
};
use yuqing::infrastructure::repositories::result_store_impl::JsonResultStore;
use yuqing::infrastructure::repositories::target_repo_impl::JsonTargetRepository;
use yuqing::infrastructure::storage::InMemoryStorage;
use yuqing::presentation::routes;
use yuqing::queue::pipeline::PipelineContext;
use yuqing::queue::scheduler::TargetScheduler;
use yuqing::utils::errors::CollectorError;
use yuqing::utils::retry_policy::RetryPolicy;
use yuqing::workers::crawl_worker::CrawlWorker;
use yuqing::workers::manager::WorkerManager;
use yuqing::workers::sentiment_worker::{
    requeue_unfinished_batches, SentimentWorker, SentimentWorkerConfig,
};

/// 假的B站协作方
///
/// 每个内容源有固定数量的评论，游标是已返回条数。
/// 记录同时在拉取的请求数，用于验证爬取流水线不会并发执行。
pub struct FakeBilibili {
    candidates: HashMap<String, Vec<CandidateSource>>,
    comments_per_source: usize,
    fetch_delay: Duration,
    panic_source: Option<String>,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub fetched_sources: Mutex<Vec<String>>,
}

impl FakeBilibili {
    /// 每个关键字对应一个同名内容源
    pub fn new(keywords: &[&str], comments_per_source: usize) -> Self {
        let candidates = keywords
            .iter()
            .map(|k| {
                (
                    k.to_string(),
                    vec![CandidateSource {
                        source_id: format!("src-{}", k),
                        label: format!("BV-{}", k),
                        title: format!("video about {}", k),
                        popularity: Some(1000),
                        size_signal: comments_per_source as u64,
                    }],
                )
            })
            .collect();
        Self {
            candidates,
            comments_per_source,
            fetch_delay: Duration::ZERO,
            panic_source: None,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            fetched_sources: Mutex::new(Vec::new()),
        }
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// 拉取该关键字对应的内容源时 panic
    pub fn panicking_on(mut self, keyword: &str) -> Self {
        self.panic_source = Some(format!("src-{}", keyword));
        self
    }
}

/// 评论内容按序号轮换：正面、负面、中性
fn comment_text(i: usize) -> &'static str {
    match i % 3 {
        0 => "这个视频真好看",
        1 => "内容太差了",
        _ => "还行吧",
    }
}

#[async_trait]
impl SourceSearcher for FakeBilibili {
    async fn search(&self, keyword: &str, page: u32) -> Result<Vec<CandidateSource>, CollectorError> {
        if page > 1 {
            return Ok(Vec::new());
        }
        Ok(self.candidates.get(keyword).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "fake-bilibili-search"
    }
}

#[async_trait]
impl CommentFetcher for FakeBilibili {
    async fn fetch_page(&self, source_id: &str, cursor: &str) -> Result<CommentPage, CollectorError> {
        if self.panic_source.as_deref() == Some(source_id) {
            panic!("fetcher exploded on {}", source_id);
        }

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        self.fetched_sources.lock().push(source_id.to_string());
        if !self.fetch_delay.is_zero() {
            sleep(self.fetch_delay).await;
        }

        let offset: usize = cursor.parse().unwrap_or(0);
        let end = (offset + 10).min(self.comments_per_source);
        let items = (offset..end)
            .map(|i| RawRecord {
                source_id: source_id.to_string(),
                source_label: String::new(),
                source_title: String::new(),
                comment_id: format!("{}-{}", source_id, i),
                author: AuthorInfo::default(),
                content: comment_text(i).to_string(),
                likes: i as u64,
                published_at: Utc::now(),
                platform: "bilibili".into(),
                keyword: String::new(),
            })
            .collect();

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(CommentPage {
            items,
            next_cursor: (end < self.comments_per_source).then(|| end.to_string()),
            skipped: 0,
        })
    }

    fn name(&self) -> &'static str {
        "fake-bilibili-replies"
    }
}

/// 假的情感分类服务
///
/// 含“好”为正面，含“差”为负面，其余中性。可选的闸门用于暂停分类。
pub struct FakeClassifier {
    gate: Option<Arc<Semaphore>>,
    fail_from_call: Option<usize>,
    pub calls: AtomicUsize,
}

impl FakeClassifier {
    pub fn new() -> Self {
        Self {
            gate: None,
            fail_from_call: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// 每次调用需要闸门中的一个许可
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    /// 从第 `call` 次调用（从 0 开始）起返回 QPS 超限错误
    pub fn exhausted_after(call: usize) -> Self {
        Self {
            fail_from_call: Some(call),
            ..Self::new()
        }
    }
}

#[async_trait]
impl SentimentClassifier for FakeClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifierResponse, ClassifierError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| ClassifierError::Transport(e.to_string()))?
                .forget();
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_from_call.is_some_and(|from| call >= from) {
            return Err(ClassifierError::Api {
                code: 18,
                message: "Open api qps request limit reached".into(),
            });
        }

        let sentiment = if text.contains('好') {
            2
        } else if text.contains('差') {
            0
        } else {
            1
        };
        Ok(ClassifierResponse {
            sentiment: Some(sentiment),
            confidence: Some(0.9),
        })
    }

    fn name(&self) -> &'static str {
        "fake-classifier"
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub pipeline: Arc<PipelineContext>,
    pub registry: Arc<TargetRegistry>,
    pub results: Arc<dyn ResultStore>,
    pub scheduler: Arc<TargetScheduler>,
    pub worker_manager: WorkerManager,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.worker_manager.shutdown();
    }
}

pub async fn create_test_app(bilibili: Arc<FakeBilibili>, classifier: Arc<FakeClassifier>) -> TestApp {
    create_test_app_with_storage(bilibili, classifier, Arc::new(InMemoryStorage::new())).await
}

/// 使用给定存储创建应用，模拟进程重启后读取之前的数据
pub async fn create_test_app_with_storage(
    bilibili: Arc<FakeBilibili>,
    classifier: Arc<FakeClassifier>,
    storage: Arc<InMemoryStorage>,
) -> TestApp {
    let mut settings = Settings::defaults().expect("default settings");
    settings.crawl.page_size = 10;
    settings.crawl.request_interval_ms = 0;

    let registry = Arc::new(TargetRegistry::new(Arc::new(JsonTargetRepository::new(
        storage.clone(),
        "keyword_groups.json",
    ))));
    let results: Arc<dyn ResultStore> = Arc::new(JsonResultStore::new(storage));
    let (pipeline, receivers) = PipelineContext::new();

    let executor = Arc::new(CrawlJobExecutor::new(
        bilibili.clone(),
        bilibili,
        &settings.crawl,
        RetryPolicy::immediate(settings.crawl.retry_ceiling),
    ));
    let crawl_worker = CrawlWorker::new(executor, pipeline.clone(), results.clone(), registry.clone());
    let sentiment_worker = SentimentWorker::new(
        classifier,
        pipeline.clone(),
        results.clone(),
        registry.clone(),
        SentimentWorkerConfig {
            fatal_codes: FatalCodeSet::default(),
            checkpoint_every: 50,
            call_interval: Duration::ZERO,
            batch_timeout: Duration::from_secs(600),
        },
    );
    let scheduler = TargetScheduler::new(
        registry.clone(),
        pipeline.clone(),
        true,
        Duration::from_secs(3600),
    );

    let mut worker_manager = WorkerManager::new(scheduler.clone());
    worker_manager.start_workers(receivers, crawl_worker, sentiment_worker);
    requeue_unfinished_batches(results.as_ref(), &pipeline)
        .await
        .expect("requeue unfinished batches");

    let app = routes::build_router(
        Arc::new(CrawlUseCase::new(pipeline.clone(), registry.clone())),
        Arc::new(TargetUseCase::new(registry.clone(), scheduler.clone())),
        Arc::new(AnalyticsUseCase::new(results.clone(), registry.clone())),
    );

    TestApp {
        server: TestServer::new(app).expect("test server"),
        pipeline,
        registry,
        results,
        scheduler,
        worker_manager,
    }
}

/// 等待爬取任务进入终态
pub async fn wait_for_job(pipeline: &PipelineContext, job_id: Uuid) -> JobStatus {
    timeout(Duration::from_secs(10), async {
        loop {
            if let Some(status) = pipeline.get_status(job_id) {
                if status.is_terminal() {
                    return status;
                }
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("crawl job did not finish in time")
}

/// 等待情感分析批次进入终态
pub async fn wait_for_batch(pipeline: &PipelineContext, batch_id: Uuid) -> BatchStatus {
    timeout(Duration::from_secs(10), async {
        loop {
            if let Some(status) = pipeline.get_batch_status(batch_id) {
                if status.is_terminal() {
                    return status;
                }
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("sentiment batch did not finish in time")
}

/// 从已完成的爬取任务中取出批次标识
pub fn batch_id_of(status: &JobStatus) -> Uuid {
    match status {
        JobStatus::Completed(summary) => summary.batch_id.expect("completed job has a batch"),
        other => panic!("job not completed: {:?}", other),
    }
}
