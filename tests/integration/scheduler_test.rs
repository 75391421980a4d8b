// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{advance, timeout};
use yuqing::domain::models::crawl_job::{CrawlJob, JobTrigger};
use yuqing::domain::models::target::{CollectionTarget, TargetUpdate};
use yuqing::domain::services::target_registry::TargetRegistry;
use yuqing::infrastructure::repositories::target_repo_impl::JsonTargetRepository;
use yuqing::infrastructure::storage::InMemoryStorage;
use yuqing::queue::pipeline::{PipelineContext, PipelineReceivers};
use yuqing::queue::scheduler::TargetScheduler;

const HOUR: Duration = Duration::from_secs(3600);

struct Fixture {
    registry: Arc<TargetRegistry>,
    pipeline: Arc<PipelineContext>,
    receivers: PipelineReceivers,
    scheduler: Arc<TargetScheduler>,
}

impl Fixture {
    fn new(enabled: bool) -> Self {
        let registry = Arc::new(TargetRegistry::new(Arc::new(JsonTargetRepository::new(
            Arc::new(InMemoryStorage::new()),
            "keyword_groups.json",
        ))));
        let (pipeline, receivers) = PipelineContext::new();
        let scheduler = TargetScheduler::new(registry.clone(), pipeline.clone(), enabled, HOUR);
        Self {
            registry,
            pipeline,
            receivers,
            scheduler,
        }
    }

    async fn add(&self, name: &str, interval_hours: u32) -> CollectionTarget {
        self.registry
            .create(CollectionTarget::new(
                name,
                vec![format!("{}-kw", name)],
                interval_hours,
                40,
            ))
            .await
            .unwrap()
    }

    /// 取出下一个爬取任务，短时间内没有则返回 None
    async fn next_job(&mut self) -> Option<CrawlJob> {
        timeout(Duration::from_secs(1), self.receivers.crawl.dequeue())
            .await
            .ok()
            .flatten()
    }
}

/// 测试定时器在一个周期后触发，并使用目标的最新快照
#[tokio::test(start_paused = true)]
async fn test_timer_enqueues_latest_snapshot() {
    let mut fx = Fixture::new(true);
    let target = fx.add("games", 1).await;
    fx.scheduler.register(&target);

    advance(HOUR + Duration::from_secs(1)).await;
    let job = fx.next_job().await.expect("first tick");
    assert_eq!(job.trigger, JobTrigger::Scheduled);
    assert_eq!(job.keywords, vec!["games-kw".to_string()]);
    assert_eq!(job.quota, 40);

    fx.registry
        .update(
            "games",
            TargetUpdate {
                keywords: Some(vec!["new-kw".into()]),
                quota: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    advance(HOUR).await;
    let job = fx.next_job().await.expect("second tick");
    assert_eq!(job.keywords, vec!["new-kw".to_string()]);
    assert_eq!(job.quota, 7);
    assert!(fx.pipeline.get_status(job.id).is_some());
}

/// 测试立即执行标记只被消费一次
#[tokio::test(start_paused = true)]
async fn test_immediate_flag_consumed_once() {
    let mut fx = Fixture::new(true);
    let mut target = CollectionTarget::new("games", vec!["kw".into()], 6, 10);
    target.immediate = true;
    fx.registry.create(target).await.unwrap();

    fx.scheduler.sync_all().await.unwrap();
    let job = fx.next_job().await.expect("immediate job");
    assert_eq!(job.trigger, JobTrigger::Immediate);

    fx.scheduler.sync_all().await.unwrap();
    assert!(fx.next_job().await.is_none());
    assert!(!fx.registry.get("games").await.unwrap().unwrap().immediate);
}

/// 测试停止采集的目标在下次触发时被移除
#[tokio::test(start_paused = true)]
async fn test_paused_target_drops_timer_on_fire() {
    let mut fx = Fixture::new(true);
    let target = fx.add("games", 1).await;
    fx.scheduler.register(&target);
    assert_eq!(fx.scheduler.registered(), vec!["games".to_string()]);

    fx.registry
        .update(
            "games",
            TargetUpdate {
                collecting: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    advance(HOUR + Duration::from_secs(1)).await;
    assert!(fx.next_job().await.is_none());
    assert!(fx.scheduler.registered().is_empty());
}

/// 测试重新同步会取消已删除目标且不重置未变化的定时器
#[tokio::test(start_paused = true)]
async fn test_resync_cancels_deleted_and_keeps_running_timers() {
    let mut fx = Fixture::new(true);
    fx.add("games", 1).await;
    fx.add("music", 2).await;
    assert_eq!(fx.scheduler.sync_all().await.unwrap(), 2);

    advance(Duration::from_secs(30 * 60)).await;
    fx.registry.delete("music").await.unwrap();
    assert_eq!(fx.scheduler.sync_all().await.unwrap(), 1);
    assert_eq!(fx.scheduler.registered(), vec!["games".to_string()]);

    // 原定时器在第 60 分钟触发，重置则会推迟到第 90 分钟
    advance(Duration::from_secs(31 * 60)).await;
    let job = fx.next_job().await.expect("timer kept its schedule");
    assert_eq!(job.target_name, "games");
}

/// 测试关闭调度时不注册定时器，但立即执行标记仍然生效
#[tokio::test(start_paused = true)]
async fn test_disabled_scheduler_only_honours_immediate() {
    let mut fx = Fixture::new(false);
    let mut target = CollectionTarget::new("games", vec!["kw".into()], 1, 10);
    target.immediate = true;
    fx.registry.create(target).await.unwrap();

    assert_eq!(fx.scheduler.sync_all().await.unwrap(), 0);
    let job = fx.next_job().await.expect("immediate job");
    assert_eq!(job.trigger, JobTrigger::Immediate);

    advance(HOUR * 2).await;
    assert!(fx.next_job().await.is_none());
}

/// 测试关闭后不再触发
#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_all_timers() {
    let mut fx = Fixture::new(true);
    fx.add("games", 1).await;
    fx.scheduler.sync_all().await.unwrap();

    fx.scheduler.shutdown();
    assert!(fx.scheduler.registered().is_empty());

    advance(HOUR * 2).await;
    assert!(fx.next_job().await.is_none());
}
