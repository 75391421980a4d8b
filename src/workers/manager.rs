// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::pipeline::PipelineReceivers;
use crate::queue::scheduler::TargetScheduler;
use crate::workers::crawl_worker::CrawlWorker;
use crate::workers::sentiment_worker::SentimentWorker;
use crate::workers::worker::spawn_worker;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
///
/// 启动两条流水线的工作器和调度器，并在关闭时统一终止
pub struct WorkerManager {
    scheduler: Arc<TargetScheduler>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new(scheduler: Arc<TargetScheduler>) -> Self {
        Self {
            scheduler,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// 每条流水线恰好一个工作器，消费端被移交给它
    pub fn start_workers(
        &mut self,
        receivers: PipelineReceivers,
        crawl_worker: CrawlWorker,
        sentiment_worker: SentimentWorker,
    ) {
        self.handles.push(spawn_worker(crawl_worker, receivers.crawl));
        self.handles.push(spawn_worker(sentiment_worker, receivers.sentiment));
    }

    /// 同步注册表中的目标并启动调度器维护循环
    pub async fn start_scheduler(&mut self) {
        match self.scheduler.sync_all().await {
            Ok(count) => info!("Scheduler started with {} timers", count),
            Err(e) => error!("Initial scheduler sync failed: {}", e),
        }
        self.handles.push(self.scheduler.start());
    }

    /// 等待关闭信号并关闭工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
        self.shutdown();
    }

    /// 终止所有工作器、定时器和维护循环
    pub fn shutdown(&mut self) {
        info!("Shutting down workers...");
        self.scheduler.shutdown();
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Workers shut down successfully");
    }
}
