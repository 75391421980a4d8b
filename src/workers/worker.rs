// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::task_queue::QueueReceiver;
use crate::utils::errors::WorkerError;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

/// Worker trait定义
///
/// 所有队列工作器都必须实现此trait。每个队列只有一个工作器持有消费端，
/// 因此同一时刻最多只有一个任务在执行。
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// 工作器处理的任务类型
    type Job: Send + 'static;

    /// 处理单个任务
    async fn process(&self, job: Self::Job) -> Result<(), WorkerError>;

    /// 任务处理失败（返回错误或 panic）时记录终态
    fn on_failure(&self, job_id: Uuid, error: String);

    /// 任务标识
    fn job_id(job: &Self::Job) -> Uuid;

    /// 获取工作器名称
    fn name(&self) -> &str;
}

/// 在后台运行工作器，直到队列所有发送端关闭
///
/// 单个任务的错误或 panic 不会终止工作器
pub fn spawn_worker<W: Worker>(worker: W, mut receiver: QueueReceiver<W::Job>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(worker = worker.name(), queue = receiver.name(), "worker started");

        while let Some(job) = receiver.dequeue().await {
            let job_id = W::job_id(&job);
            match AssertUnwindSafe(worker.process(job)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(worker = worker.name(), job_id = %job_id, "job failed: {}", e);
                    worker.on_failure(job_id, e.to_string());
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(worker = worker.name(), job_id = %job_id, "job panicked: {}", message);
                    worker.on_failure(job_id, format!("panic: {}", message));
                }
            }
        }

        info!(worker = worker.name(), "queue closed, worker exiting");
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
