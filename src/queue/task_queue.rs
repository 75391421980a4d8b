// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::gauge;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// 队列错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// 任务内容不合法，拒绝入队
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// 消费端已关闭
    #[error("Queue closed")]
    Closed,
}

/// 无界先进先出任务队列的发送端
///
/// 入队不阻塞，可以在任何上下文中调用
pub struct TaskQueue<T> {
    name: &'static str,
    sender: mpsc::UnboundedSender<T>,
    depth: Arc<AtomicUsize>,
}

/// 队列的唯一消费端
///
/// 只能有一个持有者，持有者即是该队列唯一的执行者
pub struct QueueReceiver<T> {
    name: &'static str,
    receiver: mpsc::UnboundedReceiver<T>,
    depth: Arc<AtomicUsize>,
}

/// 创建一个命名队列
pub fn channel<T>(name: &'static str) -> (TaskQueue<T>, QueueReceiver<T>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        TaskQueue {
            name,
            sender,
            depth: depth.clone(),
        },
        QueueReceiver {
            name,
            receiver,
            depth,
        },
    )
}

impl<T> TaskQueue<T> {
    /// 入队
    pub fn enqueue(&self, item: T) -> Result<(), QueueError> {
        self.sender.send(item).map_err(|_| QueueError::Closed)?;
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        gauge!("queue_depth", "queue" => self.name).set(depth as f64);
        Ok(())
    }

    /// 当前排队数量
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> QueueReceiver<T> {
    /// 出队，队列为空时等待；所有发送端关闭后返回 None
    pub async fn dequeue(&mut self) -> Option<T> {
        let item = self.receiver.recv().await?;
        let depth = self
            .depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| Some(d.saturating_sub(1)))
            .map(|prev| prev.saturating_sub(1))
            .unwrap_or(0);
        gauge!("queue_depth", "queue" => self.name).set(depth as f64);
        Some(item)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
