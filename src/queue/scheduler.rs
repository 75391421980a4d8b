// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawl_job::JobTrigger;
use crate::domain::models::target::CollectionTarget;
use crate::domain::repositories::target_repository::RepositoryError;
use crate::domain::services::target_registry::TargetRegistry;
use crate::queue::pipeline::PipelineContext;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

struct TimerEntry {
    period: Duration,
    handle: JoinHandle<()>,
}

/// 目标调度器
///
/// 每个处于采集状态的目标对应一个周期定时器。定时器触发时重新从注册表读取目标，
/// 把最新的关键字和配额快照放入爬取队列，自身从不执行爬取。
pub struct TargetScheduler {
    registry: Arc<TargetRegistry>,
    pipeline: Arc<PipelineContext>,
    timers: Mutex<HashMap<String, TimerEntry>>,
    enabled: bool,
    resync_interval: Duration,
    weak_self: Weak<TargetScheduler>,
}

impl TargetScheduler {
    pub fn new(
        registry: Arc<TargetRegistry>,
        pipeline: Arc<PipelineContext>,
        enabled: bool,
        resync_interval: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            registry,
            pipeline,
            timers: Mutex::new(HashMap::new()),
            enabled,
            resync_interval,
            weak_self: weak_self.clone(),
        })
    }

    /// 注册目标的定时器
    ///
    /// 已有定时器会被取消并替换；目标不在采集状态时只取消
    pub fn register(&self, target: &CollectionTarget) {
        if !target.collecting || !self.enabled {
            self.cancel(&target.name);
            return;
        }

        let period = target.interval();
        let handle = self.spawn_timer(target.name.clone(), period);
        let previous = self.timers.lock().insert(
            target.name.clone(),
            TimerEntry { period, handle },
        );
        if let Some(previous) = previous {
            previous.handle.abort();
        }
        info!(target = %target.name, period_secs = period.as_secs(), "timer registered");
    }

    /// 取消目标的定时器
    pub fn cancel(&self, name: &str) {
        if let Some(entry) = self.timers.lock().remove(name) {
            entry.handle.abort();
            info!(target = %name, "timer cancelled");
        }
    }

    /// 当前持有定时器的目标名称
    pub fn registered(&self) -> Vec<String> {
        let mut names: Vec<String> = self.timers.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// 定时器触发
    ///
    /// 重新读取目标；目标已删除或停止采集时取消定时器
    pub async fn fire(&self, name: &str) -> Option<Uuid> {
        let target = match self.registry.get(name).await {
            Ok(Some(target)) if target.collecting => target,
            Ok(_) => {
                debug!(target = %name, "target gone or paused, dropping timer");
                self.cancel(name);
                return None;
            }
            Err(e) => {
                error!(target = %name, "failed to read target on fire: {}", e);
                return None;
            }
        };

        self.enqueue(&target, JobTrigger::Scheduled)
    }

    /// 消费目标的立即执行标记，标记存在时额外入队一次
    pub async fn consume_immediate(&self, name: &str) -> Result<Option<Uuid>, RepositoryError> {
        if !self.registry.take_immediate(name).await? {
            return Ok(None);
        }
        let Some(target) = self.registry.get(name).await? else {
            return Ok(None);
        };
        Ok(self.enqueue(&target, JobTrigger::Immediate))
    }

    /// 与注册表重新同步
    ///
    /// 为新出现或周期变化的采集目标注册定时器，取消已删除或暂停的目标，
    /// 并消费所有立即执行标记
    pub async fn sync_all(&self) -> Result<usize, RepositoryError> {
        let targets = self.registry.list().await?;
        let names: HashSet<&str> = targets.iter().map(|t| t.name.as_str()).collect();

        let stale: Vec<String> = self
            .timers
            .lock()
            .keys()
            .filter(|name| !names.contains(name.as_str()))
            .cloned()
            .collect();
        for name in stale {
            self.cancel(&name);
        }

        for target in &targets {
            let unchanged = self
                .timers
                .lock()
                .get(&target.name)
                .is_some_and(|entry| entry.period == target.interval() && !entry.handle.is_finished());
            if !(target.collecting && unchanged) {
                self.register(target);
            }
            if target.immediate {
                if let Err(e) = self.consume_immediate(&target.name).await {
                    warn!(target = %target.name, "failed to consume immediate flag: {}", e);
                }
            }
        }

        Ok(self.timers.lock().len())
    }

    /// 启动维护循环，定期与注册表同步
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let period = self.resync_interval.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(scheduler) = weak.upgrade() else {
                    break;
                };
                match scheduler.sync_all().await {
                    Ok(count) => debug!(timers = count, "scheduler resync"),
                    Err(e) => error!("scheduler resync failed: {}", e),
                }
            }
        })
    }

    /// 取消所有定时器
    pub fn shutdown(&self) {
        let timers: Vec<(String, TimerEntry)> = self.timers.lock().drain().collect();
        for (_, entry) in timers {
            entry.handle.abort();
        }
        info!("scheduler timers cancelled");
    }

    fn enqueue(&self, target: &CollectionTarget, trigger: JobTrigger) -> Option<Uuid> {
        match self
            .pipeline
            .enqueue_crawl(&target.name, &target.keywords, target.quota, trigger)
        {
            Ok(job_id) => Some(job_id),
            Err(e) => {
                error!(target = %target.name, %trigger, "failed to enqueue crawl job: {}", e);
                None
            }
        }
    }

    fn spawn_timer(&self, name: String, period: Duration) -> JoinHandle<()> {
        let weak = self.weak_self.clone();
        tokio::spawn(async move {
            // 首次触发在一个周期之后
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let Some(scheduler) = weak.upgrade() else {
                    break;
                };
                scheduler.fire(&name).await;
            }
        })
    }
}

impl Drop for TargetScheduler {
    fn drop(&mut self) {
        for (_, entry) in self.timers.get_mut().drain() {
            entry.handle.abort();
        }
    }
}
