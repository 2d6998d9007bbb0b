use crate::orchestrator::PollOrchestrator;
use station_types::StoredState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 宿主生命周期适配器
///
/// `start` 启动定时轮询，`stop` 取消定时器并尽力登出。
/// 定时器句柄由实例持有，多个实例互不影响。
pub struct StationAdapter {
    orchestrator: Arc<PollOrchestrator>,
    interval: Duration,
    poll_on_start: bool,
    scheduler: Option<PollScheduler>,
}

impl StationAdapter {
    pub fn new(orchestrator: Arc<PollOrchestrator>, interval: Duration, poll_on_start: bool) -> Self {
        Self {
            orchestrator,
            interval,
            poll_on_start,
            scheduler: None,
        }
    }

    pub fn orchestrator(&self) -> &Arc<PollOrchestrator> {
        &self.orchestrator
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// 启动定时轮询（已在运行时先取消旧的定时器）
    ///
    /// 停止后编排器不可再用，此时拒绝启动。
    pub fn start(&mut self) {
        if self.orchestrator.is_terminated() {
            warn!("Orchestrator already shut down, not scheduling polls");
            return;
        }

        if let Some(previous) = self.scheduler.take() {
            previous.cancel();
        }

        info!(
            interval_secs = self.interval.as_secs(),
            "Scheduling status updates every {} seconds",
            self.interval.as_secs()
        );
        self.scheduler = Some(PollScheduler::spawn(
            self.orchestrator.clone(),
            self.interval,
            self.poll_on_start,
        ));
    }

    /// 外部状态变化通知，仅记录日志
    pub fn on_external_state_change(&self, id: &str, state: Option<&StoredState>) {
        match state {
            Some(state) => info!(id = %id, val = %state.val, ack = state.ack, "State changed"),
            None => info!(id = %id, "State deleted"),
        }
    }

    /// 停止：立即取消定时器，然后尽力登出
    ///
    /// 进行中的那一轮不会被中止，也不会被等待。
    pub async fn stop(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.shutdown().await;
        }
        self.orchestrator.shutdown().await;
    }

    /// 停止后总是调用回调
    pub async fn unload<F: FnOnce()>(&mut self, callback: F) {
        self.stop().await;
        callback();
    }
}

/// 定时器任务句柄
///
/// 丢弃句柄即关闭停止通道，任务随之退出。
struct PollScheduler {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollScheduler {
    fn spawn(orchestrator: Arc<PollOrchestrator>, period: Duration, poll_on_start: bool) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let first = if poll_on_start {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut ticker = interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // 每轮单独成任务，停止时不必等待进行中的 HTTP 请求
                        let orchestrator = orchestrator.clone();
                        tokio::spawn(async move {
                            orchestrator.poll().await;
                        });
                    }
                    _ = stop_rx.changed() => break,
                }
            }

            debug!("Poll scheduler stopped");
        });

        Self { stop_tx, task }
    }

    fn cancel(self) {
        let _ = self.stop_tx.send(true);
    }

    async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}
