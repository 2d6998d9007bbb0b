use station_client::StationDevice;
use station_config::StationConfig;
use station_core::{Result, StateStore};
use station_state::{DocumentShape, StateSynchronizer, SyncReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

pub const STATUS_PREFIX: &str = "status";
pub const DOCSIS_PREFIX: &str = "docsis";
pub const ABOUT_PREFIX: &str = "about";

/// 轮询阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    LoggingIn,
    FetchingStatus,
    FetchingDocsis,
    FetchingAbout,
    SynchronizingStatus,
    SynchronizingDocsis,
    SynchronizingAbout,
    Terminated,
}

/// 一轮轮询的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed(SyncReport),
    /// 本轮放弃，`phase` 为出错时所处阶段
    Failed { phase: PollPhase, error: String },
    /// 上一轮仍在进行，或已关闭
    Skipped,
}

/// 轮询参数
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub base_url: String,
    pub password: String,
    pub sync_about: bool,
}

impl From<&StationConfig> for PollSettings {
    fn from(config: &StationConfig) -> Self {
        Self {
            base_url: config.device.base_url(),
            password: config.device.password.clone(),
            sync_about: config.poll.sync_about,
        }
    }
}

/// 轮询编排器
///
/// 每轮依次执行：登录 -> 读取状态 -> 读取 DOCSIS -> 同步状态 -> 同步 DOCSIS。
/// 任何一步失败都记录日志并放弃本轮，下一轮从登录重新开始。
/// 同一时间最多一轮在执行。
pub struct PollOrchestrator {
    device: Arc<dyn StationDevice>,
    synchronizer: StateSynchronizer,
    settings: PollSettings,
    phase_tx: watch::Sender<PollPhase>,
    cycle_guard: Mutex<()>,
    terminated: AtomicBool,
}

impl PollOrchestrator {
    pub fn new(
        device: Arc<dyn StationDevice>,
        store: Arc<dyn StateStore>,
        settings: PollSettings,
    ) -> Self {
        let (phase_tx, _) = watch::channel(PollPhase::Idle);
        Self {
            device,
            synchronizer: StateSynchronizer::new(store),
            settings,
            phase_tx,
            cycle_guard: Mutex::new(()),
            terminated: AtomicBool::new(false),
        }
    }

    /// 当前阶段
    pub fn phase(&self) -> PollPhase {
        *self.phase_tx.borrow()
    }

    /// 订阅阶段变化
    pub fn subscribe_phase(&self) -> watch::Receiver<PollPhase> {
        self.phase_tx.subscribe()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// 执行一轮轮询，错误在内部处理
    pub async fn poll(&self) -> PollOutcome {
        if self.is_terminated() {
            debug!("Orchestrator terminated, ignoring tick");
            return PollOutcome::Skipped;
        }

        let Ok(_guard) = self.cycle_guard.try_lock() else {
            warn!("Previous poll cycle still running, skipping tick");
            return PollOutcome::Skipped;
        };

        let started = Instant::now();
        let outcome = match self.run_cycle().await {
            Ok(report) => {
                info!(
                    objects_created = report.objects_created,
                    channels_created = report.channels_created,
                    values_written = report.values_written,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Poll cycle completed"
                );
                PollOutcome::Completed(report)
            }
            Err(e) => {
                let phase = self.phase();
                error!(phase = ?phase, error = %e, "Failed fetching data");
                PollOutcome::Failed {
                    phase,
                    error: e.to_string(),
                }
            }
        };

        self.set_phase(PollPhase::Idle);
        outcome
    }

    async fn run_cycle(&self) -> Result<SyncReport> {
        self.set_phase(PollPhase::LoggingIn);
        debug!(base_url = %self.settings.base_url, "Performing login to station");
        self.device
            .login(&self.settings.base_url, &self.settings.password)
            .await?;

        self.set_phase(PollPhase::FetchingStatus);
        let status = self.device.get_station_status().await?;

        self.set_phase(PollPhase::FetchingDocsis);
        let docsis = self.device.get_docsis_status().await?;

        let about = if self.settings.sync_about {
            self.set_phase(PollPhase::FetchingAbout);
            Some(self.device.get_about().await?)
        } else {
            None
        };

        let mut report = SyncReport::default();

        self.set_phase(PollPhase::SynchronizingStatus);
        report.merge(
            &self
                .synchronizer
                .synchronize(&status, STATUS_PREFIX, DocumentShape::Flat)
                .await?,
        );

        self.set_phase(PollPhase::SynchronizingDocsis);
        report.merge(
            &self
                .synchronizer
                .synchronize(&docsis, DOCSIS_PREFIX, DocumentShape::Channels)
                .await?,
        );

        if let Some(about) = about {
            self.set_phase(PollPhase::SynchronizingAbout);
            report.merge(
                &self
                    .synchronizer
                    .synchronize(&about, ABOUT_PREFIX, DocumentShape::Flat)
                    .await?,
            );
        }

        if let Err(e) = self.synchronizer.store().flush().await {
            warn!(error = %e, "Failed to flush state store");
        }

        Ok(report)
    }

    /// 关闭：之后的轮询全部跳过，并尝试一次登出
    ///
    /// 登出失败只记录警告，不返回错误。
    pub async fn shutdown(&self) {
        self.terminated.store(true, Ordering::Release);
        self.phase_tx.send_replace(PollPhase::Terminated);

        match self.device.logout().await {
            Ok(()) => info!("Logged out during shutdown"),
            Err(e) => warn!(error = %e, "Logout during shutdown failed"),
        }
    }

    /// 已关闭后不再离开 `Terminated`
    fn set_phase(&self, phase: PollPhase) {
        self.phase_tx.send_if_modified(|current| {
            if *current == PollPhase::Terminated || *current == phase {
                return false;
            }
            *current = phase;
            true
        });
    }
}
