//! 轮询编排与宿主生命周期

pub mod adapter;
pub mod orchestrator;

pub use adapter::StationAdapter;
pub use orchestrator::{
    PollOrchestrator, PollOutcome, PollPhase, PollSettings, ABOUT_PREFIX, DOCSIS_PREFIX,
    STATUS_PREFIX,
};
