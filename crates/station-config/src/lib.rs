pub mod global;
pub mod loader;

pub use global::{DeviceConfig, LoggingConfig, PollConfig, StationConfig, StoreConfig};
pub use loader::ConfigLoader;
