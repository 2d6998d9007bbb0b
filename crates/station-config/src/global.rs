use serde::{Deserialize, Serialize};
use station_logging::LogFormat;
use std::path::PathBuf;
use std::time::Duration;

/// 默认轮询间隔（秒）
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// 全局配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StationConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 设备配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// 设备 IP、主机名或完整 URL
    #[serde(default = "default_ip")]
    pub ip: String,

    /// 管理密码
    #[serde(default)]
    pub password: String,

    /// HTTP 请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl DeviceConfig {
    /// 设备根地址，裸主机补全 `http://`
    pub fn base_url(&self) -> String {
        let ip = self.ip.trim();
        if ip.contains("://") {
            ip.to_string()
        } else {
            format!("http://{}", ip)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// 轮询配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    /// 轮询间隔（秒），未设置或非正数时使用 60
    #[serde(default = "default_interval_secs")]
    pub interval_secs: i64,

    /// 启动后立即执行第一轮
    #[serde(default = "default_true")]
    pub poll_on_start: bool,

    /// 同时同步 `sta_about`
    #[serde(default)]
    pub sync_about: bool,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        match u64::try_from(self.interval_secs) {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            poll_on_start: true,
            sync_about: false,
        }
    }
}

/// 状态存储配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    /// JSON 检查点文件
    #[serde(default)]
    pub checkpoint_path: Option<PathBuf>,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// 默认值函数
fn default_ip() -> String {
    "192.168.100.1".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_interval_secs() -> i64 {
    DEFAULT_POLL_INTERVAL_SECS as i64
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
