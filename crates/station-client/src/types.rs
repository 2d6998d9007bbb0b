use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// 设备默认地址
pub const DEFAULT_BASE_URL: &str = "http://192.168.100.1";

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 设备根地址
    pub base_url: String,

    /// 单次 HTTP 请求的连接/响应超时
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// `session/login` 的响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub salt: Option<String>,

    #[serde(default)]
    pub saltwebui: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoginResponse {
    pub fn is_ok(&self) -> bool {
        self.error.as_deref() == Some("ok")
    }

    /// 取出盐值对（两个字段都必须存在）
    pub fn salt_pair(&self) -> Option<SaltPair> {
        match (&self.salt, &self.saltwebui) {
            (Some(salt), Some(salt_web_ui)) => Some(SaltPair {
                salt: salt.clone(),
                salt_web_ui: salt_web_ui.clone(),
            }),
            _ => None,
        }
    }
}

/// 每次登录由设备下发的一次性盐值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltPair {
    pub salt: String,
    pub salt_web_ui: String,
}
