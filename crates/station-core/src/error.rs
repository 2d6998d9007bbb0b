use thiserror::Error;

/// 统一错误类型
#[derive(Error, Debug)]
pub enum StationError {
    /// 获取盐值失败，或登录响应缺少成功标记
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// 网络错误、超时或非 2xx 状态码
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 响应体不是合法的 JSON
    #[error("Invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("Logout error: {0}")]
    Logout(String),

    /// 状态存储拒绝了对象创建或写值
    #[error("Sync error for {id}: {reason}")]
    Sync { id: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, StationError>;

impl StationError {
    pub fn sync(id: impl Into<String>, err: impl std::fmt::Display) -> Self {
        StationError::Sync {
            id: id.into(),
            reason: err.to_string(),
        }
    }

    /// 超时属于传输错误的一种
    pub fn is_timeout(&self) -> bool {
        matches!(self, StationError::Transport(e) if e.is_timeout())
    }
}

impl From<anyhow::Error> for StationError {
    fn from(err: anyhow::Error) -> Self {
        StationError::Internal(err.to_string())
    }
}
