pub mod error;
pub mod traits;

pub use error::{Result, StationError};
pub use traits::store::StateStore;

/// 判断设备响应中的成功标记（`error` 字段等于 `"ok"`）
pub fn is_success_marker(body: &serde_json::Value) -> bool {
    body.get("error").and_then(|v| v.as_str()) == Some("ok")
}
