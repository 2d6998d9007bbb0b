use crate::types::LoginResponse;
use async_trait::async_trait;
use serde_json::Value;
use station_core::Result;
use station_types::TelemetryDocument;

/// 设备接口
///
/// 轮询编排只通过这个 trait 访问设备，便于替换实现。
#[async_trait]
pub trait StationDevice: Send + Sync {
    /// 登录（每轮轮询都会重新登录，盐值每次都会变化）
    async fn login(&self, base_url: &str, password: &str) -> Result<LoginResponse>;

    /// 读取基本状态文档
    async fn get_station_status(&self) -> Result<TelemetryDocument>;

    /// 读取 DOCSIS 通道状态文档
    async fn get_docsis_status(&self) -> Result<TelemetryDocument>;

    /// 读取设备信息
    async fn get_about(&self) -> Result<TelemetryDocument>;

    /// 重启设备
    async fn restart(&self) -> Result<Value>;

    /// 登出
    async fn logout(&self) -> Result<()>;
}
