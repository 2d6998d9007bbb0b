use async_trait::async_trait;
use serde_json::Value;
use station_types::ObjectDescriptor;

/// 外部键值/对象存储
///
/// 轮询核心只依赖这几项操作，具体后端由宿主提供。
#[async_trait]
pub trait StateStore: Send + Sync {
    /// 对象是否已有描述符
    async fn exists(&self, id: &str) -> anyhow::Result<bool>;

    /// 不存在时创建描述符。返回是否真正创建。
    async fn create_if_absent(&self, id: &str, descriptor: ObjectDescriptor) -> anyhow::Result<bool>;

    /// 写入状态值。`ack` 为 true 表示已确认的外部事实。
    async fn write_value(&self, id: &str, value: Value, ack: bool) -> anyhow::Result<()>;

    /// 一轮同步结束后调用
    async fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
