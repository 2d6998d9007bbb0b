use crate::schema::classify;
use serde_json::Value;
use station_core::{Result, StateStore, StationError};
use station_types::{ObjectDescriptor, TelemetryDocument, CHANNEL_ID_FIELD};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// 文档形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// 键值平铺（`status`、`about`）
    Flat,
    /// 每个键对应一组通道记录（`docsis`）
    Channels,
}

/// 一次同步的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub objects_created: usize,
    pub channels_created: usize,
    pub values_written: usize,
    pub records_skipped: usize,
}

impl SyncReport {
    pub fn merge(&mut self, other: &SyncReport) {
        self.objects_created += other.objects_created;
        self.channels_created += other.channels_created;
        self.values_written += other.values_written;
        self.records_skipped += other.records_skipped;
    }
}

/// 状态同步器
///
/// 把遥测文档映射到外部存储：缺失的对象先创建（已存在的描述符不会修改），
/// 然后写入值（标记为已确认，后写覆盖先写）。
/// 失败时已完成的写入不会回滚。
pub struct StateSynchronizer {
    store: Arc<dyn StateStore>,
}

impl StateSynchronizer {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// 同步一个文档
    pub async fn synchronize(
        &self,
        document: &TelemetryDocument,
        prefix: &str,
        shape: DocumentShape,
    ) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        let mut sources: HashMap<String, &str> = HashMap::new();

        for (key, value) in document.entries() {
            let base_id = format!("{}.{}", prefix, id_segment(key));
            if let Some(previous) = sources.insert(base_id.clone(), key) {
                warn!(
                    state_id = %base_id,
                    key = %key,
                    previous = %previous,
                    "Keys map to the same state id, later value wins"
                );
            }
            match (shape, value) {
                (DocumentShape::Channels, Value::Array(records)) => {
                    self.sync_channels(&base_id, records, &mut report).await?;
                }
                (DocumentShape::Channels, _) => {
                    debug!(state_id = %base_id, "Scalar value in channel document, storing as flat field");
                    self.sync_field(&base_id, key, value, &mut report).await?;
                }
                (DocumentShape::Flat, _) => {
                    self.sync_field(&base_id, key, value, &mut report).await?;
                }
            }
        }

        debug!(
            prefix = %prefix,
            objects_created = report.objects_created,
            channels_created = report.channels_created,
            values_written = report.values_written,
            "Document synchronized"
        );
        Ok(report)
    }

    async fn sync_channels(
        &self,
        base_id: &str,
        records: &[Value],
        report: &mut SyncReport,
    ) -> Result<()> {
        let mut seen = HashSet::new();

        for record in records {
            let Some(fields) = record.as_object() else {
                warn!(state_id = %base_id, "Channel record is not an object, skipping");
                report.records_skipped += 1;
                continue;
            };
            let Some(channel) = fields.get(CHANNEL_ID_FIELD).and_then(channel_discriminator) else {
                warn!(state_id = %base_id, "Channel record without {}, skipping", CHANNEL_ID_FIELD);
                report.records_skipped += 1;
                continue;
            };

            if !seen.insert(channel.clone()) {
                warn!(state_id = %base_id, channel = %channel, "Duplicate channel id in one snapshot");
            }

            let channel_id = format!("{}.{}", base_id, id_segment(&channel));
            if self
                .ensure_object(&channel_id, ObjectDescriptor::channel(&channel))
                .await?
            {
                report.channels_created += 1;
            }

            for (field, raw) in fields {
                if field == CHANNEL_ID_FIELD {
                    continue;
                }
                let state_id = format!("{}.{}", channel_id, id_segment(field));
                self.sync_field(&state_id, field, raw, report).await?;
            }
        }

        Ok(())
    }

    /// 单个字段：分类、按需创建对象、写值
    async fn sync_field(
        &self,
        state_id: &str,
        name: &str,
        raw: &Value,
        report: &mut SyncReport,
    ) -> Result<()> {
        let classified = classify(raw);
        let descriptor =
            ObjectDescriptor::value_state(name, classified.data_type, classified.unit.clone());

        if self.ensure_object(state_id, descriptor).await? {
            report.objects_created += 1;
        }

        self.store
            .write_value(state_id, classified.value, true)
            .await
            .map_err(|e| StationError::sync(state_id, e))?;
        report.values_written += 1;

        Ok(())
    }

    /// 对象不存在时创建。返回是否新建。
    async fn ensure_object(&self, id: &str, descriptor: ObjectDescriptor) -> Result<bool> {
        let exists = self
            .store
            .exists(id)
            .await
            .map_err(|e| StationError::sync(id, e))?;
        if exists {
            return Ok(false);
        }

        self.store
            .create_if_absent(id, descriptor)
            .await
            .map_err(|e| StationError::sync(id, e))
    }
}

/// 通道区分字段可以是字符串或数字
fn channel_discriminator(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// id 路径中的 `.` 是分隔符，替换为 `_`
///
/// `a.b` 与 `a_b` 会落到同一个 id，同步时记录警告。
fn id_segment(raw: &str) -> String {
    raw.replace('.', "_")
}
