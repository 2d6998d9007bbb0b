use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use station_core::StateStore;
use station_types::{ObjectDescriptor, StoredState};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 存储快照（也是检查点文件的格式）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub objects: BTreeMap<String, ObjectDescriptor>,
    pub states: BTreeMap<String, StoredState>,
}

/// 内存状态存储
///
/// 可选 JSON 检查点：`flush` 时写盘，启动时用 `load_checkpoint` 恢复，
/// 这样对象描述符和类型在进程重启后保持不变。
pub struct MemoryStateStore {
    inner: RwLock<StoreSnapshot>,
    checkpoint_path: Option<PathBuf>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreSnapshot::default()),
            checkpoint_path: None,
        }
    }

    pub fn with_checkpoint(path: impl AsRef<Path>) -> Self {
        Self {
            inner: RwLock::new(StoreSnapshot::default()),
            checkpoint_path: Some(path.as_ref().to_path_buf()),
        }
    }

    pub fn checkpoint_path(&self) -> Option<&Path> {
        self.checkpoint_path.as_deref()
    }

    /// 加载检查点。文件不存在时返回 `Ok(false)`。
    pub async fn load_checkpoint(&self) -> Result<bool> {
        let Some(path) = &self.checkpoint_path else {
            return Ok(false);
        };
        if !fs::try_exists(path).await? {
            return Ok(false);
        }

        let json = fs::read_to_string(path).await?;
        let snapshot: StoreSnapshot = serde_json::from_str(&json)?;
        let objects = snapshot.objects.len();
        *self.inner.write().await = snapshot;

        info!(path = ?path, objects = objects, "State checkpoint loaded");
        Ok(true)
    }

    /// 保存检查点（先写临时文件再重命名）
    pub async fn save_checkpoint(&self) -> Result<()> {
        let Some(path) = &self.checkpoint_path else {
            return Ok(());
        };

        let json = {
            let inner = self.inner.read().await;
            serde_json::to_string_pretty(&*inner)?
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, path).await?;

        debug!(path = ?path, "State checkpoint saved");
        Ok(())
    }

    pub async fn object(&self, id: &str) -> Option<ObjectDescriptor> {
        self.inner.read().await.objects.get(id).cloned()
    }

    pub async fn state(&self, id: &str) -> Option<StoredState> {
        self.inner.read().await.states.get(id).cloned()
    }

    /// 对象数量
    pub async fn len(&self) -> usize {
        self.inner.read().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.inner.read().await.clone()
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.inner.read().await.objects.contains_key(id))
    }

    async fn create_if_absent(&self, id: &str, descriptor: ObjectDescriptor) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.objects.contains_key(id) {
            return Ok(false);
        }
        debug!(id = %id, name = %descriptor.name(), "Object created");
        inner.objects.insert(id.to_string(), descriptor);
        Ok(true)
    }

    async fn write_value(&self, id: &str, value: Value, ack: bool) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.objects.get(id) {
            None => return Err(anyhow!("Object {} does not exist", id)),
            Some(descriptor) if descriptor.is_channel() => {
                return Err(anyhow!("Object {} is a channel and holds no value", id))
            }
            Some(_) => {}
        }
        inner.states.insert(id.to_string(), StoredState::new(value, ack));
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.save_checkpoint().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use station_types::DataType;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let store = MemoryStateStore::new();
        let first = ObjectDescriptor::value_state("uptime", DataType::Number, Some("s".into()));
        let second = ObjectDescriptor::value_state("uptime", DataType::Mixed, None);

        assert!(store.create_if_absent("status.uptime", first.clone()).await.unwrap());
        assert!(!store.create_if_absent("status.uptime", second).await.unwrap());
        assert_eq!(store.object("status.uptime").await, Some(first));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_write_requires_object() {
        let store = MemoryStateStore::new();
        assert!(store.write_value("status.missing", json!(1), true).await.is_err());

        store
            .create_if_absent("docsis.downstream.1", ObjectDescriptor::channel("1"))
            .await
            .unwrap();
        assert!(store
            .write_value("docsis.downstream.1", json!(1), true)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let store = MemoryStateStore::new();
        store
            .create_if_absent("status.mode", ObjectDescriptor::value_state("mode", DataType::Mixed, None))
            .await
            .unwrap();

        store.write_value("status.mode", json!("bridge"), true).await.unwrap();
        store.write_value("status.mode", json!("router"), true).await.unwrap();

        let state = store.state("status.mode").await.unwrap();
        assert_eq!(state.val, json!("router"));
        assert!(state.ack);
    }

    #[tokio::test]
    async fn test_checkpoint_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("states.json");

        let store = MemoryStateStore::with_checkpoint(&path);
        assert!(!store.load_checkpoint().await.unwrap());

        store
            .create_if_absent("status.uptime", ObjectDescriptor::value_state("uptime", DataType::Number, Some("s".into())))
            .await
            .unwrap();
        store.write_value("status.uptime", json!(12), true).await.unwrap();
        store.flush().await.unwrap();
        assert!(path.exists());

        let restored = MemoryStateStore::with_checkpoint(&path);
        assert!(restored.load_checkpoint().await.unwrap());
        assert_eq!(restored.snapshot().await, store.snapshot().await);
    }

    #[tokio::test]
    async fn test_flush_without_checkpoint_is_noop() {
        let store = MemoryStateStore::new();
        store.flush().await.unwrap();
        assert!(store.checkpoint_path().is_none());
    }
}
