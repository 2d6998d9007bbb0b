use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 状态对象声明的数据类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Number,
    Mixed,
}

/// 状态对象的公共属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateCommon {
    pub name: String,
    pub data_type: DataType,
    pub role: String,
    pub readable: bool,
    pub writable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// 通道对象的公共属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCommon {
    pub name: String,
}

/// 对象描述符
///
/// 每个 id 最多创建一次，创建后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ObjectDescriptor {
    State(StateCommon),
    Channel(ChannelCommon),
}

impl ObjectDescriptor {
    /// 只读的遥测值状态
    pub fn value_state(name: impl Into<String>, data_type: DataType, unit: Option<String>) -> Self {
        Self::State(StateCommon {
            name: name.into(),
            data_type,
            role: "value".to_string(),
            readable: true,
            writable: false,
            unit,
        })
    }

    /// 通道对象，名称为 `Channel <id>`
    pub fn channel(channel_id: &str) -> Self {
        Self::Channel(ChannelCommon {
            name: format!("Channel {}", channel_id),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::State(common) => &common.name,
            Self::Channel(common) => &common.name,
        }
    }

    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::State(common) => Some(common.data_type),
            Self::Channel(_) => None,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            Self::State(common) => common.unit.as_deref(),
            Self::Channel(_) => None,
        }
    }

    pub fn is_channel(&self) -> bool {
        matches!(self, Self::Channel(_))
    }
}

/// 已写入的状态值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    pub val: Value,
    pub ack: bool,
    pub ts: DateTime<Utc>,
}

impl StoredState {
    pub fn new(val: Value, ack: bool) -> Self {
        Self {
            val,
            ack,
            ts: Utc::now(),
        }
    }
}
