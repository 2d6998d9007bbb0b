use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 每条通道记录中的区分字段
pub const CHANNEL_ID_FIELD: &str = "__id";

/// 设备返回的遥测文档
///
/// `data` 中的值可以是标量，也可以是（DOCSIS 文档中的）通道记录数组。
/// 其余顶层字段（例如 `error`、`message`）原样保留在 `extra` 中。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TelemetryDocument {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data: Some(data),
            extra: Map::new(),
        }
    }

    /// 数据字段迭代器（文档没有 `data` 时为空）
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter().flat_map(|data| data.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.data.as_ref().map_or(true, |data| data.is_empty())
    }
}
