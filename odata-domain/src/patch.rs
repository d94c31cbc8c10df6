//! 部分更新文档（PATCH 文档）
//!
//! 文档是一个无类型 JSON 对象，必须携带目标实体的标识 `id`。
//! 字段缺席表示保持不变，显式 `null` 表示清空。
//!
use crate::entity::EntityId;
use crate::error::{DomainError, DomainResult};
use serde_json::{Map, Value};

/// 部分更新文档
#[derive(Debug, Clone, PartialEq)]
pub struct PatchDocument {
    /// 目标实体标识
    pub id: EntityId,
    /// 除标识外的字段，键保持客户端原样
    pub fields: Map<String, Value>,
}

impl PatchDocument {
    pub fn new(id: EntityId, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    /// 从 JSON 对象解析；`id` 键大小写不敏感，可为整数或纯数字字符串
    pub fn from_value(value: Value) -> DomainResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(invalid("document must be a JSON object"));
        };

        let mut keys = fields.keys().filter(|k| k.eq_ignore_ascii_case("id"));
        let key = keys
            .next()
            .cloned()
            .ok_or_else(|| invalid("document has no id"))?;
        if keys.next().is_some() {
            return Err(invalid("document supplies id more than once"));
        }
        let raw = fields.remove(&key).unwrap_or(Value::Null);

        let id = match &raw {
            Value::Number(n) => n.as_i64().and_then(|i| EntityId::try_from(i).ok()),
            Value::String(s) => s.parse::<EntityId>().ok(),
            _ => None,
        }
        .ok_or_else(|| invalid(&format!("id {raw} is not an integer")))?;

        Ok(Self { id, fields })
    }

    /// 解析批量信封：`{"value": [...]}` 或裸数组
    pub fn parse_batch(value: Value) -> DomainResult<Vec<Self>> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut envelope) => match envelope.remove("value") {
                Some(Value::Array(items)) => items,
                _ => return Err(invalid("batch envelope must contain a 'value' array")),
            },
            _ => return Err(invalid("batch must be an array or an envelope object")),
        };

        items.into_iter().map(Self::from_value).collect()
    }

    pub fn parse_batch_str(body: &str) -> DomainResult<Vec<Self>> {
        Self::parse_batch(serde_json::from_str(body)?)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn invalid(reason: &str) -> DomainError {
    DomainError::InvalidPatch {
        reason: reason.to_string(),
    }
}
