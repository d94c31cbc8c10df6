//! 字段强制转换（coercion）
//!
//! 将客户端传入的无类型 JSON 值转换为字段描述符声明的语义类型。
//! 纯函数，不访问存储；失败时返回 `CoercionError`。
//!
//! `FieldCodec` 负责语义值与 Rust 字段类型之间的收窄/展开，
//! 由 `#[entity]` 宏生成的字段读写代码调用。
//!
use crate::error::CoercionError;
use crate::schema::{FieldDescriptor, FieldType};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::fmt;

/// 已完成强制转换的字段值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    String(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    /// 规范的枚举变体名
    Enum(&'static str),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// 还原为 JSON 表示（时间戳使用 RFC 3339）
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::String(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::from(*i),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Timestamp(t) => Value::String(t.to_rfc3339()),
            Self::Enum(name) => Value::String((*name).to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// 按描述符把原始 JSON 值转换为语义值
pub fn coerce(raw: &Value, descriptor: &FieldDescriptor) -> Result<FieldValue, CoercionError> {
    let field = descriptor.name;
    let mismatch = || CoercionError::type_mismatch(field, raw.clone(), descriptor.field_type);

    if raw.is_null() {
        return if descriptor.nullable {
            Ok(FieldValue::Null)
        } else {
            Err(CoercionError::NotNullable {
                field: field.to_string(),
            })
        };
    }

    match descriptor.field_type {
        FieldType::String => match raw {
            Value::String(s) => Ok(FieldValue::String(s.clone())),
            Value::Number(n) => Ok(FieldValue::String(n.to_string())),
            Value::Bool(b) => Ok(FieldValue::String(b.to_string())),
            _ => Err(mismatch()),
        },
        FieldType::Integer => integer_of(raw)
            .map(FieldValue::Integer)
            .ok_or_else(mismatch),
        FieldType::Boolean => match raw {
            Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(FieldValue::Boolean(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(FieldValue::Boolean(false)),
            _ => Err(mismatch()),
        },
        FieldType::Timestamp => timestamp_of(raw)
            .map(FieldValue::Timestamp)
            .ok_or_else(mismatch),
        FieldType::Enum(variants) => match raw {
            Value::String(s) => variants
                .iter()
                .copied()
                .find(|v| v.eq_ignore_ascii_case(s))
                .map(FieldValue::Enum)
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
    }
}

// 整数：JSON 整数、小数部分为零的浮点数，或可完整解析的数字字符串
fn integer_of(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                // `i64::MAX as f64` 会进位到 2^63，上界必须取开区间
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
}

// 时间戳：RFC 3339、无时区的 ISO 8601（按 UTC 处理）或 Unix 秒
fn timestamp_of(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::String(s) => {
            if let Ok(t) = DateTime::parse_from_rfc3339(s) {
                return Some(t.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(naive.and_utc());
            }
            s.parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

/// 语义值与 Rust 字段类型之间的编解码
pub trait FieldCodec: Sized {
    const FIELD_TYPE: FieldType;
    const NULLABLE: bool = false;

    fn encode(&self) -> FieldValue;

    fn decode(field: &str, value: FieldValue) -> Result<Self, CoercionError>;
}

// 非可空字段收到 Null 时给出更明确的错误
fn rejected(field: &str, value: FieldValue, expected: FieldType) -> CoercionError {
    if value.is_null() {
        CoercionError::NotNullable {
            field: field.to_string(),
        }
    } else {
        CoercionError::type_mismatch(field, value.to_json(), expected)
    }
}

impl FieldCodec for String {
    const FIELD_TYPE: FieldType = FieldType::String;

    fn encode(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }

    fn decode(field: &str, value: FieldValue) -> Result<Self, CoercionError> {
        match value {
            FieldValue::String(s) => Ok(s),
            other => Err(rejected(field, other, Self::FIELD_TYPE)),
        }
    }
}

impl FieldCodec for i64 {
    const FIELD_TYPE: FieldType = FieldType::Integer;

    fn encode(&self) -> FieldValue {
        FieldValue::Integer(*self)
    }

    fn decode(field: &str, value: FieldValue) -> Result<Self, CoercionError> {
        match value {
            FieldValue::Integer(i) => Ok(i),
            other => Err(rejected(field, other, Self::FIELD_TYPE)),
        }
    }
}

impl FieldCodec for i32 {
    const FIELD_TYPE: FieldType = FieldType::Integer;

    fn encode(&self) -> FieldValue {
        FieldValue::Integer(i64::from(*self))
    }

    fn decode(field: &str, value: FieldValue) -> Result<Self, CoercionError> {
        let wide = i64::decode(field, value)?;
        i32::try_from(wide).map_err(|_| CoercionError::OutOfRange {
            field: field.to_string(),
            value: wide,
        })
    }
}

impl FieldCodec for bool {
    const FIELD_TYPE: FieldType = FieldType::Boolean;

    fn encode(&self) -> FieldValue {
        FieldValue::Boolean(*self)
    }

    fn decode(field: &str, value: FieldValue) -> Result<Self, CoercionError> {
        match value {
            FieldValue::Boolean(b) => Ok(b),
            other => Err(rejected(field, other, Self::FIELD_TYPE)),
        }
    }
}

impl FieldCodec for DateTime<Utc> {
    const FIELD_TYPE: FieldType = FieldType::Timestamp;

    fn encode(&self) -> FieldValue {
        FieldValue::Timestamp(*self)
    }

    fn decode(field: &str, value: FieldValue) -> Result<Self, CoercionError> {
        match value {
            FieldValue::Timestamp(t) => Ok(t),
            other => Err(rejected(field, other, Self::FIELD_TYPE)),
        }
    }
}

impl<T: FieldCodec> FieldCodec for Option<T> {
    const FIELD_TYPE: FieldType = T::FIELD_TYPE;
    const NULLABLE: bool = true;

    fn encode(&self) -> FieldValue {
        match self {
            Some(inner) => inner.encode(),
            None => FieldValue::Null,
        }
    }

    fn decode(field: &str, value: FieldValue) -> Result<Self, CoercionError> {
        match value {
            FieldValue::Null => Ok(None),
            other => T::decode(field, other).map(Some),
        }
    }
}

/// 枚举字段解码：`#[enumeration]` 宏生成的代码调用
pub fn decode_variant<T: Copy>(
    field: &str,
    value: FieldValue,
    expected: FieldType,
    variants: &[(&str, T)],
) -> Result<T, CoercionError> {
    let found = match &value {
        FieldValue::Enum(name) => variants.iter().find(|(v, _)| v == name),
        FieldValue::String(name) => variants.iter().find(|(v, _)| v.eq_ignore_ascii_case(name)),
        _ => None,
    };

    match found {
        Some((_, variant)) => Ok(*variant),
        None => Err(rejected(field, value, expected)),
    }
}
