//! 领域层统一错误定义
//!
//! 按关注点拆分为强制转换、合并、关联与存储四类错误，
//! 并在领域边界统一汇聚为 `DomainError`，便于上层用 `?` 传播。
//! 传输层状态码映射由 `ErrorClass` 表达，本 crate 只保证分类正确。
//!
use crate::entity::{EntityId, EntityRef};
use crate::persist::Edge;
use crate::schema::FieldType;
use serde_json::Value;
use thiserror::Error;

/// 字段强制转换失败
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("type mismatch: field={field}, raw={raw}, expected={expected}")]
    TypeMismatch {
        field: String,
        raw: Value,
        expected: FieldType,
    },
    #[error("field '{field}' cannot be cleared")]
    NotNullable { field: String },
    #[error("value out of range: field={field}, value={value}")]
    OutOfRange { field: String, value: i64 },
    #[error("unknown field: {field}")]
    UnknownField { field: String },
}

impl CoercionError {
    pub fn type_mismatch(field: &str, raw: Value, expected: FieldType) -> Self {
        Self::TypeMismatch {
            field: field.to_string(),
            raw,
            expected,
        }
    }

    /// 出错的字段名
    pub fn field(&self) -> &str {
        match self {
            Self::TypeMismatch { field, .. }
            | Self::NotNullable { field }
            | Self::OutOfRange { field, .. }
            | Self::UnknownField { field } => field,
        }
    }
}

/// 选择性合并失败（单个文档全有或全无）
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    #[error("forbidden: modification to field '{field}' requires role '{required_role}'")]
    Forbidden {
        field: String,
        required_role: String,
    },
    #[error("validation failed: field={field}, raw={raw}, reason={reason}")]
    Validation {
        field: String,
        raw: Value,
        reason: String,
    },
    #[error("entity kind not registered: {kind}")]
    UnknownKind { kind: String },
}

/// 多对多关联维护失败
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkError {
    #[error("unknown entity kind: {kind}")]
    UnknownKind { kind: String },
    #[error("no relation between {left} and {right}")]
    UnknownRelation { left: String, right: String },
    #[error("endpoint not found: {endpoint}")]
    EndpointNotFound { endpoint: EntityRef },
    #[error("{left} is already linked to {right}")]
    AlreadyLinked { left: EntityRef, right: EntityRef },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 存储提交失败（约束校验不通过时整个变更集不生效）
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    DuplicateKey(EntityRef),
    #[error("row not found: {0}")]
    MissingRow(EntityRef),
    #[error("association already exists: {0}")]
    DuplicateEdge(Edge),
    #[error("association endpoint does not exist: {0}")]
    DanglingEdge(EntityRef),
    #[error("foreign key constraints prevent deleting {0}")]
    ForeignKey(EntityRef),
    #[error("row type mismatch: kind={kind}, expected={expected}")]
    TypeMismatch {
        kind: &'static str,
        expected: &'static str,
    },
    #[error("identifier space exhausted for {kind}")]
    IdExhausted { kind: &'static str },
}

/// 面向调用方的错误分类，由传输层翻译为具体状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    NotFound,
    Forbidden,
    BadRequest,
    Conflict,
    Internal,
}

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("invalid patch document: {reason}")]
    InvalidPatch { reason: String },
    #[error("invalid reference: {reason}")]
    InvalidReference { reason: String },
    #[error("unknown entity kind: {kind}")]
    UnknownKind { kind: String },
    #[error("not found: {kind}({id})")]
    NotFound { kind: String, id: EntityId },
    #[error(transparent)]
    Coercion(#[from] CoercionError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn not_found(target: EntityRef) -> Self {
        Self::NotFound {
            kind: target.kind.to_string(),
            id: target.id,
        }
    }

    /// 错误分类
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Serde { .. }
            | Self::InvalidPatch { .. }
            | Self::InvalidReference { .. }
            | Self::UnknownKind { .. }
            | Self::Coercion(_) => ErrorClass::BadRequest,
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::Merge(err) => err.class(),
            Self::Link(err) => err.class(),
            Self::Store(err) => err.class(),
        }
    }
}

impl MergeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Forbidden { .. } => ErrorClass::Forbidden,
            Self::Validation { .. } => ErrorClass::BadRequest,
            Self::UnknownKind { .. } => ErrorClass::Internal,
        }
    }
}

impl LinkError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownKind { .. } | Self::UnknownRelation { .. } => ErrorClass::BadRequest,
            Self::EndpointNotFound { .. } => ErrorClass::NotFound,
            Self::AlreadyLinked { .. } => ErrorClass::Conflict,
            Self::Store(err) => err.class(),
        }
    }
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateKey(_) | Self::DuplicateEdge(_) | Self::ForeignKey(_) => {
                ErrorClass::Conflict
            }
            Self::MissingRow(_) | Self::DanglingEdge(_) => ErrorClass::NotFound,
            Self::TypeMismatch { .. } | Self::IdExhausted { .. } => ErrorClass::Internal,
        }
    }
}
