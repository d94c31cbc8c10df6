//! 实体（Entity）基础抽象
//!
//! 实体具备不可变的整型标识、一组可变标量字段以及审计戳。
//! 字段描述符表与字段读写由 `#[entity]` 宏在编译期生成，
//! 取代运行时反射。关系边不保存在实体内，由存储维护。
//!
use crate::coercion::FieldValue;
use crate::error::CoercionError;
use crate::schema::FieldDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;

/// 实体标识
pub type EntityId = i32;

/// 具备标识、字段表与审计戳的实体抽象
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 实体种类（稳定名称，用于注册表、存储与关联）
    const KIND: &'static str;

    /// 按声明顺序排列的可变字段描述符
    const DESCRIPTORS: &'static [FieldDescriptor];

    /// 获取实体标识
    fn id(&self) -> EntityId;

    /// 设置实体标识（仅用于插入前分配标识）
    fn set_id(&mut self, id: EntityId);

    fn audit(&self) -> &AuditStamp;

    fn audit_mut(&mut self) -> &mut AuditStamp;

    /// 读取字段当前值；`name` 为描述符中的规范名称
    fn read_field(&self, name: &str) -> Option<FieldValue>;

    /// 写入已完成强制转换的字段值
    fn write_field(&mut self, name: &str, value: FieldValue) -> Result<(), CoercionError>;

    /// 指向该实体的引用
    fn reference(&self) -> EntityRef {
        EntityRef::new(Self::KIND, self.id())
    }
}

/// 实体引用：种类 + 标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityRef {
    pub kind: &'static str,
    pub id: EntityId,
}

impl EntityRef {
    pub const fn new(kind: &'static str, id: EntityId) -> Self {
        Self { kind, id }
    }

    pub fn of<E: Entity>(id: EntityId) -> Self {
        Self::new(E::KIND, id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}

/// 审计戳：创建/最后修改的主体与时间
///
/// 不在字段描述符表中，客户端无法通过部分更新修改，
/// 由写入路径根据调用方身份统一盖戳。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStamp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl AuditStamp {
    /// 新建：同时设置创建与最后修改
    pub fn created(&mut self, actor: &str, at: DateTime<Utc>) {
        self.created_by = Some(actor.to_string());
        self.created_date = Some(at);
        self.modified(actor, at);
    }

    pub fn modified(&mut self, actor: &str, at: DateTime<Utc>) {
        self.last_modified_by = Some(actor.to_string());
        self.last_modified_date = Some(at);
    }

    /// 保留 `previous` 的创建信息（整体替换时使用）
    pub fn carry_creation(&mut self, previous: &AuditStamp) {
        self.created_by = previous.created_by.clone();
        self.created_date = previous.created_date;
    }
}
