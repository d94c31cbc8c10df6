//! 写操作命令
//!
//! 每个命令对应一次原子提交。实体类型以泛型参数携带，
//! 同一命令类型对不同实体种类各自注册处理器。
//!
use crate::command::Command;
use odata_domain::bulk::BatchResult;
use odata_domain::entity::{Entity, EntityId};
use odata_domain::error::DomainResult;
use odata_domain::patch::PatchDocument;
use odata_domain::persist::Edge;
use std::marker::PhantomData;

/// 批量部分更新（`{"value": [...]}` 中每项只包含需要修改的字段）
#[derive(Debug, Clone)]
pub struct PatchEntities<E> {
    pub items: Vec<PatchDocument>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> PatchEntities<E> {
    pub fn new(items: Vec<PatchDocument>) -> Self {
        Self {
            items,
            _entity: PhantomData,
        }
    }

    /// 从请求体解析
    pub fn from_json(body: &str) -> DomainResult<Self> {
        Ok(Self::new(PatchDocument::parse_batch_str(body)?))
    }
}

impl<E: Entity> Command for PatchEntities<E> {
    const NAME: &'static str = "PatchEntities";
    type Output = BatchResult<E>;
}

/// 单实体部分更新
#[derive(Debug, Clone)]
pub struct PatchEntity<E> {
    pub patch: PatchDocument,
    _entity: PhantomData<fn() -> E>,
}

impl<E> PatchEntity<E> {
    pub fn new(patch: PatchDocument) -> Self {
        Self {
            patch,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Command for PatchEntity<E> {
    const NAME: &'static str = "PatchEntity";
    type Output = E;
}

/// 批量新建；标识为 0 的实体由存储分配标识
#[derive(Debug, Clone)]
pub struct CreateEntities<E> {
    pub items: Vec<E>,
}

impl<E: Entity> Command for CreateEntities<E> {
    const NAME: &'static str = "CreateEntities";
    type Output = Vec<E>;
}

/// 批量整体替换；所有目标都必须已存在
#[derive(Debug, Clone)]
pub struct ReplaceEntities<E> {
    pub items: Vec<E>,
}

impl<E: Entity> Command for ReplaceEntities<E> {
    const NAME: &'static str = "ReplaceEntities";
    type Output = Vec<E>;
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteEntity<E> {
    pub id: EntityId,
    _entity: PhantomData<fn() -> E>,
}

impl<E> DeleteEntity<E> {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Command for DeleteEntity<E> {
    const NAME: &'static str = "DeleteEntity";
    type Output = ();
}

/// 关联目标：显式的种类与标识，或 OData 实体引用（`@odata.id`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Entity { kind: String, id: EntityId },
    Reference(String),
}

impl LinkTarget {
    pub fn entity(kind: impl Into<String>, id: EntityId) -> Self {
        Self::Entity {
            kind: kind.into(),
            id,
        }
    }

    pub fn reference(uri: impl Into<String>) -> Self {
        Self::Reference(uri.into())
    }
}

#[derive(Debug, Clone)]
pub struct LinkEntities {
    pub kind: String,
    pub id: EntityId,
    pub target: LinkTarget,
}

impl Command for LinkEntities {
    const NAME: &'static str = "LinkEntities";
    type Output = Edge;
}

#[derive(Debug, Clone)]
pub struct UnlinkEntities {
    pub kind: String,
    pub id: EntityId,
    pub target: LinkTarget,
}

impl Command for UnlinkEntities {
    const NAME: &'static str = "UnlinkEntities";
    type Output = ();
}
