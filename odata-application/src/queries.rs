use crate::query::Query;
use odata_domain::entity::{Entity, EntityId};
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy)]
pub struct GetEntity<E> {
    pub id: EntityId,
    _entity: PhantomData<fn() -> E>,
}

impl<E> GetEntity<E> {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Query for GetEntity<E> {
    const NAME: &'static str = "GetEntity";
    type Dto = E;
}

/// 列出某种类的全部实体；集合为空时返回 NotFound
#[derive(Debug, Clone, Copy, Default)]
pub struct ListEntities<E> {
    _entity: PhantomData<fn() -> E>,
}

impl<E> ListEntities<E> {
    pub fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Query for ListEntities<E> {
    const NAME: &'static str = "ListEntities";
    type Dto = Vec<E>;
}

/// 与 `(of_kind, of_id)` 关联的 `E` 类实体，例如某用户的全部地址
#[derive(Debug, Clone)]
pub struct ListRelated<E> {
    pub of_kind: String,
    pub of_id: EntityId,
    _entity: PhantomData<fn() -> E>,
}

impl<E> ListRelated<E> {
    pub fn new(of_kind: impl Into<String>, of_id: EntityId) -> Self {
        Self {
            of_kind: of_kind.into(),
            of_id,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Query for ListRelated<E> {
    const NAME: &'static str = "ListRelated";
    type Dto = Vec<E>;
}
