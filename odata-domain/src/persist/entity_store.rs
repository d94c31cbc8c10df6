//! 实体存储协议
//!
use crate::entity::{Entity, EntityId, EntityRef};
use crate::error::StoreError;
use crate::persist::{Changeset, Edge};
use async_trait::async_trait;
use std::sync::Arc;

/// 提交回执
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReceipt {
    /// 已应用的变更条数
    pub applied: usize,
    /// 提交后的存储修订号；空变更集不推进修订号
    pub revision: u64,
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find<E: Entity>(&self, id: EntityId) -> Result<Option<E>, StoreError>;

    /// 按标识升序列出某种类的全部实体
    async fn list<E: Entity>(&self) -> Result<Vec<E>, StoreError>;

    async fn exists(&self, target: EntityRef) -> Result<bool, StoreError>;

    async fn has_edge(&self, edge: Edge) -> Result<bool, StoreError>;

    /// 与 `of` 相连的、种类为 `kind` 的实体标识（升序）
    async fn related(&self, of: EntityRef, kind: &str) -> Result<Vec<EntityId>, StoreError>;

    /// 为该种类预留 `count` 个连续标识，返回首个标识
    ///
    /// 预留区间严格大于 `above` 与已用过的全部标识；并发预留互不重叠。
    /// 标识空间不足时返回 `StoreError::IdExhausted`。
    async fn reserve_ids(
        &self,
        kind: &'static str,
        count: usize,
        above: EntityId,
    ) -> Result<EntityId, StoreError>;

    /// 原子提交：全部变更生效，或全部不生效
    async fn commit(&self, changeset: Changeset) -> Result<CommitReceipt, StoreError>;
}

#[async_trait]
impl<T> EntityStore for Arc<T>
where
    T: EntityStore + ?Sized,
{
    async fn find<E: Entity>(&self, id: EntityId) -> Result<Option<E>, StoreError> {
        (**self).find::<E>(id).await
    }

    async fn list<E: Entity>(&self) -> Result<Vec<E>, StoreError> {
        (**self).list::<E>().await
    }

    async fn exists(&self, target: EntityRef) -> Result<bool, StoreError> {
        (**self).exists(target).await
    }

    async fn has_edge(&self, edge: Edge) -> Result<bool, StoreError> {
        (**self).has_edge(edge).await
    }

    async fn related(&self, of: EntityRef, kind: &str) -> Result<Vec<EntityId>, StoreError> {
        (**self).related(of, kind).await
    }

    async fn reserve_ids(
        &self,
        kind: &'static str,
        count: usize,
        above: EntityId,
    ) -> Result<EntityId, StoreError> {
        (**self).reserve_ids(kind, count, above).await
    }

    async fn commit(&self, changeset: Changeset) -> Result<CommitReceipt, StoreError> {
        (**self).commit(changeset).await
    }
}
