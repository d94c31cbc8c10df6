//! 多对多关联管理
//!
//! `link` 对已存在的边报冲突，`unlink` 对不存在的边视为已满足。
//! 提交阶段若与并发请求竞争失败，存储层的约束错误会被翻译回
//! 调用方可理解的 `AlreadyLinked` 或 `EndpointNotFound`。
//!
use crate::entity::{EntityId, EntityRef};
use crate::error::{DomainError, DomainResult, LinkError, StoreError};
use crate::persist::{Changeset, Edge, EntityStore};
use crate::schema::SchemaRegistry;
use std::sync::Arc;

/// 关联管理器
#[derive(Debug)]
pub struct AssociationManager<S> {
    store: Arc<S>,
    registry: Arc<SchemaRegistry>,
}

impl<S> Clone for AssociationManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<S: EntityStore> AssociationManager<S> {
    pub fn new(store: Arc<S>, registry: Arc<SchemaRegistry>) -> Self {
        Self { store, registry }
    }

    /// 建立 `(kind_a, id_a)` 与 `(kind_b, id_b)` 之间的边
    pub async fn link(
        &self,
        kind_a: &str,
        id_a: EntityId,
        kind_b: &str,
        id_b: EntityId,
    ) -> Result<Edge, LinkError> {
        let (a, b) = self.resolve(kind_a, id_a, kind_b, id_b).await?;
        let edge = Edge::new(a, b);

        if self.store.has_edge(edge).await? {
            return Err(LinkError::AlreadyLinked { left: a, right: b });
        }

        let mut changes = Changeset::new();
        changes.link(edge);
        match self.store.commit(changes).await {
            Ok(_) => Ok(edge),
            Err(StoreError::DuplicateEdge(_)) => Err(LinkError::AlreadyLinked { left: a, right: b }),
            Err(StoreError::DanglingEdge(endpoint)) => Err(LinkError::EndpointNotFound { endpoint }),
            Err(err) => Err(err.into()),
        }
    }

    /// 解除边；边不存在时直接成功且不提交
    pub async fn unlink(
        &self,
        kind_a: &str,
        id_a: EntityId,
        kind_b: &str,
        id_b: EntityId,
    ) -> Result<(), LinkError> {
        let (a, b) = self.resolve(kind_a, id_a, kind_b, id_b).await?;
        let edge = Edge::new(a, b);

        if !self.store.has_edge(edge).await? {
            return Ok(());
        }

        let mut changes = Changeset::new();
        changes.unlink(edge);
        self.store.commit(changes).await?;
        Ok(())
    }

    /// 以 OData 实体引用（`@odata.id`）为目标建立关联
    pub async fn link_reference(
        &self,
        kind: &str,
        id: EntityId,
        reference: &str,
    ) -> DomainResult<Edge> {
        let (target_kind, target_id) = self.resolve_reference(reference)?;
        Ok(self.link(kind, id, target_kind, target_id).await?)
    }

    /// 以 OData 实体引用为目标解除关联
    pub async fn unlink_reference(
        &self,
        kind: &str,
        id: EntityId,
        reference: &str,
    ) -> DomainResult<()> {
        let (target_kind, target_id) = self.resolve_reference(reference)?;
        Ok(self.unlink(kind, id, target_kind, target_id).await?)
    }

    fn resolve_reference(&self, reference: &str) -> DomainResult<(&'static str, EntityId)> {
        let (collection, id) = parse_reference(reference)?;
        let kind = self.registry.kind_for_collection(&collection)?;
        Ok((kind, id))
    }

    // 规范化种类、校验关系存在且两端实体均存在
    async fn resolve(
        &self,
        kind_a: &str,
        id_a: EntityId,
        kind_b: &str,
        id_b: EntityId,
    ) -> Result<(EntityRef, EntityRef), LinkError> {
        let kind_a = self.canonical(kind_a)?;
        let kind_b = self.canonical(kind_b)?;

        if self.registry.relation_between(kind_a, kind_b).is_none() {
            return Err(LinkError::UnknownRelation {
                left: kind_a.to_string(),
                right: kind_b.to_string(),
            });
        }

        let a = EntityRef::new(kind_a, id_a);
        let b = EntityRef::new(kind_b, id_b);
        for endpoint in [a, b] {
            if !self.store.exists(endpoint).await? {
                return Err(LinkError::EndpointNotFound { endpoint });
            }
        }
        Ok((a, b))
    }

    fn canonical(&self, kind: &str) -> Result<&'static str, LinkError> {
        self.registry
            .canonical_kind(kind)
            .map_err(|_| LinkError::UnknownKind {
                kind: kind.to_string(),
            })
    }
}

/// 解析 OData 实体引用，例如 `http://host/odata/addresses(1)` → `("addresses", 1)`
///
/// 返回集合名，由调用方映射为实体种类。
pub fn parse_reference(reference: &str) -> DomainResult<(String, EntityId)> {
    let invalid = || DomainError::InvalidReference {
        reason: format!("'{reference}' is not an entity reference"),
    };

    let trimmed = reference.trim().trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().ok_or_else(invalid)?;
    let (collection, rest) = segment.split_once('(').ok_or_else(invalid)?;
    let key = rest.strip_suffix(')').ok_or_else(invalid)?;
    // 同时接受 `addresses(1)` 与 `addresses(id=1)`
    let key = key.rsplit('=').next().unwrap_or(key).trim();

    if collection.is_empty() {
        return Err(invalid());
    }
    let id = key.parse::<EntityId>().map_err(|_| invalid())?;
    Ok((collection.to_string(), id))
}
