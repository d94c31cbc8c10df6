//! 批量更新协调
//!
//! 按输入顺序逐项合并，逐项记录结果；任一项失败则整批不持久化，
//! 否则把全部合并后的实体放入一个变更集一次性提交。
//! 同一批次中针对同一标识的多个文档按输入顺序累积合并。
//!
use crate::authorization::Caller;
use crate::entity::{Entity, EntityId, EntityRef};
use crate::error::{DomainError, DomainResult, ErrorClass, MergeError, StoreError};
use crate::merge::MergeEngine;
use crate::patch::PatchDocument;
use crate::persist::{Changeset, CommitReceipt, EntityStore};
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 单项结果，位置与输入文档一一对应
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<E> {
    Updated(E),
    NotFound {
        id: EntityId,
    },
    Forbidden {
        id: EntityId,
        field: String,
        required_role: String,
    },
    Invalid {
        id: EntityId,
        field: String,
        /// 客户端提交的原始值
        raw: Value,
        reason: String,
    },
}

impl<E: Entity> ItemOutcome<E> {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Updated(entity) => entity.id(),
            Self::NotFound { id } | Self::Forbidden { id, .. } | Self::Invalid { id, .. } => *id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Updated(_))
    }

    /// 失败项的错误分类
    pub fn class(&self) -> Option<ErrorClass> {
        match self {
            Self::Updated(_) => None,
            Self::NotFound { .. } => Some(ErrorClass::NotFound),
            Self::Forbidden { .. } => Some(ErrorClass::Forbidden),
            Self::Invalid { .. } => Some(ErrorClass::BadRequest),
        }
    }

    /// 将失败项转换为领域错误
    pub fn to_error(&self) -> Option<DomainError> {
        match self {
            Self::Updated(_) => None,
            Self::NotFound { id } => Some(DomainError::not_found(EntityRef::of::<E>(*id))),
            Self::Forbidden {
                field,
                required_role,
                ..
            } => Some(
                MergeError::Forbidden {
                    field: field.clone(),
                    required_role: required_role.clone(),
                }
                .into(),
            ),
            Self::Invalid {
                field, raw, reason, ..
            } => Some(
                MergeError::Validation {
                    field: field.clone(),
                    raw: raw.clone(),
                    reason: reason.clone(),
                }
                .into(),
            ),
        }
    }
}

/// 整批提交决定
#[derive(Debug, Clone, PartialEq)]
pub enum CommitDecision {
    Committed(CommitReceipt),
    /// 至少一项失败，未做任何持久化
    RolledBack,
    /// 全部合并成功但提交被存储拒绝
    StoreFailed(StoreError),
}

/// 批量结果
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<E> {
    pub outcomes: Vec<ItemOutcome<E>>,
    pub decision: CommitDecision,
}

impl<E: Entity> BatchResult<E> {
    pub fn is_committed(&self) -> bool {
        matches!(self.decision, CommitDecision::Committed(_))
    }

    pub fn first_failure(&self) -> Option<&ItemOutcome<E>> {
        self.outcomes.iter().find(|outcome| !outcome.is_success())
    }

    /// 调用方可见的错误分类：已提交为 `None`
    pub fn failure_class(&self) -> Option<ErrorClass> {
        match &self.decision {
            CommitDecision::Committed(_) => None,
            CommitDecision::StoreFailed(_) => Some(ErrorClass::Internal),
            CommitDecision::RolledBack => self
                .first_failure()
                .and_then(ItemOutcome::class)
                .or(Some(ErrorClass::Internal)),
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// 成功项的实体（按输入顺序）
    pub fn into_entities(self) -> Vec<E> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                ItemOutcome::Updated(entity) => Some(entity),
                _ => None,
            })
            .collect()
    }
}

/// 批量更新协调器
pub struct BulkCoordinator<S> {
    store: Arc<S>,
    engine: MergeEngine,
    fallback_actor: String,
}

impl<S: EntityStore> BulkCoordinator<S> {
    pub fn new(store: Arc<S>, engine: MergeEngine) -> Self {
        Self {
            store,
            engine,
            fallback_actor: "anonymous".to_string(),
        }
    }

    /// 匿名调用方在审计戳中使用的主体名
    pub fn with_fallback_actor(mut self, actor: impl Into<String>) -> Self {
        self.fallback_actor = actor.into();
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn engine(&self) -> &MergeEngine {
        &self.engine
    }

    /// 批量部分更新
    ///
    /// 仅存储读取失败或实体种类未注册时返回 `Err`；逐项失败记录在结果中。
    pub async fn apply_batch<E: Entity>(
        &self,
        items: &[PatchDocument],
        caller: &Caller,
    ) -> DomainResult<BatchResult<E>> {
        let actor = caller.actor(&self.fallback_actor);
        let now = Utc::now();
        let mut pending: BTreeMap<EntityId, E> = BTreeMap::new();
        let mut outcomes = Vec::with_capacity(items.len());

        for patch in items {
            let current = match pending.get(&patch.id) {
                Some(entity) => Some(entity.clone()),
                None => self.store.find::<E>(patch.id).await?,
            };
            let Some(current) = current else {
                outcomes.push(ItemOutcome::NotFound { id: patch.id });
                continue;
            };

            match self.engine.merge(&current, patch, &caller.roles) {
                Ok(merged) => {
                    let mut entity = merged.entity;
                    entity.audit_mut().modified(actor, now);
                    pending.insert(patch.id, entity.clone());
                    outcomes.push(ItemOutcome::Updated(entity));
                }
                Err(MergeError::Forbidden {
                    field,
                    required_role,
                }) => outcomes.push(ItemOutcome::Forbidden {
                    id: patch.id,
                    field,
                    required_role,
                }),
                Err(MergeError::Validation { field, raw, reason }) => {
                    outcomes.push(ItemOutcome::Invalid {
                        id: patch.id,
                        field,
                        raw,
                        reason,
                    })
                }
                Err(err) => return Err(err.into()),
            }
        }

        if outcomes.iter().any(|outcome| !outcome.is_success()) {
            return Ok(BatchResult {
                outcomes,
                decision: CommitDecision::RolledBack,
            });
        }

        let mut changes = Changeset::new();
        for entity in pending.into_values() {
            changes.update(entity);
        }
        let decision = match self.store.commit(changes).await {
            Ok(receipt) => CommitDecision::Committed(receipt),
            Err(err) => CommitDecision::StoreFailed(err),
        };

        Ok(BatchResult { outcomes, decision })
    }

    /// 单实体部分更新
    pub async fn apply_one<E: Entity>(
        &self,
        patch: &PatchDocument,
        caller: &Caller,
    ) -> DomainResult<E> {
        let current = self
            .store
            .find::<E>(patch.id)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityRef::of::<E>(patch.id)))?;

        let mut entity = self.engine.merge(&current, patch, &caller.roles)?.entity;
        entity
            .audit_mut()
            .modified(caller.actor(&self.fallback_actor), Utc::now());

        let mut changes = Changeset::new();
        changes.update(entity.clone());
        self.store.commit(changes).await?;
        Ok(entity)
    }
}
