//! 内存实体存储
//!
//! 状态由 `tokio::sync::RwLock` 保护。提交时在写锁内复制一份状态，
//! 依次校验并应用每条变更，全部成功后才替换原状态。
//!
use crate::entity::{Entity, EntityId, EntityRef};
use crate::error::StoreError;
use crate::persist::{Change, Changeset, CommitReceipt, Edge, EntityStore, Row};
use async_trait::async_trait;
use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
struct StoreState {
    tables: HashMap<&'static str, BTreeMap<EntityId, Row>>,
    // 每个种类首次写入时绑定的行类型
    row_types: HashMap<&'static str, (TypeId, &'static str)>,
    edges: BTreeSet<Edge>,
    sequences: HashMap<&'static str, EntityId>,
    revision: u64,
}

impl StoreState {
    fn contains(&self, target: EntityRef) -> bool {
        self.tables
            .get(target.kind)
            .is_some_and(|rows| rows.contains_key(&target.id))
    }

    fn check_row_type(&mut self, kind: &'static str, row: &Row) -> Result<(), StoreError> {
        let (type_id, type_name) = *self
            .row_types
            .entry(kind)
            .or_insert((row.entity_type(), row.type_name()));
        if type_id == row.entity_type() {
            Ok(())
        } else {
            Err(StoreError::TypeMismatch {
                kind,
                expected: type_name,
            })
        }
    }

    fn apply(&mut self, change: Change) -> Result<(), StoreError> {
        match change {
            Change::Insert { target, row } => {
                if self.contains(target) {
                    return Err(StoreError::DuplicateKey(target));
                }
                self.check_row_type(target.kind, &row)?;
                self.tables
                    .entry(target.kind)
                    .or_default()
                    .insert(target.id, row);
            }
            Change::Update { target, row } => {
                if !self.contains(target) {
                    return Err(StoreError::MissingRow(target));
                }
                self.check_row_type(target.kind, &row)?;
                self.tables
                    .entry(target.kind)
                    .or_default()
                    .insert(target.id, row);
            }
            Change::Delete { target } => {
                if !self.contains(target) {
                    return Err(StoreError::MissingRow(target));
                }
                if self.edges.iter().any(|edge| edge.touches(target)) {
                    return Err(StoreError::ForeignKey(target));
                }
                if let Some(rows) = self.tables.get_mut(target.kind) {
                    rows.remove(&target.id);
                }
            }
            Change::Link(edge) => {
                for endpoint in [edge.left(), edge.right()] {
                    if !self.contains(endpoint) {
                        return Err(StoreError::DanglingEdge(endpoint));
                    }
                }
                if !self.edges.insert(edge) {
                    return Err(StoreError::DuplicateEdge(edge));
                }
            }
            Change::Unlink(edge) => {
                self.edges.remove(&edge);
            }
        }
        Ok(())
    }
}

/// 内存实体存储
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前修订号
    pub async fn revision(&self) -> u64 {
        self.state.read().await.revision
    }

    /// 当前全部关联边
    pub async fn edges(&self) -> Vec<Edge> {
        self.state.read().await.edges.iter().copied().collect()
    }
}

fn decode<E: Entity>(row: &Row) -> Result<E, StoreError> {
    row.downcast::<E>()
        .cloned()
        .ok_or(StoreError::TypeMismatch {
            kind: E::KIND,
            expected: std::any::type_name::<E>(),
        })
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn find<E: Entity>(&self, id: EntityId) -> Result<Option<E>, StoreError> {
        let state = self.state.read().await;
        state
            .tables
            .get(E::KIND)
            .and_then(|rows| rows.get(&id))
            .map(decode::<E>)
            .transpose()
    }

    async fn list<E: Entity>(&self) -> Result<Vec<E>, StoreError> {
        let state = self.state.read().await;
        match state.tables.get(E::KIND) {
            Some(rows) => rows.values().map(decode::<E>).collect(),
            None => Ok(Vec::new()),
        }
    }

    async fn exists(&self, target: EntityRef) -> Result<bool, StoreError> {
        Ok(self.state.read().await.contains(target))
    }

    async fn has_edge(&self, edge: Edge) -> Result<bool, StoreError> {
        Ok(self.state.read().await.edges.contains(&edge))
    }

    async fn related(&self, of: EntityRef, kind: &str) -> Result<Vec<EntityId>, StoreError> {
        let state = self.state.read().await;
        let mut ids: Vec<EntityId> = state
            .edges
            .iter()
            .filter_map(|edge| edge.other(of))
            .filter(|other| other.kind == kind)
            .map(|other| other.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn reserve_ids(
        &self,
        kind: &'static str,
        count: usize,
        above: EntityId,
    ) -> Result<EntityId, StoreError> {
        let mut state = self.state.write().await;
        let highest = state
            .tables
            .get(kind)
            .and_then(|rows| rows.keys().next_back().copied())
            .unwrap_or(0);
        let last = state.sequences.get(kind).copied().unwrap_or(0);
        let exhausted = || StoreError::IdExhausted { kind };

        let first = highest
            .max(last)
            .max(above)
            .checked_add(1)
            .ok_or_else(exhausted)?;
        let span = EntityId::try_from(count.saturating_sub(1)).map_err(|_| exhausted())?;
        let end = first.checked_add(span).ok_or_else(exhausted)?;
        state.sequences.insert(kind, end);
        Ok(first)
    }

    async fn commit(&self, changeset: Changeset) -> Result<CommitReceipt, StoreError> {
        let mut state = self.state.write().await;
        if changeset.is_empty() {
            return Ok(CommitReceipt {
                applied: 0,
                revision: state.revision,
            });
        }

        let mut staged = state.clone();
        let applied = changeset.len();
        for change in changeset {
            staged.apply(change)?;
        }
        staged.revision += 1;
        *state = staged;

        Ok(CommitReceipt {
            applied,
            revision: state.revision,
        })
    }
}
