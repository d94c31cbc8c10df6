use crate::entity::{Entity, EntityRef};
use crate::persist::Edge;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// 类型擦除后的实体行
#[derive(Clone)]
pub struct Row {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Row {
    pub fn new<E: Entity>(entity: E) -> Self {
        Self {
            value: Arc::new(entity),
            type_name: std::any::type_name::<E>(),
        }
    }

    pub fn downcast<E: Entity>(&self) -> Option<&E> {
        self.value.downcast_ref::<E>()
    }

    pub fn entity_type(&self) -> TypeId {
        (*self.value).type_id()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// 单条变更
#[derive(Debug, Clone)]
pub enum Change {
    Insert { target: EntityRef, row: Row },
    Update { target: EntityRef, row: Row },
    Delete { target: EntityRef },
    Link(Edge),
    Unlink(Edge),
}

/// 一次原子提交的变更集合，按加入顺序应用
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    changes: Vec<Change>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<E: Entity>(&mut self, entity: E) -> &mut Self {
        let target = entity.reference();
        self.push(Change::Insert {
            target,
            row: Row::new(entity),
        })
    }

    pub fn update<E: Entity>(&mut self, entity: E) -> &mut Self {
        let target = entity.reference();
        self.push(Change::Update {
            target,
            row: Row::new(entity),
        })
    }

    pub fn delete(&mut self, target: EntityRef) -> &mut Self {
        self.push(Change::Delete { target })
    }

    pub fn link(&mut self, edge: Edge) -> &mut Self {
        self.push(Change::Link(edge))
    }

    pub fn unlink(&mut self, edge: Edge) -> &mut Self {
        self.push(Change::Unlink(edge))
    }

    fn push(&mut self, change: Change) -> &mut Self {
        self.changes.push(change);
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }
}

impl IntoIterator for Changeset {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
