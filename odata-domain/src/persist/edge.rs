use crate::entity::EntityRef;
use std::fmt;

/// 多对多关联边
///
/// 存储时规范化为 `left <= right`，因此 `(a, b)` 与 `(b, a)` 是同一条边。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    left: EntityRef,
    right: EntityRef,
}

impl Edge {
    pub fn new(a: EntityRef, b: EntityRef) -> Self {
        if a <= b {
            Self { left: a, right: b }
        } else {
            Self { left: b, right: a }
        }
    }

    pub fn left(&self) -> EntityRef {
        self.left
    }

    pub fn right(&self) -> EntityRef {
        self.right
    }

    /// 边是否以 `endpoint` 为一端
    pub fn touches(&self, endpoint: EntityRef) -> bool {
        self.left == endpoint || self.right == endpoint
    }

    /// 返回 `endpoint` 的另一端
    pub fn other(&self, endpoint: EntityRef) -> Option<EntityRef> {
        if self.left == endpoint {
            Some(self.right)
        } else if self.right == endpoint {
            Some(self.left)
        } else {
            None
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.left, self.right)
    }
}
