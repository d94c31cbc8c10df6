//! 持久化协议（persist）
//!
//! 定义实体存储接口及其内存实现：
//! - 关联边（`Edge`）：规范化的无序实体对；
//! - 变更集（`Changeset`）：一次提交内的插入/更新/删除/建边/拆边；
//! - 存储协议（`EntityStore`）：按种类读取实体、查询关联、原子提交变更集；
//! - 内存实现（`InMemoryStore`）：以读写锁保护状态，提交时整体校验后一次性替换。
//!
//! 提交是唯一的串行化点：约束不满足时整个变更集都不生效。
//!
mod changeset;
mod edge;
mod entity_store;
mod memory;

pub use changeset::{Change, Changeset, Row};
pub use edge::Edge;
pub use entity_store::{CommitReceipt, EntityStore};
pub use memory::InMemoryStore;
