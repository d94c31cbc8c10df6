//! OData 实体领域核心（odata-domain）
//!
//! 面向“部分更新 + 多对多关联”的实体核心，负责把客户端传入的无类型 JSON
//! 与强类型实体进行对账：
//! - 实体模式注册表（`schema`）：每种实体的可变字段描述符与关系定义；
//! - 字段强制转换（`coercion`）：把原始 JSON 值转换为字段的语义类型；
//! - 授权闸门（`authorization`）：字段级角色校验；
//! - 选择性合并引擎（`merge`）：仅应用文档中出现的字段，全有或全无；
//! - 关联管理（`association`）：多对多边的建立与解除；
//! - 批量协调（`bulk`）：逐项合并、按输入顺序汇总结果、整体提交或整体回滚；
//! - 持久化协议（`persist`）：实体存储接口与内存实现。
//!
//! 本 crate 不做日志与重试，所有失败都以类型化的错误值返回给调用方。
//!
//! 典型用法：
//! 1. 使用 `#[entity]` 宏定义实体，得到编译期生成的字段描述符表；
//! 2. 通过 `SchemaRegistry::builder()` 注册实体与关系；
//! 3. 构造 `InMemoryStore`（或其他 `EntityStore` 实现）；
//! 4. 使用 `BulkCoordinator` 与 `AssociationManager` 完成批量更新与关联维护。
//!
pub mod association;
pub mod authorization;
pub mod bulk;
pub mod coercion;
pub mod entity;
pub mod error;
pub mod merge;
pub mod patch;
pub mod persist;
pub mod schema;
pub mod specification;

// 允许在本 crate 内部通过 ::odata_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::odata_domain 路径。
extern crate self as odata_domain;
