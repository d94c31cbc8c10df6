//! OData 实体应用层（odata-application）
//!
//! 把领域核心包装为命令与查询：
//! - 命令：批量/单项部分更新、新建、整体替换、删除、关联与解除关联；
//! - 查询：按标识读取、列出集合、列出关联实体；
//! - 进程内命令/查询总线（`InMemoryCommandBus` / `InMemoryQueryBus`）；
//! - `AppError` 与传输层状态码分类。
//!
pub mod bootstrap;
pub mod command;
pub mod commands;
pub mod context;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod inmemory_command_bus;
pub mod inmemory_query_bus;
pub mod options;
pub mod queries;
pub mod query;

pub use bootstrap::ServiceBuses;
pub use command::CommandBus;
pub use query::QueryBus;
pub use inmemory_command_bus::InMemoryCommandBus;
pub use inmemory_query_bus::InMemoryQueryBus;
