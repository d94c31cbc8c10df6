//! 处理器装配
//!
//! 命令与查询按实体类型泛型化，每个实体种类都需要单独注册一组处理器。
//!
use crate::commands::{
    CreateEntities, DeleteEntity, LinkEntities, PatchEntities, PatchEntity, ReplaceEntities,
    UnlinkEntities,
};
use crate::error::AppError;
use crate::handlers::EntityHandlers;
use crate::inmemory_command_bus::InMemoryCommandBus;
use crate::inmemory_query_bus::InMemoryQueryBus;
use crate::options::ServiceOptions;
use crate::queries::{GetEntity, ListEntities, ListRelated};
use odata_domain::entity::Entity;
use odata_domain::persist::EntityStore;
use odata_domain::schema::SchemaRegistry;
use std::sync::Arc;

/// 一组已装配好的命令总线与查询总线
pub struct ServiceBuses<S> {
    pub commands: Arc<InMemoryCommandBus>,
    pub queries: Arc<InMemoryQueryBus>,
    handlers: Arc<EntityHandlers<S>>,
}

impl<S: EntityStore + 'static> ServiceBuses<S> {
    /// 创建总线并注册与实体种类无关的关联命令
    pub fn new(
        store: Arc<S>,
        registry: Arc<SchemaRegistry>,
        options: ServiceOptions,
    ) -> Result<Self, AppError> {
        let handlers = Arc::new(EntityHandlers::new(store, registry, options));
        let commands = Arc::new(InMemoryCommandBus::new());
        commands.register::<LinkEntities, _>(handlers.clone())?;
        commands.register::<UnlinkEntities, _>(handlers.clone())?;

        Ok(Self {
            commands,
            queries: Arc::new(InMemoryQueryBus::new()),
            handlers,
        })
    }

    /// 注册实体种类 `E` 的全部命令与查询
    pub fn with_entity<E: Entity>(self) -> Result<Self, AppError> {
        let h = &self.handlers;
        self.commands.register::<PatchEntities<E>, _>(h.clone())?;
        self.commands.register::<PatchEntity<E>, _>(h.clone())?;
        self.commands.register::<CreateEntities<E>, _>(h.clone())?;
        self.commands.register::<ReplaceEntities<E>, _>(h.clone())?;
        self.commands.register::<DeleteEntity<E>, _>(h.clone())?;
        self.queries.register::<GetEntity<E>, _>(h.clone())?;
        self.queries.register::<ListEntities<E>, _>(h.clone())?;
        Ok(self)
    }

    /// 注册“列出与某实体关联的 `T`”查询，例如某用户的全部地址
    pub fn with_related<T: Entity>(self) -> Result<Self, AppError> {
        self.queries
            .register::<ListRelated<T>, _>(self.handlers.clone())?;
        Ok(self)
    }

    pub fn handlers(&self) -> &Arc<EntityHandlers<S>> {
        &self.handlers
    }
}
