//! 实体命令/查询处理器
//!
//! `EntityHandlers` 持有存储、注册表与领域服务，对所有已注册实体种类通用。
//! 领域核心不记录日志，处理器在这里输出结构化事件。
//!
use crate::commands::{
    CreateEntities, DeleteEntity, LinkEntities, LinkTarget, PatchEntities, PatchEntity,
    ReplaceEntities, UnlinkEntities,
};
use crate::command::CommandHandler;
use crate::context::AppContext;
use crate::error::AppError;
use crate::options::ServiceOptions;
use crate::queries::{GetEntity, ListEntities, ListRelated};
use crate::query::QueryHandler;
use async_trait::async_trait;
use chrono::Utc;
use odata_domain::association::AssociationManager;
use odata_domain::authorization::is_allowed;
use odata_domain::bulk::{BatchResult, BulkCoordinator, CommitDecision};
use odata_domain::entity::{Entity, EntityId, EntityRef};
use odata_domain::error::{DomainError, LinkError, MergeError, StoreError};
use odata_domain::merge::MergeEngine;
use odata_domain::persist::{Changeset, Edge, EntityStore};
use odata_domain::schema::SchemaRegistry;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct EntityHandlers<S> {
    store: Arc<S>,
    registry: Arc<SchemaRegistry>,
    coordinator: BulkCoordinator<S>,
    associations: AssociationManager<S>,
    options: ServiceOptions,
}

impl<S: EntityStore> EntityHandlers<S> {
    pub fn new(store: Arc<S>, registry: Arc<SchemaRegistry>, options: ServiceOptions) -> Self {
        let coordinator = BulkCoordinator::new(store.clone(), MergeEngine::new(registry.clone()))
            .with_fallback_actor(options.fallback_actor.clone());
        let associations = AssociationManager::new(store.clone(), registry.clone());
        Self {
            store,
            registry,
            coordinator,
            associations,
            options,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    fn actor<'a>(&'a self, ctx: &'a AppContext) -> &'a str {
        ctx.caller.actor(&self.options.fallback_actor)
    }

    async fn require<E: Entity>(&self, id: EntityId) -> Result<E, AppError> {
        self.store
            .find::<E>(id)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityRef::of::<E>(id)).into())
    }

    // 整体替换同样受列级授权约束：受保护字段的值发生变化时需持有相应角色
    fn guard_replacement<E: Entity>(
        &self,
        ctx: &AppContext,
        current: &E,
        replacement: &E,
    ) -> Result<(), MergeError> {
        for descriptor in E::DESCRIPTORS {
            if is_allowed(&ctx.caller.roles, descriptor) {
                continue;
            }
            if current.read_field(descriptor.name) != replacement.read_field(descriptor.name) {
                return Err(MergeError::Forbidden {
                    field: descriptor.name.to_string(),
                    required_role: descriptor
                        .auth
                        .required_role()
                        .unwrap_or_default()
                        .to_string(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S, E> CommandHandler<PatchEntities<E>> for EntityHandlers<S>
where
    S: EntityStore + 'static,
    E: Entity,
{
    #[instrument(
        name = "patch_entities",
        skip_all,
        fields(kind = E::KIND, items = cmd.items.len(), correlation = %ctx.correlation())
    )]
    async fn handle(
        &self,
        ctx: &AppContext,
        cmd: PatchEntities<E>,
    ) -> Result<BatchResult<E>, AppError> {
        self.options.check_batch(cmd.items.len())?;

        let result = self
            .coordinator
            .apply_batch::<E>(&cmd.items, &ctx.caller)
            .await?;

        match &result.decision {
            CommitDecision::Committed(receipt) => info!(
                applied = receipt.applied,
                revision = receipt.revision,
                "batch committed"
            ),
            CommitDecision::RolledBack => {
                if let Some(failure) = result.first_failure() {
                    warn!(
                        id = failure.id(),
                        class = ?failure.class(),
                        "batch rolled back"
                    );
                }
            }
            CommitDecision::StoreFailed(err) => warn!(error = %err, "batch commit rejected by store"),
        }
        Ok(result)
    }
}

#[async_trait]
impl<S, E> CommandHandler<PatchEntity<E>> for EntityHandlers<S>
where
    S: EntityStore + 'static,
    E: Entity,
{
    #[instrument(
        name = "patch_entity",
        skip_all,
        fields(kind = E::KIND, id = cmd.patch.id, correlation = %ctx.correlation())
    )]
    async fn handle(&self, ctx: &AppContext, cmd: PatchEntity<E>) -> Result<E, AppError> {
        let entity = self.coordinator.apply_one::<E>(&cmd.patch, &ctx.caller).await?;
        info!(fields = cmd.patch.fields.len(), "entity patched");
        Ok(entity)
    }
}

#[async_trait]
impl<S, E> CommandHandler<CreateEntities<E>> for EntityHandlers<S>
where
    S: EntityStore + 'static,
    E: Entity,
{
    #[instrument(
        name = "create_entities",
        skip_all,
        fields(kind = E::KIND, items = cmd.items.len(), correlation = %ctx.correlation())
    )]
    async fn handle(&self, ctx: &AppContext, cmd: CreateEntities<E>) -> Result<Vec<E>, AppError> {
        self.options.check_batch(cmd.items.len())?;
        if cmd.items.is_empty() {
            return Ok(Vec::new());
        }

        // 一次预留整段标识，并避开本批次内显式给出的标识
        let unassigned = cmd.items.iter().filter(|e| e.id() == 0).count();
        let mut fresh = if unassigned == 0 {
            // 空区间
            1..=0
        } else {
            let explicit_max = cmd.items.iter().map(Entity::id).max().unwrap_or(0);
            let first = self
                .store
                .reserve_ids(E::KIND, unassigned, explicit_max)
                .await?;
            debug!(first, count = unassigned, "identifiers reserved");
            first..=EntityId::MAX
        };

        let actor = self.actor(ctx);
        let now = Utc::now();
        let mut created = cmd.items;
        let mut changes = Changeset::new();
        for entity in &mut created {
            if entity.id() == 0 {
                let id = fresh.next().ok_or(StoreError::IdExhausted { kind: E::KIND })?;
                entity.set_id(id);
            }
            *entity.audit_mut() = Default::default();
            entity.audit_mut().created(actor, now);
            changes.insert(entity.clone());
        }

        let receipt = self.store.commit(changes).await?;
        info!(
            created = receipt.applied,
            revision = receipt.revision,
            "entities created"
        );
        Ok(created)
    }
}

#[async_trait]
impl<S, E> CommandHandler<ReplaceEntities<E>> for EntityHandlers<S>
where
    S: EntityStore + 'static,
    E: Entity,
{
    #[instrument(
        name = "replace_entities",
        skip_all,
        fields(kind = E::KIND, items = cmd.items.len(), correlation = %ctx.correlation())
    )]
    async fn handle(&self, ctx: &AppContext, cmd: ReplaceEntities<E>) -> Result<Vec<E>, AppError> {
        self.options.check_batch(cmd.items.len())?;
        if cmd.items.is_empty() {
            return Ok(Vec::new());
        }

        let actor = self.actor(ctx);
        let now = Utc::now();
        let mut replaced = cmd.items;
        let mut changes = Changeset::new();
        for entity in &mut replaced {
            let current = self.require::<E>(entity.id()).await?;
            self.guard_replacement(ctx, &current, entity)?;

            let audit = entity.audit_mut();
            *audit = Default::default();
            audit.carry_creation(current.audit());
            audit.modified(actor, now);
            changes.update(entity.clone());
        }

        let receipt = self.store.commit(changes).await?;
        info!(
            replaced = receipt.applied,
            revision = receipt.revision,
            "entities replaced"
        );
        Ok(replaced)
    }
}

#[async_trait]
impl<S, E> CommandHandler<DeleteEntity<E>> for EntityHandlers<S>
where
    S: EntityStore + 'static,
    E: Entity,
{
    #[instrument(
        name = "delete_entity",
        skip_all,
        fields(kind = E::KIND, id = cmd.id, correlation = %ctx.correlation())
    )]
    async fn handle(&self, ctx: &AppContext, cmd: DeleteEntity<E>) -> Result<(), AppError> {
        let target = EntityRef::of::<E>(cmd.id);
        if !self.store.exists(target).await? {
            return Err(DomainError::not_found(target).into());
        }

        let mut changes = Changeset::new();
        changes.delete(target);
        if let Err(err) = self.store.commit(changes).await {
            warn!(error = %err, "delete rejected");
            return Err(err.into());
        }
        info!(actor = self.actor(ctx), "entity deleted");
        Ok(())
    }
}

impl<S: EntityStore> EntityHandlers<S> {
    async fn link_target(
        &self,
        kind: &str,
        id: EntityId,
        target: &LinkTarget,
    ) -> Result<Edge, AppError> {
        let edge = match target {
            LinkTarget::Entity {
                kind: target_kind,
                id: target_id,
            } => self.associations.link(kind, id, target_kind, *target_id).await?,
            LinkTarget::Reference(uri) => self.associations.link_reference(kind, id, uri).await?,
        };
        Ok(edge)
    }

    async fn unlink_target(
        &self,
        kind: &str,
        id: EntityId,
        target: &LinkTarget,
    ) -> Result<(), AppError> {
        match target {
            LinkTarget::Entity {
                kind: target_kind,
                id: target_id,
            } => self.associations.unlink(kind, id, target_kind, *target_id).await?,
            LinkTarget::Reference(uri) => self.associations.unlink_reference(kind, id, uri).await?,
        }
        Ok(())
    }
}

#[async_trait]
impl<S> CommandHandler<LinkEntities> for EntityHandlers<S>
where
    S: EntityStore + 'static,
{
    #[instrument(
        name = "link_entities",
        skip_all,
        fields(kind = %cmd.kind, id = cmd.id, target = ?cmd.target, correlation = %ctx.correlation())
    )]
    async fn handle(&self, ctx: &AppContext, cmd: LinkEntities) -> Result<Edge, AppError> {
        match self.link_target(&cmd.kind, cmd.id, &cmd.target).await {
            Ok(edge) => {
                info!(edge = %edge, "association added");
                Ok(edge)
            }
            Err(err) => {
                warn!(error = %err, "association not added");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl<S> CommandHandler<UnlinkEntities> for EntityHandlers<S>
where
    S: EntityStore + 'static,
{
    #[instrument(
        name = "unlink_entities",
        skip_all,
        fields(kind = %cmd.kind, id = cmd.id, target = ?cmd.target, correlation = %ctx.correlation())
    )]
    async fn handle(&self, ctx: &AppContext, cmd: UnlinkEntities) -> Result<(), AppError> {
        self.unlink_target(&cmd.kind, cmd.id, &cmd.target).await?;
        info!("association removed");
        Ok(())
    }
}

#[async_trait]
impl<S, E> QueryHandler<GetEntity<E>> for EntityHandlers<S>
where
    S: EntityStore + 'static,
    E: Entity,
{
    async fn handle(&self, _ctx: &AppContext, q: GetEntity<E>) -> Result<E, AppError> {
        debug!(kind = E::KIND, id = q.id, "get entity");
        self.require::<E>(q.id).await
    }
}

#[async_trait]
impl<S, E> QueryHandler<ListEntities<E>> for EntityHandlers<S>
where
    S: EntityStore + 'static,
    E: Entity,
{
    async fn handle(&self, _ctx: &AppContext, _q: ListEntities<E>) -> Result<Vec<E>, AppError> {
        let entities = self.store.list::<E>().await?;
        debug!(kind = E::KIND, count = entities.len(), "list entities");
        if entities.is_empty() {
            return Err(AppError::EmptyCollection(E::KIND));
        }
        Ok(entities)
    }
}

#[async_trait]
impl<S, E> QueryHandler<ListRelated<E>> for EntityHandlers<S>
where
    S: EntityStore + 'static,
    E: Entity,
{
    async fn handle(&self, _ctx: &AppContext, q: ListRelated<E>) -> Result<Vec<E>, AppError> {
        let of_kind = self.registry.canonical_kind(&q.of_kind)?;
        if self.registry.relation_between(of_kind, E::KIND).is_none() {
            return Err(LinkError::UnknownRelation {
                left: of_kind.to_string(),
                right: E::KIND.to_string(),
            }
            .into());
        }

        let owner = EntityRef::new(of_kind, q.of_id);
        if !self.store.exists(owner).await? {
            return Err(DomainError::not_found(owner).into());
        }

        let mut related = Vec::new();
        for id in self.store.related(owner, E::KIND).await? {
            if let Some(entity) = self.store.find::<E>(id).await? {
                related.push(entity);
            }
        }
        debug!(owner = %owner, kind = E::KIND, count = related.len(), "list related");
        if related.is_empty() {
            return Err(AppError::EmptyCollection(E::KIND));
        }
        Ok(related)
    }
}
