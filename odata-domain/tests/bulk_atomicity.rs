use anyhow::Result as AnyResult;
use odata_domain::authorization::{Caller, RoleSet};
use odata_domain::bulk::{BulkCoordinator, CommitDecision, ItemOutcome};
use odata_domain::entity::{Entity, EntityId};
use odata_domain::error::{DomainError, ErrorClass, MergeError, StoreError};
use odata_domain::merge::MergeEngine;
use odata_domain::patch::PatchDocument;
use odata_domain::persist::{Changeset, EntityStore, InMemoryStore};
use odata_domain::schema::SchemaRegistry;
use odata_macros::entity;
use serde_json::json;
use std::sync::Arc;

#[entity(kind = "user")]
pub struct User {
    pub first_name: String,
    #[field(requires_role = "Admin")]
    pub email: String,
    pub age: i32,
}

fn user(id: EntityId) -> User {
    User {
        id,
        audit: Default::default(),
        first_name: format!("user-{id}"),
        email: format!("u{id}@x.com"),
        age: 20 + id,
    }
}

async fn coordinator() -> AnyResult<BulkCoordinator<InMemoryStore>> {
    let store = Arc::new(InMemoryStore::new());
    let mut changes = Changeset::new();
    for id in 1..=3 {
        changes.insert(user(id));
    }
    store.commit(changes).await?;

    let registry = SchemaRegistry::builder().entity::<User>().build()?;
    Ok(BulkCoordinator::new(store, MergeEngine::new(Arc::new(registry))))
}

fn batch(value: serde_json::Value) -> Vec<PatchDocument> {
    PatchDocument::parse_batch(value).unwrap()
}

#[tokio::test]
async fn failing_middle_item_persists_nothing() -> AnyResult<()> {
    let coordinator = coordinator().await?;
    let revision = coordinator.store().revision().await;

    let result = coordinator
        .apply_batch::<User>(
            &batch(json!({"value": [
                {"id": 1, "firstName": "Ann"},
                {"id": 2, "age": "not a number"},
                {"id": 3, "firstName": "Cat"}
            ]})),
            &Caller::anonymous(),
        )
        .await?;

    assert_eq!(result.decision, CommitDecision::RolledBack);
    assert_eq!(coordinator.store().revision().await, revision);
    for id in 1..=3 {
        let stored: User = coordinator.store().find(id).await?.unwrap();
        assert_eq!(stored.first_name, format!("user-{id}"));
        assert_eq!(stored.age, 20 + id);
        assert!(stored.audit.last_modified_by.is_none());
    }
    Ok(())
}

#[tokio::test]
async fn outcomes_follow_input_positions() -> AnyResult<()> {
    let coordinator = coordinator().await?;

    let result = coordinator
        .apply_batch::<User>(
            &batch(json!([
                {"id": 3, "firstName": "Cat"},
                {"id": 42, "firstName": "Nobody"},
                {"id": 1, "email": "root@x.com"},
                {"id": 2, "age": 7.5},
                {"id": 2, "firstName": "Bea"}
            ])),
            &Caller::builder().roles(RoleSet::from_claim("User")).build(),
        )
        .await?;

    assert_eq!(result.len(), 5);
    assert_eq!(
        result.outcomes.iter().map(|o| o.id()).collect::<Vec<_>>(),
        vec![3, 42, 1, 2, 2]
    );
    assert!(matches!(result.outcomes[0], ItemOutcome::Updated(ref u) if u.first_name == "Cat"));
    assert!(matches!(result.outcomes[1], ItemOutcome::NotFound { id: 42 }));
    assert!(matches!(
        result.outcomes[2],
        ItemOutcome::Forbidden { ref field, ref required_role, .. }
            if field == "email" && required_role == "Admin"
    ));
    assert!(matches!(
        result.outcomes[3],
        ItemOutcome::Invalid { ref field, ref raw, .. } if field == "age" && *raw == json!(7.5)
    ));
    assert!(result.outcomes[4].is_success());

    match result.outcomes[3].to_error() {
        Some(DomainError::Merge(MergeError::Validation { field, raw, .. })) => {
            assert_eq!(field, "age");
            assert_eq!(raw, json!(7.5));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(result.failure_class(), Some(ErrorClass::NotFound));
    assert!(result.first_failure().is_some_and(|o| o.id() == 42));
    Ok(())
}

#[tokio::test]
async fn clean_batch_commits_in_one_changeset() -> AnyResult<()> {
    let coordinator = coordinator().await?;
    let admin = Caller::builder()
        .name("root")
        .roles(RoleSet::from_claim("Admin"))
        .build();

    let result = coordinator
        .apply_batch::<User>(
            &batch(json!([
                {"id": 1, "email": "one@x.com"},
                {"id": 2, "age": "33"},
                {"id": 3, "FirstName": "Cat"}
            ])),
            &admin,
        )
        .await?;

    match result.decision {
        CommitDecision::Committed(receipt) => {
            assert_eq!(receipt.applied, 3);
            assert_eq!(receipt.revision, 2);
        }
        ref other => panic!("unexpected {other:?}"),
    }

    let entities = result.into_entities();
    assert_eq!(entities.len(), 3);
    let stamp = entities[0].audit().last_modified_date;
    assert!(stamp.is_some());
    assert!(entities.iter().all(|e| e.audit().last_modified_date == stamp));

    let stored: User = coordinator.store().find(2).await?.unwrap();
    assert_eq!(stored.age, 33);
    assert_eq!(stored.audit.last_modified_by.as_deref(), Some("root"));
    Ok(())
}

#[tokio::test]
async fn empty_batch_commits_nothing() -> AnyResult<()> {
    let coordinator = coordinator().await?;
    let result = coordinator
        .apply_batch::<User>(&[], &Caller::anonymous())
        .await?;

    assert!(result.is_committed());
    assert!(result.is_empty());
    assert_eq!(coordinator.store().revision().await, 1);
    Ok(())
}

// 读取后、提交前实体被删除：提交失败但逐项结果保留
struct VanishingStore {
    inner: InMemoryStore,
}

#[async_trait::async_trait]
impl EntityStore for VanishingStore {
    async fn find<E: Entity>(&self, id: EntityId) -> Result<Option<E>, StoreError> {
        self.inner.find::<E>(id).await
    }

    async fn list<E: Entity>(&self) -> Result<Vec<E>, StoreError> {
        self.inner.list::<E>().await
    }

    async fn exists(
        &self,
        target: odata_domain::entity::EntityRef,
    ) -> Result<bool, StoreError> {
        self.inner.exists(target).await
    }

    async fn has_edge(&self, edge: odata_domain::persist::Edge) -> Result<bool, StoreError> {
        self.inner.has_edge(edge).await
    }

    async fn related(
        &self,
        of: odata_domain::entity::EntityRef,
        kind: &str,
    ) -> Result<Vec<EntityId>, StoreError> {
        self.inner.related(of, kind).await
    }

    async fn reserve_ids(
        &self,
        kind: &'static str,
        count: usize,
        above: EntityId,
    ) -> Result<EntityId, StoreError> {
        self.inner.reserve_ids(kind, count, above).await
    }

    async fn commit(
        &self,
        changeset: Changeset,
    ) -> Result<odata_domain::persist::CommitReceipt, StoreError> {
        let mut removal = Changeset::new();
        removal.delete(User::reference(&user(1)));
        self.inner.commit(removal).await?;
        self.inner.commit(changeset).await
    }
}

#[tokio::test]
async fn store_failure_keeps_outcomes() -> AnyResult<()> {
    let inner = InMemoryStore::new();
    let mut changes = Changeset::new();
    changes.insert(user(1));
    inner.commit(changes).await?;

    let registry = SchemaRegistry::builder().entity::<User>().build()?;
    let coordinator = BulkCoordinator::new(
        Arc::new(VanishingStore { inner }),
        MergeEngine::new(Arc::new(registry)),
    );

    let result = coordinator
        .apply_batch::<User>(&batch(json!([{"id": 1, "age": 50}])), &Caller::anonymous())
        .await?;

    assert!(matches!(result.decision, CommitDecision::StoreFailed(StoreError::MissingRow(_))));
    assert!(result.outcomes[0].is_success());
    assert_eq!(result.failure_class(), Some(ErrorClass::Internal));
    Ok(())
}
