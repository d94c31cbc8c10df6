use anyhow::Result as AnyResult;
use odata_application::ServiceBuses;
use odata_application::command::CommandBus;
use odata_application::commands::{
    CreateEntities, DeleteEntity, LinkEntities, LinkTarget, PatchEntities, PatchEntity,
    ReplaceEntities, UnlinkEntities,
};
use odata_application::context::AppContext;
use odata_application::error::{AppError, batch_status};
use odata_application::options::ServiceOptions;
use odata_application::queries::{GetEntity, ListEntities, ListRelated};
use odata_application::query::QueryBus;
use odata_domain::authorization::{Caller, RoleSet};
use odata_domain::entity::EntityId;
use odata_domain::patch::PatchDocument;
use odata_domain::persist::InMemoryStore;
use odata_domain::schema::SchemaRegistry;
use odata_macros::{entity, enumeration};
use serde_json::json;
use std::sync::Arc;

#[enumeration]
pub enum AddressType {
    Home,
    Work,
}

#[entity(kind = "user")]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    #[field(requires_role = "Admin")]
    pub email: String,
}

#[entity(kind = "address")]
pub struct Address {
    pub street: String,
    pub address_type: AddressType,
}

fn new_user(first: &str, email: &str) -> User {
    User {
        id: 0,
        audit: Default::default(),
        first_name: first.into(),
        last_name: "Doe".into(),
        email: email.into(),
    }
}

fn new_address(street: &str) -> Address {
    Address {
        id: 0,
        audit: Default::default(),
        street: street.into(),
        address_type: AddressType::Home,
    }
}

fn admin() -> AppContext {
    AppContext::builder()
        .caller(
            Caller::builder()
                .name("root")
                .roles(RoleSet::from_claim("Admin"))
                .build(),
        )
        .correlation_id("test")
        .build()
}

fn member() -> AppContext {
    AppContext::for_caller(
        Caller::builder()
            .name("jane")
            .roles(RoleSet::from_claim("User"))
            .build(),
    )
}

async fn setup(options: ServiceOptions) -> AnyResult<ServiceBuses<InMemoryStore>> {
    let registry = SchemaRegistry::builder()
        .collection::<User>("Users")
        .collection::<Address>("Addresses")
        .relation("addresses", "user", "address")
        .build()?;
    let buses = ServiceBuses::new(Arc::new(InMemoryStore::new()), Arc::new(registry), options)?
        .with_entity::<User>()?
        .with_entity::<Address>()?
        .with_related::<User>()?
        .with_related::<Address>()?;

    let ctx = admin();
    buses
        .commands
        .dispatch(
            &ctx,
            CreateEntities {
                items: vec![new_user("Ann", "ann@x.com"), new_user("Bob", "bob@x.com")],
            },
        )
        .await?;
    buses
        .commands
        .dispatch(
            &ctx,
            CreateEntities {
                items: vec![new_address("1 Main St")],
            },
        )
        .await?;
    Ok(buses)
}

#[tokio::test]
async fn create_assigns_ids_and_stamps_audit() -> AnyResult<()> {
    let buses = setup(ServiceOptions::default()).await?;
    let users = buses
        .queries
        .dispatch(&admin(), ListEntities::<User>::new())
        .await?;

    assert_eq!(users.iter().map(|u| u.id).collect::<Vec<EntityId>>(), vec![1, 2]);
    assert!(users.iter().all(|u| u.audit.created_by.as_deref() == Some("root")));
    assert_eq!(users[0].audit.created_date, users[0].audit.last_modified_date);

    let err = buses
        .commands
        .dispatch(
            &admin(),
            CreateEntities {
                items: vec![User {
                    id: 2,
                    ..new_user("Dup", "dup@x.com")
                }],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 409);
    Ok(())
}

#[tokio::test]
async fn create_at_the_end_of_the_id_space_fails_cleanly() -> AnyResult<()> {
    let buses = setup(ServiceOptions::default()).await?;
    let ctx = admin();

    let err = buses
        .commands
        .dispatch(
            &ctx,
            CreateEntities {
                items: vec![
                    User {
                        id: EntityId::MAX,
                        ..new_user("Max", "max@x.com")
                    },
                    new_user("Next", "next@x.com"),
                ],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 500);

    buses
        .commands
        .dispatch(
            &ctx,
            CreateEntities {
                items: vec![User {
                    id: EntityId::MAX,
                    ..new_user("Max", "max@x.com")
                }],
            },
        )
        .await?;
    let err = buses
        .commands
        .dispatch(
            &ctx,
            CreateEntities {
                items: vec![new_user("Next", "next@x.com")],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 500);

    let users = buses.queries.dispatch(&ctx, ListEntities::<User>::new()).await?;
    assert_eq!(users.len(), 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_disjoint_ids() -> AnyResult<()> {
    let buses = setup(ServiceOptions::default()).await?;

    let mut set = tokio::task::JoinSet::new();
    for n in 0..16 {
        let commands = buses.commands.clone();
        set.spawn(async move {
            commands
                .dispatch(
                    &admin(),
                    CreateEntities {
                        items: vec![
                            new_user(&format!("A{n}"), "a@x.com"),
                            new_user(&format!("B{n}"), "b@x.com"),
                            new_user(&format!("C{n}"), "c@x.com"),
                        ],
                    },
                )
                .await
        });
    }
    while let Some(joined) = set.join_next().await {
        joined??;
    }

    let users = buses
        .queries
        .dispatch(&admin(), ListEntities::<User>::new())
        .await?;
    assert_eq!(users.len(), 2 + 16 * 3);
    Ok(())
}

#[tokio::test]
async fn bulk_patch_reports_forbidden_and_persists_nothing() -> AnyResult<()> {
    let buses = setup(ServiceOptions::default()).await?;

    let cmd = PatchEntities::<User>::from_json(
        r#"{"value": [{"id": 1, "lastName": "Smith"}, {"id": 2, "email": "new@x.com"}]}"#,
    )?;
    let result = buses.commands.dispatch(&member(), cmd).await?;
    assert!(!result.is_committed());
    assert_eq!(batch_status(&result), 403);

    let ann = buses.queries.dispatch(&member(), GetEntity::<User>::new(1)).await?;
    assert_eq!(ann.last_name, "Doe");

    let cmd = PatchEntities::<User>::from_json(
        r#"{"value": [{"id": 1, "lastName": "Smith"}, {"id": 2, "email": "new@x.com"}]}"#,
    )?;
    let result = buses.commands.dispatch(&admin(), cmd).await?;
    assert_eq!(batch_status(&result), 200);
    let bob = buses.queries.dispatch(&admin(), GetEntity::<User>::new(2)).await?;
    assert_eq!(bob.email, "new@x.com");
    assert_eq!(bob.audit.last_modified_by.as_deref(), Some("root"));
    Ok(())
}

#[tokio::test]
async fn batch_limit_is_enforced() -> AnyResult<()> {
    let buses = setup(ServiceOptions::builder().max_batch_size(1).build()).await?;
    let cmd = PatchEntities::<User>::from_json(r#"[{"id": 1}, {"id": 2}]"#)?;
    let err = buses.commands.dispatch(&admin(), cmd).await.unwrap_err();
    assert!(matches!(err, AppError::BatchTooLarge { len: 2, max: 1 }));
    Ok(())
}

#[tokio::test]
async fn single_patch_and_missing_target() -> AnyResult<()> {
    let buses = setup(ServiceOptions::default()).await?;

    let patch = PatchDocument::from_value(json!({"id": 1, "firstName": "Anna"}))?;
    let ann = buses
        .commands
        .dispatch(&member(), PatchEntity::<User>::new(patch))
        .await?;
    assert_eq!(ann.first_name, "Anna");
    assert_eq!(ann.audit.last_modified_by.as_deref(), Some("jane"));

    let patch = PatchDocument::from_value(json!({"id": 9, "firstName": "Nobody"}))?;
    let err = buses
        .commands
        .dispatch(&member(), PatchEntity::<User>::new(patch))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    Ok(())
}

#[tokio::test]
async fn replace_keeps_creation_stamp_and_guards_columns() -> AnyResult<()> {
    let buses = setup(ServiceOptions::default()).await?;
    let before = buses.queries.dispatch(&admin(), GetEntity::<User>::new(1)).await?;

    let mut replacement = before.clone();
    replacement.first_name = "Annie".into();
    replacement.audit = Default::default();
    let replaced = buses
        .commands
        .dispatch(
            &member(),
            ReplaceEntities {
                items: vec![replacement.clone()],
            },
        )
        .await?;
    assert_eq!(replaced[0].audit.created_by.as_deref(), Some("root"));
    assert_eq!(replaced[0].audit.last_modified_by.as_deref(), Some("jane"));

    replacement.email = "other@x.com".into();
    let err = buses
        .commands
        .dispatch(
            &member(),
            ReplaceEntities {
                items: vec![replacement],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);

    let err = buses
        .commands
        .dispatch(
            &admin(),
            ReplaceEntities {
                items: vec![User {
                    id: 7,
                    ..new_user("Ghost", "g@x.com")
                }],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    Ok(())
}

#[tokio::test]
async fn association_lifecycle() -> AnyResult<()> {
    let buses = setup(ServiceOptions::default()).await?;
    let ctx = admin();

    buses
        .commands
        .dispatch(
            &ctx,
            LinkEntities {
                kind: "user".into(),
                id: 1,
                target: LinkTarget::reference("http://localhost/odata/Addresses(1)"),
            },
        )
        .await?;

    let err = buses
        .commands
        .dispatch(
            &ctx,
            LinkEntities {
                kind: "address".into(),
                id: 1,
                target: LinkTarget::entity("user", 1),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 409);

    let addresses = buses
        .queries
        .dispatch(&ctx, ListRelated::<Address>::new("user", 1))
        .await?;
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].street, "1 Main St");

    // 仍有关联时不能删除
    let err = buses
        .commands
        .dispatch(&ctx, DeleteEntity::<Address>::new(1))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 409);

    for _ in 0..2 {
        buses
            .commands
            .dispatch(
                &ctx,
                UnlinkEntities {
                    kind: "user".into(),
                    id: 1,
                    target: LinkTarget::entity("address", 1),
                },
            )
            .await?;
    }

    let err = buses
        .queries
        .dispatch(&ctx, ListRelated::<Address>::new("user", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyCollection("address")));

    buses
        .commands
        .dispatch(&ctx, DeleteEntity::<Address>::new(1))
        .await?;
    let err = buses
        .commands
        .dispatch(&ctx, DeleteEntity::<Address>::new(1))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let err = buses
        .queries
        .dispatch(&ctx, ListEntities::<Address>::new())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
    Ok(())
}

#[tokio::test]
async fn unknown_relation_is_bad_request() -> AnyResult<()> {
    let buses = setup(ServiceOptions::default()).await?;
    let err = buses
        .commands
        .dispatch(
            &admin(),
            LinkEntities {
                kind: "user".into(),
                id: 1,
                target: LinkTarget::entity("user", 2),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    Ok(())
}
