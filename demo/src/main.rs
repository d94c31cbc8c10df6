mod config;
mod mock_data;
mod models;

use anyhow::{Context, Result};
use config::AppConfig;
use models::{Address, User};
use odata_application::ServiceBuses;
use odata_application::command::CommandBus;
use odata_application::commands::{
    CreateEntities, DeleteEntity, LinkEntities, LinkTarget, PatchEntities, PatchEntity,
    ReplaceEntities, UnlinkEntities,
};
use odata_application::context::AppContext;
use odata_application::error::batch_status;
use odata_application::options::ServiceOptions;
use odata_application::queries::{GetEntity, ListEntities, ListRelated};
use odata_application::query::QueryBus;
use odata_domain::authorization::{Caller, RoleSet};
use odata_domain::patch::PatchDocument;
use odata_domain::persist::InMemoryStore;
use odata_domain::schema::SchemaRegistry;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.log_filter);

    let registry = SchemaRegistry::builder()
        .collection::<User>("Users")
        .collection::<Address>("Addresses")
        .relation("addresses", "user", "address")
        .build()
        .context("invalid entity schema")?;

    let options = ServiceOptions::builder()
        .max_batch_size(config.max_batch_size)
        .fallback_actor(config.default_actor.clone())
        .build();

    let buses = ServiceBuses::new(Arc::new(InMemoryStore::new()), Arc::new(registry), options)?
        .with_entity::<User>()?
        .with_entity::<Address>()?
        .with_related::<User>()?
        .with_related::<Address>()?;

    let admin = AppContext::builder()
        .caller(
            Caller::builder()
                .name("ada")
                .roles(RoleSet::from_claim("Admin, User"))
                .build(),
        )
        .correlation_id("demo-admin")
        .build();
    let member = AppContext::builder()
        .caller(
            Caller::builder()
                .name("alan")
                .roles(RoleSet::from_claim("User"))
                .build(),
        )
        .correlation_id("demo-member")
        .build();

    if config.seed_mock_data {
        seed(&buses, &admin).await?;
    }

    walkthrough(&buses, &admin, &member).await
}

fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn seed(buses: &ServiceBuses<InMemoryStore>, ctx: &AppContext) -> Result<()> {
    let users = buses
        .commands
        .dispatch(ctx, CreateEntities { items: mock_data::users() })
        .await?;
    let addresses = buses
        .commands
        .dispatch(ctx, CreateEntities { items: mock_data::addresses() })
        .await?;

    for (user_id, address_id) in mock_data::links() {
        buses
            .commands
            .dispatch(
                ctx,
                LinkEntities {
                    kind: "user".into(),
                    id: user_id,
                    target: LinkTarget::entity("address", address_id),
                },
            )
            .await?;
    }
    info!(users = users.len(), addresses = addresses.len(), "mock data seeded");
    Ok(())
}

async fn walkthrough(
    buses: &ServiceBuses<InMemoryStore>,
    admin: &AppContext,
    member: &AppContext,
) -> Result<()> {
    let users = buses.queries.dispatch(admin, ListEntities::<User>::new()).await?;
    println!("GET /users -> {}", serde_json::to_string_pretty(&users)?);

    // 批量部分更新：非管理员修改 email 被拒绝，整批不生效
    let body = json!({"value": [
        {"id": 2, "lastName": "M. Turing"},
        {"id": 3, "email": "grace@navy.mil"}
    ]})
    .to_string();
    let result = buses
        .commands
        .dispatch(member, PatchEntities::<User>::from_json(&body)?)
        .await?;
    println!("PATCH /users as member -> {}", batch_status(&result));
    if let Some(err) = result.first_failure().and_then(|item| item.to_error()) {
        warn!(error = %err, "bulk patch rejected");
    }

    let result = buses
        .commands
        .dispatch(admin, PatchEntities::<User>::from_json(&body)?)
        .await?;
    println!(
        "PATCH /users as admin -> {} {}",
        batch_status(&result),
        serde_json::to_string(&result.into_entities())?
    );

    // 单实体部分更新：显式 null 清空可空字段
    let patch = PatchDocument::from_value(json!({"id": 1, "Phone": "555-0100", "middleName": null}))?;
    let ada = buses.commands.dispatch(member, PatchEntity::<User>::new(patch)).await?;
    println!("PATCH /users(1) -> {}", serde_json::to_string(&ada)?);

    let mut grace = buses.queries.dispatch(admin, GetEntity::<User>::new(3)).await?;
    grace.role = models::Role::Admin;
    let replaced = buses
        .commands
        .dispatch(admin, ReplaceEntities { items: vec![grace] })
        .await?;
    println!("PUT /users -> {}", serde_json::to_string(&replaced)?);

    // 关联维护：重复关联冲突、解除关联幂等
    let link = LinkEntities {
        kind: "user".into(),
        id: 2,
        target: LinkTarget::reference("http://localhost/odata/Addresses(3)"),
    };
    let edge = buses.commands.dispatch(admin, link.clone()).await?;
    println!("POST /users(2)/addresses/$ref -> 204 ({edge})");
    match buses.commands.dispatch(admin, link).await {
        Ok(_) => println!("POST /users(2)/addresses/$ref -> 204"),
        Err(err) => println!("POST /users(2)/addresses/$ref -> {} {err}", err.status_code()),
    }

    let unlink = UnlinkEntities {
        kind: "user".into(),
        id: 2,
        target: LinkTarget::reference("http://localhost/odata/Addresses(3)"),
    };
    buses.commands.dispatch(admin, unlink.clone()).await?;
    buses.commands.dispatch(admin, unlink).await?;
    println!("DELETE /users(2)/addresses/$ref (twice) -> 204");

    let addresses = buses
        .queries
        .dispatch(admin, ListRelated::<Address>::new("user", 1))
        .await?;
    println!("GET /users(1)/addresses -> {}", serde_json::to_string(&addresses)?);

    match buses.commands.dispatch(admin, DeleteEntity::<Address>::new(1)).await {
        Ok(()) => println!("DELETE /addresses(1) -> 204"),
        Err(err) => println!("DELETE /addresses(1) -> {} {err}", err.status_code()),
    }

    let created = buses
        .commands
        .dispatch(
            admin,
            CreateEntities {
                items: vec![serde_json::from_value::<Address>(json!({
                    "street": "221B Baker St",
                    "city": "London",
                    "state": "LDN",
                    "zipCode": "NW1",
                    "addressType": "Home"
                }))?],
            },
        )
        .await?;
    let id = created.first().map(|a| a.id).unwrap_or_default();
    buses.commands.dispatch(admin, DeleteEntity::<Address>::new(id)).await?;
    println!("POST then DELETE /addresses({id}) -> 204");

    Ok(())
}
