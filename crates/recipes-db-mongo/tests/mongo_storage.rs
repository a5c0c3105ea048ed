//! Integration tests for the MongoDB backend.
//!
//! These spin up a real MongoDB with testcontainers and are ignored by
//! default: run with `cargo test -p recipes-db-mongo -- --ignored`.

use recipes_core::{RecipePayload, User, now_utc};
use recipes_db_mongo::{MongoConfig, MongoStorage, RecipeStorage, UserStorage};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::mongo::Mongo;
use tokio::sync::OnceCell;

static SHARED_MONGO: OnceCell<(ContainerAsync<Mongo>, String)> = OnceCell::const_new();

async fn get_mongo_uri() -> String {
    let (_, uri) = SHARED_MONGO
        .get_or_init(|| async {
            let container = Mongo::default().start().await.expect("start mongo container");
            let port = container.get_host_port_ipv4(27017).await.expect("get port");
            (container, format!("mongodb://127.0.0.1:{port}"))
        })
        .await;
    uri.clone()
}

async fn storage(database: &str) -> MongoStorage {
    let config = MongoConfig::new(get_mongo_uri().await, database);
    MongoStorage::connect(&config).await.expect("connect to mongo")
}

fn tea() -> RecipePayload {
    RecipePayload {
        name: "Tea".into(),
        tags: vec!["drink".into()],
        ingredients: vec!["water".into(), "tea leaf".into()],
        instructions: vec!["boil".into(), "steep".into()],
        image_url: None,
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn recipe_lifecycle() {
    let recipes = storage("recipes_lifecycle").await.recipes();

    let created = recipes.insert(tea(), now_utc()).await.unwrap();
    assert_eq!(created.id.len(), 24);

    let all = recipes.find_all().await.unwrap();
    assert!(all.iter().any(|r| r.id == created.id));

    let mut update = tea();
    update.name = "Green tea".into();
    assert_eq!(recipes.replace_fields(&created.id, update).await.unwrap(), 1);

    let all = recipes.find_all().await.unwrap();
    let stored = all.iter().find(|r| r.id == created.id).unwrap();
    assert_eq!(stored.name, "Green tea");
    assert_eq!(stored.published_at, created.published_at);

    assert_eq!(recipes.delete(&created.id).await.unwrap(), 1);
    assert_eq!(recipes.delete(&created.id).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn malformed_ids_match_nothing() {
    let recipes = storage("recipes_malformed").await.recipes();
    assert_eq!(recipes.replace_fields("nope", tea()).await.unwrap(), 0);
    assert_eq!(recipes.delete("nope").await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn user_upsert_and_lookup() {
    let users = storage("recipes_users").await.users();

    assert!(users.upsert(&User::new("admin", "digest-1")).await.unwrap());
    assert!(!users.upsert(&User::new("admin", "digest-2")).await.unwrap());

    let found = users.find_by_username("admin").await.unwrap().unwrap();
    assert_eq!(found.password, "digest-2");
    assert!(users.find_by_username("ADMIN").await.unwrap().is_none());
}
