//! `RecipeStorage` and `UserStorage` over MongoDB collections.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Collection, Database};
use recipes_core::{Recipe, RecipePayload, Timestamp, User};
use recipes_storage::{RecipeStorage, StorageError, UserStorage};
use tracing::{debug, instrument};

use crate::client;
use crate::config::MongoConfig;
use crate::documents::{RecipeDocument, parse_object_id, replace_fields_update};
use crate::error::{MongoError, Result};
use crate::{RECIPES_COLLECTION, USERS_COLLECTION};

/// Handle to one MongoDB database; hands out the per-collection stores.
#[derive(Debug, Clone)]
pub struct MongoStorage {
    database: Database,
}

impl MongoStorage {
    /// Connects and verifies the deployment answers a `ping`.
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let database = client::connect(config).await?;
        client::ping(&database).await?;
        Ok(Self { database })
    }

    pub fn recipes(&self) -> MongoRecipeStorage {
        MongoRecipeStorage {
            database: self.database.clone(),
            collection: self.database.collection(RECIPES_COLLECTION),
        }
    }

    pub fn users(&self) -> MongoUserStorage {
        MongoUserStorage {
            collection: self.database.collection(USERS_COLLECTION),
        }
    }
}

/// Recipe store backed by the `recipes` collection.
#[derive(Debug, Clone)]
pub struct MongoRecipeStorage {
    database: Database,
    collection: Collection<RecipeDocument>,
}

impl MongoRecipeStorage {
    async fn find_all_documents(&self) -> Result<Vec<Recipe>> {
        let cursor = self.collection.find(doc! {}).await?;
        let documents: Vec<RecipeDocument> = cursor.try_collect().await?;
        documents.into_iter().map(RecipeDocument::into_recipe).collect()
    }

    async fn insert_document(&self, payload: RecipePayload, published_at: Timestamp) -> Result<Recipe> {
        let document = RecipeDocument::new(ObjectId::new(), payload, published_at);
        self.collection.insert_one(&document).await?;
        document.into_recipe()
    }

    async fn replace_fields_document(&self, id: &str, payload: &RecipePayload) -> Result<u64> {
        let Some(oid) = parse_object_id(id) else {
            debug!(id, "Recipe id is not an ObjectId; nothing to update");
            return Ok(0);
        };
        let update = replace_fields_update(payload)?;
        let result = self.collection.update_one(doc! { "_id": oid }, update).await?;
        Ok(result.matched_count)
    }

    async fn delete_document(&self, id: &str) -> Result<u64> {
        let Some(oid) = parse_object_id(id) else {
            debug!(id, "Recipe id is not an ObjectId; nothing to delete");
            return Ok(0);
        };
        let result = self.collection.delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl RecipeStorage for MongoRecipeStorage {
    #[instrument(skip(self))]
    async fn find_all(&self) -> std::result::Result<Vec<Recipe>, StorageError> {
        Ok(self.find_all_documents().await?)
    }

    #[instrument(skip(self, payload))]
    async fn insert(
        &self,
        payload: RecipePayload,
        published_at: Timestamp,
    ) -> std::result::Result<Recipe, StorageError> {
        Ok(self.insert_document(payload, published_at).await?)
    }

    #[instrument(skip(self, payload))]
    async fn replace_fields(
        &self,
        id: &str,
        payload: RecipePayload,
    ) -> std::result::Result<u64, StorageError> {
        Ok(self.replace_fields_document(id, &payload).await?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> std::result::Result<u64, StorageError> {
        Ok(self.delete_document(id).await?)
    }

    async fn health_check(&self) -> std::result::Result<(), StorageError> {
        client::ping(&self.database).await.map_err(StorageError::from)
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}

/// Account store backed by the `users` collection.
#[derive(Debug, Clone)]
pub struct MongoUserStorage {
    collection: Collection<User>,
}

#[async_trait]
impl UserStorage for MongoUserStorage {
    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> std::result::Result<Option<User>, StorageError> {
        self.collection
            .find_one(doc! { "username": username })
            .await
            .map_err(|e| MongoError::from(e).into())
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn upsert(&self, user: &User) -> std::result::Result<bool, StorageError> {
        let result = self
            .collection
            .replace_one(doc! { "username": user.username.as_str() }, user)
            .upsert(true)
            .await
            .map_err(MongoError::from)?;
        Ok(result.upserted_id.is_some())
    }
}
