//! Storage traits implemented by every backend.

use async_trait::async_trait;
use recipes_core::{Recipe, RecipePayload, Timestamp, User};

use crate::error::StorageError;

/// Recipe document store.
///
/// Implementations must be thread-safe (`Send + Sync`); the HTTP layer shares
/// one instance across all request tasks.
#[async_trait]
pub trait RecipeStorage: Send + Sync {
    /// Returns every stored recipe in storage order.
    async fn find_all(&self) -> Result<Vec<Recipe>, StorageError>;

    /// Persists a new recipe. The backend assigns the identifier and returns
    /// the stored document.
    async fn insert(
        &self,
        payload: RecipePayload,
        published_at: Timestamp,
    ) -> Result<Recipe, StorageError>;

    /// Replaces `name`, `instructions`, `ingredients` and `tags` of the recipe
    /// with the given id.
    ///
    /// Returns the number of matched documents. An id the backend cannot
    /// parse matches nothing and is not an error.
    async fn replace_fields(&self, id: &str, payload: RecipePayload) -> Result<u64, StorageError>;

    /// Removes the recipe with the given id and returns the number removed.
    async fn delete(&self, id: &str) -> Result<u64, StorageError>;

    /// Cheap connectivity probe used by readiness checks.
    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Short backend label for logs.
    fn backend_name(&self) -> &'static str;
}

/// Account store used by sign-in and the seeding tool.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Looks up an account by exact (case-sensitive) username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// Inserts or replaces the account with the same username.
    ///
    /// Returns `true` when a new account was created.
    async fn upsert(&self, user: &User) -> Result<bool, StorageError>;
}
