//! Cache-aside storage for the full recipe list.

use std::time::Duration;

use recipes_core::Recipe;

use super::backend::{CacheBackend, CacheError};

/// Key under which the serialized recipe list is stored.
pub const RECIPES_CACHE_KEY: &str = "recipes";

/// The recipe list as a JSON array under [`RECIPES_CACHE_KEY`].
#[derive(Debug, Clone)]
pub struct RecipeListCache {
    backend: CacheBackend,
    ttl: Option<Duration>,
}

impl RecipeListCache {
    pub fn new(backend: CacheBackend, ttl: Option<Duration>) -> Self {
        Self { backend, ttl }
    }

    pub fn backend(&self) -> &CacheBackend {
        &self.backend
    }

    /// Cached list, if present.
    ///
    /// Bytes that do not decode as a recipe list are dropped and reported as a
    /// miss. Backend failures are returned to the caller.
    pub async fn get(&self) -> Result<Option<Vec<Recipe>>, CacheError> {
        let Some(bytes) = self.backend.get(RECIPES_CACHE_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<Vec<Recipe>>(&bytes) {
            Ok(recipes) => Ok(Some(recipes)),
            Err(e) => {
                tracing::warn!(key = RECIPES_CACHE_KEY, error = %e, "Discarding undecodable cache entry");
                if let Err(e) = self.backend.invalidate(RECIPES_CACHE_KEY).await {
                    tracing::warn!(key = RECIPES_CACHE_KEY, error = %e, "Failed to drop cache entry");
                }
                Ok(None)
            }
        }
    }

    pub async fn put(&self, recipes: &[Recipe]) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(recipes)?;
        self.backend.set(RECIPES_CACHE_KEY, bytes, self.ttl).await
    }

    pub async fn invalidate(&self) -> Result<(), CacheError> {
        self.backend.invalidate(RECIPES_CACHE_KEY).await
    }
}
