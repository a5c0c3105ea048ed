//! Recipe catalog: storage access with a cache-aside list.

use recipes_api::ApiError;
use recipes_core::{Recipe, RecipePayload, now_utc};
use recipes_storage::{DynRecipeStorage, StorageError};

use crate::cache::{CacheError, RecipeListCache};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("No recipes found with tag '{0}'")]
    NoTaggedRecipes(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Storage(e) => ApiError::from(e),
            CatalogError::Cache(e) => {
                tracing::error!(error = %e, "Cache read failed");
                ApiError::internal(e.to_string())
            }
            CatalogError::NoTaggedRecipes(_) => ApiError::not_found(err.to_string()),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Recipe operations shared by the HTTP handlers.
///
/// Listing reads through the cache. Every successful write drops the cached
/// list; failures to drop it are logged and do not fail the write.
#[derive(Clone)]
pub struct CatalogService {
    storage: DynRecipeStorage,
    cache: Option<RecipeListCache>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("storage", &self.storage.backend_name())
            .field("cache", &self.cache)
            .finish()
    }
}

impl CatalogService {
    pub fn new(storage: DynRecipeStorage, cache: Option<RecipeListCache>) -> Self {
        Self { storage, cache }
    }

    pub fn storage(&self) -> &DynRecipeStorage {
        &self.storage
    }

    pub fn cache(&self) -> Option<&RecipeListCache> {
        self.cache.as_ref()
    }

    pub async fn list(&self) -> CatalogResult<Vec<Recipe>> {
        let Some(cache) = &self.cache else {
            return Ok(self.storage.find_all().await?);
        };

        if let Some(recipes) = cache.get().await? {
            tracing::debug!(count = recipes.len(), "Recipe list served from cache");
            return Ok(recipes);
        }

        let recipes = self.storage.find_all().await?;
        tracing::debug!(count = recipes.len(), "Recipe list loaded from storage");
        if let Err(e) = cache.put(&recipes).await {
            tracing::warn!(error = %e, "Failed to populate recipe cache");
        }
        Ok(recipes)
    }

    /// Store a new recipe. The id and publication time are assigned here;
    /// client-supplied values are ignored.
    pub async fn create(&self, payload: RecipePayload) -> CatalogResult<Recipe> {
        let recipe = self.storage.insert(payload, now_utc()).await?;
        tracing::info!(id = %recipe.id, name = %recipe.name, "Recipe created");
        self.invalidate_list().await;
        Ok(recipe)
    }

    /// Replace name, instructions, ingredients and tags. Returns the number of
    /// matched recipes; an unknown id is not an error.
    pub async fn update(&self, id: &str, payload: RecipePayload) -> CatalogResult<u64> {
        let matched = self.storage.replace_fields(id, payload).await?;
        if matched == 0 {
            tracing::debug!(id, "Update matched no recipe");
        } else {
            tracing::info!(id, "Recipe updated");
        }
        self.invalidate_list().await;
        Ok(matched)
    }

    /// Remove a recipe. Returns the number removed; an unknown id is not an error.
    pub async fn delete(&self, id: &str) -> CatalogResult<u64> {
        let deleted = self.storage.delete(id).await?;
        if deleted == 0 {
            tracing::debug!(id, "Delete matched no recipe");
        } else {
            tracing::info!(id, "Recipe deleted");
        }
        self.invalidate_list().await;
        Ok(deleted)
    }

    /// Recipes carrying `tag`, compared case-insensitively, in storage order.
    pub async fn search_by_tag(&self, tag: &str) -> CatalogResult<Vec<Recipe>> {
        let matches: Vec<Recipe> = self
            .storage
            .find_all()
            .await?
            .into_iter()
            .filter(|recipe| recipe.has_tag(tag))
            .collect();
        if matches.is_empty() {
            return Err(CatalogError::NoTaggedRecipes(tag.to_string()));
        }
        Ok(matches)
    }

    pub async fn health_check(&self) -> CatalogResult<()> {
        Ok(self.storage.health_check().await?)
    }

    async fn invalidate_list(&self) {
        if let Some(cache) = &self.cache
            && let Err(e) = cache.invalidate().await
        {
            tracing::warn!(error = %e, "Failed to invalidate recipe cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBackend;
    use recipes_db_memory::InMemoryRecipeStorage;
    use std::sync::Arc;

    fn payload(name: &str, tags: &[&str]) -> RecipePayload {
        RecipePayload {
            name: name.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn service() -> CatalogService {
        CatalogService::new(
            Arc::new(InMemoryRecipeStorage::new()),
            Some(RecipeListCache::new(CacheBackend::new_local(), None)),
        )
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_ordered() {
        let catalog = service();
        catalog.create(payload("Margherita", &["Italian"])).await.unwrap();
        catalog.create(payload("Pad Thai", &["thai"])).await.unwrap();
        catalog.create(payload("Lasagna", &["ITALIAN", "oven"])).await.unwrap();

        let found = catalog.search_by_tag("italian").await.unwrap();
        let names: Vec<_> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Margherita", "Lasagna"]);
    }

    #[tokio::test]
    async fn search_without_matches_is_not_found() {
        let catalog = service();
        catalog.create(payload("Margherita", &["italian"])).await.unwrap();
        let err = catalog.search_by_tag("vegan").await.unwrap_err();
        assert!(matches!(err, CatalogError::NoTaggedRecipes(ref t) if t == "vegan"));
        assert_eq!(
            ApiError::from(err).status_code(),
            axum::http::StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn unknown_ids_match_nothing() {
        let catalog = service();
        assert_eq!(catalog.update("missing", payload("x", &[])).await.unwrap(), 0);
        assert_eq!(catalog.delete("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn works_without_cache() {
        let catalog = CatalogService::new(Arc::new(InMemoryRecipeStorage::new()), None);
        let created = catalog.create(payload("Soup", &[])).await.unwrap();
        assert_eq!(catalog.list().await.unwrap(), vec![created]);
    }
}
