use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use recipes_core::{Recipe, RecipePayload, Timestamp, generate_id};
use recipes_storage::{RecipeStorage, StorageError};
use tokio::sync::RwLock;

use crate::seed::parse_seed;

/// In-memory recipe store.
///
/// Readers share the lock; every mutation takes it exclusively, so a
/// concurrent `find_all` never observes a half-applied update.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecipeStorage {
    recipes: Arc<RwLock<Vec<Recipe>>>,
}

impl InMemoryRecipeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given recipes.
    pub fn with_recipes(recipes: Vec<Recipe>) -> Self {
        Self {
            recipes: Arc::new(RwLock::new(recipes)),
        }
    }

    /// Loads a JSON array of recipes from disk.
    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            StorageError::internal(format!("failed to read seed file {}: {e}", path.display()))
        })?;
        let recipes = parse_seed(&bytes).map_err(|e| {
            StorageError::invalid_document(format!("seed file {}: {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), count = recipes.len(), "Loaded recipe seed file");
        Ok(Self::with_recipes(recipes))
    }

    pub async fn len(&self) -> usize {
        self.recipes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.recipes.read().await.is_empty()
    }
}

#[async_trait]
impl RecipeStorage for InMemoryRecipeStorage {
    async fn find_all(&self) -> Result<Vec<Recipe>, StorageError> {
        Ok(self.recipes.read().await.clone())
    }

    async fn insert(
        &self,
        payload: RecipePayload,
        published_at: Timestamp,
    ) -> Result<Recipe, StorageError> {
        let recipe = Recipe::from_payload(generate_id(), payload, published_at);
        self.recipes.write().await.push(recipe.clone());
        Ok(recipe)
    }

    async fn replace_fields(&self, id: &str, payload: RecipePayload) -> Result<u64, StorageError> {
        let mut guard = self.recipes.write().await;
        match guard.iter_mut().find(|r| r.id == id) {
            Some(recipe) => {
                recipe.apply_update(payload);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: &str) -> Result<u64, StorageError> {
        let mut guard = self.recipes.write().await;
        let before = guard.len();
        guard.retain(|r| r.id != id);
        Ok((before - guard.len()) as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
