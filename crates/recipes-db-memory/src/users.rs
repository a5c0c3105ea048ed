use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use recipes_core::User;
use recipes_storage::{StorageError, UserStorage};
use tokio::sync::RwLock;

/// In-memory account store keyed by username.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStorage {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let map = users
            .into_iter()
            .map(|u| (u.username.clone(), u))
            .collect::<HashMap<_, _>>();
        Self {
            users: Arc::new(RwLock::new(map)),
        }
    }

    /// Load accounts from a JSON array of `{username, password}` records.
    /// A missing file yields an empty store.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Users file not found, starting without accounts");
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(StorageError::internal(format!(
                    "failed to read users file {}: {e}",
                    path.display()
                )));
            }
        };
        let users: Vec<User> = serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::invalid_document(format!("users file {}: {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), count = users.len(), "Loaded accounts");
        Ok(Self::with_users(users))
    }

    /// Write every account to `path`, sorted by username.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        let json = serde_json::to_vec_pretty(&users)
            .map_err(|e| StorageError::internal(e.to_string()))?;
        tokio::fs::write(path, json).await.map_err(|e| {
            StorageError::internal(format!("failed to write users file {}: {e}", path.display()))
        })
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn upsert(&self, user: &User) -> Result<bool, StorageError> {
        let previous = self
            .users
            .write()
            .await
            .insert(user.username.clone(), user.clone());
        Ok(previous.is_none())
    }
}
