//! In-memory storage backend for the recipes API.
//!
//! Recipes live in an ordered, lock-guarded `Vec` so listing preserves
//! insertion order; accounts live in a map keyed by username.
//!
//! # Example
//!
//! ```ignore
//! use recipes_db_memory::InMemoryRecipeStorage;
//! use recipes_storage::RecipeStorage;
//!
//! let storage = InMemoryRecipeStorage::from_seed_file("recipes.json").await?;
//! let all = storage.find_all().await?;
//! ```

mod seed;
pub mod storage;
pub mod users;

pub use recipes_storage::{RecipeStorage, StorageError, UserStorage};
pub use storage::InMemoryRecipeStorage;
pub use users::InMemoryUserStorage;
