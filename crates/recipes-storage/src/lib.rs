//! # recipes-storage
//!
//! Storage abstraction layer for the recipes API.
//!
//! This crate only defines the contracts; backends live in `recipes-db-memory`
//! and `recipes-db-mongo`.
//!
//! ## Overview
//!
//! - [`RecipeStorage`]: list, insert, field replacement and removal of recipes
//! - [`UserStorage`]: credential lookups for sign-in and account seeding
//!
//! ## Example
//!
//! ```ignore
//! use recipes_storage::{RecipeStorage, StorageError};
//!
//! async fn count_vegetarian(storage: &dyn RecipeStorage) -> Result<usize, StorageError> {
//!     let recipes = storage.find_all().await?;
//!     Ok(recipes.iter().filter(|r| r.has_tag("vegetarian")).count())
//! }
//! ```

mod error;
mod traits;

pub use error::{ErrorCategory, StorageError};
pub use traits::{RecipeStorage, UserStorage};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Shared recipe store handle.
pub type DynRecipeStorage = std::sync::Arc<dyn RecipeStorage>;

/// Shared user store handle.
pub type DynUserStorage = std::sync::Arc<dyn UserStorage>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::traits::{RecipeStorage, UserStorage};
    pub use crate::{DynRecipeStorage, DynUserStorage, StorageResult};
}
