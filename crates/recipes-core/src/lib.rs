pub mod error;
pub mod id;
pub mod recipe;
pub mod time;
pub mod user;

pub use error::{CoreError, Result};
pub use id::generate_id;
pub use recipe::{Ingredient, MeasuredIngredient, Recipe, RecipePayload};
pub use time::{Timestamp, now_utc};
pub use user::User;
