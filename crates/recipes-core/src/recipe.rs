use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// A quantified ingredient line such as `{"quantity": "2", "name": "eggs", "type": "unit"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasuredIngredient {
    #[serde(default)]
    pub quantity: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Ingredients are either free text or a measured record; both shapes round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ingredient {
    Plain(String),
    Measured(MeasuredIngredient),
}

impl Ingredient {
    pub fn name(&self) -> &str {
        match self {
            Ingredient::Plain(name) => name,
            Ingredient::Measured(m) => &m.name,
        }
    }
}

impl From<&str> for Ingredient {
    fn from(value: &str) -> Self {
        Ingredient::Plain(value.to_string())
    }
}

/// A persisted recipe document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, alias = "steps")]
    pub instructions: Vec<String>,
    pub published_at: Timestamp,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Recipe {
    /// Builds a new document from client input. Any id or publish time the
    /// client may have sent is ignored.
    pub fn from_payload(id: String, payload: RecipePayload, published_at: Timestamp) -> Self {
        Self {
            id,
            name: payload.name,
            tags: payload.tags,
            ingredients: payload.ingredients,
            instructions: payload.instructions,
            published_at,
            image_url: payload.image_url,
        }
    }

    /// Replaces the mutable fields; `id`, `published_at` and the picture stay as they were.
    pub fn apply_update(&mut self, payload: RecipePayload) {
        self.name = payload.name;
        self.instructions = payload.instructions;
        self.ingredients = payload.ingredients;
        self.tags = payload.tags;
    }

    /// Case-insensitive exact tag match.
    pub fn has_tag(&self, tag: &str) -> bool {
        let needle = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == needle)
    }
}

/// Request body for create and update.
///
/// Every field is optional on the wire; a syntactically valid JSON object is
/// always accepted and missing fields become empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, alias = "steps")]
    pub instructions: Vec<String>,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
