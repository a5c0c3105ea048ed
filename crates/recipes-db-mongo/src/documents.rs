//! BSON shapes of the stored documents.

use mongodb::bson::{self, Bson, DateTime, Document, doc, oid::ObjectId};
use recipes_core::{Ingredient, Recipe, RecipePayload, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{MongoError, Result};

/// A recipe as stored in the `recipes` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RecipeDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: DateTime,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl RecipeDocument {
    pub fn new(id: ObjectId, payload: RecipePayload, published_at: Timestamp) -> Self {
        Self {
            id,
            name: payload.name,
            tags: payload.tags,
            ingredients: payload.ingredients,
            instructions: payload.instructions,
            published_at: DateTime::from_millis(published_at.unix_timestamp_millis()),
            image_url: payload.image_url,
        }
    }

    pub fn into_recipe(self) -> Result<Recipe> {
        let published_at = Timestamp::from_unix_timestamp_millis(self.published_at.timestamp_millis())
            .map_err(|e| MongoError::invalid_document(format!("recipe {}: {e}", self.id)))?;
        Ok(Recipe {
            id: self.id.to_hex(),
            name: self.name,
            tags: self.tags,
            ingredients: self.ingredients,
            instructions: self.instructions,
            published_at,
            image_url: self.image_url,
        })
    }
}

/// `$set` update that replaces the mutable recipe fields.
pub(crate) fn replace_fields_update(payload: &RecipePayload) -> Result<Document> {
    let ingredients: Bson = bson::to_bson(&payload.ingredients)?;
    Ok(doc! {
        "$set": {
            "name": payload.name.as_str(),
            "instructions": payload.instructions.clone(),
            "ingredients": ingredients,
            "tags": payload.tags.clone(),
        }
    })
}

/// Parses a client-supplied id. Anything that is not a 24-hex ObjectId matches no document.
pub(crate) fn parse_object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipes_core::MeasuredIngredient;
    use time::macros::datetime;

    fn payload() -> RecipePayload {
        RecipePayload {
            name: "Omelette".into(),
            tags: vec!["breakfast".into()],
            ingredients: vec![
                "salt".into(),
                Ingredient::Measured(MeasuredIngredient {
                    quantity: "2".into(),
                    name: "eggs".into(),
                    kind: "unit".into(),
                }),
            ],
            instructions: vec!["whisk".into(), "fry".into()],
            image_url: None,
        }
    }

    #[test]
    fn document_maps_back_to_recipe() {
        let oid = ObjectId::new();
        let published = Timestamp::new(datetime!(2021-01-17 19:28:52.803 UTC));
        let document = RecipeDocument::new(oid, payload(), published);

        let stored = bson::to_document(&document).unwrap();
        assert!(stored.contains_key("_id"));
        assert!(stored.get_datetime("publishedAt").is_ok());
        assert!(!stored.contains_key("imageURL"));

        let decoded: RecipeDocument = bson::from_document(stored).unwrap();
        let recipe = decoded.into_recipe().unwrap();
        assert_eq!(recipe.id, oid.to_hex());
        assert_eq!(recipe.published_at, published);
        assert_eq!(recipe.ingredients, payload().ingredients);
    }

    #[test]
    fn update_only_touches_mutable_fields() {
        let update = replace_fields_update(&payload()).unwrap();
        let set = update.get_document("$set").unwrap();
        let mut keys: Vec<_> = set.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["ingredients", "instructions", "name", "tags"]);
    }

    #[test]
    fn malformed_ids_do_not_parse() {
        assert!(parse_object_id("not-an-object-id").is_none());
        assert!(parse_object_id("").is_none());
        assert!(parse_object_id("600dca30c8b4d8ea2fdb1d6b").is_some());
    }
}
