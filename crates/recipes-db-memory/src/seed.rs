use recipes_core::{Recipe, RecipePayload, Timestamp, generate_id, now_utc};
use serde::Deserialize;

/// One entry of a `recipes.json` seed file. `id` and `publishedAt` may be
/// omitted and are filled in at load time.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedRecipe {
    id: Option<String>,
    published_at: Option<Timestamp>,
    #[serde(flatten)]
    payload: RecipePayload,
}

pub(crate) fn parse_seed(bytes: &[u8]) -> serde_json::Result<Vec<Recipe>> {
    let entries: Vec<SeedRecipe> = serde_json::from_slice(bytes)?;
    let loaded_at = now_utc();
    Ok(entries
        .into_iter()
        .map(|entry| {
            let id = entry.id.filter(|id| !id.is_empty()).unwrap_or_else(generate_id);
            Recipe::from_payload(id, entry.payload, entry.published_at.unwrap_or(loaded_at))
        })
        .collect())
}
