use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::store::{Collection, Store};
use crate::{
    error::AppResult,
    models::{
        category::find_category,
        recipe::{source_schema, FIELD_MAPPING_VERSION},
    },
};

/// Recipe data set loaded at startup
///
/// ```json
/// {
///   "recipes": [ ... ],
///   "top_recipes": [ ... ],
///   "sections": { "Top_10_Resep_Pokoknya_Jadi": [ ... ] },
///   "categories": { "ayam": [ ... ] }
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub recipes: Vec<Value>,
    #[serde(default)]
    pub top_recipes: Vec<Value>,
    #[serde(default)]
    pub sections: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<Value>>,
}

impl Seed {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let seed = serde_json::from_str(&raw)?;
        Ok(seed)
    }

    /// Loads every collection of the seed into the store
    pub async fn apply(self, store: &dyn Store) -> AppResult<()> {
        let schema = self.recipes.first().and_then(source_schema);
        let recipes = store.ingest(&Collection::Recipes, self.recipes).await?;
        let top = store.ingest(&Collection::TopRated, self.top_recipes).await?;

        for (name, documents) in self.sections {
            let kept = store.ingest(&Collection::Section(name.clone()), documents).await?;
            tracing::debug!(section = %name, kept, "Seeded section");
        }

        for (slug, documents) in self.categories {
            let Some(info) = find_category(&slug) else {
                tracing::warn!(category = %slug, "Skipping category outside the catalog");
                continue;
            };
            let kept = store
                .ingest(&Collection::Category(info.id.to_string()), documents)
                .await?;
            tracing::debug!(category = %info.id, kept, "Seeded category");
        }

        tracing::info!(
            recipes,
            top,
            ?schema,
            mapping_version = FIELD_MAPPING_VERSION,
            "Seed data loaded"
        );
        Ok(())
    }
}
