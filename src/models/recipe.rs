//! Canonical recipe shape and the field mapping used to build it.
//!
//! Recipe documents come from several exports that disagree on field naming
//! (`"Title Cleaned"` vs `title_cleaned` vs `Title`, `item_id` vs `id`). All of
//! them are resolved here, once, through [`FIELD_MAPPINGS`]. Nothing past this
//! boundary looks at raw field names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bump when a schema variant is added or a key changes.
pub const FIELD_MAPPING_VERSION: u32 = 2;

/// Placeholder shown when a record carries no usable title
pub const TITLE_PLACEHOLDER: &str = "Judul tidak tersedia";

const MAX_RATING: f64 = 5.0;

/// A recipe as every consumer sees it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub difficulty: Option<String>,
}

/// Source-schema variants, listed in resolution priority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSchema {
    /// Curated dataset export (`"Title Cleaned"`, `"Image URL"`, `item_id`)
    CuratedExport,
    /// snake_case re-export used by the category collections
    SnakeCase,
    /// Payload shape returned by the ML recommendation service
    MlService,
}

/// Keys one schema variant uses for each canonical field
#[derive(Debug)]
pub struct FieldMapping {
    pub schema: SourceSchema,
    pub id: &'static [&'static str],
    pub title: &'static [&'static str],
    pub image_url: &'static [&'static str],
    pub category: &'static [&'static str],
    pub rating: &'static [&'static str],
    pub difficulty: &'static [&'static str],
    pub ingredients: &'static [&'static str],
}

pub const FIELD_MAPPINGS: &[FieldMapping] = &[
    FieldMapping {
        schema: SourceSchema::CuratedExport,
        id: &["item_id"],
        title: &["Title Cleaned", "Title"],
        image_url: &["Image URL", "Image"],
        category: &["Category"],
        rating: &["Rating", "rating"],
        difficulty: &["Complexity", "Difficulty"],
        ingredients: &["Ingredients Cleaned", "Ingredients"],
    },
    FieldMapping {
        schema: SourceSchema::SnakeCase,
        id: &["id", "_id"],
        title: &["title_cleaned", "title"],
        image_url: &["image_url", "image"],
        category: &["category"],
        rating: &["rating", "total_rating"],
        difficulty: &["complexity", "difficulty"],
        ingredients: &["ingredients_cleaned", "ingredients"],
    },
    FieldMapping {
        schema: SourceSchema::MlService,
        id: &["recipe_id"],
        title: &["name", "recipe_title"],
        image_url: &["imageUrl", "thumbnail"],
        category: &["predicted_category"],
        rating: &["score_rating"],
        difficulty: &["difficulty_level", "skill_level"],
        ingredients: &["ingredient_list"],
    },
];

/// First value, across schema variants in priority order, that converts cleanly
fn resolve<T>(
    record: &Map<String, Value>,
    keys: impl Fn(&FieldMapping) -> &'static [&'static str],
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    FIELD_MAPPINGS
        .iter()
        .flat_map(|mapping| keys(mapping).iter())
        .filter_map(|key| record.get(*key))
        .find_map(convert)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_rating(value: &Value) -> Option<f64> {
    let rating = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    rating.is_finite().then(|| rating.clamp(0.0, MAX_RATING))
}

/// Canonical identifier of a raw document, if it has one
pub fn recipe_id(raw: &Value) -> Option<String> {
    let record = raw.as_object()?;
    resolve(record, |m| m.id, as_text)
}

/// Schema variant whose identifier key the document carries
pub fn source_schema(raw: &Value) -> Option<SourceSchema> {
    let record = raw.as_object()?;
    FIELD_MAPPINGS
        .iter()
        .find(|mapping| {
            mapping
                .id
                .iter()
                .any(|key| record.get(*key).and_then(as_text).is_some())
        })
        .map(|mapping| mapping.schema)
}

/// Ingredient text of a raw document, used by search
pub fn ingredients_text(raw: &Value) -> Option<String> {
    let record = raw.as_object()?;
    resolve(
        record,
        |m| m.ingredients,
        |value| match value {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(as_text)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            other => as_text(other),
        },
    )
}

/// Title of a raw document without the placeholder fallback
pub fn raw_title(raw: &Value) -> Option<String> {
    let record = raw.as_object()?;
    resolve(record, |m| m.title, as_text)
}

/// Rating of a raw document, clamped to 0..=5
pub fn raw_rating(raw: &Value) -> Option<f64> {
    let record = raw.as_object()?;
    resolve(record, |m| m.rating, as_rating)
}

/// Normalizes one raw document. Returns `None` when no identifier can be found.
pub fn normalize_recipe(raw: &Value) -> Option<Recipe> {
    let record = raw.as_object()?;
    let id = resolve(record, |m| m.id, as_text)?;

    Some(Recipe {
        id,
        title: resolve(record, |m| m.title, as_text)
            .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string()),
        image_url: resolve(record, |m| m.image_url, as_text),
        category: resolve(record, |m| m.category, as_text),
        rating: resolve(record, |m| m.rating, as_rating),
        difficulty: resolve(record, |m| m.difficulty, as_text),
    })
}

/// Normalizes a list, dropping records without an identifier
pub fn normalize_recipes(raw: &[Value]) -> Vec<Recipe> {
    let recipes: Vec<Recipe> = raw.iter().filter_map(normalize_recipe).collect();
    let dropped = raw.len() - recipes.len();
    if dropped > 0 {
        tracing::debug!(dropped, "Dropped recipe records without identifier");
    }
    recipes
}

/// Keys under which a service may nest its recipe array
const ARRAY_KEYS: &[&str] = &["recommendations", "data", "results", "recipes"];

/// Extracts the recipe array from a payload that is either a bare array or an
/// object wrapping one. Anything else yields an empty list.
pub fn recipe_array(payload: &Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items.clone(),
        Value::Object(map) => ARRAY_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Parsed search input: comma-separated, trimmed, lower-cased terms.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    pub fn parse(input: &str) -> Self {
        Self(
            input
                .to_lowercase()
                .split(',')
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn terms(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_curated_record() {
        let raw = json!({"item_id": "42", "Title Cleaned": "Nasi Goreng"});
        let recipe = normalize_recipe(&raw).unwrap();
        assert_eq!(recipe.id, "42");
        assert_eq!(recipe.title, "Nasi Goreng");
        assert_eq!(recipe.image_url, None);

        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["title"], "Nasi Goreng");
        assert!(json["imageUrl"].is_null());
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let raw = json!({"id": 7, "Image URL": "https://img.local/7.jpg"});
        let recipe = normalize_recipe(&raw).unwrap();
        assert_eq!(recipe.id, "7");
        assert_eq!(recipe.title, TITLE_PLACEHOLDER);
        assert_eq!(recipe.image_url.as_deref(), Some("https://img.local/7.jpg"));
    }

    #[test]
    fn test_blank_and_null_titles_fall_through() {
        let raw = json!({"item_id": "1", "Title Cleaned": "  ", "Title": null, "title": "Sayur Asem"});
        assert_eq!(normalize_recipe(&raw).unwrap().title, "Sayur Asem");
    }

    #[test]
    fn test_curated_keys_win_over_snake_case() {
        let raw = json!({"item_id": "a", "id": "b", "Title Cleaned": "Soto", "title_cleaned": "soto"});
        let recipe = normalize_recipe(&raw).unwrap();
        assert_eq!(recipe.id, "a");
        assert_eq!(recipe.title, "Soto");
    }

    #[test]
    fn test_record_without_id_is_dropped() {
        let raws = vec![
            json!({"Title": "No id here"}),
            json!({"item_id": "9", "Title": "Rendang"}),
            json!("not an object"),
        ];
        let recipes = normalize_recipes(&raws);
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].id, "9");
    }

    #[test]
    fn test_rating_parsing_and_clamping() {
        assert_eq!(normalize_recipe(&json!({"id": "1", "rating": "4.5"})).unwrap().rating, Some(4.5));
        assert_eq!(normalize_recipe(&json!({"id": "1", "rating": 12})).unwrap().rating, Some(5.0));
        assert_eq!(normalize_recipe(&json!({"id": "1", "rating": "n/a"})).unwrap().rating, None);
    }

    #[test]
    fn test_ml_service_shape() {
        let raw = json!({"recipe_id": 1001, "name": "Ayam Bakar", "difficulty_level": "Butuh Usaha"});
        let recipe = normalize_recipe(&raw).unwrap();
        assert_eq!(recipe.id, "1001");
        assert_eq!(recipe.title, "Ayam Bakar");
        assert_eq!(recipe.difficulty.as_deref(), Some("Butuh Usaha"));
    }

    #[test]
    fn test_recipe_array_shapes() {
        assert_eq!(recipe_array(&json!([{"id": "1"}])).len(), 1);
        assert_eq!(recipe_array(&json!({"recommendations": [{"id": "1"}, {"id": "2"}]})).len(), 2);
        assert_eq!(recipe_array(&json!({"data": [{"id": "1"}]})).len(), 1);
        assert!(recipe_array(&json!({"status": "ok"})).is_empty());
        assert!(recipe_array(&json!(null)).is_empty());
    }

    #[test]
    fn test_search_terms_parse() {
        let terms = SearchTerms::parse("ayam, tomat");
        assert_eq!(terms.terms(), &["ayam".to_string(), "tomat".to_string()]);
        assert_eq!(SearchTerms::parse(" Ayam ,, ").terms(), &["ayam".to_string()]);
        assert!(SearchTerms::parse(" , ").is_empty());
    }

    #[test]
    fn test_source_schema_follows_identifier_key() {
        assert_eq!(source_schema(&json!({"item_id": 3})), Some(SourceSchema::CuratedExport));
        assert_eq!(source_schema(&json!({"id": "a1"})), Some(SourceSchema::SnakeCase));
        assert_eq!(
            source_schema(&json!({"_id": {"$oid": "65f0"}, "recipe_id": "r-1"})),
            Some(SourceSchema::MlService)
        );
        assert_eq!(source_schema(&json!({"Title": "Soto"})), None);
    }

    #[test]
    fn test_mongo_object_id_is_skipped() {
        let raw = json!({"_id": {"$oid": "65f0"}, "recipe_id": "r-1", "name": "Pepes Ikan"});
        assert_eq!(normalize_recipe(&raw).unwrap().id, "r-1");
    }

    #[test]
    fn test_ingredients_array_is_joined() {
        let raw = json!({"id": "1", "ingredients": ["Tempe", "Kecap"]});
        assert_eq!(ingredients_text(&raw).as_deref(), Some("Tempe, Kecap"));
    }
}
