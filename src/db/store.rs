use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Display;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        recipe::{ingredients_text, raw_rating, raw_title, recipe_id},
        Bookmark, PageRequest, PreferenceSet, ProfileUpdate, SearchTerms, User,
    },
};

/// Named group of recipe documents
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Main recipe collection, used by search and lookup by id
    Recipes,
    /// Highly rated recipes the popular list is ranked from
    TopRated,
    /// Curated section such as `Top_10_Resep_Pokoknya_Jadi`
    Section(String),
    /// Recipes of one catalog category
    Category(String),
}

impl Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collection::Recipes => write!(f, "recipes"),
            Collection::TopRated => write!(f, "top"),
            Collection::Section(name) => write!(f, "section:{}", name),
            Collection::Category(slug) => write!(f, "category:{}", slug.to_lowercase()),
        }
    }
}

/// A raw recipe document together with the fields resolved at ingest time
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    /// Lower-cased title, for search
    pub title_text: String,
    /// Lower-cased ingredients, for search and the category filter
    pub ingredients_text: String,
    pub rating: Option<f64>,
    pub document: Value,
}

impl StoredDocument {
    /// Resolves the canonical id and searchable text of a raw document.
    /// Documents without an identifier are rejected.
    pub fn from_raw(document: Value) -> Option<Self> {
        let id = recipe_id(&document)?;
        Some(Self {
            id,
            title_text: raw_title(&document).unwrap_or_default().to_lowercase(),
            ingredients_text: ingredients_text(&document)
                .unwrap_or_default()
                .to_lowercase(),
            rating: raw_rating(&document),
            document,
        })
    }

    pub fn matches(&self, filter: &RecipeFilter) -> bool {
        let terms_match = filter.terms.terms().iter().all(|term| {
            self.title_text.contains(term.as_str()) || self.ingredients_text.contains(term.as_str())
        });
        let category_match = filter
            .category
            .as_deref()
            .map_or(true, |category| self.ingredients_text.contains(category));
        terms_match && category_match
    }
}

/// Search filter over the main recipe collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub terms: SearchTerms,
    /// Lower-cased ingredient substring
    pub category: Option<String>,
}

impl RecipeFilter {
    pub fn new(search: Option<&str>, category: Option<&str>) -> Self {
        Self {
            terms: search.map(SearchTerms::parse).unwrap_or_default(),
            category: category
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty()),
        }
    }
}

/// One page of raw documents and the total number of matches
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPage {
    pub items: Vec<Value>,
    pub total: u64,
}

/// Persistence boundary of the backend
#[async_trait]
pub trait Store: Send + Sync {
    /// Stores documents into a collection, in order. Returns how many were kept.
    async fn ingest(&self, collection: &Collection, documents: Vec<Value>) -> AppResult<usize>;

    /// Every document of a collection, in ingest order
    async fn documents(&self, collection: &Collection) -> AppResult<Vec<Value>>;

    /// One page of a collection, in ingest order
    async fn document_page(&self, collection: &Collection, page: PageRequest)
        -> AppResult<DocumentPage>;

    async fn count(&self, collection: &Collection) -> AppResult<u64>;

    /// Highest rated documents of [`Collection::TopRated`]
    async fn top_rated(&self, limit: usize) -> AppResult<Vec<Value>>;

    async fn search_recipes(&self, filter: &RecipeFilter, page: PageRequest)
        -> AppResult<DocumentPage>;

    async fn recipe_by_id(&self, id: &str) -> AppResult<Option<Value>>;

    /// Fails with `Conflict` when the email is taken
    async fn create_user(&self, user: &User) -> AppResult<()>;

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    /// Applies a profile change and returns the updated user.
    /// Fails with `Conflict` when the new email belongs to another user.
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<User>;

    async fn preferences(&self, user_id: Uuid) -> AppResult<Option<PreferenceSet>>;

    /// Inserts or replaces the preferences. Returns `true` when they were created.
    async fn save_preferences(&self, user_id: Uuid, preferences: &PreferenceSet)
        -> AppResult<bool>;

    /// Returns `false` when there was nothing to delete
    async fn delete_preferences(&self, user_id: Uuid) -> AppResult<bool>;

    /// Newest first
    async fn bookmarks(&self, user_id: Uuid) -> AppResult<Vec<Bookmark>>;

    /// Fails with `Conflict` when the recipe is already bookmarked by this user
    async fn add_bookmark(&self, bookmark: &Bookmark) -> AppResult<()>;

    /// Returns `false` when the bookmark does not exist or belongs to someone else
    async fn remove_bookmark(&self, user_id: Uuid, bookmark_id: Uuid) -> AppResult<bool>;
}
