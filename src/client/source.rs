use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use super::error::ClientResult;
use crate::models::{CategoryEntry, GuestListKind, Pagination, PreferenceSet, Recipe};

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchPage {
    pub recipes: Vec<Recipe>,
    pub pagination: Option<Pagination>,
}

/// Where the aggregation core gets recipes from
///
/// Implementations hand back normalized recipes; raw field names never
/// cross this boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn guest_list(&self, kind: GuestListKind) -> ClientResult<Vec<Recipe>>;

    async fn search(&self, term: &str, page: u32, limit: u32) -> ClientResult<SearchPage>;

    async fn categories(&self) -> ClientResult<Vec<CategoryEntry>>;

    /// Stored preferences of `user_id`, `None` when they have never been saved
    async fn stored_preferences(&self, user_id: Uuid) -> ClientResult<Option<PreferenceSet>>;
}

/// Body of the preference-based recommendation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUserRequest {
    pub preferred_categories: Vec<String>,
    pub preferred_difficulty: String,
    pub top_k: usize,
}

impl NewUserRequest {
    pub fn from_preferences(preferences: &PreferenceSet, top_k: usize) -> Self {
        Self {
            preferred_categories: preferences.preferred_categories.clone(),
            preferred_difficulty: preferences.skill_level.label().to_string(),
            top_k,
        }
    }
}

/// The ML recommendation service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn health(&self) -> ClientResult<()>;

    /// Recommendations from the user's history
    async fn existing_user(&self, user_id: Uuid, top_k: usize) -> ClientResult<Vec<Recipe>>;

    /// Recommendations from declared preferences
    async fn new_user(&self, request: &NewUserRequest) -> ClientResult<Vec<Recipe>>;
}
