use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::guest::{GuestLists, GuestLoader};
use crate::client::{ClientError, NewUserRequest, RecipeSource, RecommendationSource};
use crate::config::ClientConfig;
use crate::models::{PreferenceSet, Recipe};

/// Why personalized content was replaced by guest content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Health check failed or timed out
    ServiceUnavailable,
    /// Both recommendation calls failed
    RequestFailed,
    /// Both calls answered, with nothing in them
    NoRecommendations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "reason", rename_all = "snake_case")]
pub enum FeedMode {
    Personalized,
    DegradedFallback(FallbackReason),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedLists {
    pub for_you: Vec<Recipe>,
    pub similar_taste: Vec<Recipe>,
    pub top_community: Vec<Recipe>,
}

/// Result of a personalized load. Always complete, never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedFeed {
    pub lists: PersonalizedLists,
    #[serde(flatten)]
    pub mode: FeedMode,
    /// User-visible message when the ML path failed
    pub error: Option<String>,
}

impl PersonalizedFeed {
    /// Guest lists substituted under personalized labels
    pub fn fallback(guest: &GuestLists, reason: FallbackReason, error: Option<String>) -> Self {
        Self {
            lists: PersonalizedLists {
                similar_taste: guest.budget_menu.clone(),
                for_you: guest.popular.clone(),
                top_community: guest.staple.clone(),
            },
            mode: FeedMode::DegradedFallback(reason),
            error,
        }
    }

    pub fn has_personalized_data(&self) -> bool {
        self.mode == FeedMode::Personalized
    }
}

/// Tunables of the personalized path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSettings {
    pub display_count: usize,
    pub top_k: usize,
    pub health_timeout: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            display_count: 5,
            top_k: 10,
            health_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&ClientConfig> for FeedSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            display_count: config.display_count,
            top_k: config.ml_top_k,
            health_timeout: config.health_timeout(),
        }
    }
}

/// Builds the personalized feed from the ML service, falling back to guest lists
#[derive(Clone)]
pub struct PersonalizedLoader {
    recipes: Arc<dyn RecipeSource>,
    recommender: Arc<dyn RecommendationSource>,
    settings: FeedSettings,
}

impl PersonalizedLoader {
    pub fn new(
        recipes: Arc<dyn RecipeSource>,
        recommender: Arc<dyn RecommendationSource>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            recipes,
            recommender,
            settings,
        }
    }

    /// Preferences in effect: the explicit override, then the stored set, then defaults
    async fn effective_preferences(
        &self,
        user_id: Uuid,
        preferences: Option<PreferenceSet>,
    ) -> PreferenceSet {
        if let Some(preferences) = preferences {
            return preferences;
        }
        match self.recipes.stored_preferences(user_id).await {
            Ok(Some(stored)) => stored,
            Ok(None) => PreferenceSet::default(),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Could not read stored preferences, using defaults");
                PreferenceSet::default()
            }
        }
    }

    pub async fn load(
        &self,
        user_id: Uuid,
        preferences: Option<PreferenceSet>,
        guest: Option<Arc<GuestLists>>,
    ) -> PersonalizedFeed {
        let guest = match guest {
            Some(guest) => guest,
            None => Arc::new(GuestLoader::new(self.recipes.clone()).load().await.lists),
        };

        let preferences = self.effective_preferences(user_id, preferences).await;

        match tokio::time::timeout(self.settings.health_timeout, self.recommender.health()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(user_id = %user_id, error = %e, "ML service health check failed");
                return PersonalizedFeed::fallback(
                    &guest,
                    FallbackReason::ServiceUnavailable,
                    Some(format!("Recommendation service is unavailable: {}", e)),
                );
            }
            Err(_) => {
                tracing::warn!(
                    user_id = %user_id,
                    timeout_ms = self.settings.health_timeout.as_millis() as u64,
                    "ML service health check timed out"
                );
                return PersonalizedFeed::fallback(
                    &guest,
                    FallbackReason::ServiceUnavailable,
                    Some(ClientError::Timeout.to_string()),
                );
            }
        }

        let request = NewUserRequest::from_preferences(&preferences, self.settings.top_k);

        let (history, declared) = tokio::join!(
            self.recommender.existing_user(user_id, self.settings.top_k),
            self.recommender.new_user(&request),
        );

        let failed = history.is_err() && declared.is_err();
        let for_you = self.settle("existing_user", user_id, history);
        let similar_taste = self.settle("new_user", user_id, declared);

        if for_you.is_empty() && similar_taste.is_empty() {
            let (reason, error) = if failed {
                (
                    FallbackReason::RequestFailed,
                    Some("Could not load recommendations, showing popular recipes instead".to_string()),
                )
            } else {
                (FallbackReason::NoRecommendations, None)
            };
            tracing::info!(user_id = %user_id, ?reason, "Using guest lists as personalized fallback");
            return PersonalizedFeed::fallback(&guest, reason, error);
        }

        tracing::info!(
            user_id = %user_id,
            for_you = for_you.len(),
            similar_taste = similar_taste.len(),
            "Personalized recommendations loaded"
        );

        PersonalizedFeed {
            lists: PersonalizedLists {
                for_you,
                similar_taste,
                top_community: self.truncate(guest.popular.clone()),
            },
            mode: FeedMode::Personalized,
            error: None,
        }
    }

    fn settle(
        &self,
        call: &'static str,
        user_id: Uuid,
        result: Result<Vec<Recipe>, ClientError>,
    ) -> Vec<Recipe> {
        match result {
            Ok(recipes) => self.truncate(recipes),
            Err(e) => {
                tracing::warn!(user_id = %user_id, call, error = %e, "Recommendation request failed");
                Vec::new()
            }
        }
    }

    fn truncate(&self, mut recipes: Vec<Recipe>) -> Vec<Recipe> {
        recipes.truncate(self.settings.display_count);
        recipes
    }
}
