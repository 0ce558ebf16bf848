use std::sync::Arc;

use crate::{
    aggregate::FeedSettings,
    auth::TokenIssuer,
    client::RecommendationSource,
    db::{Cache, Store},
    services::{AccountService, RecipeService},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub recipes: RecipeService,
    pub accounts: AccountService,
    pub tokens: TokenIssuer,
    /// ML service used by the home feed; `None` serves the degraded feed
    pub recommender: Option<Arc<dyn RecommendationSource>>,
    pub feed: FeedSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, cache: Option<Cache>, tokens: TokenIssuer) -> Self {
        Self {
            recipes: RecipeService::new(store.clone(), cache),
            accounts: AccountService::new(store.clone(), tokens.clone()),
            store,
            tokens,
            recommender: None,
            feed: FeedSettings::default(),
        }
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn RecommendationSource>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    pub fn with_feed_settings(mut self, feed: FeedSettings) -> Self {
        self.feed = feed;
        self
    }
}
