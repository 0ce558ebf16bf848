use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    aggregate::{
        FallbackReason, GuestLists, GuestLoader, PersonalizedFeed, PersonalizedLoader,
    },
    api::AppState,
    client::RecipeSource,
    middleware::{MaybeAuthUser, RequestId},
    models::Envelope,
};

/// Liveness check
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeFeed {
    pub guest: GuestLists,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personalized: Option<PersonalizedFeed>,
}

/// Aggregated home feed
///
/// Guests get the three curated lists. Signed-in callers additionally get
/// the personalized feed, which degrades to the guest lists when the ML
/// service is missing or unhelpful.
pub async fn home_feed(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> Json<Envelope<HomeFeed>> {
    let recipes: Arc<dyn RecipeSource> = Arc::new(state.recipes.clone());

    let guest_load = GuestLoader::new(recipes.clone()).load().await;
    let guest_failed = guest_load.all_failed();
    let guest = Arc::new(guest_load.lists);

    let personalized = match (user, &state.recommender) {
        (None, _) => None,
        (Some(user), Some(recommender)) => {
            let loader = PersonalizedLoader::new(recipes, recommender.clone(), state.feed);
            Some(loader.load(user.user_id, None, Some(guest.clone())).await)
        }
        (Some(_), None) => Some(PersonalizedFeed::fallback(
            &guest,
            FallbackReason::ServiceUnavailable,
            Some("Recommendation service is not configured".to_string()),
        )),
    };

    tracing::info!(
        request_id = %request_id,
        authenticated = personalized.is_some(),
        mode = ?personalized.as_ref().map(|feed| feed.mode),
        "Home feed assembled"
    );

    let feed = HomeFeed {
        guest: Arc::unwrap_or_clone(guest),
        personalized,
    };
    let envelope = Envelope::data(feed);
    Json(if guest_failed {
        envelope.with_message("Could not load recipes")
    } else {
        envelope
    })
}
