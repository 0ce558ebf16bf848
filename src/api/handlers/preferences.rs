use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::{
    api::{extract::ApiJson, AppState},
    error::{AppError, AppResult},
    middleware::{AuthUser, RequestId},
    models::{Envelope, PreferenceSet, SavePreferencesRequest},
};

pub async fn get_preferences(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Envelope<PreferenceSet>>> {
    let preferences = state
        .store
        .preferences(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Preferences not set".to_string()))?;
    Ok(Json(Envelope::data(preferences)))
}

/// Creates or replaces the caller's preferences: 201 on first save, 200 after
pub async fn save_preferences(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
    ApiJson(request): ApiJson<SavePreferencesRequest>,
) -> AppResult<(StatusCode, Json<Envelope<PreferenceSet>>)> {
    let preferences = request.validate().map_err(AppError::InvalidInput)?;
    let created = state
        .store
        .save_preferences(user.user_id, &preferences)
        .await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user.user_id,
        created,
        categories = preferences.preferred_categories.len(),
        "Preferences saved"
    );

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(Envelope::data(preferences).with_message("Preferences saved")),
    ))
}

pub async fn delete_preferences(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Envelope<()>>> {
    if !state.store.delete_preferences(user.user_id).await? {
        return Err(AppError::NotFound("Preferences not set".to_string()));
    }
    Ok(Json(Envelope::message("Preferences deleted")))
}
