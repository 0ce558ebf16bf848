use axum::{extract::State, Extension, Json};

use crate::{
    api::{extract::ApiJson, AppState},
    error::AppResult,
    middleware::{AuthUser, RequestId},
    models::{Envelope, UserProfile},
    services::{ChangePasswordRequest, UpdateProfileRequest},
};

pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Envelope<UserProfile>>> {
    let profile = state.accounts.profile(user.user_id).await?;
    Ok(Json(Envelope::data(profile)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<Envelope<UserProfile>>> {
    tracing::info!(request_id = %request_id, user_id = %user.user_id, "Updating profile");

    let profile = state.accounts.update_profile(user.user_id, request).await?;
    Ok(Json(Envelope::data(profile).with_message("Profile updated")))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> AppResult<Json<Envelope<()>>> {
    tracing::info!(request_id = %request_id, user_id = %user.user_id, "Changing password");

    state.accounts.change_password(user.user_id, request).await?;
    Ok(Json(Envelope::message("Password updated")))
}
