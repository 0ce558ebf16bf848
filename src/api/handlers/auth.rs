use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::{
    api::{extract::ApiJson, AppState},
    error::AppResult,
    middleware::RequestId,
    models::{Envelope, LoginResult},
    services::{LoginRequest, RegisterRequest},
};

/// Creates an account and signs it in
pub async fn register(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Envelope<LoginResult>>)> {
    tracing::info!(request_id = %request_id, "Processing registration");

    let result = state.accounts.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(result).with_message("Registration successful")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<Envelope<LoginResult>>> {
    tracing::info!(request_id = %request_id, "Processing login");

    let result = state.accounts.login(request).await?;
    Ok(Json(Envelope::data(result).with_message("Login successful")))
}
