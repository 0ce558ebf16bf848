use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::{api::AppState, error::AppError};

/// The caller identified by a valid bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Like [`AuthUser`], but a request without a token passes as a guest.
/// A token that is present but invalid is still rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let header = parts.headers.get(AUTHORIZATION)?;
    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Malformed authorization header".to_string()));
    Some(token)
}

fn authenticate(token: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let claims = state.tokens.verify(token)?;
    Ok(AuthUser {
        user_id: claims.sub,
        email: claims.email,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))??;
        authenticate(token, state)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(MaybeAuthUser(None)),
            Some(token) => Ok(MaybeAuthUser(Some(authenticate(token?, state)?))),
        }
    }
}
