use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::{
    api::{extract::{ApiJson, ApiPath}, AppState},
    error::{AppError, AppResult},
    middleware::{AuthUser, RequestId},
    models::{Bookmark, CreateBookmarkRequest, Envelope},
};

/// Caller's bookmarks, newest first
pub async fn list_bookmarks(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Envelope<Vec<Bookmark>>>> {
    let bookmarks = state.store.bookmarks(user.user_id).await?;
    Ok(Json(Envelope::data(bookmarks)))
}

pub async fn add_bookmark(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateBookmarkRequest>,
) -> AppResult<(StatusCode, Json<Envelope<Bookmark>>)> {
    request.validate().map_err(AppError::InvalidInput)?;

    let bookmark = Bookmark::new(user.user_id, request);
    state.store.add_bookmark(&bookmark).await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %user.user_id,
        recipe_id = %bookmark.recipe_id,
        "Bookmark added"
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::data(bookmark).with_message("Bookmark added")),
    ))
}

pub async fn remove_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Envelope<()>>> {
    if !state.store.remove_bookmark(user.user_id, id).await? {
        return Err(AppError::NotFound("Bookmark not found".to_string()));
    }
    Ok(Json(Envelope::message("Bookmark removed")))
}
