use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    api::{extract::{ApiPath, ApiQuery}, AppState},
    error::AppResult,
    models::{CategoryDetails, Envelope, GuestListKind, PageRequest},
    services::{RecipePage, CATEGORY_PAGE_SIZE},
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    search: Option<String>,
    category: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

fn paged(page: RecipePage) -> Json<Envelope<Vec<Value>>> {
    Json(Envelope::data(page.items).with_pagination(page.pagination))
}

async fn guest_list(state: &AppState, kind: GuestListKind) -> AppResult<Json<Envelope<Vec<Value>>>> {
    let documents = state.recipes.guest_list(kind).await?;
    tracing::debug!(list = %kind, count = documents.len(), "Serving guest list");
    Ok(Json(Envelope::data(documents)))
}

pub async fn budget_menu(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<Value>>>> {
    guest_list(&state, GuestListKind::BudgetMenu).await
}

pub async fn popular(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<Value>>>> {
    guest_list(&state, GuestListKind::Popular).await
}

pub async fn staple(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<Value>>>> {
    guest_list(&state, GuestListKind::Staple).await
}

/// Handler for recipe search
///
/// Every comma-separated term of `search` must match the title or the
/// ingredients. Results keep their raw document shape.
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> AppResult<Json<Envelope<Vec<Value>>>> {
    let page = PageRequest::clamp(params.page, params.limit, PageRequest::MAX_LIMIT);
    let result = state
        .recipes
        .search(params.search.as_deref(), params.category.as_deref(), page)
        .await?;
    Ok(paged(result))
}

pub async fn by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<Envelope<Value>>> {
    let recipe = state.recipes.recipe(&id).await?;
    Ok(Json(Envelope::data(recipe)))
}

pub async fn by_category(
    State(state): State<AppState>,
    ApiPath(category): ApiPath<String>,
    ApiQuery(params): ApiQuery<PageQuery>,
) -> AppResult<Json<Envelope<Vec<Value>>>> {
    let page = PageRequest::clamp(params.page, params.limit, CATEGORY_PAGE_SIZE);
    let result = state.recipes.category_recipes(&category, page).await?;
    Ok(paged(result))
}

pub async fn categories(
    State(state): State<AppState>,
) -> AppResult<Json<Envelope<Vec<CategoryDetails>>>> {
    let categories = state.recipes.categories().await?;
    Ok(Json(Envelope::data(categories)))
}
