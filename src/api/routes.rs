use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{auth, bookmarks, home, preferences, profile, recipes};
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(home::health_check))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Guest lists
        .route("/guest/top-menu-hemat", get(recipes::budget_menu))
        .route("/guest/banyak-disukai", get(recipes::popular))
        .route("/guest/top-andalan", get(recipes::staple))
        // Recipes
        .route("/recipes", get(recipes::search))
        .route("/recipes/category/:category", get(recipes::by_category))
        .route("/recipes/:id", get(recipes::by_id))
        .route("/categories", get(recipes::categories))
        .route("/home", get(home::home_feed))
        // Accounts
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/profile/password", put(profile::change_password))
        // Per-user data
        .route(
            "/preferences",
            get(preferences::get_preferences)
                .post(preferences::save_preferences)
                .delete(preferences::delete_preferences),
        )
        .route(
            "/bookmark",
            get(bookmarks::list_bookmarks).post(bookmarks::add_bookmark),
        )
        .route("/bookmark/:id", delete(bookmarks::remove_bookmark))
}
