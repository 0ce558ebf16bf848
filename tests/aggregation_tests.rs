//! End-to-end runs of the aggregation core against a live backend and a fake ML service.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;

use werecooked::{
    aggregate::{AggregationController, FallbackReason, FeedMode, FeedSettings, PersonalizedLoader},
    api::{create_router, AppState},
    auth::TokenIssuer,
    client::{
        BackendClient, ClientError, MlClient, RecipeSource, RetryPolicy, Session, SessionContext,
    },
    db::{MemoryStore, Seed},
    models::GuestListKind,
};

const SEED_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/seed.json");

/// Serves `app` on an ephemeral local port and returns its base URL
async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_backend() -> String {
    let store = MemoryStore::new();
    Seed::from_file(SEED_FILE)
        .unwrap()
        .apply(&store)
        .await
        .unwrap();
    let tokens = TokenIssuer::new("aggregation-test", Duration::from_secs(3600));
    serve(create_router(AppState::new(Arc::new(store), None, tokens))).await
}

#[derive(Debug, Deserialize)]
struct TopK {
    top_k: usize,
}

/// ML service that answers in its own payload shapes
fn ml_router(healthy: bool) -> Router {
    Router::new()
        .route(
            "/health",
            get(move || async move {
                if healthy {
                    (StatusCode::OK, Json(json!({"status": "ok"})))
                } else {
                    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "loading"})))
                }
            }),
        )
        .route(
            "/api/recommendations/existing-user/:user_id",
            get(|Path(_user_id): Path<String>, Query(q): Query<TopK>| async move {
                let items: Vec<Value> = (1..=q.top_k)
                    .map(|i| json!({"recipe_id": 100 + i, "name": format!("Rekomendasi {}", i), "score_rating": 4.2}))
                    .collect();
                Json(json!({"recommendations": items}))
            }),
        )
        .route(
            "/api/recommendations/new-user",
            post(|Json(body): Json<Value>| async move {
                let categories = body["preferred_categories"].as_array().cloned().unwrap_or_default();
                let items: Vec<Value> = categories
                    .iter()
                    .enumerate()
                    .map(|(i, c)| json!({"recipe_id": format!("cat-{}", i), "name": format!("Olahan {}", c.as_str().unwrap_or(""))}))
                    .collect();
                Json(json!(items))
            }),
        )
}

fn backend_client(base_url: &str, session: &SessionContext) -> BackendClient {
    BackendClient::new(base_url, session.clone(), RetryPolicy::none())
}

fn controller(
    backend: &BackendClient,
    ml_url: &str,
    session: &SessionContext,
) -> AggregationController {
    let recipes: Arc<dyn RecipeSource> = Arc::new(backend.clone());
    let ml = Arc::new(MlClient::new(ml_url, "/health", RetryPolicy::none()));
    let loader = PersonalizedLoader::new(recipes.clone(), ml, FeedSettings::default());
    AggregationController::spawn(recipes, loader, session)
}

#[tokio::test]
async fn test_guest_then_signed_in_feed() {
    let backend_url = spawn_backend().await;
    let ml_url = serve(ml_router(true)).await;
    let session = SessionContext::guest();
    let backend = backend_client(&backend_url, &session);
    let controller = controller(&backend, &ml_url, &session);

    let guest = controller.wait_until(|s| s.is_ready_for(None)).await;
    assert_eq!(guest.guest.get(GuestListKind::BudgetMenu).len(), 10);
    assert_eq!(guest.guest.popular[0].title, "Rendang Sapi");
    assert_eq!(guest.guest.staple.len(), 5);
    assert!(guest.personalized.is_none());
    assert!(guest.guest_error.is_none());

    let signed_in = backend
        .register("Budi Santoso", "budi@mail.com", "rahasia123")
        .await
        .unwrap();
    backend
        .save_preferences(&werecooked::models::PreferenceSet {
            preferred_categories: vec!["ayam".into(), "tempe".into()],
            cooking_methods: vec!["goreng".into()],
            ..Default::default()
        })
        .await
        .unwrap();

    let snapshot = controller
        .wait_until(|s| s.is_ready_for(Some(signed_in.user_id)))
        .await;
    assert!(snapshot.has_personalized_data());
    let feed = snapshot.personalized.unwrap();
    // top_k is 10 but only 5 are shown
    assert_eq!(feed.lists.for_you.len(), 5);
    assert_eq!(feed.lists.for_you[0].id, "101");
    assert_eq!(feed.lists.top_community.len(), 5);
    assert!(snapshot.ml_error.is_none());

    controller.shutdown();
}

#[tokio::test]
async fn test_stored_preferences_reach_the_ml_service() {
    let backend_url = spawn_backend().await;
    let ml_url = serve(ml_router(true)).await;
    let session = SessionContext::guest();
    let backend = backend_client(&backend_url, &session);

    backend
        .register("Rina Wati", "rina@mail.com", "rahasia123")
        .await
        .unwrap();
    backend
        .save_preferences(&werecooked::models::PreferenceSet {
            preferred_categories: vec!["udang".into()],
            cooking_methods: vec!["bakar".into()],
            ..Default::default()
        })
        .await
        .unwrap();

    let controller = controller(&backend, &ml_url, &session);
    let user_id = session.user_id();
    let snapshot = controller.wait_until(|s| s.is_ready_for(user_id)).await;
    let feed = snapshot.personalized.unwrap();
    assert_eq!(feed.lists.similar_taste.len(), 1);
    assert_eq!(feed.lists.similar_taste[0].title, "Olahan udang");
}

#[tokio::test]
async fn test_unhealthy_ml_service_falls_back_to_guest_lists() {
    let backend_url = spawn_backend().await;
    let ml_url = serve(ml_router(false)).await;
    let session = SessionContext::guest();
    let backend = backend_client(&backend_url, &session);
    let user = backend
        .register("Dewi Lestari", "dewi@mail.com", "rahasia123")
        .await
        .unwrap();

    let controller = controller(&backend, &ml_url, &session);
    let snapshot = controller
        .wait_until(|s| s.is_ready_for(Some(user.user_id)))
        .await;

    let feed = snapshot.personalized.clone().unwrap();
    assert_eq!(
        feed.mode,
        FeedMode::DegradedFallback(FallbackReason::ServiceUnavailable)
    );
    assert_eq!(feed.lists.for_you, snapshot.guest.popular);
    assert_eq!(feed.lists.similar_taste, snapshot.guest.budget_menu);
    assert!(snapshot.ml_error.is_some());

    controller.dismiss_ml_error();
    let dismissed = controller.wait_until(|s| s.ml_error.is_none()).await;
    assert!(!dismissed.has_personalized_data());

    // A retry runs the ML path again and publishes before resolving
    let retried = controller.retry_personalized().await;
    assert!(!retried.ml_loading);
    assert!(retried.ml_error.is_some());
}

#[tokio::test]
async fn test_search_and_categories_side_channels() {
    let backend_url = spawn_backend().await;
    let ml_url = serve(ml_router(true)).await;
    let session = SessionContext::guest();
    let backend = backend_client(&backend_url, &session);
    let controller = controller(&backend, &ml_url, &session);

    let page = controller.search("  tempe ", 0).await.unwrap();
    assert_eq!(page.recipes.len(), 3);
    let pagination = page.pagination.unwrap();
    assert_eq!(pagination.page, 1);
    assert_eq!(pagination.limit, 20);
    assert_eq!(pagination.total, 3);

    let blank = controller.search("   ", 1).await.unwrap();
    assert!(blank.recipes.is_empty());

    let categories = controller.categories().await.unwrap();
    assert_eq!(categories.len(), 8);
    let telur = categories.iter().find(|c| c.name == "Telur").unwrap();
    assert_eq!(telur.count, 3);
}

#[tokio::test]
async fn test_rejected_token_clears_session() {
    let backend_url = spawn_backend().await;
    let session = SessionContext::with_session(Session {
        user_id: uuid::Uuid::new_v4(),
        name: "Kadaluarsa".into(),
        email: "old@mail.com".into(),
        token: "expired-token".into(),
    });
    let backend = backend_client(&backend_url, &session);

    let result = backend.bookmarks().await;
    assert_eq!(result, Err(ClientError::Unauthorized));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_bookmarks_through_client() {
    let backend_url = spawn_backend().await;
    let session = SessionContext::guest();
    let backend = backend_client(&backend_url, &session);
    backend
        .register("Agus Salim", "agus@mail.com", "rahasia123")
        .await
        .unwrap();

    let recipe = backend.recipe_summary("6").await.unwrap();
    assert_eq!(recipe.title, "Rendang Sapi");

    let bookmark = backend.add_bookmark(&recipe).await.unwrap();
    assert_eq!(bookmark.recipe_id, "6");

    let duplicate = backend.add_bookmark(&recipe).await;
    assert!(matches!(duplicate, Err(ClientError::Declared { status: 409, .. })));

    backend.remove_bookmark(bookmark.id).await.unwrap();
    assert!(backend.bookmarks().await.unwrap().is_empty());
    assert_eq!(backend.preferences().await.unwrap(), None);
}

#[tokio::test]
async fn test_categories_from_minimal_backend_response() {
    let app = Router::new().route(
        "/api/categories",
        get(|| async {
            Json(json!({
                "data": [{"id": "ayam", "name": "Ayam", "icon": "🐔", "count": 12}],
                "error": false
            }))
        }),
    );
    let base_url = serve(app).await;
    let backend = backend_client(&base_url, &SessionContext::guest());

    let categories = backend.categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Ayam");
    assert_eq!(categories[0].icon, "🐔");
    assert_eq!(categories[0].count, 12);
}

#[tokio::test]
async fn test_declared_error_wins_over_success_status() {
    let app = Router::new().route(
        "/api/guest/top-andalan",
        get(|| async { Json(json!({"error": true, "message": "Recipe data not found"})) }),
    );
    let base_url = serve(app).await;
    let backend = backend_client(&base_url, &SessionContext::guest());

    let result = backend.guest_list(GuestListKind::Staple).await;
    assert_eq!(
        result,
        Err(ClientError::Declared {
            status: 200,
            message: "Recipe data not found".to_string()
        })
    );
}
