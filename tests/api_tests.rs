use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

use werecooked::{
    api::{create_router, AppState},
    auth::TokenIssuer,
    client::{ClientError, ClientResult, NewUserRequest, RecommendationSource},
    db::{MemoryStore, Seed, Store},
    models::Recipe,
};

const SEED_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/seed.json");

async fn seeded_store() -> Arc<dyn Store> {
    let store = MemoryStore::new();
    Seed::from_file(SEED_FILE)
        .unwrap()
        .apply(&store)
        .await
        .unwrap();
    Arc::new(store)
}

fn tokens() -> TokenIssuer {
    TokenIssuer::new("api-test-secret", Duration::from_secs(3600))
}

async fn create_test_server() -> TestServer {
    let state = AppState::new(seeded_store().await, None, tokens());
    TestServer::new(create_router(state)).unwrap()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

/// Registers a fresh account and returns its token
async fn register(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/register")
        .json(&json!({
            "name": "Sari Dewi",
            "email": email,
            "password": "rahasia123"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server().await;
    let response = server
        .get("/health")
        .add_header(
            axum::http::HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-abc-123"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-abc-123");
}

#[tokio::test]
async fn test_guest_lists() {
    let server = create_test_server().await;

    let body: Value = server.get("/api/guest/top-menu-hemat").await.json();
    assert_eq!(body["error"], false);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);

    let body: Value = server.get("/api/guest/top-andalan").await.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    // Popular is ranked by rating
    let body: Value = server.get("/api/guest/banyak-disukai").await.json();
    let popular = body["data"].as_array().unwrap();
    assert_eq!(popular.len(), 11);
    assert_eq!(popular[0]["Title Cleaned"], "Rendang Sapi");
}

#[tokio::test]
async fn test_empty_guest_list_is_not_found() {
    let state = AppState::new(Arc::new(MemoryStore::new()), None, tokens());
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server.get("/api/guest/top-andalan").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], true);
    assert_eq!(body["message"], "Recipe data not found");
}

#[tokio::test]
async fn test_search_requires_every_term() {
    let server = create_test_server().await;

    let response = server
        .get("/api/recipes")
        .add_query_param("search", "telur, cabai")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Title Cleaned"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec!["Telur Dadar Padang", "Indomie Goreng Telur Keju", "Telur Balado"]
    );
    assert_eq!(body["pagination"]["total"], 3);
}

#[tokio::test]
async fn test_search_pagination_is_clamped() {
    let server = create_test_server().await;

    let body: Value = server
        .get("/api/recipes")
        .add_query_param("page", 0)
        .add_query_param("limit", 500)
        .await
        .json();
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 50);
    assert_eq!(body["pagination"]["total"], 16);

    let body: Value = server
        .get("/api/recipes")
        .add_query_param("page", 2)
        .add_query_param("limit", 5)
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"][0]["item_id"], 6);
    assert_eq!(body["pagination"]["totalPages"], 4);
}

#[tokio::test]
async fn test_recipe_by_id() {
    let server = create_test_server().await;

    let body: Value = server.get("/api/recipes/4").await.json();
    assert_eq!(body["data"]["Title Cleaned"], "Telur Dadar Padang");

    let response = server.get("/api/recipes/999").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn test_categories_and_category_pages() {
    let server = create_test_server().await;

    let body: Value = server.get("/api/categories").await.json();
    let categories = body["data"].as_array().unwrap();
    assert_eq!(categories.len(), 8);
    let ayam = categories.iter().find(|c| c["id"] == "ayam").unwrap();
    assert_eq!(ayam["count"], 3);

    let body: Value = server
        .get("/api/recipes/category/ayam")
        .add_query_param("limit", 2)
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);

    // Slugs are matched case-insensitively
    let response = server.get("/api/recipes/category/TEMPE").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["pagination"]["limit"], 12);

    let response = server.get("/api/recipes/category/kerbau").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_and_login() {
    let server = create_test_server().await;
    register(&server, "sari@mail.com").await;

    let response = server
        .post("/api/register")
        .json(&json!({"name": "Sari Lain", "email": "SARI@mail.com", "password": "rahasia123"}))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = server
        .post("/api/login")
        .json(&json!({"email": "sari@mail.com", "password": "rahasia123"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["email"], "sari@mail.com");
    assert!(body["data"]["token"].is_string());

    let response = server
        .post("/api/login")
        .json(&json!({"email": "sari@mail.com", "password": "salah12345"}))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/login")
        .json(&json!({"email": "nobody@mail.com", "password": "rahasia123"}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_validation() {
    let server = create_test_server().await;
    let response = server
        .post("/api/register")
        .json(&json!({"name": "Sa", "email": "sari@mail.com", "password": "rahasia123"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/register")
        .json(&json!({"name": "Sari", "email": "sari@mail.com", "password": "pendek"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let server = create_test_server().await;

    for path in ["/api/preferences", "/api/bookmark", "/api/profile"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["error"], true);
    }

    let response = server
        .get("/api/profile")
        .add_header(AUTHORIZATION, bearer("not-a-token"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_preferences_lifecycle() {
    let server = create_test_server().await;
    let token = register(&server, "pref@mail.com").await;

    let response = server
        .get("/api/preferences")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let preferences = json!({
        "preferred_categories": ["ayam", " tempe ", "ayam"],
        "cooking_methods": ["goreng"],
        "skill_level": "Butuh Usaha"
    });
    let response = server
        .post("/api/preferences")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&preferences)
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["preferred_categories"], json!(["ayam", "tempe"]));
    assert_eq!(body["data"]["preferred_time"], "Siang");

    let response = server
        .post("/api/preferences")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&preferences)
        .await;
    response.assert_status_ok();

    let response = server
        .post("/api/preferences")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({"preferred_categories": ["ayam"]}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = server
        .get("/api/preferences")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(body["data"]["skill_level"], "Butuh Usaha");

    let response = server
        .delete("/api/preferences")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    let response = server
        .delete("/api/preferences")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bookmarks_lifecycle() {
    let server = create_test_server().await;
    let token = register(&server, "bookmark@mail.com").await;
    let other = register(&server, "other@mail.com").await;

    let bookmark = json!({"recipeId": "4", "title": "Telur Dadar Padang", "image": ""});
    let response = server
        .post("/api/bookmark")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&bookmark)
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(body["data"]["image"].is_null());

    let response = server
        .post("/api/bookmark")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&bookmark)
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let body: Value = server
        .get("/api/bookmark")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["recipeId"], "4");

    // Another user cannot remove it
    let response = server
        .delete(&format!("/api/bookmark/{}", id))
        .add_header(AUTHORIZATION, bearer(&other))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server
        .delete(&format!("/api/bookmark/{}", id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();

    let body: Value = server
        .get("/api/bookmark")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_profile_and_password_change() {
    let server = create_test_server().await;
    let token = register(&server, "profile@mail.com").await;

    let body: Value = server
        .get("/api/profile")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(body["data"]["name"], "Sari Dewi");
    assert!(body["data"].get("passwordHash").is_none());

    let response = server
        .put("/api/profile/password")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({"currentPassword": "salah12345", "newPassword": "barubaru123"}))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .put("/api/profile/password")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({"currentPassword": "rahasia123", "newPassword": "barubaru123"}))
        .await;
    response.assert_status_ok();

    let response = server
        .post("/api/login")
        .json(&json!({"email": "profile@mail.com", "password": "barubaru123"}))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_profile_update() {
    let server = create_test_server().await;
    let token = register(&server, "ubah@mail.com").await;
    register(&server, "dipakai@mail.com").await;

    let response = server
        .put("/api/profile")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({
            "name": "Sari Wulandari",
            "phone": "0812-3456-7890",
            "gender": "female",
            "birthDate": "1998-07-17",
            "location": " Surabaya "
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Profile updated");
    assert_eq!(body["data"]["name"], "Sari Wulandari");
    assert_eq!(body["data"]["email"], "ubah@mail.com");
    assert_eq!(body["data"]["birthDate"], "1998-07-17");
    assert_eq!(body["data"]["location"], "Surabaya");
    assert!(body["data"]["updatedAt"].is_string());

    let body: Value = server
        .get("/api/profile")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(body["data"]["phone"], "0812-3456-7890");

    // Another account's email
    let response = server
        .put("/api/profile")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({"email": "Dipakai@mail.com"}))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    for invalid in [
        json!({}),
        json!({"name": "Al"}),
        json!({"gender": "unknown"}),
        json!({"birthDate": "kemarin"}),
        json!({"phone": "123"}),
    ] {
        let response = server
            .put("/api/profile")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&invalid)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], true);
    }

    let response = server
        .put("/api/profile")
        .json(&json!({"name": "Tanpa Token"}))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_input_uses_error_envelope() {
    let server = create_test_server().await;
    let token = register(&server, "rusak@mail.com").await;

    let response = server
        .delete("/api/bookmark/bukan-uuid")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], true);
    assert!(body["message"].is_string());

    let response = server.get("/api/recipes?page=x").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], true);

    let response = server
        .post("/api/preferences")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({"preferred_categories": "ayam"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], true);

    let response = server
        .post("/api/login")
        .json(&json!(["not", "an", "object"]))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn test_home_feed_for_guest() {
    let server = create_test_server().await;
    let body: Value = server.get("/api/home").await.json();

    assert_eq!(body["error"], false);
    assert_eq!(body["data"]["guest"]["budgetMenu"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"]["guest"]["staple"][0]["id"], "4");
    assert!(body["data"].get("personalized").is_none());
}

#[tokio::test]
async fn test_home_feed_without_recommender_degrades() {
    let server = create_test_server().await;
    let token = register(&server, "home@mail.com").await;

    let body: Value = server
        .get("/api/home")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    let feed = &body["data"]["personalized"];
    assert_eq!(feed["mode"], "degraded_fallback");
    assert_eq!(feed["reason"], "service_unavailable");
    assert!(feed["error"].is_string());
    // Popular list shown as "for you"
    assert_eq!(feed["lists"]["forYou"][0]["title"], "Rendang Sapi");
}

#[tokio::test]
async fn test_home_feed_rejects_invalid_token() {
    let server = create_test_server().await;
    let response = server
        .get("/api/home")
        .add_header(AUTHORIZATION, bearer("garbage"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

/// Recommender that knows one recipe for every user
struct FixedRecommender;

#[async_trait]
impl RecommendationSource for FixedRecommender {
    async fn health(&self) -> ClientResult<()> {
        Ok(())
    }

    async fn existing_user(&self, _user_id: Uuid, _top_k: usize) -> ClientResult<Vec<Recipe>> {
        Err(ClientError::Declared {
            status: 404,
            message: "user has no history".to_string(),
        })
    }

    async fn new_user(&self, request: &NewUserRequest) -> ClientResult<Vec<Recipe>> {
        assert_eq!(request.preferred_difficulty, "Cepat & Mudah");
        Ok(vec![Recipe {
            id: "ml-7".to_string(),
            title: "Soto Lamongan".to_string(),
            image_url: None,
            category: Some("Ayam".to_string()),
            rating: Some(4.4),
            difficulty: None,
        }])
    }
}

#[tokio::test]
async fn test_home_feed_personalized() {
    let state = AppState::new(seeded_store().await, None, tokens())
        .with_recommender(Arc::new(FixedRecommender));
    let server = TestServer::new(create_router(state)).unwrap();
    let token = register(&server, "ml@mail.com").await;

    let body: Value = server
        .get("/api/home")
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .json();
    let feed = &body["data"]["personalized"];
    assert_eq!(feed["mode"], "personalized");
    assert!(feed["error"].is_null());
    assert!(feed["lists"]["forYou"].as_array().unwrap().is_empty());
    assert_eq!(feed["lists"]["similarTaste"][0]["id"], "ml-7");
    assert_eq!(feed["lists"]["topCommunity"].as_array().unwrap().len(), 5);
}
