use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use super::error::{ClientError, ClientResult};
use super::retry::RetryPolicy;
use super::source::{NewUserRequest, RecommendationSource};
use crate::config::ClientConfig;
use crate::models::{normalize_recipes, recipe_array, Recipe};

/// HTTP client for the ML recommendation service
#[derive(Clone)]
pub struct MlClient {
    http_client: HttpClient,
    base_url: String,
    health_path: String,
    retry: RetryPolicy,
}

impl MlClient {
    pub fn new(base_url: impl Into<String>, health_path: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            http_client: HttpClient::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_path: health_path.into(),
            retry,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.ml_service_url.clone(),
            config.ml_health_path.clone(),
            config.retry_policy(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and extracts the recipe array from whatever shape the service returns
    async fn recommendations(
        &self,
        build: impl Fn(&HttpClient) -> RequestBuilder,
    ) -> ClientResult<Vec<Recipe>> {
        let payload = self
            .retry
            .run(|| read_json(build(&self.http_client)))
            .await?;
        Ok(normalize_recipes(&recipe_array(&payload)))
    }
}

/// Reads a JSON body; a failing status becomes `Declared` with the service's own message if it gave one
async fn read_json(request: RequestBuilder) -> ClientResult<Value> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|v| {
                ["message", "error"]
                    .iter()
                    .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
            })
            .unwrap_or_else(|| format!("ML service returned status {}", status));
        return Err(ClientError::Declared {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&body).map_err(|e| ClientError::Malformed(e.to_string()))
}

#[async_trait]
impl RecommendationSource for MlClient {
    async fn health(&self) -> ClientResult<()> {
        let response = self
            .http_client
            .get(self.url(&self.health_path))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::Declared {
                status: response.status().as_u16(),
                message: "ML service is unhealthy".to_string(),
            })
        }
    }

    async fn existing_user(&self, user_id: Uuid, top_k: usize) -> ClientResult<Vec<Recipe>> {
        let path = format!("/api/recommendations/existing-user/{}", user_id);
        self.recommendations(|http| http.get(self.url(&path)).query(&[("top_k", top_k)]))
            .await
    }

    async fn new_user(&self, request: &NewUserRequest) -> ClientResult<Vec<Recipe>> {
        self.recommendations(|http| {
            http.post(self.url("/api/recommendations/new-user"))
                .json(request)
        })
        .await
    }
}
