use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use super::error::{ClientError, ClientResult};
use super::retry::RetryPolicy;
use super::session::{Session, SessionContext};
use super::source::{RecipeSource, SearchPage};
use crate::models::{
    normalize_recipe, normalize_recipes, Bookmark, CategoryDetails, CategoryEntry, Envelope,
    GuestListKind, LoginResult, PreferenceSet, Recipe,
};

/// HTTP client for the backend REST API
///
/// Every response is read as an [`Envelope`]; `error: true` is a failure
/// whatever the status code says. A 401 on a request that carried the
/// session token clears the session.
#[derive(Clone)]
pub struct BackendClient {
    http_client: HttpClient,
    base_url: String,
    session: SessionContext,
    retry: RetryPolicy,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, session: SessionContext, retry: RetryPolicy) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            retry,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request built by `build`, retrying per policy, and unwraps the envelope
    async fn call<T: DeserializeOwned>(
        &self,
        authenticated: bool,
        build: impl Fn(&HttpClient) -> RequestBuilder,
    ) -> ClientResult<Envelope<T>> {
        let token = if authenticated {
            Some(self.session.token().ok_or(ClientError::Unauthorized)?)
        } else {
            None
        };

        let result = self
            .retry
            .run(|| {
                let mut request = build(&self.http_client);
                if let Some(token) = &token {
                    request = request.bearer_auth(token);
                }
                read_envelope::<T>(request)
            })
            .await;

        match result {
            Err(ClientError::Declared { status: 401, .. }) if authenticated => {
                tracing::warn!("Backend rejected the session token");
                self.session.sign_out();
                Err(ClientError::Unauthorized)
            }
            other => other,
        }
    }

    /// Data of a successful envelope; a missing payload is malformed
    fn required<T>(envelope: Envelope<T>) -> ClientResult<T> {
        envelope
            .data
            .ok_or_else(|| ClientError::Malformed("response carries no data".to_string()))
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ClientResult<Session> {
        let body = json!({ "name": name, "email": email, "password": password });
        let envelope: Envelope<LoginResult> = self
            .call(false, |http| http.post(self.url("/api/register")).json(&body))
            .await?;
        let session = Session::from(Self::required(envelope)?);
        self.session.sign_in(session.clone());
        Ok(session)
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let body = json!({ "email": email, "password": password });
        let envelope: Envelope<LoginResult> = self
            .call(false, |http| http.post(self.url("/api/login")).json(&body))
            .await?;
        let session = Session::from(Self::required(envelope)?);
        self.session.sign_in(session.clone());
        Ok(session)
    }

    pub fn logout(&self) {
        self.session.sign_out();
    }

    /// Raw recipe document, with every field the backend stores
    pub async fn recipe(&self, id: &str) -> ClientResult<Value> {
        let path = format!("/api/recipes/{}", id);
        let envelope: Envelope<Value> = self.call(false, |http| http.get(self.url(&path))).await?;
        Self::required(envelope)
    }

    pub async fn recipe_summary(&self, id: &str) -> ClientResult<Recipe> {
        let raw = self.recipe(id).await?;
        normalize_recipe(&raw)
            .ok_or_else(|| ClientError::Malformed("recipe has no identifier".to_string()))
    }

    /// Current user's preferences, `None` when none are stored
    pub async fn preferences(&self) -> ClientResult<Option<PreferenceSet>> {
        match self
            .call::<PreferenceSet>(true, |http| http.get(self.url("/api/preferences")))
            .await
        {
            Ok(envelope) => Ok(envelope.data),
            Err(ClientError::Declared { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn save_preferences(&self, preferences: &PreferenceSet) -> ClientResult<PreferenceSet> {
        let envelope: Envelope<PreferenceSet> = self
            .call(true, |http| http.post(self.url("/api/preferences")).json(preferences))
            .await?;
        Self::required(envelope)
    }

    pub async fn delete_preferences(&self) -> ClientResult<()> {
        self.call::<Value>(true, |http| http.delete(self.url("/api/preferences")))
            .await?;
        Ok(())
    }

    pub async fn bookmarks(&self) -> ClientResult<Vec<Bookmark>> {
        let envelope: Envelope<Vec<Bookmark>> = self
            .call(true, |http| http.get(self.url("/api/bookmark")))
            .await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn add_bookmark(&self, recipe: &Recipe) -> ClientResult<Bookmark> {
        let body = json!({
            "recipeId": recipe.id,
            "title": recipe.title,
            "image": recipe.image_url,
        });
        let envelope: Envelope<Bookmark> = self
            .call(true, |http| http.post(self.url("/api/bookmark")).json(&body))
            .await?;
        Self::required(envelope)
    }

    pub async fn remove_bookmark(&self, bookmark_id: Uuid) -> ClientResult<()> {
        let path = format!("/api/bookmark/{}", bookmark_id);
        self.call::<Value>(true, |http| http.delete(self.url(&path)))
            .await?;
        Ok(())
    }
}

/// Reads a response body as an envelope and applies the failure rules
async fn read_envelope<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<Envelope<T>> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    let envelope: Envelope<T> = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => return Err(ClientError::Malformed(e.to_string())),
        Err(_) => {
            return Err(ClientError::Declared {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
            })
        }
    };

    if envelope.error || !status.is_success() {
        return Err(ClientError::Declared {
            status: status.as_u16(),
            message: envelope
                .message
                .unwrap_or_else(|| "Request failed".to_string()),
        });
    }

    Ok(envelope)
}

#[async_trait]
impl RecipeSource for BackendClient {
    async fn guest_list(&self, kind: GuestListKind) -> ClientResult<Vec<Recipe>> {
        let envelope: Envelope<Vec<Value>> =
            self.call(false, |http| http.get(self.url(kind.path()))).await?;
        Ok(normalize_recipes(&envelope.data.unwrap_or_default()))
    }

    async fn search(&self, term: &str, page: u32, limit: u32) -> ClientResult<SearchPage> {
        let envelope: Envelope<Vec<Value>> = self
            .call(false, |http| {
                http.get(self.url("/api/recipes")).query(&[
                    ("search", term.to_string()),
                    ("page", page.to_string()),
                    ("limit", limit.to_string()),
                ])
            })
            .await?;
        Ok(SearchPage {
            recipes: normalize_recipes(&envelope.data.unwrap_or_default()),
            pagination: envelope.pagination,
        })
    }

    async fn categories(&self) -> ClientResult<Vec<CategoryEntry>> {
        let envelope: Envelope<Vec<CategoryDetails>> = self
            .call(false, |http| http.get(self.url("/api/categories")))
            .await?;
        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(CategoryEntry::from)
            .collect())
    }

    async fn stored_preferences(&self, user_id: Uuid) -> ClientResult<Option<PreferenceSet>> {
        // The backend resolves the user from the bearer token
        if self.session.user_id() != Some(user_id) {
            return Ok(None);
        }
        self.preferences().await
    }
}
