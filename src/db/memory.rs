use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{Collection, DocumentPage, RecipeFilter, Store, StoredDocument};
use crate::{
    error::{AppError, AppResult},
    models::{Bookmark, PageRequest, PreferenceSet, ProfileUpdate, User},
};

/// Store kept entirely in process memory
///
/// Used when no database is configured, and by the API tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

/// Documents in ingest order plus an id index into them
#[derive(Default)]
struct DocumentSet {
    docs: Vec<StoredDocument>,
    positions: HashMap<String, usize>,
}

impl DocumentSet {
    /// Replaces a document with the same id in place, otherwise appends
    fn upsert(&mut self, doc: StoredDocument) {
        match self.positions.get(&doc.id) {
            Some(&position) => self.docs[position] = doc,
            None => {
                self.positions.insert(doc.id.clone(), self.docs.len());
                self.docs.push(doc);
            }
        }
    }

    fn get(&self, id: &str) -> Option<&StoredDocument> {
        self.positions.get(id).map(|&position| &self.docs[position])
    }
}

#[derive(Default)]
struct MemoryStoreInner {
    collections: HashMap<Collection, DocumentSet>,
    users: HashMap<Uuid, User>,
    preferences: HashMap<Uuid, PreferenceSet>,
    bookmarks: Vec<Bookmark>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_of(documents: Vec<&StoredDocument>, page: PageRequest) -> DocumentPage {
    let total = documents.len() as u64;
    let items = documents
        .into_iter()
        .skip(page.offset())
        .take(page.limit as usize)
        .map(|doc| doc.document.clone())
        .collect();
    DocumentPage { items, total }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ingest(&self, collection: &Collection, documents: Vec<Value>) -> AppResult<usize> {
        let stored: Vec<StoredDocument> = documents
            .into_iter()
            .filter_map(StoredDocument::from_raw)
            .collect();
        let kept = stored.len();

        let mut inner = self.inner.write().await;
        let set = inner.collections.entry(collection.clone()).or_default();
        for doc in stored {
            set.upsert(doc);
        }
        Ok(kept)
    }

    async fn documents(&self, collection: &Collection) -> AppResult<Vec<Value>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(collection)
            .map(|set| set.docs.iter().map(|doc| doc.document.clone()).collect())
            .unwrap_or_default())
    }

    async fn document_page(
        &self,
        collection: &Collection,
        page: PageRequest,
    ) -> AppResult<DocumentPage> {
        let inner = self.inner.read().await;
        let documents = inner
            .collections
            .get(collection)
            .map(|set| set.docs.iter().collect())
            .unwrap_or_default();
        Ok(page_of(documents, page))
    }

    async fn count(&self, collection: &Collection) -> AppResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(collection)
            .map_or(0, |set| set.docs.len() as u64))
    }

    async fn top_rated(&self, limit: usize) -> AppResult<Vec<Value>> {
        let inner = self.inner.read().await;
        let mut documents: Vec<&StoredDocument> = inner
            .collections
            .get(&Collection::TopRated)
            .map(|set| set.docs.iter().collect())
            .unwrap_or_default();
        // Stable sort keeps ingest order among equal ratings; unrated last
        documents.sort_by(|a, b| {
            let a = a.rating.unwrap_or(f64::NEG_INFINITY);
            let b = b.rating.unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        });
        Ok(documents
            .into_iter()
            .take(limit)
            .map(|doc| doc.document.clone())
            .collect())
    }

    async fn search_recipes(
        &self,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> AppResult<DocumentPage> {
        let inner = self.inner.read().await;
        let matching = inner
            .collections
            .get(&Collection::Recipes)
            .map(|set| set.docs.iter().filter(|doc| doc.matches(filter)).collect())
            .unwrap_or_default();
        Ok(page_of(matching, page))
    }

    async fn recipe_by_id(&self, id: &str) -> AppResult<Option<Value>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&Collection::Recipes)
            .and_then(|set| set.get(id))
            .map(|doc| doc.document.clone()))
    }

    async fn create_user(&self, user: &User) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        if let Some(email) = &update.email {
            if inner.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(AppError::Conflict(
                    "Email is already used by another account".to_string(),
                ));
            }
        }
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.apply(update);
        Ok(user.clone())
    }

    async fn preferences(&self, user_id: Uuid) -> AppResult<Option<PreferenceSet>> {
        let inner = self.inner.read().await;
        Ok(inner.preferences.get(&user_id).cloned())
    }

    async fn save_preferences(
        &self,
        user_id: Uuid,
        preferences: &PreferenceSet,
    ) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .preferences
            .insert(user_id, preferences.clone())
            .is_none())
    }

    async fn delete_preferences(&self, user_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.preferences.remove(&user_id).is_some())
    }

    async fn bookmarks(&self, user_id: Uuid) -> AppResult<Vec<Bookmark>> {
        let inner = self.inner.read().await;
        let mut bookmarks: Vec<Bookmark> = inner
            .bookmarks
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookmarks)
    }

    async fn add_bookmark(&self, bookmark: &Bookmark) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if inner
            .bookmarks
            .iter()
            .any(|b| b.user_id == bookmark.user_id && b.recipe_id == bookmark.recipe_id)
        {
            return Err(AppError::Conflict("Recipe is already bookmarked".to_string()));
        }
        inner.bookmarks.push(bookmark.clone());
        Ok(())
    }

    async fn remove_bookmark(&self, user_id: Uuid, bookmark_id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.bookmarks.len();
        inner
            .bookmarks
            .retain(|b| !(b.id == bookmark_id && b.user_id == user_id));
        Ok(inner.bookmarks.len() < before)
    }
}
