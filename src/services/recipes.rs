use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    cached,
    client::{ClientError, ClientResult, RecipeSource, SearchPage},
    db::{Cache, CacheKey, Collection, RecipeFilter, Store},
    error::{AppError, AppResult},
    models::{
        category::find_category, normalize_recipes, CategoryDetails, CategoryEntry, GuestListKind,
        PageRequest, Pagination, PreferenceSet, Recipe, CATEGORY_CATALOG,
    },
};

const GUEST_LIST_CACHE_TTL: u64 = 3600; // 1 hour
const CATEGORY_CACHE_TTL: u64 = 3600;

/// Default page size of a category listing
pub const CATEGORY_PAGE_SIZE: u32 = 12;

/// Raw documents of one page plus its pagination block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipePage {
    pub items: Vec<Value>,
    pub pagination: Pagination,
}

/// Read side of the recipe data: guest lists, search, categories
#[derive(Clone)]
pub struct RecipeService {
    store: Arc<dyn Store>,
    cache: Option<Cache>,
}

impl RecipeService {
    pub fn new(store: Arc<dyn Store>, cache: Option<Cache>) -> Self {
        Self { store, cache }
    }

    /// Raw documents of a guest list. An empty list is `NotFound`.
    pub async fn guest_list(&self, kind: GuestListKind) -> AppResult<Vec<Value>> {
        let documents = self.cached_guest_list(kind).await?;
        if documents.is_empty() {
            return Err(AppError::NotFound("Recipe data not found".to_string()));
        }
        Ok(documents)
    }

    async fn cached_guest_list(&self, kind: GuestListKind) -> AppResult<Vec<Value>> {
        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::GuestList(kind),
                GUEST_LIST_CACHE_TTL,
                self.load_guest_list(kind)
            ),
            None => self.load_guest_list(kind).await,
        }
    }

    async fn load_guest_list(&self, kind: GuestListKind) -> AppResult<Vec<Value>> {
        if kind == GuestListKind::Popular {
            return self.store.top_rated(GuestListKind::POPULAR_LIMIT).await;
        }

        let mut documents = Vec::new();
        for section in kind.sections() {
            documents.extend(
                self.store
                    .documents(&Collection::Section(section.to_string()))
                    .await?,
            );
        }
        Ok(documents)
    }

    pub async fn search(
        &self,
        search: Option<&str>,
        category: Option<&str>,
        page: PageRequest,
    ) -> AppResult<RecipePage> {
        let filter = RecipeFilter::new(search, category);
        let result = self.store.search_recipes(&filter, page).await?;
        tracing::debug!(
            terms = ?filter.terms.terms(),
            total = result.total,
            "Recipe search"
        );
        Ok(RecipePage {
            items: result.items,
            pagination: Pagination::new(page.page, page.limit, result.total),
        })
    }

    pub async fn recipe(&self, id: &str) -> AppResult<Value> {
        self.store
            .recipe_by_id(id.trim())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))
    }

    /// Catalog categories that have at least one recipe
    pub async fn categories(&self) -> AppResult<Vec<CategoryDetails>> {
        match &self.cache {
            Some(cache) => cached!(cache, CacheKey::Categories, CATEGORY_CACHE_TTL, self.load_categories()),
            None => self.load_categories().await,
        }
    }

    async fn load_categories(&self) -> AppResult<Vec<CategoryDetails>> {
        let mut categories = Vec::new();
        for info in CATEGORY_CATALOG {
            let count = self
                .store
                .count(&Collection::Category(info.id.to_string()))
                .await?;
            if count > 0 {
                categories.push(CategoryDetails::from_catalog(info, count));
            }
        }
        Ok(categories)
    }

    pub async fn category_recipes(&self, category: &str, page: PageRequest) -> AppResult<RecipePage> {
        let info = find_category(category)
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid category: {}", category)))?;

        let result = self.cached_category_page(info.id, page).await?;
        if result.pagination.total == 0 {
            return Err(AppError::NotFound(format!(
                "No recipes found for category {}",
                info.id
            )));
        }
        Ok(result)
    }

    async fn cached_category_page(&self, slug: &str, page: PageRequest) -> AppResult<RecipePage> {
        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::CategoryPage {
                    slug: slug.to_string(),
                    page: page.page,
                    limit: page.limit,
                },
                CATEGORY_CACHE_TTL,
                self.load_category_page(slug, page)
            ),
            None => self.load_category_page(slug, page).await,
        }
    }

    async fn load_category_page(&self, slug: &str, page: PageRequest) -> AppResult<RecipePage> {
        let result = self
            .store
            .document_page(&Collection::Category(slug.to_string()), page)
            .await?;
        Ok(RecipePage {
            items: result.items,
            pagination: Pagination::new(page.page, page.limit, result.total),
        })
    }
}

impl From<AppError> for ClientError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound(message) => ClientError::Declared { status: 404, message },
            AppError::InvalidInput(message) => ClientError::Declared { status: 400, message },
            AppError::Conflict(message) => ClientError::Declared { status: 409, message },
            AppError::Unauthorized(_) => ClientError::Unauthorized,
            other => ClientError::Declared {
                status: 500,
                message: other.to_string(),
            },
        }
    }
}

/// Lets the aggregation core run in-process against the store
#[async_trait]
impl RecipeSource for RecipeService {
    async fn guest_list(&self, kind: GuestListKind) -> ClientResult<Vec<Recipe>> {
        let documents = RecipeService::guest_list(self, kind).await?;
        Ok(normalize_recipes(&documents))
    }

    async fn search(&self, term: &str, page: u32, limit: u32) -> ClientResult<SearchPage> {
        let request = PageRequest::clamp(Some(page as i64), Some(limit as i64), PageRequest::MAX_LIMIT);
        let result = RecipeService::search(self, Some(term), None, request).await?;
        Ok(SearchPage {
            recipes: normalize_recipes(&result.items),
            pagination: Some(result.pagination),
        })
    }

    async fn categories(&self) -> ClientResult<Vec<CategoryEntry>> {
        let categories = RecipeService::categories(self).await?;
        Ok(categories.into_iter().map(CategoryEntry::from).collect())
    }

    async fn stored_preferences(&self, user_id: Uuid) -> ClientResult<Option<PreferenceSet>> {
        Ok(self.store.preferences(user_id).await?)
    }
}
