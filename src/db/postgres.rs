use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use super::store::{Collection, DocumentPage, RecipeFilter, Store, StoredDocument};
use crate::{
    error::{AppError, AppResult},
    models::{Bookmark, PageRequest, PreferenceSet, ProfileUpdate, User},
};

const USER_COLUMNS: &str = "id, name, email, password_hash, phone, gender, birth_date, \
     location, photo, created_at, updated_at";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Maps a unique-constraint violation to `Conflict`, anything else to `Database`
fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ingest(&self, collection: &Collection, documents: Vec<Value>) -> AppResult<usize> {
        let collection = collection.to_string();
        let mut tx = self.pool.begin().await?;
        let mut kept = 0;

        for doc in documents.into_iter().filter_map(StoredDocument::from_raw) {
            sqlx::query(
                r#"
                INSERT INTO recipe_documents (collection, id, title_text, ingredients_text, rating, document)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (collection, id) DO UPDATE
                SET title_text = EXCLUDED.title_text,
                    ingredients_text = EXCLUDED.ingredients_text,
                    rating = EXCLUDED.rating,
                    document = EXCLUDED.document
                "#,
            )
            .bind(&collection)
            .bind(&doc.id)
            .bind(&doc.title_text)
            .bind(&doc.ingredients_text)
            .bind(doc.rating)
            .bind(&doc.document)
            .execute(&mut *tx)
            .await?;
            kept += 1;
        }

        tx.commit().await?;
        Ok(kept)
    }

    async fn documents(&self, collection: &Collection) -> AppResult<Vec<Value>> {
        let rows: Vec<(Value,)> = sqlx::query_as(
            "SELECT document FROM recipe_documents WHERE collection = $1 ORDER BY position",
        )
        .bind(collection.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(doc,)| doc).collect())
    }

    async fn document_page(
        &self,
        collection: &Collection,
        page: PageRequest,
    ) -> AppResult<DocumentPage> {
        let collection = collection.to_string();
        let total = self.count_raw(&collection).await?;
        let rows: Vec<(Value,)> = sqlx::query_as(
            r#"
            SELECT document FROM recipe_documents
            WHERE collection = $1
            ORDER BY position
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&collection)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(DocumentPage {
            items: rows.into_iter().map(|(doc,)| doc).collect(),
            total,
        })
    }

    async fn count(&self, collection: &Collection) -> AppResult<u64> {
        self.count_raw(&collection.to_string()).await
    }

    async fn top_rated(&self, limit: usize) -> AppResult<Vec<Value>> {
        let rows: Vec<(Value,)> = sqlx::query_as(
            r#"
            SELECT document FROM recipe_documents
            WHERE collection = $1
            ORDER BY rating DESC NULLS LAST, position
            LIMIT $2
            "#,
        )
        .bind(Collection::TopRated.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(doc,)| doc).collect())
    }

    async fn search_recipes(
        &self,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> AppResult<DocumentPage> {
        // Every term must appear in the title or the ingredients
        const MATCH: &str = r#"
            collection = $1
            AND NOT EXISTS (
                SELECT 1 FROM unnest($2::text[]) AS term
                WHERE strpos(title_text, term) = 0 AND strpos(ingredients_text, term) = 0
            )
            AND ($3::text IS NULL OR strpos(ingredients_text, $3) > 0)
        "#;

        let collection = Collection::Recipes.to_string();
        let terms = filter.terms.terms().to_vec();

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM recipe_documents WHERE {}", MATCH))
                .bind(&collection)
                .bind(&terms)
                .bind(&filter.category)
                .fetch_one(&self.pool)
                .await?;

        let rows: Vec<(Value,)> = sqlx::query_as(&format!(
            "SELECT document FROM recipe_documents WHERE {} ORDER BY position LIMIT $4 OFFSET $5",
            MATCH
        ))
        .bind(&collection)
        .bind(&terms)
        .bind(&filter.category)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(DocumentPage {
            items: rows.into_iter().map(|(doc,)| doc).collect(),
            total: total.max(0) as u64,
        })
    }

    async fn recipe_by_id(&self, id: &str) -> AppResult<Option<Value>> {
        let row: Option<(Value,)> =
            sqlx::query_as("SELECT document FROM recipe_documents WHERE collection = $1 AND id = $2")
                .bind(Collection::Recipes.to_string())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(doc,)| doc))
    }

    async fn create_user(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email is already registered"))?;
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                email = COALESCE($3, email), \
                phone = COALESCE($4, phone), \
                gender = COALESCE($5, gender), \
                birth_date = COALESCE($6, birth_date), \
                location = COALESCE($7, location), \
                photo = COALESCE($8, photo), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.gender)
        .bind(update.birth_date)
        .bind(&update.location)
        .bind(&update.photo)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email is already used by another account"))?;

        user.ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn preferences(&self, user_id: Uuid) -> AppResult<Option<PreferenceSet>> {
        let row: Option<(Json<PreferenceSet>,)> =
            sqlx::query_as("SELECT preferences FROM user_preferences WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(prefs),)| prefs))
    }

    async fn save_preferences(
        &self,
        user_id: Uuid,
        preferences: &PreferenceSet,
    ) -> AppResult<bool> {
        // xmax is 0 only for freshly inserted rows
        let (created,): (bool,) = sqlx::query_as(
            r#"
            INSERT INTO user_preferences (user_id, preferences, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE
            SET preferences = EXCLUDED.preferences, updated_at = NOW()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(user_id)
        .bind(Json(preferences))
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn delete_preferences(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM user_preferences WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn bookmarks(&self, user_id: Uuid) -> AppResult<Vec<Bookmark>> {
        let bookmarks = sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, recipe_id, title, image, created_at
            FROM bookmarks
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookmarks)
    }

    async fn add_bookmark(&self, bookmark: &Bookmark) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookmarks (id, user_id, recipe_id, title, image, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(bookmark.id)
        .bind(bookmark.user_id)
        .bind(&bookmark.recipe_id)
        .bind(&bookmark.title)
        .bind(&bookmark.image)
        .bind(bookmark.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Recipe is already bookmarked"))?;
        Ok(())
    }

    async fn remove_bookmark(&self, user_id: Uuid, bookmark_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = $1 AND user_id = $2")
            .bind(bookmark_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl PgStore {
    async fn count_raw(&self, collection: &str) -> AppResult<u64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM recipe_documents WHERE collection = $1")
                .bind(collection)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }
}
