use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved recipe with the title and image captured when it was bookmarked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipe_id: String,
    pub title: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(user_id: Uuid, request: CreateBookmarkRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            recipe_id: request.recipe_id.trim().to_string(),
            title: request.title.trim().to_string(),
            image: request.image.filter(|url| !url.trim().is_empty()),
            created_at: Utc::now(),
        }
    }
}

/// Body of `POST /api/bookmark`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkRequest {
    pub recipe_id: String,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CreateBookmarkRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.recipe_id.trim().is_empty() {
            return Err("recipeId is required".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bookmark_snapshot() {
        let user_id = Uuid::new_v4();
        let bookmark = Bookmark::new(
            user_id,
            CreateBookmarkRequest {
                recipe_id: " 42 ".to_string(),
                title: "Nasi Goreng".to_string(),
                image: Some("".to_string()),
            },
        );
        assert_eq!(bookmark.user_id, user_id);
        assert_eq!(bookmark.recipe_id, "42");
        assert_eq!(bookmark.image, None);
    }

    #[test]
    fn test_validate_requires_recipe_id() {
        let request = CreateBookmarkRequest {
            recipe_id: "  ".to_string(),
            title: "Soto".to_string(),
            image: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let bookmark = Bookmark::new(
            Uuid::new_v4(),
            CreateBookmarkRequest {
                recipe_id: "7".to_string(),
                title: "Pecel".to_string(),
                image: None,
            },
        );
        let json = serde_json::to_value(&bookmark).unwrap();
        assert_eq!(json["recipeId"], "7");
        assert!(json.get("createdAt").is_some());
    }
}
