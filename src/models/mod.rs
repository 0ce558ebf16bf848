use serde::{Deserialize, Serialize};

pub mod bookmark;
pub mod category;
pub mod guest;
pub mod preferences;
pub mod recipe;
pub mod user;

pub use bookmark::{Bookmark, CreateBookmarkRequest};
pub use category::{CategoryDetails, CategoryEntry, CATEGORY_CATALOG};
pub use guest::GuestListKind;
pub use preferences::{PreferenceSet, SavePreferencesRequest, SkillLevel, TimeOfDay};
pub use recipe::{normalize_recipe, normalize_recipes, recipe_array, Recipe, SearchTerms};
pub use user::{Claims, LoginResult, ProfileUpdate, User, UserProfile};

/// Response envelope shared by every backend endpoint
///
/// Consumers treat `error: true` as the authoritative failure signal
/// regardless of the HTTP status code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            error: false,
            message: None,
            data: Some(data),
            pagination: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: false,
            message: Some(message.into()),
            data: None,
            pagination: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64)
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Page request with the backend's clamping rules applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const MAX_LIMIT: u32 = 50;

    /// Page is at least 1; a missing or non-positive limit falls back to `default_limit`.
    pub fn clamp(page: Option<i64>, limit: Option<i64>, default_limit: u32) -> Self {
        let page = page.unwrap_or(1).max(1).min(u32::MAX as i64) as u32;
        let limit = match limit {
            Some(l) if l > 0 => l.min(Self::MAX_LIMIT as i64) as u32,
            _ => default_limit,
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_skips_absent_fields() {
        let json = serde_json::to_value(Envelope::message("Bookmark removed")).unwrap();
        assert_eq!(json, serde_json::json!({"error": false, "message": "Bookmark removed"}));
    }

    #[test]
    fn test_envelope_declared_error_parses_without_data() {
        let env: Envelope<Vec<String>> =
            serde_json::from_str(r#"{"error": true, "message": "Recipe data not found"}"#).unwrap();
        assert!(env.error);
        assert!(env.data.is_none());
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct NoDefault {
        id: u32,
    }

    #[test]
    fn test_envelope_decodes_payload_without_default() {
        let env: Envelope<NoDefault> = serde_json::from_str(
            r#"{"error": false, "data": {"id": 7}, "pagination": {"page": 1, "limit": 20, "total": 1, "totalPages": 1}}"#,
        )
        .unwrap();
        assert_eq!(env.data, Some(NoDefault { id: 7 }));
        assert_eq!(env.pagination.unwrap().total_pages, 1);

        let bare: Envelope<NoDefault> = serde_json::from_str(r#"{"error": false}"#).unwrap();
        assert!(bare.data.is_none());
        assert!(bare.pagination.is_none());
    }

    #[test]
    fn test_pagination_total_pages() {
        let p = Pagination::new(2, 20, 41);
        assert_eq!(p.total_pages, 3);
        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json["totalPages"], 3);
    }

    #[test]
    fn test_page_request_clamping() {
        assert_eq!(PageRequest::clamp(None, None, 50), PageRequest { page: 1, limit: 50 });
        assert_eq!(PageRequest::clamp(Some(0), Some(500), 50), PageRequest { page: 1, limit: 50 });
        assert_eq!(PageRequest::clamp(Some(3), Some(-2), 12), PageRequest { page: 3, limit: 12 });
        assert_eq!(PageRequest::clamp(Some(2), Some(10), 12).offset(), 10);
    }
}
