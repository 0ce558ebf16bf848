use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub location: Option<String>,
    /// Photo URL or data URI
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: email.trim().to_lowercase(),
            password_hash,
            phone: None,
            gender: None,
            birth_date: None,
            location: None,
            photo: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Applies a validated profile change and stamps `updated_at`
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
        if let Some(phone) = &update.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(gender) = &update.gender {
            self.gender = Some(gender.clone());
        }
        if let Some(birth_date) = update.birth_date {
            self.birth_date = Some(birth_date);
        }
        if let Some(location) = &update.location {
            self.location = Some(location.clone());
        }
        if let Some(photo) = &update.photo {
            self.photo = Some(photo.clone());
        }
        self.updated_at = Some(Utc::now());
    }
}

/// Validated set of profile fields to change; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    /// Lower-cased
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub photo: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// User as exposed over the API, without credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            gender: user.gender.clone(),
            birth_date: user.birth_date,
            location: user.location.clone(),
            photo: user.photo.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Token claims: who the bearer is and until when
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Returned by register and login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub token: String,
}
