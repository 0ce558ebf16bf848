use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use crate::{
    auth::{hash_password, verify_password, TokenIssuer},
    db::Store,
    error::{AppError, AppResult},
    models::{LoginResult, ProfileUpdate, User, UserProfile},
};

const MIN_NAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 8;
const GENDERS: &[&str] = &["male", "female", "other"];

fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().chars().count() < MIN_NAME_LEN {
            return Err(format!("Name must be at least {} characters", MIN_NAME_LEN));
        }
        if !is_valid_email(self.email.trim()) {
            return Err("Email is not valid".to_string());
        }
        validate_password(&self.password)
    }
}

fn is_valid_phone(phone: &str) -> bool {
    static PHONE: OnceLock<Option<Regex>> = OnceLock::new();
    PHONE
        .get_or_init(|| Regex::new(r"^[\d\s\-+()]{10,15}$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(phone))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp
fn parse_birth_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.date_naive()))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Partial profile change. Absent fields are left alone; blank email, phone,
/// gender and birth date are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub location: Option<String>,
    pub photo: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(self) -> Result<ProfileUpdate, String> {
        let mut update = ProfileUpdate::default();

        if let Some(name) = self.name {
            let name = name.trim();
            if name.chars().count() < MIN_NAME_LEN {
                return Err(format!("Name must be at least {} characters", MIN_NAME_LEN));
            }
            update.name = Some(name.to_string());
        }

        if let Some(email) = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            if !is_valid_email(email) {
                return Err("Email is not valid".to_string());
            }
            update.email = Some(email.to_lowercase());
        }

        if let Some(phone) = self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            if !is_valid_phone(phone) {
                return Err("Phone number is not valid".to_string());
            }
            update.phone = Some(phone.to_string());
        }

        if let Some(gender) = self.gender.filter(|g| !g.is_empty()) {
            if !GENDERS.contains(&gender.as_str()) {
                return Err("Gender must be one of male, female, other".to_string());
            }
            update.gender = Some(gender);
        }

        if let Some(birth_date) = self.birth_date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            update.birth_date =
                Some(parse_birth_date(birth_date).ok_or("Birth date is not valid")?);
        }

        update.location = self.location.map(|l| l.trim().to_string());
        update.photo = self.photo;

        if update.is_empty() {
            return Err("No changes to update".to_string());
        }
        Ok(update)
    }
}

fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    Ok(())
}

/// Registration, login and password management
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    tokens: TokenIssuer,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    fn login_result(&self, user: &User) -> AppResult<LoginResult> {
        Ok(LoginResult {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            token: self.tokens.issue(user)?,
        })
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<LoginResult> {
        request.validate().map_err(AppError::InvalidInput)?;

        let password_hash = hash_password(request.password).await?;
        let user = User::new(request.name.trim().to_string(), request.email, password_hash);
        self.store.create_user(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.login_result(&user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResult> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }

        let user = self
            .store
            .user_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("No account with this email".to_string()))?;

        if !verify_password(request.password, user.password_hash.clone()).await? {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::Unauthorized("Wrong password".to_string()));
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.login_result(&user)
    }

    pub async fn profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(UserProfile::from(&user))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> AppResult<UserProfile> {
        let update = request.validate().map_err(AppError::InvalidInput)?;
        let user = self.store.update_profile(user_id, &update).await?;
        tracing::info!(user_id = %user_id, "Profile updated");
        Ok(UserProfile::from(&user))
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> AppResult<()> {
        validate_password(&request.new_password).map_err(AppError::InvalidInput)?;

        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !verify_password(request.current_password, user.password_hash.clone()).await? {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_password(request.new_password).await?;
        self.store.update_password(user_id, &password_hash).await?;
        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
