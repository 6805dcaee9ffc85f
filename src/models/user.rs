// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

/// Closed set of account roles. Stored as TEXT in the database and parsed
/// at the boundary so authorization logic can match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Owner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Owner => "owner",
            Role::Admin => "admin",
        }
    }

    /// Parses a stored role string. Unknown values yield `None` so callers
    /// fail closed instead of granting access on a typo.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique email address.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Account role: 'user', 'owner' or 'admin'. Immutable after creation.
    pub role: String,

    pub is_active: bool,

    pub avatar: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Public subset of a user, embedded as the `owner` object in listing
/// responses. Never carries the password hash or activity flag.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OwnerSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// DTO for creating a new account (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 2,
        max = 50,
        message = "Name length must be between 2 and 50 characters."
    ))]
    pub name: String,
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,
    /// Defaults to 'user' when absent.
    #[validate(custom(function = validate_role))]
    pub role: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// DTO for profile updates. Only name and avatar are mutable.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(
        min = 2,
        max = 50,
        message = "Name length must be between 2 and 50 characters."
    ))]
    pub name: Option<String>,
    #[validate(custom(function = validate_url_string))]
    pub avatar: Option<String>,
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    if Role::parse(role).is_none() {
        return Err(validator::ValidationError::new("invalid_role"));
    }
    Ok(())
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
