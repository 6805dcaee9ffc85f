// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{LoginRequest, RegisterRequest, Role, UpdateProfileRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{CurrentUser, sign_jwt},
    },
};

/// Registers a new account.
///
/// Hashes the password using Argon2 before storing it. The role defaults
/// to 'user' and is immutable afterwards. Returns 201 Created with the
/// user object (excluding the password hash) and a bearer token.
pub async fn register(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let role = payload
        .role
        .as_deref()
        .and_then(Role::parse)
        .unwrap_or(Role::User);

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password, role)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(role.as_str())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("User already exists with this email".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    let token = sign_jwt(user.id, role, &config.jwt_secret, config.jwt_expiration)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": { "user": user, "token": token },
            "message": "Registration successful"
        })),
    ))
}

/// Authenticates a user and returns a JWT token.
///
/// An unknown email, a deactivated account and a wrong password all fail
/// with 401; the first and last share one message so the response does
/// not reveal which emails are registered.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::Unauthenticated("Invalid credentials".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthenticated("Account is deactivated".to_string()));
    }

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::Unauthenticated("Invalid credentials".to_string()));
    }

    let role = Role::parse(&user.role)
        .ok_or_else(|| AppError::InternalServerError(format!("unknown role '{}'", user.role)))?;

    let token = sign_jwt(user.id, role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "success": true,
        "data": { "user": user, "token": token },
        "message": "Login successful"
    })))
}

/// Returns the current user's profile.
pub async fn me(
    State(pool): State<PgPool>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(current.id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "success": true, "data": { "user": user } })))
}

/// Updates the current user's profile. Only name and avatar are mutable;
/// email and role are fixed at registration.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    if let Some(name) = &payload.name {
        sqlx::query("UPDATE users SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(current.id)
            .execute(&pool)
            .await?;
    }

    if let Some(avatar) = &payload.avatar {
        sqlx::query("UPDATE users SET avatar = $1 WHERE id = $2")
            .bind(avatar)
            .bind(current.id)
            .execute(&pool)
            .await?;
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(current.id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "data": { "user": user },
        "message": "Profile updated successfully"
    })))
}

/// Stateless logout; the client discards its token.
pub async fn logout() -> impl IntoResponse {
    Json(json!({ "success": true, "message": "Logged out successfully" }))
}
