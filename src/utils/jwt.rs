// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::user::Role, state::AppState};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// User's role ('user', 'owner' or 'admin').
    pub role: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// The verified caller of a request. Resolved once by the auth middleware
/// and passed to handlers as a request extension, never ambient state.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

/// Signs a new JWT for the user.
pub fn sign_jwt(
    id: i64,
    role: Role,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        role: role.as_str().to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthenticated("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
}

/// Verifies a token and resolves its subject to an existing, active user.
/// A token whose subject no longer exists is rejected; an unknown role in
/// the database fails closed.
async fn resolve_user(state: &AppState, token: &str) -> Result<CurrentUser, AppError> {
    let claims = verify_jwt(token, &state.config.jwt_secret)?;

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthenticated("Invalid token".to_string()))?;

    let row = sqlx::query_as::<_, (String, bool)>("SELECT role, is_active FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::Unauthenticated("User not found".to_string()))?;

    let (role, is_active) = row;

    if !is_active {
        return Err(AppError::Unauthenticated("Account is deactivated".to_string()));
    }

    let role = Role::parse(&role)
        .ok_or_else(|| AppError::InternalServerError(format!("unknown role '{}'", role)))?;

    Ok(CurrentUser { id: user_id, role })
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header
/// and resolves the subject against the identity store. On success injects
/// `CurrentUser` into the request extensions; otherwise returns 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)
        .ok_or(AppError::Unauthenticated("Not authorized: no token".to_string()))?;

    let current_user = resolve_user(&state, token).await?;
    req.extensions_mut().insert(current_user);

    Ok(next.run(req).await)
}

/// Axum Middleware: Optional Authentication.
///
/// Used by public read paths that behave differently for logged-in callers
/// (draft visibility, favorite enrichment). A missing or invalid token is
/// not an error; the request simply proceeds anonymously.
pub async fn authenticate_optional(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&req) {
        if let Ok(current_user) = resolve_user(&state, token).await {
            req.extensions_mut().insert(current_user);
        }
    }

    next.run(req).await
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `authenticate`. Exhaustive on `Role`, so a future
/// role variant cannot silently pass.
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let current = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::Unauthenticated("Not authenticated".to_string()))?;

    match current.role {
        Role::Admin => Ok(next.run(req).await),
        Role::Owner | Role::User => {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// Axum Middleware: Owner-role Authorization.
///
/// Gates listing creation and the my-properties view. Resource-ownership
/// checks stay in the handlers, which have the loaded resource.
pub async fn require_owner_role(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let current = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::Unauthenticated("Not authenticated".to_string()))?;

    match current.role {
        Role::Owner => Ok(next.run(req).await),
        Role::Admin | Role::User => Err(AppError::Forbidden(
            "Only property owners can perform this action".to_string(),
        )),
    }
}
