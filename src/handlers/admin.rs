// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::PgPool;

use crate::{
    error::AppError,
    handlers::property::fetch_property,
    models::{
        property::{ArchiveReason, Property, ToggleAction},
        user::User,
    },
};

/// System metrics: user counts by role, property counts by status and the
/// five most recent listings.
/// Admin only.
pub async fn get_metrics(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let user_counts: Vec<(String, i64)> =
        sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role")
            .fetch_all(&pool)
            .await?;

    let property_counts: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM properties GROUP BY status")
            .fetch_all(&pool)
            .await?;

    let recent_properties: Vec<Property> =
        sqlx::query_as("SELECT * FROM properties ORDER BY created_at DESC LIMIT 5")
            .fetch_all(&pool)
            .await?;

    let users_total: i64 = user_counts.iter().map(|(_, count)| count).sum();
    let by_role: serde_json::Map<String, Value> = user_counts
        .into_iter()
        .map(|(role, count)| (role, json!(count)))
        .collect();

    let properties_total: i64 = property_counts.iter().map(|(_, count)| count).sum();
    let by_status: serde_json::Map<String, Value> = property_counts
        .into_iter()
        .map(|(status, count)| (status, json!(count)))
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": {
            "users": { "total": users_total, "byRole": by_role },
            "properties": { "total": properties_total, "byStatus": by_status },
            "recentProperties": recent_properties,
        }
    })))
}

/// Lists all users, newest first. Password hashes never serialize.
/// Admin only.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users: Vec<User> = sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(json!({
        "success": true,
        "count": users.len(),
        "data": users
    })))
}

/// Lists all properties regardless of status, newest first.
/// Admin only.
pub async fn list_properties(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let properties: Vec<Property> =
        sqlx::query_as("SELECT * FROM properties ORDER BY created_at DESC")
            .fetch_all(&pool)
            .await?;

    Ok(Json(json!({
        "success": true,
        "count": properties.len(),
        "data": properties
    })))
}

/// DTO for the moderation toggle.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub action: String,
}

/// Disables or re-enables a listing.
///
/// Disable forces status to archived and records the admin as the cause.
/// Enable restores published status without re-checking publish
/// preconditions; `published_at` is backfilled if the listing was never
/// published, keeping the published-implies-timestamp invariant.
/// Admin only.
pub async fn toggle_property(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<ToggleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let action = ToggleAction::parse(&payload.action).ok_or_else(|| {
        AppError::Validation("Invalid action. Use \"disable\" or \"enable\"".to_string())
    })?;

    let property = fetch_property(&pool, id).await?;

    let (result, message) = match action {
        ToggleAction::Disable => {
            let result = sqlx::query(
                r#"
                UPDATE properties
                SET status = 'archived', archived_reason = $1, is_active = FALSE,
                    updated_at = NOW(), version = version + 1
                WHERE id = $2 AND version = $3
                "#,
            )
            .bind(ArchiveReason::AdminDisable.as_str())
            .bind(id)
            .bind(property.version)
            .execute(&pool)
            .await?;
            (result, "Property disabled successfully")
        }
        ToggleAction::Enable => {
            let result = sqlx::query(
                r#"
                UPDATE properties
                SET status = 'published', archived_reason = NULL, is_active = TRUE,
                    published_at = COALESCE(published_at, NOW()),
                    updated_at = NOW(), version = version + 1
                WHERE id = $1 AND version = $2
                "#,
            )
            .bind(id)
            .bind(property.version)
            .execute(&pool)
            .await?;
            (result, "Property enabled successfully")
        }
    };

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Property was modified concurrently".to_string(),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": message
    })))
}
