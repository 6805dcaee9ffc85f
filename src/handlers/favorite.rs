// src/handlers/favorite.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, prelude::FromRow};

use crate::{
    error::{AppError, is_unique_violation},
    handlers::property::attach_owners,
    models::{favorite::Favorite, property::Property},
    utils::jwt::CurrentUser,
};

/// Adds a published property to the caller's favorites.
///
/// Uniqueness of the (user, property) pair is enforced by the database
/// constraint; the losing side of a concurrent double-add gets a 409
/// instead of a second row or a generic error.
pub async fn add_favorite(
    State(pool): State<PgPool>,
    Extension(current): Extension<CurrentUser>,
    Path(property_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let target: Option<i64> =
        sqlx::query_scalar("SELECT id FROM properties WHERE id = $1 AND status = 'published'")
            .bind(property_id)
            .fetch_optional(&pool)
            .await?;

    if target.is_none() {
        return Err(AppError::NotFound(
            "Property not found or not published".to_string(),
        ));
    }

    let favorite = sqlx::query_as::<_, Favorite>(
        "INSERT INTO favorites (user_id, property_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(current.id)
    .bind(property_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Property already in favorites".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": favorite,
            "message": "Added to favorites"
        })),
    ))
}

/// Removes a property from the caller's favorites.
pub async fn remove_favorite(
    State(pool): State<PgPool>,
    Extension(current): Extension<CurrentUser>,
    Path(property_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND property_id = $2")
        .bind(current.id)
        .bind(property_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Favorite not found".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Removed from favorites"
    })))
}

#[derive(Debug, FromRow)]
struct FavoriteListingRow {
    #[sqlx(flatten)]
    property: Property,
    favorited_at: chrono::DateTime<chrono::Utc>,
}

/// Lists the caller's favorites joined with their properties.
///
/// Favorites whose property is no longer published are filtered out at
/// read time, not deleted; unfavoriting later still works.
pub async fn list_favorites(
    State(pool): State<PgPool>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, FavoriteListingRow>(
        r#"
        SELECT p.*, f.created_at AS favorited_at
        FROM favorites f
        JOIN properties p ON p.id = f.property_id
        WHERE f.user_id = $1 AND p.status = 'published'
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(current.id)
    .fetch_all(&pool)
    .await?;

    let mut data = rows
        .iter()
        .map(|row| {
            let mut value = serde_json::to_value(&row.property)?;
            value["favoritedAt"] = json!(row.favorited_at);
            value["isFavorite"] = json!(true);
            Ok(value)
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let owner_ids: Vec<i64> = rows.iter().map(|row| row.property.owner_id).collect();
    attach_owners(&pool, &owner_ids, &mut data).await?;

    Ok(Json(json!({
        "success": true,
        "count": data.len(),
        "data": data
    })))
}

/// Boolean favorite check. Never errors, even for unknown properties.
pub async fn check_favorite(
    State(pool): State<PgPool>,
    Extension(current): Extension<CurrentUser>,
    Path(property_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let is_favorite: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = $1 AND property_id = $2)",
    )
    .bind(current.id)
    .bind(property_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": { "isFavorite": is_favorite }
    })))
}
