// src/models/favorite.rs

use serde::Serialize;
use sqlx::prelude::FromRow;

/// Represents the 'favorites' table: a (user, property) join row.
/// Uniqueness of the pair is enforced by a database constraint.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub property_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
