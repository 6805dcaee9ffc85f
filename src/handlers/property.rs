// src/handlers/property.rs
//
// Listing lifecycle: draft -> published -> archived, with ownership and
// transition rules enforced here against the loaded row. Every mutation
// is conditional on the version the handler loaded, so a concurrent
// writer surfaces as a 409 instead of silently winning.

use std::collections::{HashMap, HashSet};

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        filter::{ListParams, ListScope, Pagination, PropertyFilter, push_criteria},
        property::{
            ArchiveReason, Category, CreatePropertyRequest, Property, PropertyStatus,
            UpdatePropertyRequest,
        },
        user::{OwnerSummary, Role},
    },
    utils::{html::clean_text, jwt::CurrentUser},
};

pub(crate) async fn fetch_property(pool: &PgPool, id: i64) -> Result<Property, AppError> {
    sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Property not found".to_string()))
}

/// Resolves owner identities for a page of listings and nests each one
/// into its serialized value as an `owner` object (id, name, email).
/// One batch lookup per page; `owner_ids[i]` pairs with `values[i]`.
pub(crate) async fn attach_owners(
    pool: &PgPool,
    owner_ids: &[i64],
    values: &mut [Value],
) -> Result<(), AppError> {
    let owners: Vec<OwnerSummary> =
        sqlx::query_as("SELECT id, name, email FROM users WHERE id = ANY($1)")
            .bind(owner_ids)
            .fetch_all(pool)
            .await?;

    let by_id: HashMap<i64, Value> = owners
        .into_iter()
        .map(|owner| Ok((owner.id, serde_json::to_value(&owner)?)))
        .collect::<Result<_, AppError>>()?;

    for (value, owner_id) in values.iter_mut().zip(owner_ids) {
        if let Some(owner) = by_id.get(owner_id) {
            value["owner"] = owner.clone();
        }
    }

    Ok(())
}

/// Computes `isFavorite` for a whole page with a single batch lookup
/// against the favorites table, never one query per row.
async fn with_favorite_flags(
    pool: &PgPool,
    user_id: i64,
    properties: &[Property],
) -> Result<Vec<Value>, AppError> {
    let ids: Vec<i64> = properties.iter().map(|p| p.id).collect();

    let favored: HashSet<i64> = sqlx::query_scalar::<_, i64>(
        "SELECT property_id FROM favorites WHERE user_id = $1 AND property_id = ANY($2)",
    )
    .bind(user_id)
    .bind(&ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    properties
        .iter()
        .map(|property| {
            let mut value = serde_json::to_value(property)?;
            value["isFavorite"] = json!(favored.contains(&property.id));
            Ok(value)
        })
        .collect()
}

/// Lists properties with pagination and typed filters.
///
/// Visibility is resolved inside query construction: everyone sees
/// published listings; an authenticated owner asking for drafts sees only
/// their own. The requested status is never passed through raw.
pub async fn list_properties(
    State(pool): State<PgPool>,
    caller: Option<Extension<CurrentUser>>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let caller = caller.map(|Extension(user)| user);

    let pagination = Pagination::from_params(&params);
    let filter = PropertyFilter::from_params(&params)?;
    let scope = ListScope::resolve(params.status.as_deref(), caller.as_ref());

    let mut count_query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM properties");
    push_criteria(&mut count_query, &scope, &filter);
    let total: i64 = count_query.build_query_scalar().fetch_one(&pool).await?;

    let mut page_query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM properties");
    push_criteria(&mut page_query, &scope, &filter);
    page_query.push(" ORDER BY created_at DESC LIMIT ");
    page_query.push_bind(pagination.limit);
    page_query.push(" OFFSET ");
    page_query.push_bind(pagination.offset());
    let properties: Vec<Property> = page_query.build_query_as().fetch_all(&pool).await?;

    let mut data = match &caller {
        Some(user) => with_favorite_flags(&pool, user.id, &properties).await?,
        None => properties
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?,
    };

    let owner_ids: Vec<i64> = properties.iter().map(|p| p.owner_id).collect();
    attach_owners(&pool, &owner_ids, &mut data).await?;

    Ok(Json(json!({
        "success": true,
        "count": data.len(),
        "total": total,
        "totalPages": pagination.total_pages(total),
        "currentPage": pagination.page,
        "data": data,
    })))
}

/// Retrieves a single listing. A non-published listing is visible only to
/// its owner; everyone else gets 403 no matter what they ask for.
pub async fn get_property(
    State(pool): State<PgPool>,
    caller: Option<Extension<CurrentUser>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let caller = caller.map(|Extension(user)| user);

    let property = fetch_property(&pool, id).await?;

    if property.status()? != PropertyStatus::Published {
        let is_owner = caller.as_ref().is_some_and(|u| u.id == property.owner_id);
        if !is_owner {
            return Err(AppError::Forbidden(
                "Not authorized to access this property".to_string(),
            ));
        }
    }

    let mut data = serde_json::to_value(&property)?;

    let owner: OwnerSummary = sqlx::query_as("SELECT id, name, email FROM users WHERE id = $1")
        .bind(property.owner_id)
        .fetch_one(&pool)
        .await?;
    data["owner"] = serde_json::to_value(&owner)?;

    if let Some(user) = &caller {
        let is_favorite: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = $1 AND property_id = $2)",
        )
        .bind(user.id)
        .bind(property.id)
        .fetch_one(&pool)
        .await?;
        data["isFavorite"] = json!(is_favorite);
    }

    Ok(Json(json!({ "success": true, "data": data })))
}

/// Creates a draft listing. The owner-role gate is a route middleware;
/// the draft carries no images yet, those arrive via update.
pub async fn create_property(
    State(pool): State<PgPool>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreatePropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let category = payload
        .category
        .as_deref()
        .and_then(Category::parse)
        .unwrap_or(Category::Apartment);

    let property = sqlx::query_as::<_, Property>(
        r#"
        INSERT INTO properties
        (title, description, address, city, state, country, lat, lng,
         price, category, bedrooms, bathrooms, area, amenities, owner_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING *
        "#,
    )
    .bind(clean_text(&payload.title))
    .bind(clean_text(&payload.description))
    .bind(&payload.location.address)
    .bind(&payload.location.city)
    .bind(&payload.location.state)
    .bind(payload.location.country.as_deref().unwrap_or("Ethiopia"))
    .bind(payload.location.lat)
    .bind(payload.location.lng)
    .bind(payload.price)
    .bind(category.as_str())
    .bind(payload.bedrooms)
    .bind(payload.bathrooms)
    .bind(payload.area)
    .bind(SqlJson(payload.amenities.unwrap_or_default()))
    .bind(current.id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create property: {:?}", e);
        AppError::from(e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": property,
            "message": "Property created successfully"
        })),
    ))
}

/// Updates a draft or archived listing owned by the caller.
/// Published listings are immutable; editing one is an invalid transition.
pub async fn update_property(
    State(pool): State<PgPool>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let property = fetch_property(&pool, id).await?;

    if property.owner_id != current.id {
        return Err(AppError::Forbidden(
            "Not authorized to update this property".to_string(),
        ));
    }

    if !property.status()?.is_editable() {
        return Err(AppError::InvalidTransition(
            "Cannot edit published properties".to_string(),
        ));
    }

    if payload.is_empty() {
        return Ok(Json(json!({
            "success": true,
            "data": property,
            "message": "Property updated successfully"
        })));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE properties SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = &payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(clean_text(title));
    }

    if let Some(description) = &payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_text(description));
    }

    if let Some(location) = &payload.location {
        separated.push("address = ");
        separated.push_bind_unseparated(location.address.clone());
        separated.push("city = ");
        separated.push_bind_unseparated(location.city.clone());
        separated.push("state = ");
        separated.push_bind_unseparated(location.state.clone());
        if let Some(country) = &location.country {
            separated.push("country = ");
            separated.push_bind_unseparated(country.clone());
        }
        separated.push("lat = ");
        separated.push_bind_unseparated(location.lat);
        separated.push("lng = ");
        separated.push_bind_unseparated(location.lng);
    }

    if let Some(price) = payload.price {
        separated.push("price = ");
        separated.push_bind_unseparated(price);
    }

    if let Some(category) = payload.category.as_deref().and_then(Category::parse) {
        separated.push("category = ");
        separated.push_bind_unseparated(category.as_str());
    }

    if let Some(bedrooms) = payload.bedrooms {
        separated.push("bedrooms = ");
        separated.push_bind_unseparated(bedrooms);
    }

    if let Some(bathrooms) = payload.bathrooms {
        separated.push("bathrooms = ");
        separated.push_bind_unseparated(bathrooms);
    }

    if let Some(area) = payload.area {
        separated.push("area = ");
        separated.push_bind_unseparated(area);
    }

    if let Some(amenities) = &payload.amenities {
        separated.push("amenities = ");
        separated.push_bind_unseparated(SqlJson(amenities.clone()));
    }

    if let Some(images) = &payload.images {
        separated.push("images = ");
        separated.push_bind_unseparated(SqlJson(images.clone()));
    }

    separated.push("updated_at = NOW()");
    separated.push("version = version + 1");

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND version = ");
    builder.push_bind(property.version);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update property: {:?}", e);
        AppError::from(e)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Property was modified concurrently".to_string(),
        ));
    }

    let updated = fetch_property(&pool, id).await?;

    Ok(Json(json!({
        "success": true,
        "data": updated,
        "message": "Property updated successfully"
    })))
}

/// Publishes a draft listing owned by the caller.
///
/// Requires title, description, location, a positive price and at least
/// one image; the first missing field is named in the error. Stamps
/// `published_at` exactly once. There is no owner-initiated unpublish.
pub async fn publish_property(
    State(pool): State<PgPool>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let property = fetch_property(&pool, id).await?;

    if property.owner_id != current.id {
        return Err(AppError::Forbidden(
            "Not authorized to publish this property".to_string(),
        ));
    }

    match property.status()? {
        PropertyStatus::Draft => {}
        PropertyStatus::Published => {
            return Err(AppError::InvalidTransition(
                "Property is already published".to_string(),
            ));
        }
        PropertyStatus::Archived => {
            return Err(AppError::InvalidTransition(
                "Archived properties cannot be published".to_string(),
            ));
        }
    }

    if let Some(field) = property.publish_blocker() {
        return Err(AppError::InvalidTransition(format!(
            "Cannot publish: {} is required",
            field
        )));
    }

    let result = sqlx::query(
        r#"
        UPDATE properties
        SET status = 'published', published_at = NOW(),
            updated_at = NOW(), version = version + 1
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(id)
    .bind(property.version)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Property was modified concurrently".to_string(),
        ));
    }

    let published = fetch_property(&pool, id).await?;

    Ok(Json(json!({
        "success": true,
        "data": published,
        "message": "Property published successfully"
    })))
}

/// Soft-deletes a listing: archives it and marks it inactive.
/// Permitted for the resource owner or an admin; idempotent on an
/// already-archived listing.
pub async fn delete_property(
    State(pool): State<PgPool>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let property = fetch_property(&pool, id).await?;

    let allowed = match current.role {
        Role::Admin => true,
        Role::Owner | Role::User => property.owner_id == current.id,
    };
    if !allowed {
        return Err(AppError::Forbidden(
            "Not authorized to delete this property".to_string(),
        ));
    }

    if property.status()? == PropertyStatus::Archived {
        return Ok(Json(json!({
            "success": true,
            "message": "Property deleted successfully"
        })));
    }

    let reason = match current.role {
        Role::Admin => ArchiveReason::AdminDisable,
        Role::Owner | Role::User => ArchiveReason::OwnerDelete,
    };

    let result = sqlx::query(
        r#"
        UPDATE properties
        SET is_active = FALSE, status = 'archived', archived_reason = $1,
            updated_at = NOW(), version = version + 1
        WHERE id = $2 AND version = $3
        "#,
    )
    .bind(reason.as_str())
    .bind(id)
    .bind(property.version)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Property was modified concurrently".to_string(),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Property deleted successfully"
    })))
}

/// Query parameters for the my-properties view.
#[derive(Debug, Deserialize)]
pub struct MyPropertiesParams {
    pub status: Option<String>,
}

/// Lists the caller's own listings regardless of status, newest first.
pub async fn my_properties(
    State(pool): State<PgPool>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<MyPropertiesParams>,
) -> Result<impl IntoResponse, AppError> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(
            PropertyStatus::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Invalid status '{}'", raw)))?,
        ),
        None => None,
    };

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT * FROM properties WHERE owner_id = ");
    builder.push_bind(current.id);
    if let Some(status) = status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
    builder.push(" ORDER BY created_at DESC");

    let properties: Vec<Property> = builder.build_query_as().fetch_all(&pool).await?;

    Ok(Json(json!({
        "success": true,
        "count": properties.len(),
        "data": properties
    })))
}
