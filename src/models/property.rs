// src/models/property.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use url::Url;
use validator::Validate;

use crate::error::AppError;

/// Listing lifecycle status. Stored as TEXT, parsed at the boundary.
///
/// Transitions: draft -> published (owner publish, preconditions apply),
/// draft/published -> archived (owner soft delete or admin disable),
/// archived -> published (admin enable only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Draft,
    Published,
    Archived,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Draft => "draft",
            PropertyStatus::Published => "published",
            PropertyStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<PropertyStatus> {
        match s {
            "draft" => Some(PropertyStatus::Draft),
            "published" => Some(PropertyStatus::Published),
            "archived" => Some(PropertyStatus::Archived),
            _ => None,
        }
    }

    /// Published listings are immutable to their owner.
    pub fn is_editable(&self) -> bool {
        match self {
            PropertyStatus::Draft | PropertyStatus::Archived => true,
            PropertyStatus::Published => false,
        }
    }
}

/// Fixed listing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Apartment,
    House,
    Villa,
    Land,
    Commercial,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Apartment => "apartment",
            Category::House => "house",
            Category::Villa => "villa",
            Category::Land => "land",
            Category::Commercial => "commercial",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "apartment" => Some(Category::Apartment),
            "house" => Some(Category::House),
            "villa" => Some(Category::Villa),
            "land" => Some(Category::Land),
            "commercial" => Some(Category::Commercial),
            _ => None,
        }
    }
}

/// Why an archived listing is archived. Cleared when an admin re-enables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveReason {
    OwnerDelete,
    AdminDisable,
}

impl ArchiveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveReason::OwnerDelete => "owner_delete",
            ArchiveReason::AdminDisable => "admin_disable",
        }
    }
}

/// Admin moderation action on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Disable,
    Enable,
}

impl ToggleAction {
    pub fn parse(s: &str) -> Option<ToggleAction> {
        match s {
            "disable" => Some(ToggleAction::Disable),
            "enable" => Some(ToggleAction::Enable),
            _ => None,
        }
    }
}

/// Location columns of a listing, flattened into the properties table
/// but nested as an object in API responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// A single listing image. Upload/CDN handling is external; only the
/// metadata is stored, as a JSON array preserving order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyImage {
    pub url: String,
    pub public_id: Option<String>,
    pub caption: Option<String>,
}

/// Represents the 'properties' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,

    pub title: String,

    pub description: String,

    #[sqlx(flatten)]
    pub location: Location,

    pub price: f64,

    /// Ordered image metadata, stored as a JSONB array.
    pub images: Json<Vec<PropertyImage>>,

    pub owner_id: i64,

    /// Lifecycle status: 'draft', 'published' or 'archived'.
    pub status: String,

    pub category: String,

    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<f64>,

    pub amenities: Json<Vec<String>>,

    pub is_active: bool,

    /// Stamped exactly once, at the draft -> published transition.
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,

    /// 'owner_delete' or 'admin_disable' while archived, NULL otherwise.
    pub archived_reason: Option<String>,

    /// Optimistic-concurrency token. Every mutation is conditional on the
    /// version it loaded; a lost race surfaces as a 409.
    pub version: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Property {
    /// Parses the stored status. An unknown value is a data corruption
    /// bug and fails closed as an internal error.
    pub fn status(&self) -> Result<PropertyStatus, AppError> {
        PropertyStatus::parse(&self.status).ok_or_else(|| {
            AppError::InternalServerError(format!("unknown property status '{}'", self.status))
        })
    }

    /// First publish precondition not met, if any, in the order the
    /// publish endpoint reports them. A zero price counts as missing.
    pub fn publish_blocker(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            return Some("title");
        }
        if self.description.trim().is_empty() {
            return Some("description");
        }
        if self.location.address.trim().is_empty() || self.location.city.trim().is_empty() {
            return Some("location");
        }
        if self.price <= 0.0 {
            return Some("price");
        }
        if self.images.0.is_empty() {
            return Some("images");
        }
        None
    }
}

/// DTO for the location object on create/update.
#[derive(Debug, Deserialize, Validate)]
pub struct LocationRequest {
    #[validate(length(min = 1, max = 200, message = "Address is required."))]
    pub address: String,
    #[validate(length(min = 1, max = 100, message = "City is required."))]
    pub city: String,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// DTO for creating a draft listing. Images are attached afterwards via
/// update; a draft never requires them.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePropertyRequest {
    #[validate(length(
        min = 5,
        max = 200,
        message = "Title length must be between 5 and 200 characters."
    ))]
    pub title: String,
    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description length must be between 10 and 2000 characters."
    ))]
    pub description: String,
    #[validate(nested)]
    pub location: LocationRequest,
    #[validate(range(min = 0.0, message = "Price cannot be negative."))]
    pub price: f64,
    #[validate(custom(function = validate_category))]
    pub category: Option<String>,
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    #[validate(range(min = 0.0))]
    pub area: Option<f64>,
    pub amenities: Option<Vec<String>>,
}

/// DTO for updating a draft or archived listing. All fields optional;
/// present fields are merged and re-validated.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePropertyRequest {
    #[validate(length(
        min = 5,
        max = 200,
        message = "Title length must be between 5 and 200 characters."
    ))]
    pub title: Option<String>,
    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description length must be between 10 and 2000 characters."
    ))]
    pub description: Option<String>,
    #[validate(nested)]
    pub location: Option<LocationRequest>,
    #[validate(range(min = 0.0, message = "Price cannot be negative."))]
    pub price: Option<f64>,
    #[validate(custom(function = validate_category))]
    pub category: Option<String>,
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    #[validate(range(min = 0.0))]
    pub area: Option<f64>,
    pub amenities: Option<Vec<String>>,
    #[validate(custom(function = validate_images))]
    pub images: Option<Vec<PropertyImage>>,
}

impl UpdatePropertyRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.bedrooms.is_none()
            && self.bathrooms.is_none()
            && self.area.is_none()
            && self.amenities.is_none()
            && self.images.is_none()
    }
}

fn validate_category(category: &str) -> Result<(), validator::ValidationError> {
    if Category::parse(category).is_none() {
        return Err(validator::ValidationError::new("invalid_category"));
    }
    Ok(())
}

/// Validates image metadata: each entry needs a well-formed URL.
fn validate_images(images: &[PropertyImage]) -> Result<(), validator::ValidationError> {
    for image in images {
        if image.url.len() > 500 || Url::parse(&image.url).is_err() {
            return Err(validator::ValidationError::new("invalid_image_url"));
        }
    }
    Ok(())
}
