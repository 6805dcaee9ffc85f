// src/models/filter.rs
//
// Typed filter criteria for the property list endpoint. The raw query
// string is parsed into a `PropertyFilter` plus a visibility `ListScope`,
// and only those are translated into SQL. The requested status never
// passes through to the query as-is, so unpublished listings cannot leak
// to callers who are not entitled to them.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use crate::error::AppError;
use crate::models::property::{Category, PropertyStatus};
use crate::models::user::Role;
use crate::utils::jwt::CurrentUser;

/// Raw query parameters for listing properties.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// City substring, matched case-insensitively.
    pub location: Option<String>,
    pub category: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
}

/// Validated pagination window. Page starts at 1, limit is capped at 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            page: params.page.unwrap_or(1).max(1),
            limit: params.limit.unwrap_or(10).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

/// Which listings a caller may see. Computed inside query construction,
/// not left to a generic filter pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Anonymous callers, regular users and admins: published only,
    /// regardless of the requested status.
    Published,
    /// An authenticated owner asking for their drafts (or archived
    /// listings) sees only their own.
    OwnerScoped {
        owner_id: i64,
        status: PropertyStatus,
    },
}

impl ListScope {
    pub fn resolve(requested_status: Option<&str>, caller: Option<&CurrentUser>) -> ListScope {
        let requested = requested_status.and_then(PropertyStatus::parse);
        match (requested, caller) {
            (
                Some(status @ (PropertyStatus::Draft | PropertyStatus::Archived)),
                Some(user),
            ) if user.role == Role::Owner => ListScope::OwnerScoped {
                owner_id: user.id,
                status,
            },
            _ => ListScope::Published,
        }
    }
}

/// Typed filter criteria, translated into SQL by `push_criteria`.
#[derive(Debug, Default, Clone)]
pub struct PropertyFilter {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub city_contains: Option<String>,
    pub category: Option<Category>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
}

impl PropertyFilter {
    pub fn from_params(params: &ListParams) -> Result<Self, AppError> {
        let category = match &params.category {
            Some(raw) => Some(
                Category::parse(raw)
                    .ok_or_else(|| AppError::Validation(format!("Invalid category '{}'", raw)))?,
            ),
            None => None,
        };

        Ok(Self {
            min_price: params.min_price,
            max_price: params.max_price,
            city_contains: params.location.clone(),
            category,
            bedrooms: params.bedrooms,
            bathrooms: params.bathrooms,
        })
    }
}

/// Appends the WHERE clause for a scope and filter set. Shared by the
/// page query and the COUNT query so the two can never disagree.
pub fn push_criteria(
    builder: &mut QueryBuilder<'_, Postgres>,
    scope: &ListScope,
    filter: &PropertyFilter,
) {
    builder.push(" WHERE ");
    match scope {
        ListScope::Published => {
            builder.push("status = ");
            builder.push_bind(PropertyStatus::Published.as_str());
        }
        ListScope::OwnerScoped { owner_id, status } => {
            builder.push("status = ");
            builder.push_bind(status.as_str());
            builder.push(" AND owner_id = ");
            builder.push_bind(*owner_id);
        }
    }

    if let Some(min_price) = filter.min_price {
        builder.push(" AND price >= ");
        builder.push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        builder.push(" AND price <= ");
        builder.push_bind(max_price);
    }
    if let Some(city) = &filter.city_contains {
        builder.push(" AND city ILIKE ");
        builder.push_bind(format!("%{}%", city));
    }
    if let Some(category) = filter.category {
        builder.push(" AND category = ");
        builder.push_bind(category.as_str());
    }
    if let Some(bedrooms) = filter.bedrooms {
        builder.push(" AND bedrooms = ");
        builder.push_bind(bedrooms);
    }
    if let Some(bathrooms) = filter.bathrooms {
        builder.push(" AND bathrooms = ");
        builder.push_bind(bathrooms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(id: i64) -> CurrentUser {
        CurrentUser {
            id,
            role: Role::Owner,
        }
    }

    fn rendered(scope: &ListScope, filter: &PropertyFilter) -> String {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM properties");
        push_criteria(&mut builder, scope, filter);
        builder.into_sql()
    }

    #[test]
    fn anonymous_callers_are_pinned_to_published() {
        assert_eq!(ListScope::resolve(None, None), ListScope::Published);
        assert_eq!(
            ListScope::resolve(Some("draft"), None),
            ListScope::Published
        );
        assert_eq!(
            ListScope::resolve(Some("archived"), None),
            ListScope::Published
        );
    }

    #[test]
    fn non_owner_roles_cannot_request_drafts() {
        let user = CurrentUser {
            id: 3,
            role: Role::User,
        };
        let admin = CurrentUser {
            id: 4,
            role: Role::Admin,
        };
        assert_eq!(
            ListScope::resolve(Some("draft"), Some(&user)),
            ListScope::Published
        );
        assert_eq!(
            ListScope::resolve(Some("draft"), Some(&admin)),
            ListScope::Published
        );
    }

    #[test]
    fn owner_requesting_drafts_is_scoped_to_own_rows() {
        assert_eq!(
            ListScope::resolve(Some("draft"), Some(&owner(7))),
            ListScope::OwnerScoped {
                owner_id: 7,
                status: PropertyStatus::Draft,
            }
        );
    }

    #[test]
    fn owner_requesting_published_is_not_scoped() {
        assert_eq!(
            ListScope::resolve(Some("published"), Some(&owner(7))),
            ListScope::Published
        );
        // Garbage status strings fall back to published, never pass through.
        assert_eq!(
            ListScope::resolve(Some("'; DROP TABLE"), Some(&owner(7))),
            ListScope::Published
        );
    }

    #[test]
    fn published_scope_renders_single_bind() {
        let sql = rendered(&ListScope::Published, &PropertyFilter::default());
        assert_eq!(sql, "SELECT * FROM properties WHERE status = $1");
    }

    #[test]
    fn owner_scope_constrains_owner_column() {
        let scope = ListScope::OwnerScoped {
            owner_id: 7,
            status: PropertyStatus::Draft,
        };
        let sql = rendered(&scope, &PropertyFilter::default());
        assert!(sql.contains("status = $1"));
        assert!(sql.contains("owner_id = $2"));
    }

    #[test]
    fn all_criteria_render_as_binds() {
        let filter = PropertyFilter {
            min_price: Some(100.0),
            max_price: Some(5000.0),
            city_contains: Some("addis".to_string()),
            category: Some(Category::Villa),
            bedrooms: Some(3),
            bathrooms: Some(2),
        };
        let sql = rendered(&ListScope::Published, &filter);
        assert!(sql.contains("price >= $2"));
        assert!(sql.contains("price <= $3"));
        assert!(sql.contains("city ILIKE $4"));
        assert!(sql.contains("category = $5"));
        assert!(sql.contains("bedrooms = $6"));
        assert!(sql.contains("bathrooms = $7"));
    }

    #[test]
    fn invalid_category_is_rejected() {
        let params = ListParams {
            category: Some("castle".to_string()),
            ..Default::default()
        };
        assert!(PropertyFilter::from_params(&params).is_err());
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let pagination = Pagination::from_params(&ListParams::default());
        assert_eq!(pagination, Pagination { page: 1, limit: 10 });

        let params = ListParams {
            page: Some(0),
            limit: Some(1000),
            ..Default::default()
        };
        let pagination = Pagination::from_params(&params);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 100);
    }

    #[test]
    fn total_pages_rounds_up() {
        let pagination = Pagination {
            page: 3,
            limit: 10,
        };
        assert_eq!(pagination.total_pages(25), 3);
        assert_eq!(pagination.total_pages(30), 3);
        assert_eq!(pagination.total_pages(31), 4);
        assert_eq!(pagination.total_pages(0), 0);
        assert_eq!(pagination.offset(), 20);
    }
}
