//! Public supplier directory

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::RequireUser;
use crate::domain::users::{normalize_category, SupplierQuery, SupplierSummary};
use crate::error::ApiError;

pub(crate) const SUPPLIER_COLUMNS: &str =
    "id, name, company_name, location, categories, years_in_business, rating, verified";

/// Database row for a supplier directory entry
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SupplierRow {
    id: Uuid,
    name: String,
    company_name: Option<String>,
    location: Option<String>,
    categories: Vec<String>,
    years_in_business: i32,
    rating: f64,
    verified: bool,
}

impl From<SupplierRow> for SupplierSummary {
    fn from(row: SupplierRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            company_name: row.company_name,
            location: row.location,
            categories: row.categories,
            years_in_business: row.years_in_business,
            rating: row.rating,
            verified: row.verified,
        }
    }
}

/// GET /suppliers
pub async fn list_suppliers(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<SupplierQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = filter
        .category
        .as_deref()
        .map(normalize_category)
        .filter(|c| !c.is_empty());
    let verified_only = filter.verified_only.unwrap_or(false);

    let where_clause = r#"
        WHERE role = 'supplier' AND is_active
        AND ($1::text IS NULL OR $1 = ANY(categories))
        AND ($2::text IS NULL OR location ILIKE '%' || $2 || '%')
        AND (NOT $3 OR verified)
        AND ($4::float8 IS NULL OR rating >= $4)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users {}", where_clause))
        .bind(&category)
        .bind(&filter.location)
        .bind(verified_only)
        .bind(filter.min_rating)
        .fetch_one(&state.db)
        .await?;

    let rows = sqlx::query_as::<_, SupplierRow>(&format!(
        r#"
        SELECT {} FROM users
        {}
        ORDER BY verified DESC, rating DESC, name ASC
        LIMIT $5 OFFSET $6
        "#,
        SUPPLIER_COLUMNS, where_clause
    ))
    .bind(&category)
    .bind(&filter.location)
    .bind(verified_only)
    .bind(filter.min_rating)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let data: Vec<SupplierSummary> = rows.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, &pagination, total))
}

/// GET /suppliers/:supplier_id
pub async fn get_supplier(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(supplier_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, SupplierRow>(&format!(
        "SELECT {} FROM users WHERE id = $1 AND role = 'supplier' AND is_active",
        SUPPLIER_COLUMNS
    ))
    .bind(supplier_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Supplier not found"))?;

    Ok(Json(DataResponse::new(SupplierSummary::from(row))))
}
