//! Product catalogue routes
//!
//! Suppliers own their catalogue rows; deleting a product only hides it.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::RequireUser;
use crate::domain::products::{
    CreateProductRequest, ProductQuery, ProductResponse, UpdateProductRequest,
};
use crate::domain::users::{normalize_category, UserRole};
use crate::error::ApiError;

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.supplier_id, COALESCE(u.company_name, u.name) AS supplier_name,
           p.name, p.description, p.category, p.unit_price, p.unit,
           p.min_order_quantity, p.is_active, p.created_at, p.updated_at
    FROM products p
    JOIN users u ON u.id = p.supplier_id
"#;

/// Database row for product
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    supplier_id: Uuid,
    supplier_name: Option<String>,
    name: String,
    description: Option<String>,
    category: String,
    unit_price: i64,
    unit: Option<String>,
    min_order_quantity: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductResponse {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            supplier_id: row.supplier_id,
            supplier_name: row.supplier_name,
            name: row.name,
            description: row.description,
            category: row.category,
            unit_price: row.unit_price,
            unit: row.unit,
            min_order_quantity: row.min_order_quantity,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

async fn fetch_product(state: &AppState, product_id: Uuid) -> Result<ProductRow, ApiError> {
    sqlx::query_as::<_, ProductRow>(&format!("{} WHERE p.id = $1", PRODUCT_SELECT))
        .bind(product_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

/// Owner check shared by update and delete
async fn ensure_owner(state: &AppState, product_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
    let owner: Option<Uuid> =
        sqlx::query_scalar("SELECT supplier_id FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&state.db)
            .await?;

    match owner {
        None => Err(ApiError::not_found("Product not found")),
        Some(owner) if owner != user_id => {
            Err(ApiError::forbidden("Only the owning supplier can change this product"))
        }
        Some(_) => Ok(()),
    }
}

/// POST /products
pub async fn create_product(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(UserRole::Supplier)?;
    let category = req.validate().map_err(ApiError::validation)?;

    let product_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO products (supplier_id, name, description, category, unit_price, unit, min_order_quantity)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(&category)
    .bind(req.unit_price)
    .bind(&req.unit)
    .bind(req.min_order_quantity)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(user_id = %user.id, product_id = %product_id, category = %category, "Product created");

    let row = fetch_product(&state, product_id).await?;
    Ok(Created(ProductResponse::from(row)))
}

/// GET /products
///
/// Active products only, newest first.
pub async fn list_products(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ProductQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = filter
        .category
        .as_deref()
        .map(normalize_category)
        .filter(|c| !c.is_empty());

    let where_clause = r#"
        WHERE p.is_active
        AND ($1::text IS NULL OR p.category = $1)
        AND ($2::uuid IS NULL OR p.supplier_id = $2)
        AND ($3::text IS NULL OR p.name ILIKE '%' || $3 || '%' OR p.description ILIKE '%' || $3 || '%')
    "#;

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM products p {}",
        where_clause
    ))
    .bind(&category)
    .bind(filter.supplier_id)
    .bind(&filter.search)
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{} {} ORDER BY p.created_at DESC LIMIT $4 OFFSET $5",
        PRODUCT_SELECT, where_clause
    ))
    .bind(&category)
    .bind(filter.supplier_id)
    .bind(&filter.search)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let data: Vec<ProductResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, &pagination, total))
}

/// GET /products/:product_id
///
/// Inactive products stay visible to their owner.
pub async fn get_product(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = fetch_product(&state, product_id).await?;

    if !row.is_active && row.supplier_id != user.id && !user.is_admin() {
        return Err(ApiError::not_found("Product not found"));
    }

    Ok(Json(DataResponse::new(ProductResponse::from(row))))
}

/// PUT /products/:product_id
pub async fn update_product(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = req.validate().map_err(ApiError::validation)?;
    ensure_owner(&state, product_id, user.id).await?;

    sqlx::query(
        r#"
        UPDATE products SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            category = COALESCE($4, category),
            unit_price = COALESCE($5, unit_price),
            unit = COALESCE($6, unit),
            min_order_quantity = COALESCE($7, min_order_quantity),
            is_active = COALESCE($8, is_active),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(product_id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(&category)
    .bind(req.unit_price)
    .bind(&req.unit)
    .bind(req.min_order_quantity)
    .bind(req.is_active)
    .execute(&state.db)
    .await?;

    let row = fetch_product(&state, product_id).await?;
    Ok(Json(DataResponse::new(ProductResponse::from(row))))
}

/// DELETE /products/:product_id
pub async fn delete_product(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_owner(&state, product_id, user.id).await?;

    sqlx::query("UPDATE products SET is_active = false, updated_at = NOW() WHERE id = $1")
        .bind(product_id)
        .execute(&state.db)
        .await?;

    tracing::info!(user_id = %user.id, product_id = %product_id, "Product deactivated");

    Ok(Json(DataResponse::new(serde_json::json!({
        "id": product_id,
        "is_active": false,
    }))))
}
