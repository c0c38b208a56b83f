//! RFQ routes
//!
//! Buyers post and manage RFQs; suppliers browse the open ones.

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
use crate::domain::rfqs::{
    CreateRfqRequest, MyRfqQuery, RfqMarketQuery, RfqResponse, RfqStatus, UpdateRfqRequest,
};
use crate::domain::users::{normalize_category, UserRole};
use crate::error::ApiError;
use crate::services::{cache::keys, notifications};

const RFQ_SELECT: &str = r#"
    SELECT r.id, r.buyer_id, COALESCE(u.company_name, u.name) AS buyer_company,
           r.title, r.description, r.category, r.quantity, r.unit,
           r.budget_min, r.budget_max, r.delivery_location, r.deadline,
           r.status, r.awarded_quote_id,
           (SELECT COUNT(*) FROM quotes q WHERE q.rfq_id = r.id AND q.status <> 'withdrawn') AS quote_count,
           r.created_at, r.updated_at
    FROM rfqs r
    JOIN users u ON u.id = r.buyer_id
"#;

/// Database row for RFQ
#[derive(Debug, sqlx::FromRow)]
struct RfqRow {
    id: Uuid,
    buyer_id: Uuid,
    buyer_company: Option<String>,
    title: String,
    description: Option<String>,
    category: String,
    quantity: i64,
    unit: Option<String>,
    budget_min: Option<i64>,
    budget_max: Option<i64>,
    delivery_location: Option<String>,
    deadline: Option<DateTime<Utc>>,
    status: String,
    awarded_quote_id: Option<Uuid>,
    quote_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RfqRow> for RfqResponse {
    fn from(row: RfqRow) -> Self {
        Self {
            id: row.id,
            buyer_id: row.buyer_id,
            buyer_company: row.buyer_company,
            title: row.title,
            description: row.description,
            category: row.category,
            quantity: row.quantity,
            unit: row.unit,
            budget_min: row.budget_min,
            budget_max: row.budget_max,
            delivery_location: row.delivery_location,
            deadline: row.deadline,
            status: row.status.into(),
            awarded_quote_id: row.awarded_quote_id,
            quote_count: row.quote_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(crate) async fn fetch_rfq(state: &AppState, rfq_id: Uuid) -> Result<RfqResponse, ApiError> {
    sqlx::query_as::<_, RfqRow>(&format!("{} WHERE r.id = $1", RFQ_SELECT))
        .bind(rfq_id)
        .fetch_optional(&state.db)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::not_found("RFQ not found"))
}

/// POST /rfqs
pub async fn create_rfq(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRfqRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(UserRole::Buyer)?;
    let category = req.validate(Utc::now()).map_err(ApiError::validation)?;

    let rfq_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO rfqs (buyer_id, title, description, category, quantity, unit,
                          budget_min, budget_max, delivery_location, deadline)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(req.title.trim())
    .bind(&req.description)
    .bind(&category)
    .bind(req.quantity)
    .bind(&req.unit)
    .bind(req.budget_min)
    .bind(req.budget_max)
    .bind(&req.delivery_location)
    .bind(req.deadline)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        user_id = %user.id,
        rfq_id = %rfq_id,
        category = %category,
        quantity = req.quantity,
        "RFQ created"
    );

    Ok(Created(fetch_rfq(&state, rfq_id).await?))
}

/// GET /rfqs
///
/// The open marketplace: open RFQs whose deadline has not passed.
pub async fn list_open_rfqs(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<RfqMarketQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = filter
        .category
        .as_deref()
        .map(normalize_category)
        .filter(|c| !c.is_empty());

    let where_clause = r#"
        WHERE r.status = 'open'
        AND (r.deadline IS NULL OR r.deadline > NOW())
        AND ($1::text IS NULL OR r.category = $1)
        AND ($2::text IS NULL OR r.delivery_location ILIKE '%' || $2 || '%')
        AND ($3::text IS NULL OR r.title ILIKE '%' || $3 || '%' OR r.description ILIKE '%' || $3 || '%')
        AND ($4::bigint IS NULL OR COALESCE(r.budget_max, r.budget_min) >= $4)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM rfqs r {}", where_clause))
        .bind(&category)
        .bind(&filter.location)
        .bind(&filter.search)
        .bind(filter.min_budget)
        .fetch_one(&state.db)
        .await?;

    let rows = sqlx::query_as::<_, RfqRow>(&format!(
        "{} {} ORDER BY r.created_at DESC LIMIT $5 OFFSET $6",
        RFQ_SELECT, where_clause
    ))
    .bind(&category)
    .bind(&filter.location)
    .bind(&filter.search)
    .bind(filter.min_budget)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let data: Vec<RfqResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, &pagination, total))
}

/// GET /rfqs/mine
pub async fn list_my_rfqs(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<MyRfqQuery>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(UserRole::Buyer)?;
    let status = filter.status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM rfqs WHERE buyer_id = $1 AND ($2::text IS NULL OR status = $2)",
    )
    .bind(user.id)
    .bind(status)
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query_as::<_, RfqRow>(&format!(
        r#"
        {}
        WHERE r.buyer_id = $1 AND ($2::text IS NULL OR r.status = $2)
        ORDER BY r.created_at DESC
        LIMIT $3 OFFSET $4
        "#,
        RFQ_SELECT
    ))
    .bind(user.id)
    .bind(status)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let data: Vec<RfqResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, &pagination, total))
}

/// GET /rfqs/:rfq_id
pub async fn get_rfq(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(DataResponse::new(fetch_rfq(&state, rfq_id).await?)))
}

/// PUT /rfqs/:rfq_id
///
/// Owner edits while the RFQ is still open.
pub async fn update_rfq(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
    Json(req): Json<UpdateRfqRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let current = fetch_rfq(&state, rfq_id).await?;

    if current.buyer_id != user.id {
        return Err(ApiError::forbidden("Only the RFQ owner can edit it"));
    }
    if current.status != RfqStatus::Open {
        return Err(ApiError::conflict(format!(
            "RFQ is {} and can no longer be edited",
            current.status
        )));
    }

    let category = req
        .validate(current.budget_min, current.budget_max, Utc::now())
        .map_err(ApiError::validation)?;

    // The status guard makes a concurrent award or close win over this edit
    let updated = sqlx::query(
        r#"
        UPDATE rfqs SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            category = COALESCE($4, category),
            quantity = COALESCE($5, quantity),
            unit = COALESCE($6, unit),
            budget_min = COALESCE($7, budget_min),
            budget_max = COALESCE($8, budget_max),
            delivery_location = COALESCE($9, delivery_location),
            deadline = COALESCE($10, deadline),
            updated_at = NOW()
        WHERE id = $1 AND status = 'open'
        "#,
    )
    .bind(rfq_id)
    .bind(req.title.as_deref().map(str::trim))
    .bind(&req.description)
    .bind(&category)
    .bind(req.quantity)
    .bind(&req.unit)
    .bind(req.budget_min)
    .bind(req.budget_max)
    .bind(&req.delivery_location)
    .bind(req.deadline)
    .execute(&state.db)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::conflict("RFQ is no longer open"));
    }

    state
        .cache
        .invalidate(&keys::rfq_matches_pattern(rfq_id))
        .await;

    tracing::info!(user_id = %user.id, rfq_id = %rfq_id, "RFQ updated");

    Ok(Json(DataResponse::new(fetch_rfq(&state, rfq_id).await?)))
}

/// POST /rfqs/:rfq_id/close
pub async fn close_rfq(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    end_rfq(&state, &user, rfq_id, RfqStatus::Closed).await
}

/// POST /rfqs/:rfq_id/cancel
pub async fn cancel_rfq(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    end_rfq(&state, &user, rfq_id, RfqStatus::Cancelled).await
}

/// Move an open RFQ to `closed` or `cancelled` and reject its pending quotes.
async fn end_rfq(
    state: &AppState,
    user: &RequireUser,
    rfq_id: Uuid,
    next: RfqStatus,
) -> Result<Json<DataResponse<RfqResponse>>, ApiError> {
    let mut tx = state.db.begin().await?;

    let locked: Option<(Uuid, String, String)> =
        sqlx::query_as("SELECT buyer_id, status, title FROM rfqs WHERE id = $1 FOR UPDATE")
            .bind(rfq_id)
            .fetch_optional(&mut *tx)
            .await?;

    let (buyer_id, status, title) =
        locked.ok_or_else(|| ApiError::not_found("RFQ not found"))?;

    if buyer_id != user.id {
        return Err(ApiError::forbidden("Only the RFQ owner can close it"));
    }

    let next = RfqStatus::from(status).transition_to(next)?;

    sqlx::query("UPDATE rfqs SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(rfq_id)
        .bind(next.as_str())
        .execute(&mut *tx)
        .await?;

    let rejected: Vec<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE quotes SET status = 'rejected', updated_at = NOW()
        WHERE rfq_id = $1 AND status = 'pending'
        RETURNING supplier_id
        "#,
    )
    .bind(rfq_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        rfq_id = %rfq_id,
        status = %next,
        rejected_quotes = rejected.len(),
        "RFQ ended"
    );

    state
        .cache
        .invalidate(&keys::rfq_matches_pattern(rfq_id))
        .await;
    notifications::notify_rfq_closed(&state.db, &rejected, rfq_id, &title, next).await;

    Ok(Json(DataResponse::new(fetch_rfq(state, rfq_id).await?)))
}
