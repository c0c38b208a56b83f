//! Quote routes
//!
//! Suppliers quote on open RFQs. Accepting a quote awards the RFQ and
//! creates its order in one transaction.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::orders::fetch_order;
use super::rfqs::fetch_rfq;
use crate::api::{Created, DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::RequireUser;
use crate::domain::orders::{AwardedQuote, NewOrder};
use crate::domain::quotes::{ensure_acceptable, QuoteResponse, QuoteStatus, SubmitQuoteRequest};
use crate::domain::rfqs::RfqStatus;
use crate::domain::users::UserRole;
use crate::error::ApiError;
use crate::services::{cache::keys, notifications};

const QUOTE_SELECT: &str = r#"
    SELECT q.id, q.rfq_id, r.title AS rfq_title, q.supplier_id,
           COALESCE(u.company_name, u.name) AS supplier_name,
           q.unit_price, q.quantity, q.total_amount, q.delivery_days, q.notes,
           q.status, q.valid_until, q.created_at, q.updated_at
    FROM quotes q
    JOIN rfqs r ON r.id = q.rfq_id
    JOIN users u ON u.id = q.supplier_id
"#;

/// Database row for quote
#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: Uuid,
    rfq_id: Uuid,
    rfq_title: Option<String>,
    supplier_id: Uuid,
    supplier_name: Option<String>,
    unit_price: i64,
    quantity: i64,
    total_amount: i64,
    delivery_days: Option<i32>,
    notes: Option<String>,
    status: String,
    valid_until: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl QuoteRow {
    fn into_quote(self, now: DateTime<Utc>) -> QuoteResponse {
        let status = QuoteStatus::from(self.status);
        QuoteResponse {
            id: self.id,
            rfq_id: self.rfq_id,
            rfq_title: self.rfq_title,
            supplier_id: self.supplier_id,
            supplier_name: self.supplier_name,
            unit_price: self.unit_price,
            quantity: self.quantity,
            total_amount: self.total_amount,
            delivery_days: self.delivery_days,
            notes: self.notes,
            is_expired: status == QuoteStatus::Pending && self.valid_until <= now,
            status,
            valid_until: self.valid_until,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

async fn fetch_quote(state: &AppState, quote_id: Uuid) -> Result<QuoteResponse, ApiError> {
    sqlx::query_as::<_, QuoteRow>(&format!("{} WHERE q.id = $1", QUOTE_SELECT))
        .bind(quote_id)
        .fetch_optional(&state.db)
        .await?
        .map(|row| row.into_quote(Utc::now()))
        .ok_or_else(|| ApiError::not_found("Quote not found"))
}

/// POST /rfqs/:rfq_id/quotes
pub async fn submit_quote(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
    Json(req): Json<SubmitQuoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(UserRole::Supplier)?;

    let now = Utc::now();
    let pricing = req.price(now).map_err(ApiError::bad_request)?;

    let mut tx = state.db.begin().await?;

    // Shared lock: an award or close on this RFQ waits for the insert
    let rfq: Option<(Uuid, String, String, Option<DateTime<Utc>>)> = sqlx::query_as(
        "SELECT buyer_id, status, title, deadline FROM rfqs WHERE id = $1 FOR SHARE",
    )
    .bind(rfq_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (buyer_id, status, title, deadline) =
        rfq.ok_or_else(|| ApiError::not_found("RFQ not found"))?;

    if RfqStatus::from(status) != RfqStatus::Open {
        return Err(ApiError::conflict("RFQ is not accepting quotes"));
    }
    if matches!(deadline, Some(d) if d <= now) {
        return Err(ApiError::conflict("RFQ deadline has passed"));
    }

    let quote_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO quotes (rfq_id, supplier_id, unit_price, quantity, total_amount,
                            delivery_days, notes, valid_until)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(rfq_id)
    .bind(user.id)
    .bind(req.unit_price)
    .bind(req.quantity)
    .bind(pricing.total_amount)
    .bind(req.delivery_days)
    .bind(&req.notes)
    .bind(pricing.valid_until)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| ApiError::unique_violation(e, "You already have a live quote on this RFQ"))?;

    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        rfq_id = %rfq_id,
        quote_id = %quote_id,
        total_amount = pricing.total_amount,
        "Quote submitted"
    );

    notifications::notify_quote_received(
        &state.db,
        buyer_id,
        rfq_id,
        &title,
        &user.name,
        pricing.total_amount,
    )
    .await;

    Ok(Created(fetch_quote(&state, quote_id).await?))
}

/// GET /rfqs/:rfq_id/quotes
///
/// The RFQ owner and admins see every quote, cheapest first. A supplier sees
/// only their own.
pub async fn list_rfq_quotes(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let rfq = fetch_rfq(&state, rfq_id).await?;

    let supplier_filter = if rfq.buyer_id == user.id || user.is_admin() {
        None
    } else if user.role == UserRole::Supplier {
        Some(user.id)
    } else {
        return Err(ApiError::forbidden("Only the RFQ owner can view its quotes"));
    };

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM quotes WHERE rfq_id = $1 AND ($2::uuid IS NULL OR supplier_id = $2)",
    )
    .bind(rfq_id)
    .bind(supplier_filter)
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query_as::<_, QuoteRow>(&format!(
        r#"
        {}
        WHERE q.rfq_id = $1 AND ($2::uuid IS NULL OR q.supplier_id = $2)
        ORDER BY q.total_amount ASC, q.created_at ASC
        LIMIT $3 OFFSET $4
        "#,
        QUOTE_SELECT
    ))
    .bind(rfq_id)
    .bind(supplier_filter)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let now = Utc::now();
    let data: Vec<QuoteResponse> = rows.into_iter().map(|r| r.into_quote(now)).collect();
    Ok(Paginated::new(data, &pagination, total))
}

/// GET /quotes/mine
pub async fn list_my_quotes(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    user.require(UserRole::Supplier)?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quotes WHERE supplier_id = $1")
        .bind(user.id)
        .fetch_one(&state.db)
        .await?;

    let rows = sqlx::query_as::<_, QuoteRow>(&format!(
        "{} WHERE q.supplier_id = $1 ORDER BY q.created_at DESC LIMIT $2 OFFSET $3",
        QUOTE_SELECT
    ))
    .bind(user.id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let now = Utc::now();
    let data: Vec<QuoteResponse> = rows.into_iter().map(|r| r.into_quote(now)).collect();
    Ok(Paginated::new(data, &pagination, total))
}

/// POST /quotes/:quote_id/withdraw
pub async fn withdraw_quote(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let locked: Option<(Uuid, String, Uuid, Uuid, String)> = sqlx::query_as(
        r#"
        SELECT q.supplier_id, q.status, q.rfq_id, r.buyer_id, r.title
        FROM quotes q
        JOIN rfqs r ON r.id = q.rfq_id
        WHERE q.id = $1
        FOR UPDATE OF q
        "#,
    )
    .bind(quote_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (supplier_id, status, rfq_id, buyer_id, title) =
        locked.ok_or_else(|| ApiError::not_found("Quote not found"))?;

    if supplier_id != user.id {
        return Err(ApiError::forbidden("Only the quoting supplier can withdraw it"));
    }

    let next = QuoteStatus::from(status).transition_to(QuoteStatus::Withdrawn)?;

    sqlx::query("UPDATE quotes SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(quote_id)
        .bind(next.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(user_id = %user.id, quote_id = %quote_id, "Quote withdrawn");

    notifications::notify_quote_withdrawn(&state.db, buyer_id, rfq_id, &title, &user.name).await;

    Ok(Json(DataResponse::new(fetch_quote(&state, quote_id).await?)))
}

/// POST /quotes/:quote_id/accept
///
/// Locks the RFQ, accepts this quote, rejects every other pending quote,
/// awards the RFQ and inserts its single order. Notifications go out only
/// after the commit.
pub async fn accept_quote(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let rfq_id: Uuid = sqlx::query_scalar("SELECT rfq_id FROM quotes WHERE id = $1")
        .bind(quote_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Quote not found"))?;

    // RFQ first, then the quote: the same order every writer on this RFQ uses
    let (buyer_id, rfq_status, title): (Uuid, String, String) =
        sqlx::query_as("SELECT buyer_id, status, title FROM rfqs WHERE id = $1 FOR UPDATE")
            .bind(rfq_id)
            .fetch_one(&mut *tx)
            .await?;

    if buyer_id != user.id {
        return Err(ApiError::forbidden("Only the RFQ owner can accept quotes"));
    }

    let (supplier_id, quote_status, valid_until, quantity, unit_price, total_amount): (
        Uuid,
        String,
        DateTime<Utc>,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT supplier_id, status, valid_until, quantity, unit_price, total_amount
        FROM quotes WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(quote_id)
    .fetch_one(&mut *tx)
    .await?;

    let now = Utc::now();
    ensure_acceptable(
        RfqStatus::from(rfq_status),
        QuoteStatus::from(quote_status),
        valid_until,
        now,
    )
    .map_err(|e| ApiError::conflict(e.to_string()))?;

    sqlx::query("UPDATE quotes SET status = 'accepted', updated_at = NOW() WHERE id = $1")
        .bind(quote_id)
        .execute(&mut *tx)
        .await?;

    let rejected: Vec<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE quotes SET status = 'rejected', updated_at = NOW()
        WHERE rfq_id = $1 AND id <> $2 AND status = 'pending'
        RETURNING supplier_id
        "#,
    )
    .bind(rfq_id)
    .bind(quote_id)
    .fetch_all(&mut *tx)
    .await?;

    let awarded = sqlx::query(
        r#"
        UPDATE rfqs SET status = 'awarded', awarded_quote_id = $2, updated_at = NOW()
        WHERE id = $1 AND status = 'open'
        "#,
    )
    .bind(rfq_id)
    .bind(quote_id)
    .execute(&mut *tx)
    .await?;

    if awarded.rows_affected() != 1 {
        return Err(ApiError::conflict("RFQ is no longer open"));
    }

    let order = NewOrder::from_award(
        &AwardedQuote {
            quote_id,
            rfq_id,
            buyer_id,
            supplier_id,
            quantity,
            unit_price,
            total_amount,
        },
        state.settings.commission_rate_bps,
        now,
    );

    sqlx::query(
        r#"
        INSERT INTO orders (id, order_number, rfq_id, quote_id, buyer_id, supplier_id,
                            quantity, unit_price, total_amount,
                            commission_rate_bps, commission_amount, supplier_payout)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.rfq_id)
    .bind(order.quote_id)
    .bind(order.buyer_id)
    .bind(order.supplier_id)
    .bind(order.quantity)
    .bind(order.unit_price)
    .bind(order.total_amount)
    .bind(order.commission.rate_bps as i32)
    .bind(order.commission.amount)
    .bind(order.commission.supplier_payout)
    .execute(&mut *tx)
    .await
    .map_err(|e| ApiError::unique_violation(e, "An order already exists for this RFQ"))?;

    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        rfq_id = %rfq_id,
        quote_id = %quote_id,
        order_id = %order.id,
        order_number = %order.order_number,
        total_amount = order.total_amount,
        commission = order.commission.amount,
        rejected_quotes = rejected.len(),
        "Quote accepted and order created"
    );

    state
        .cache
        .invalidate(&keys::rfq_matches_pattern(rfq_id))
        .await;

    notifications::notify_quote_accepted(
        &state.db,
        supplier_id,
        rfq_id,
        &title,
        order.id,
        &order.order_number,
    )
    .await;
    notifications::notify_quotes_rejected(&state.db, &rejected, rfq_id, &title).await;

    Ok(Created(fetch_order(&state, order.id).await?))
}
