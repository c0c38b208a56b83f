//! Order routes

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::{CurrentUser, RequireUser};
use crate::domain::orders::{
    OrderParty, OrderQuery, OrderResponse, OrderStatus, UpdateOrderStatusRequest,
};
use crate::error::ApiError;
use crate::services::notifications;

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.order_number, o.rfq_id, r.title AS rfq_title, o.quote_id,
           o.buyer_id, o.supplier_id, o.quantity, o.unit_price, o.total_amount,
           o.commission_rate_bps, o.commission_amount, o.supplier_payout,
           o.status, o.created_at, o.updated_at
    FROM orders o
    JOIN rfqs r ON r.id = o.rfq_id
"#;

/// Database row for order
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    rfq_id: Uuid,
    rfq_title: Option<String>,
    quote_id: Uuid,
    buyer_id: Uuid,
    supplier_id: Uuid,
    quantity: i64,
    unit_price: i64,
    total_amount: i64,
    commission_rate_bps: i32,
    commission_amount: i64,
    supplier_payout: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for OrderResponse {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            rfq_id: row.rfq_id,
            rfq_title: row.rfq_title,
            quote_id: row.quote_id,
            buyer_id: row.buyer_id,
            supplier_id: row.supplier_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_amount: row.total_amount,
            commission_rate_bps: row.commission_rate_bps,
            commission_amount: row.commission_amount,
            supplier_payout: row.supplier_payout,
            status: row.status.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(crate) async fn fetch_order(state: &AppState, order_id: Uuid) -> Result<OrderResponse, ApiError> {
    sqlx::query_as::<_, OrderRow>(&format!("{} WHERE o.id = $1", ORDER_SELECT))
        .bind(order_id)
        .fetch_optional(&state.db)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::not_found("Order not found"))
}

/// Which side of the order `user` is on, if any. Admin wins over a
/// participant role.
fn party_for(user: &CurrentUser, buyer_id: Uuid, supplier_id: Uuid) -> Option<OrderParty> {
    if user.is_admin() {
        Some(OrderParty::Admin)
    } else if user.id == supplier_id {
        Some(OrderParty::Supplier)
    } else if user.id == buyer_id {
        Some(OrderParty::Buyer)
    } else {
        None
    }
}

/// GET /orders
///
/// Participants see their own orders; admins see every order.
pub async fn list_orders(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<OrderQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let participant = if user.is_admin() { None } else { Some(user.id) };
    let status = filter.status.map(|s| s.as_str());

    let where_clause = r#"
        WHERE ($1::uuid IS NULL OR o.buyer_id = $1 OR o.supplier_id = $1)
        AND ($2::text IS NULL OR o.status = $2)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders o {}", where_clause))
        .bind(participant)
        .bind(status)
        .fetch_one(&state.db)
        .await?;

    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "{} {} ORDER BY o.created_at DESC LIMIT $3 OFFSET $4",
        ORDER_SELECT, where_clause
    ))
    .bind(participant)
    .bind(status)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let data: Vec<OrderResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, &pagination, total))
}

/// GET /orders/:order_id
pub async fn get_order(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = fetch_order(&state, order_id).await?;

    if party_for(&user, order.buyer_id, order.supplier_id).is_none() {
        // Don't reveal that the order exists
        return Err(ApiError::not_found("Order not found"));
    }

    Ok(Json(DataResponse::new(order)))
}

/// POST /orders/:order_id/status
pub async fn update_order_status(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let locked: Option<(Uuid, Uuid, String, String)> = sqlx::query_as(
        "SELECT buyer_id, supplier_id, status, order_number FROM orders WHERE id = $1 FOR UPDATE",
    )
    .bind(order_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (buyer_id, supplier_id, status, order_number) =
        locked.ok_or_else(|| ApiError::not_found("Order not found"))?;

    let party = party_for(&user, buyer_id, supplier_id)
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    if !party.may_set(req.status) {
        return Err(ApiError::forbidden(format!(
            "You cannot mark this order as {}",
            req.status
        )));
    }

    let current = OrderStatus::from(status);
    if current.is_terminal() {
        return Err(ApiError::conflict(format!("Order is already {}", current)));
    }
    let next = current.transition_to(req.status)?;

    sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(order_id)
        .bind(next.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        order_id = %order_id,
        status = %next,
        "Order status updated"
    );

    // Tell whoever didn't make the change; an admin change reaches both sides
    let recipients: Vec<Uuid> = match party {
        OrderParty::Buyer => vec![supplier_id],
        OrderParty::Supplier => vec![buyer_id],
        OrderParty::Admin => vec![buyer_id, supplier_id],
    };
    for recipient in recipients {
        notifications::notify_order_status(&state.db, recipient, order_id, &order_number, next)
            .await;
    }

    Ok(Json(DataResponse::new(fetch_order(&state, order_id).await?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::users::UserRole;

    fn user(id: u128, role: UserRole) -> CurrentUser {
        CurrentUser {
            id: Uuid::from_u128(id),
            email: format!("{}@example.com", id),
            name: "Test".into(),
            role,
            is_active: true,
        }
    }

    #[test]
    fn parties_are_resolved_from_ids() {
        let buyer = Uuid::from_u128(1);
        let supplier = Uuid::from_u128(2);

        assert_eq!(
            party_for(&user(1, UserRole::Buyer), buyer, supplier),
            Some(OrderParty::Buyer)
        );
        assert_eq!(
            party_for(&user(2, UserRole::Supplier), buyer, supplier),
            Some(OrderParty::Supplier)
        );
        assert_eq!(
            party_for(&user(9, UserRole::Admin), buyer, supplier),
            Some(OrderParty::Admin)
        );
        assert_eq!(party_for(&user(3, UserRole::Supplier), buyer, supplier), None);
    }
}
