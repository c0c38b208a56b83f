//! Notification routes
//!
//! Endpoints for in-app notifications: list, unread count, mark read.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::api::{DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::RequireUser;
use crate::domain::notifications::{
    MarkReadRequest, NotificationQuery, NotificationResponse, UnreadCountResponse,
};
use crate::error::ApiError;

/// GET /notifications
///
/// Newest first, optionally unread only.
pub async fn list_notifications(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<NotificationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let unread_only = filter.unread_only.unwrap_or(false);

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM notifications
        WHERE user_id = $1
        AND ($2::bool = false OR is_read = false)
        "#,
    )
    .bind(user.id)
    .bind(unread_only)
    .fetch_one(&state.db)
    .await?;

    let data = sqlx::query_as::<_, NotificationResponse>(
        r#"
        SELECT id, type, title, message, data, is_read, read_at, created_at
        FROM notifications
        WHERE user_id = $1
        AND ($2::bool = false OR is_read = false)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user.id)
    .bind(unread_only)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    Ok(Paginated::new(data, &pagination, total))
}

/// GET /notifications/unread-count
pub async fn get_unread_count(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
    )
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(DataResponse::new(UnreadCountResponse { count })))
}

/// POST /notifications/read
///
/// Marks the given notifications read, or all of them when no ids are sent.
/// Ids belonging to other users are ignored.
pub async fn mark_read(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<MarkReadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = sqlx::query(
        r#"
        UPDATE notifications SET is_read = true, read_at = NOW()
        WHERE user_id = $1 AND is_read = false
        AND ($2::uuid[] IS NULL OR id = ANY($2))
        "#,
    )
    .bind(user.id)
    .bind(&req.notification_ids)
    .execute(&state.db)
    .await?;

    tracing::debug!(user_id = %user.id, marked = result.rows_affected(), "Notifications marked read");

    Ok(Json(DataResponse::new(serde_json::json!({
        "marked_read": result.rows_affected(),
    }))))
}
