//! Admin routes
//!
//! Protected admin endpoints for:
//! - Dashboard statistics
//! - User listing, supplier verification and suspension
//!
//! All routes require the admin role. Every mutation is written to the
//! audit log inside the same transaction.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgConnection;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::me::{UserRow, USER_COLUMNS};
use crate::api::{DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::{CurrentUser, RequireUser};
use crate::domain::admin::{
    AdminAction, AdminStats, AdminUserQuery, AuditTargetType, SetActiveRequest, StatusCount,
    VerifySupplierRequest,
};
use crate::domain::users::{UserResponse, UserRole};
use crate::error::ApiError;
use crate::services::{cache::keys, notifications};

const STATS_TTL: Duration = Duration::from_secs(60);

// ============================================================================
// RequireAdmin Extractor
// ============================================================================

/// Extractor that requires an active user with the admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentUser);

impl std::ops::Deref for RequireAdmin {
    type Target = CurrentUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, "Non-admin user attempted to access admin route");
            return Err(ApiError::forbidden("Admin privileges required").into_response());
        }

        Ok(RequireAdmin(user))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log an admin action to the audit log
pub(crate) async fn log_admin_action(
    conn: &mut PgConnection,
    admin_id: Uuid,
    action: AdminAction,
    target_type: AuditTargetType,
    target_id: Option<Uuid>,
    details: serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO admin_audit_log (id, admin_id, action, target_type, target_id, details)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(admin_id)
    .bind(action.to_string())
    .bind(target_type.to_string())
    .bind(target_id)
    .bind(&details)
    .execute(conn)
    .await?;

    tracing::info!(
        admin_id = %admin_id,
        action = %action,
        target_type = %target_type,
        target_id = ?target_id,
        "Admin action logged"
    );

    Ok(())
}

async fn grouped_counts(state: &AppState, sql: &str) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as::<_, StatusCount>(sql).fetch_all(&state.db).await
}

// ============================================================================
// Admin Dashboard
// ============================================================================

/// GET /admin/stats
pub async fn get_admin_stats(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let cache_key = keys::admin_stats();
    if let Some(stats) = state.cache.get::<AdminStats>(&cache_key).await {
        return Ok(Json(DataResponse::new(stats)));
    }

    let users_by_role = grouped_counts(
        &state,
        "SELECT role AS status, COUNT(*) AS count FROM users GROUP BY role ORDER BY role",
    )
    .await?;
    let rfqs_by_status = grouped_counts(
        &state,
        "SELECT status, COUNT(*) AS count FROM rfqs GROUP BY status ORDER BY status",
    )
    .await?;
    let orders_by_status = grouped_counts(
        &state,
        "SELECT status, COUNT(*) AS count FROM orders GROUP BY status ORDER BY status",
    )
    .await?;

    let pending_quotes: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM quotes WHERE status = 'pending'")
            .fetch_one(&state.db)
            .await?;

    let (gross_order_value, commission_earned): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(total_amount), 0)::BIGINT,
               COALESCE(SUM(commission_amount), 0)::BIGINT
        FROM orders
        WHERE status <> 'cancelled'
        "#,
    )
    .fetch_one(&state.db)
    .await?;

    let new_leads: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM scraped_companies WHERE status = 'new'")
            .fetch_one(&state.db)
            .await?;

    let stats = AdminStats {
        users_by_role,
        rfqs_by_status,
        orders_by_status,
        pending_quotes,
        gross_order_value,
        commission_earned,
        new_leads,
    };

    state.cache.put(&cache_key, &stats, STATS_TTL).await;

    Ok(Json(DataResponse::new(stats)))
}

// ============================================================================
// User Management
// ============================================================================

/// GET /admin/users
pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<AdminUserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let role = filter.role.map(|r| r.as_str());

    let where_clause = r#"
        WHERE ($1::text IS NULL OR role = $1)
        AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%'
             OR email ILIKE '%' || $2 || '%'
             OR company_name ILIKE '%' || $2 || '%')
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users {}", where_clause))
        .bind(role)
        .bind(&filter.search)
        .fetch_one(&state.db)
        .await?;

    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users {} ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        USER_COLUMNS, where_clause
    ))
    .bind(role)
    .bind(&filter.search)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let data: Vec<UserResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, &pagination, total))
}

/// POST /admin/suppliers/:user_id/verify
pub async fn verify_supplier(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<VerifySupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        UPDATE users SET verified = $2, rating = COALESCE($3, rating), updated_at = NOW()
        WHERE id = $1 AND role = 'supplier'
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(user_id)
    .bind(req.verified)
    .bind(req.rating)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Supplier not found"))?;

    let action = if req.verified {
        AdminAction::VerifySupplier
    } else {
        AdminAction::UnverifySupplier
    };
    log_admin_action(
        &mut *tx,
        admin.id,
        action,
        AuditTargetType::User,
        Some(user_id),
        serde_json::json!({ "verified": req.verified, "rating": req.rating }),
    )
    .await?;

    tx.commit().await?;

    // Verification and rating are scoring factors for every RFQ
    state.cache.invalidate(&keys::all_matches_pattern()).await;

    notifications::notify_supplier_verified(&state.db, user_id, req.verified).await;

    Ok(Json(DataResponse::new(UserResponse::from(row))))
}

/// POST /admin/users/:user_id/active
pub async fn set_user_active(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if user_id == admin.id && !req.active {
        return Err(ApiError::bad_request("You cannot suspend your own account"));
    }

    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        UPDATE users SET is_active = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(user_id)
    .bind(req.active)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    let action = if req.active {
        AdminAction::UnsuspendUser
    } else {
        AdminAction::SuspendUser
    };
    log_admin_action(
        &mut *tx,
        admin.id,
        action,
        AuditTargetType::User,
        Some(user_id),
        serde_json::json!({ "active": req.active }),
    )
    .await?;

    tx.commit().await?;

    let user = UserResponse::from(row);
    if user.role == UserRole::Supplier {
        state.cache.invalidate(&keys::all_matches_pattern()).await;
    }

    Ok(Json(DataResponse::new(user)))
}
