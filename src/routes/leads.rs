//! External lead routes (admin only)

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::admin::{log_admin_action, RequireAdmin};
use crate::api::{DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::domain::admin::{AdminAction, AuditTargetType};
use crate::domain::leads::{
    ImportLeadsRequest, ImportSummary, LeadQuery, LeadResponse, UpdateLeadRequest,
};
use crate::domain::users::normalize_category;
use crate::error::ApiError;

const LEAD_COLUMNS: &str =
    "id, name, category, location, website, email, phone, source, status, created_at, updated_at";

/// Database row for lead
#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: Uuid,
    name: String,
    category: Option<String>,
    location: Option<String>,
    website: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    source: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LeadRow> for LeadResponse {
    fn from(row: LeadRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            location: row.location,
            website: row.website,
            email: row.email,
            phone: row.phone,
            source: row.source,
            status: row.status.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// POST /admin/leads
///
/// Bulk import. Rows already on file for the same (name, source) are counted
/// as duplicates and left untouched.
pub async fn import_leads(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportLeadsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (leads, skipped) = req.clean().map_err(ApiError::validation)?;
    let source = req.source.trim();

    let mut tx = state.db.begin().await?;
    let mut inserted = 0u64;

    for lead in &leads {
        let result = sqlx::query(
            r#"
            INSERT INTO scraped_companies (name, category, location, website, email, phone, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ((LOWER(name)), source) DO NOTHING
            "#,
        )
        .bind(&lead.name)
        .bind(&lead.category)
        .bind(&lead.location)
        .bind(&lead.website)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(source)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    let summary = ImportSummary {
        received: req.leads.len(),
        inserted,
        skipped,
        duplicates: leads.len() as u64 - inserted,
    };

    log_admin_action(
        &mut *tx,
        admin.id,
        AdminAction::ImportLeads,
        AuditTargetType::Lead,
        None,
        serde_json::json!({
            "source": source,
            "received": summary.received,
            "inserted": summary.inserted,
            "skipped": summary.skipped,
            "duplicates": summary.duplicates,
        }),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        admin_id = %admin.id,
        source = %source,
        received = summary.received,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        "Leads imported"
    );

    Ok(Json(DataResponse::new(summary)))
}

/// GET /admin/leads
pub async fn list_leads(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<LeadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = filter.status.map(|s| s.as_str());
    let category = filter
        .category
        .as_deref()
        .map(normalize_category)
        .filter(|c| !c.is_empty());

    let where_clause = r#"
        WHERE ($1::text IS NULL OR status = $1)
        AND ($2::text IS NULL OR category = $2)
        AND ($3::text IS NULL OR source = $3)
        AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%')
    "#;

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM scraped_companies {}",
        where_clause
    ))
    .bind(status)
    .bind(&category)
    .bind(&filter.source)
    .bind(&filter.search)
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query_as::<_, LeadRow>(&format!(
        "SELECT {} FROM scraped_companies {} ORDER BY created_at DESC, name ASC LIMIT $5 OFFSET $6",
        LEAD_COLUMNS, where_clause
    ))
    .bind(status)
    .bind(&category)
    .bind(&filter.source)
    .bind(&filter.search)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.db)
    .await?;

    let data: Vec<LeadResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Paginated::new(data, &pagination, total))
}

/// PATCH /admin/leads/:lead_id
pub async fn update_lead(
    admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(lead_id): Path<Uuid>,
    Json(req): Json<UpdateLeadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, LeadRow>(&format!(
        r#"
        UPDATE scraped_companies SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        LEAD_COLUMNS
    ))
    .bind(lead_id)
    .bind(req.status.as_str())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Lead not found"))?;

    log_admin_action(
        &mut *tx,
        admin.id,
        AdminAction::UpdateLead,
        AuditTargetType::Lead,
        Some(lead_id),
        serde_json::json!({ "status": req.status }),
    )
    .await?;

    tx.commit().await?;

    Ok(Json(DataResponse::new(LeadResponse::from(row))))
}
