//! Supplier matching for an RFQ
//!
//! Candidates are active suppliers ordered by their match score, bounded by
//! the configured candidate limit. Ranked lists are cached per (RFQ, limit).

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::rfqs::fetch_rfq;
use super::suppliers::{SupplierRow, SUPPLIER_COLUMNS};
use crate::api::DataResponse;
use crate::app::AppState;
use crate::auth::RequireUser;
use crate::domain::matching::{
    rank_suppliers, score_sql, MatchCriteria, SupplierMatch, MAX_MATCH_LIMIT,
};
use crate::domain::users::SupplierSummary;
use crate::error::ApiError;
use crate::services::cache::keys;

#[derive(Debug, Deserialize, Default)]
pub struct MatchQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /rfqs/:rfq_id/matches
pub async fn get_matches(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
    Query(query): Query<MatchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rfq = fetch_rfq(&state, rfq_id).await?;

    if rfq.buyer_id != user.id && !user.is_admin() {
        return Err(ApiError::forbidden(
            "Only the RFQ owner can view supplier matches",
        ));
    }

    let limit = query
        .limit
        .unwrap_or(state.settings.match_default_limit)
        .clamp(1, MAX_MATCH_LIMIT);
    let cache_key = keys::rfq_matches(rfq_id, limit);

    if let Some(cached) = state.cache.get::<Vec<SupplierMatch>>(&cache_key).await {
        return Ok(Json(DataResponse::new(cached)));
    }

    let criteria = MatchCriteria::new(&rfq.category, rfq.delivery_location.as_deref());

    let candidates: Vec<SupplierSummary> = sqlx::query_as::<_, SupplierRow>(&format!(
        r#"
        SELECT {} FROM users
        WHERE role = 'supplier' AND is_active
        ORDER BY {} DESC, rating DESC, id ASC
        LIMIT $1
        "#,
        SUPPLIER_COLUMNS,
        score_sql(2, 3)
    ))
    .bind(state.settings.match_candidate_limit)
    .bind(&criteria.category)
    .bind(&criteria.location)
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .map(Into::into)
    .collect();

    let candidate_count = candidates.len();
    let matches = rank_suppliers(&criteria, candidates, limit);

    tracing::info!(
        rfq_id = %rfq_id,
        candidates = candidate_count,
        returned = matches.len(),
        top_score = matches.first().map(|m| m.score).unwrap_or(0),
        "Suppliers matched"
    );

    state
        .cache
        .put(&cache_key, &matches, state.cache.default_ttl())
        .await;

    Ok(Json(DataResponse::new(matches)))
}
