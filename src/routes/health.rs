use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::db;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub database: String,
    pub redis: String,
}

/// Overall status from the two dependency checks. The database is critical,
/// Redis only degrades the service.
fn overall_status(db_ok: bool, redis_ok: bool) -> (&'static str, StatusCode) {
    match (db_ok, redis_ok) {
        (true, true) => ("healthy", StatusCode::OK),
        (true, false) => ("degraded", StatusCode::OK),
        (false, _) => ("unhealthy", StatusCode::SERVICE_UNAVAILABLE),
    }
}

fn label(ok: bool) -> String {
    let label = if ok { "ok" } else { "error" };
    label.to_string()
}

/// Health check endpoint - public
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (db_result, redis_result) =
        tokio::join!(db::health_check(&state.db), state.cache.health_check());

    if let Err(e) = &db_result {
        tracing::error!(error = %e, "Database health check failed");
    }
    if let Err(e) = &redis_result {
        tracing::warn!(error = %e, "Redis health check failed");
    }

    let (status, status_code) = overall_status(db_result.is_ok(), redis_result.is_ok());

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: ServiceHealth {
                database: label(db_result.is_ok()),
                redis: label(redis_result.is_ok()),
            },
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_outage_is_unhealthy() {
        assert_eq!(overall_status(true, true), ("healthy", StatusCode::OK));
        assert_eq!(overall_status(true, false), ("degraded", StatusCode::OK));
        assert_eq!(
            overall_status(false, true),
            ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
        );
    }
}
