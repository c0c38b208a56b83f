//! Current user routes
//!
//! Onboarding turns a verified token subject into a marketplace user.

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::{RequireAuth, RequireUser};
use crate::domain::users::{
    normalize_categories, OnboardRequest, UpdateProfileRequest, UserResponse, UserRole,
};
use crate::error::ApiError;
use crate::services::cache::keys;

pub(crate) const USER_COLUMNS: &str = "id, email, name, role, company_name, phone, location, \
     gst_number, categories, years_in_business, rating, verified, is_active, created_at, updated_at";

/// Database row for user
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    role: String,
    company_name: Option<String>,
    phone: Option<String>,
    location: Option<String>,
    gst_number: Option<String>,
    categories: Vec<String>,
    years_in_business: i32,
    rating: f64,
    verified: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            role: row.role.into(),
            company_name: row.company_name,
            phone: row.phone,
            location: row.location,
            gst_number: row.gst_number,
            categories: row.categories,
            years_in_business: row.years_in_business,
            rating: row.rating,
            verified: row.verified,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// POST /me
///
/// First-time onboarding for the token subject.
pub async fn onboard(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<OnboardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(ApiError::bad_request)?;

    let email = auth
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request("Token carries no email address"))?;

    tracing::info!(
        user_id = %auth.user_id,
        issuer = %auth.issuer,
        role = %req.role,
        "Onboarding user"
    );

    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (id, email, name, role, company_name, location, phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(auth.user_id)
    .bind(email)
    .bind(req.name.trim())
    .bind(req.role.as_str())
    .bind(trimmed(&req.company_name))
    .bind(trimmed(&req.location))
    .bind(trimmed(&req.phone))
    .fetch_one(&state.db)
    .await
    .map_err(|e| ApiError::unique_violation(e, "User is already onboarded"))?;

    Ok(Created(UserResponse::from(row)))
}

/// GET /me
pub async fn get_me(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(DataResponse::new(UserResponse::from(row))))
}

/// PUT /me
///
/// Partial profile update; omitted fields keep their value.
pub async fn update_me(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate().map_err(ApiError::validation)?;

    let categories = req.categories.as_deref().map(normalize_categories);

    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            company_name = COALESCE($3, company_name),
            phone = COALESCE($4, phone),
            location = COALESCE($5, location),
            gst_number = COALESCE($6, gst_number),
            categories = COALESCE($7, categories),
            years_in_business = COALESCE($8, years_in_business),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(user.id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(trimmed(&req.company_name))
    .bind(trimmed(&req.phone))
    .bind(trimmed(&req.location))
    .bind(trimmed(&req.gst_number))
    .bind(categories)
    .bind(req.years_in_business)
    .fetch_one(&state.db)
    .await?;

    // Supplier profile fields feed every RFQ's match list
    if user.role == UserRole::Supplier {
        state.cache.invalidate(&keys::all_matches_pattern()).await;
    }

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(DataResponse::new(UserResponse::from(row))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_fields_are_dropped() {
        assert_eq!(trimmed(&Some("  Pune ".into())), Some("Pune".to_string()));
        assert_eq!(trimmed(&Some("   ".into())), None);
        assert_eq!(trimmed(&None), None);
    }
}
