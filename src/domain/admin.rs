//! Admin domain types
//!
//! Dashboard statistics, moderation requests and audit logging.

use serde::{Deserialize, Serialize};

use super::users::UserRole;

/// Admin action types for audit logging
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    VerifySupplier,
    UnverifySupplier,
    SuspendUser,
    UnsuspendUser,
    ImportLeads,
    UpdateLead,
}

impl std::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_default();
        write!(f, "{}", s.trim_matches('"'))
    }
}

/// Target types for audit logging
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditTargetType {
    User,
    Lead,
}

impl std::fmt::Display for AuditTargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_default();
        write!(f, "{}", s.trim_matches('"'))
    }
}

/// Label/count pair for grouped statistics
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Dashboard statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStats {
    pub users_by_role: Vec<StatusCount>,
    pub rfqs_by_status: Vec<StatusCount>,
    pub orders_by_status: Vec<StatusCount>,
    pub pending_quotes: i64,
    pub gross_order_value: i64, // paise, excludes cancelled orders
    pub commission_earned: i64, // paise, excludes cancelled orders
    pub new_leads: i64,
}

/// Query params for listing users
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminUserQuery {
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifySupplierRequest {
    pub verified: bool,
    /// Optional rating on the 0..=5 scale used by matching
    #[serde(default)]
    pub rating: Option<f64>,
}

impl VerifySupplierRequest {
    pub fn validate(&self) -> Result<(), String> {
        match self.rating {
            Some(r) if !r.is_finite() || !(0.0..=5.0).contains(&r) => {
                Err("Rating must be between 0 and 5".to_string())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_labels_are_snake_case() {
        assert_eq!(AdminAction::VerifySupplier.to_string(), "verify_supplier");
        assert_eq!(AuditTargetType::Lead.to_string(), "lead");
    }

    #[test]
    fn verify_request_rating_is_optional_and_bounded() {
        let req: VerifySupplierRequest =
            serde_json::from_value(serde_json::json!({ "verified": true })).unwrap();
        assert_eq!(req.rating, None);
        assert!(req.validate().is_ok());

        let req: VerifySupplierRequest =
            serde_json::from_value(serde_json::json!({ "verified": true, "rating": 4.5 }))
                .unwrap();
        assert!(req.validate().is_ok());

        for bad in [-0.1, 5.1, f64::NAN] {
            let req = VerifySupplierRequest {
                verified: true,
                rating: Some(bad),
            };
            assert!(req.validate().is_err());
        }
    }
}
