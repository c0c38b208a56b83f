//! User domain types
//!
//! Buyers post RFQs, suppliers quote on them, admins run the marketplace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Buyer,
    Supplier,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Supplier => "supplier",
            Self::Admin => "admin",
        }
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            "supplier" => Self::Supplier,
            "admin" => Self::Admin,
            _ => Self::Buyer,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full user profile as returned to its owner and admins
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub gst_number: Option<String>,
    pub categories: Vec<String>,
    pub years_in_business: i32,
    pub rating: f64,
    pub verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public supplier directory entry; contact details stay private
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierSummary {
    pub id: Uuid,
    pub name: String,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub categories: Vec<String>,
    pub years_in_business: i32,
    pub rating: f64,
    pub verified: bool,
}

/// Request DTO for first-time onboarding
#[derive(Debug, Clone, Deserialize)]
pub struct OnboardRequest {
    pub name: String,
    pub role: UserRole,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl OnboardRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is required".into());
        }
        if self.role == UserRole::Admin {
            return Err("admin accounts cannot be self-registered".into());
        }
        Ok(())
    }
}

/// Request DTO for profile updates
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub years_in_business: Option<i32>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err("name cannot be empty".into());
        }
        if matches!(self.years_in_business, Some(y) if !(0..=200).contains(&y)) {
            return Err("years_in_business must be between 0 and 200".into());
        }
        Ok(())
    }
}

/// Query params for the supplier directory
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SupplierQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub verified_only: Option<bool>,
    #[serde(default)]
    pub min_rating: Option<f64>,
}

/// Canonical category form: trimmed, lowercase, whitespace collapsed.
pub fn normalize_category(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalize and deduplicate a category list, keeping first-seen order.
pub fn normalize_categories(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for category in raw {
        let c = normalize_category(category);
        if !c.is_empty() && !out.contains(&c) {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_normalized_and_deduplicated() {
        let raw = vec![
            "  Steel  Pipes ".to_string(),
            "steel pipes".to_string(),
            "".to_string(),
            "Valves".to_string(),
        ];
        assert_eq!(normalize_categories(&raw), vec!["steel pipes", "valves"]);
    }

    #[test]
    fn admin_cannot_self_register() {
        let req = OnboardRequest {
            name: "Root".into(),
            role: UserRole::Admin,
            company_name: None,
            location: None,
            phone: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn blank_name_rejected() {
        let req = OnboardRequest {
            name: "   ".into(),
            role: UserRole::Buyer,
            company_name: None,
            location: None,
            phone: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn profile_update_bounds() {
        let req = UpdateProfileRequest {
            years_in_business: Some(-1),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = UpdateProfileRequest {
            years_in_business: Some(12),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn role_round_trips_through_text_column() {
        for role in [UserRole::Buyer, UserRole::Supplier, UserRole::Admin] {
            assert_eq!(UserRole::from(role.to_string()), role);
        }
    }
}
