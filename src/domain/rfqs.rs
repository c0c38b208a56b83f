//! RFQ (request for quotation) domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::users::normalize_category;
use super::TransitionError;

/// RFQ lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RfqStatus {
    Open,
    Awarded,
    Closed,
    Cancelled,
}

impl RfqStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Awarded => "awarded",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Only an open RFQ can move, and only to a terminal state.
    pub fn can_transition_to(&self, next: RfqStatus) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Awarded) | (Self::Open, Self::Closed) | (Self::Open, Self::Cancelled)
        )
    }

    pub fn transition_to(&self, next: RfqStatus) -> Result<RfqStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::new("RFQ", self.as_str(), next.as_str()))
        }
    }
}

impl Default for RfqStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl From<String> for RfqStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "awarded" => Self::Awarded,
            "closed" => Self::Closed,
            "cancelled" => Self::Cancelled,
            _ => Self::Open,
        }
    }
}

impl std::fmt::Display for RfqStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response DTO for RFQ
#[derive(Debug, Clone, Serialize)]
pub struct RfqResponse {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub buyer_company: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub quantity: i64,
    pub unit: Option<String>,
    pub budget_min: Option<i64>, // paise
    pub budget_max: Option<i64>, // paise
    pub delivery_location: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: RfqStatus,
    pub awarded_quote_id: Option<Uuid>,
    pub quote_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating an RFQ
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRfqRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub quantity: i64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub budget_min: Option<i64>,
    #[serde(default)]
    pub budget_max: Option<i64>,
    #[serde(default)]
    pub delivery_location: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl CreateRfqRequest {
    /// Validate against `now`, returning the normalized category.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<String, String> {
        if self.title.trim().is_empty() {
            return Err("title is required".into());
        }
        let category = normalize_category(&self.category);
        if category.is_empty() {
            return Err("category is required".into());
        }
        if self.quantity < 1 {
            return Err("quantity must be at least 1".into());
        }
        validate_budget(self.budget_min, self.budget_max)?;
        validate_deadline(self.deadline, now)?;
        Ok(category)
    }
}

/// Request DTO for editing an open RFQ
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateRfqRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub budget_min: Option<i64>,
    #[serde(default)]
    pub budget_max: Option<i64>,
    #[serde(default)]
    pub delivery_location: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl UpdateRfqRequest {
    /// Validate the merged budget (`current_*` are the stored values) and
    /// return the normalized category, if one was supplied.
    pub fn validate(
        &self,
        current_min: Option<i64>,
        current_max: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, String> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err("title cannot be empty".into());
        }
        if matches!(self.quantity, Some(q) if q < 1) {
            return Err("quantity must be at least 1".into());
        }
        validate_budget(
            self.budget_min.or(current_min),
            self.budget_max.or(current_max),
        )?;
        validate_deadline(self.deadline, now)?;
        match &self.category {
            Some(raw) => {
                let category = normalize_category(raw);
                if category.is_empty() {
                    return Err("category cannot be empty".into());
                }
                Ok(Some(category))
            }
            None => Ok(None),
        }
    }
}

fn validate_budget(min: Option<i64>, max: Option<i64>) -> Result<(), String> {
    if matches!(min, Some(v) if v < 0) || matches!(max, Some(v) if v < 0) {
        return Err("budget cannot be negative".into());
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err("budget_min cannot exceed budget_max".into());
        }
    }
    Ok(())
}

fn validate_deadline(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<(), String> {
    match deadline {
        Some(d) if d <= now => Err("deadline must be in the future".into()),
        _ => Ok(()),
    }
}

/// Query params for the open RFQ marketplace
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RfqMarketQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub min_budget: Option<i64>,
}

/// Query params for a buyer's own RFQs
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MyRfqQuery {
    #[serde(default)]
    pub status: Option<RfqStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request() -> CreateRfqRequest {
        CreateRfqRequest {
            title: "500 MT TMT bars".into(),
            description: None,
            category: "Steel".into(),
            quantity: 500,
            unit: Some("MT".into()),
            budget_min: Some(10_000_000),
            budget_max: Some(20_000_000),
            delivery_location: Some("Pune".into()),
            deadline: None,
        }
    }

    #[test]
    fn open_is_the_only_source_state() {
        let open = RfqStatus::Open;
        assert!(open.can_transition_to(RfqStatus::Awarded));
        assert!(open.can_transition_to(RfqStatus::Closed));
        assert!(open.can_transition_to(RfqStatus::Cancelled));
        assert!(!open.can_transition_to(RfqStatus::Open));

        for terminal in [RfqStatus::Awarded, RfqStatus::Closed, RfqStatus::Cancelled] {
            for next in [
                RfqStatus::Open,
                RfqStatus::Awarded,
                RfqStatus::Closed,
                RfqStatus::Cancelled,
            ] {
                assert!(terminal.transition_to(next).is_err());
            }
        }
    }

    #[test]
    fn transition_error_names_both_states() {
        let err = RfqStatus::Awarded.transition_to(RfqStatus::Cancelled).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("awarded") && msg.contains("cancelled"));
    }

    #[test]
    fn valid_request_normalizes_category() {
        assert_eq!(request().validate(Utc::now()).unwrap(), "steel");
    }

    #[test]
    fn inverted_budget_rejected() {
        let mut req = request();
        req.budget_min = Some(30_000_000);
        assert!(req.validate(Utc::now()).is_err());
    }

    #[test]
    fn past_deadline_rejected() {
        let now = Utc::now();
        let mut req = request();
        req.deadline = Some(now - Duration::hours(1));
        assert!(req.validate(now).is_err());
        req.deadline = Some(now + Duration::days(7));
        assert!(req.validate(now).is_ok());
    }

    #[test]
    fn zero_quantity_rejected() {
        let mut req = request();
        req.quantity = 0;
        assert!(req.validate(Utc::now()).is_err());
    }

    #[test]
    fn update_budget_checked_against_stored_values() {
        let req = UpdateRfqRequest {
            budget_min: Some(5_000),
            ..Default::default()
        };
        assert!(req.validate(None, Some(4_000), Utc::now()).is_err());
        assert!(req.validate(None, Some(6_000), Utc::now()).is_ok());
    }
}
