//! Quote (supplier bid) domain types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::rfqs::RfqStatus;
use super::TransitionError;

pub const MAX_VALIDITY_DAYS: i64 = 90;

/// Quote status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub fn can_transition_to(&self, next: QuoteStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted)
                | (Self::Pending, Self::Rejected)
                | (Self::Pending, Self::Withdrawn)
        )
    }

    pub fn transition_to(&self, next: QuoteStatus) -> Result<QuoteStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::new("quote", self.as_str(), next.as_str()))
        }
    }
}

impl Default for QuoteStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl From<String> for QuoteStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            "withdrawn" => Self::Withdrawn,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response DTO for quote
#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    pub id: Uuid,
    pub rfq_id: Uuid,
    pub rfq_title: Option<String>,
    pub supplier_id: Uuid,
    pub supplier_name: Option<String>,
    pub unit_price: i64,   // paise
    pub quantity: i64,
    pub total_amount: i64, // paise
    pub delivery_days: Option<i32>,
    pub notes: Option<String>,
    pub status: QuoteStatus,
    pub valid_until: DateTime<Utc>,
    pub is_expired: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for submitting a quote
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitQuoteRequest {
    pub unit_price: i64,
    pub quantity: i64,
    pub validity_days: i64,
    #[serde(default)]
    pub delivery_days: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validated pricing derived from a [`SubmitQuoteRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotePricing {
    pub total_amount: i64,
    pub valid_until: DateTime<Utc>,
}

impl SubmitQuoteRequest {
    pub fn price(&self, now: DateTime<Utc>) -> Result<QuotePricing, String> {
        if self.unit_price <= 0 {
            return Err("unit_price must be positive".into());
        }
        if self.quantity < 1 {
            return Err("quantity must be at least 1".into());
        }
        if !(1..=MAX_VALIDITY_DAYS).contains(&self.validity_days) {
            return Err(format!(
                "validity_days must be between 1 and {}",
                MAX_VALIDITY_DAYS
            ));
        }
        if matches!(self.delivery_days, Some(d) if d < 0) {
            return Err("delivery_days cannot be negative".into());
        }

        let total_amount = self
            .unit_price
            .checked_mul(self.quantity)
            .ok_or_else(|| "quote total is too large".to_string())?;

        Ok(QuotePricing {
            total_amount,
            valid_until: now + Duration::days(self.validity_days),
        })
    }
}

/// Why a quote cannot be accepted right now
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcceptanceError {
    #[error("RFQ is {0} and no longer accepting awards")]
    RfqNotOpen(RfqStatus),
    #[error("quote is {0} and cannot be accepted")]
    QuoteNotPending(QuoteStatus),
    #[error("quote expired at {0}")]
    QuoteExpired(DateTime<Utc>),
}

/// Check every precondition for accepting a quote.
pub fn ensure_acceptable(
    rfq_status: RfqStatus,
    quote_status: QuoteStatus,
    valid_until: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), AcceptanceError> {
    if !rfq_status.can_transition_to(RfqStatus::Awarded) {
        return Err(AcceptanceError::RfqNotOpen(rfq_status));
    }
    if !quote_status.can_transition_to(QuoteStatus::Accepted) {
        return Err(AcceptanceError::QuoteNotPending(quote_status));
    }
    if valid_until <= now {
        return Err(AcceptanceError::QuoteExpired(valid_until));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(unit_price: i64, quantity: i64, validity_days: i64) -> SubmitQuoteRequest {
        SubmitQuoteRequest {
            unit_price,
            quantity,
            validity_days,
            delivery_days: Some(14),
            notes: None,
        }
    }

    #[test]
    fn pricing_multiplies_and_sets_validity() {
        let now = Utc::now();
        let pricing = submit(550_000, 20, 15).price(now).unwrap();
        assert_eq!(pricing.total_amount, 11_000_000);
        assert_eq!(pricing.valid_until, now + Duration::days(15));
    }

    #[test]
    fn pricing_rejects_overflow() {
        assert!(submit(i64::MAX, 2, 10).price(Utc::now()).is_err());
    }

    #[test]
    fn pricing_rejects_out_of_range_inputs() {
        let now = Utc::now();
        assert!(submit(0, 1, 10).price(now).is_err());
        assert!(submit(100, 0, 10).price(now).is_err());
        assert!(submit(100, 1, 0).price(now).is_err());
        assert!(submit(100, 1, MAX_VALIDITY_DAYS + 1).price(now).is_err());
    }

    #[test]
    fn only_pending_quotes_move() {
        assert!(QuoteStatus::Pending.can_transition_to(QuoteStatus::Withdrawn));
        assert!(QuoteStatus::Accepted
            .transition_to(QuoteStatus::Withdrawn)
            .is_err());
        assert!(QuoteStatus::Rejected
            .transition_to(QuoteStatus::Accepted)
            .is_err());
    }

    #[test]
    fn acceptance_preconditions() {
        let now = Utc::now();
        let later = now + Duration::days(1);

        assert!(ensure_acceptable(RfqStatus::Open, QuoteStatus::Pending, later, now).is_ok());
        assert_eq!(
            ensure_acceptable(RfqStatus::Awarded, QuoteStatus::Pending, later, now),
            Err(AcceptanceError::RfqNotOpen(RfqStatus::Awarded))
        );
        assert_eq!(
            ensure_acceptable(RfqStatus::Open, QuoteStatus::Withdrawn, later, now),
            Err(AcceptanceError::QuoteNotPending(QuoteStatus::Withdrawn))
        );
        assert_eq!(
            ensure_acceptable(RfqStatus::Open, QuoteStatus::Pending, now, now),
            Err(AcceptanceError::QuoteExpired(now))
        );
    }
}
