//! Order domain types
//!
//! An order is created from exactly one accepted quote and carries the
//! platform commission computed at award time.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TransitionError;

/// Order fulfilment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Shipped, Delivered)
                | (Delivered, Completed)
        )
    }

    pub fn transition_to(&self, next: OrderStatus) -> Result<OrderStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError::new("order", self.as_str(), next.as_str()))
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "confirmed" => Self::Confirmed,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the order is asking for a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderParty {
    Buyer,
    Supplier,
    Admin,
}

impl OrderParty {
    /// Suppliers drive fulfilment, buyers sign off, either may cancel early.
    pub fn may_set(&self, next: OrderStatus) -> bool {
        match self {
            Self::Admin => true,
            Self::Supplier => matches!(
                next,
                OrderStatus::Confirmed
                    | OrderStatus::Shipped
                    | OrderStatus::Delivered
                    | OrderStatus::Cancelled
            ),
            Self::Buyer => matches!(next, OrderStatus::Completed | OrderStatus::Cancelled),
        }
    }
}

/// Commission split for an order total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Commission {
    pub rate_bps: u32,
    pub amount: i64,
    pub supplier_payout: i64,
}

impl Commission {
    /// `total × bps / 10000`, rounded half away from zero to whole paise.
    pub fn compute(total: i64, rate_bps: u32) -> Self {
        let rate_bps = rate_bps.min(10_000);
        let amount = (Decimal::from(total) * Decimal::from(rate_bps) / Decimal::from(10_000))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(0);

        Self {
            rate_bps,
            amount,
            supplier_payout: total - amount,
        }
    }
}

/// The accepted quote an order is built from
#[derive(Debug, Clone)]
pub struct AwardedQuote {
    pub quote_id: Uuid,
    pub rfq_id: Uuid,
    pub buyer_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_amount: i64,
}

/// An order ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: Uuid,
    pub order_number: String,
    pub rfq_id: Uuid,
    pub quote_id: Uuid,
    pub buyer_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_amount: i64,
    pub commission: Commission,
}

impl NewOrder {
    pub fn from_award(award: &AwardedQuote, rate_bps: u32, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            order_number: order_number(id, now),
            rfq_id: award.rfq_id,
            quote_id: award.quote_id,
            buyer_id: award.buyer_id,
            supplier_id: award.supplier_id,
            quantity: award.quantity,
            unit_price: award.unit_price,
            total_amount: award.total_amount,
            commission: Commission::compute(award.total_amount, rate_bps),
        }
    }
}

/// Human-facing order number, e.g. `B24-20240615-1A2B3C4D`.
pub fn order_number(id: Uuid, now: DateTime<Utc>) -> String {
    let simple = id.simple().to_string().to_uppercase();
    format!("B24-{}-{}", now.format("%Y%m%d"), &simple[..8])
}

/// Response DTO for order
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub rfq_id: Uuid,
    pub rfq_title: Option<String>,
    pub quote_id: Uuid,
    pub buyer_id: Uuid,
    pub supplier_id: Uuid,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_amount: i64,
    pub commission_rate_bps: i32,
    pub commission_amount: i64,
    pub supplier_payout: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query params for listing orders
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OrderQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// Request to move an order forward
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn commission_rounds_half_up() {
        // 2.5% of 1_001 paise = 25.025 → 25
        assert_eq!(Commission::compute(1_001, 250).amount, 25);
        // 2.5% of 1_010 paise = 25.25 → 25
        assert_eq!(Commission::compute(1_010, 250).amount, 25);
        // 2.5% of 1_020 paise = 25.5 → 26
        let c = Commission::compute(1_020, 250);
        assert_eq!(c.amount, 26);
        assert_eq!(c.supplier_payout, 994);
    }

    #[test]
    fn commission_parts_sum_to_total() {
        for total in [0_i64, 1, 99, 12_345_678, 9_999_999_999] {
            let c = Commission::compute(total, 250);
            assert_eq!(c.amount + c.supplier_payout, total);
        }
    }

    #[test]
    fn commission_rate_is_capped() {
        let c = Commission::compute(10_000, 20_000);
        assert_eq!(c.rate_bps, 10_000);
        assert_eq!(c.amount, 10_000);
        assert_eq!(c.supplier_payout, 0);
    }

    #[test]
    fn fulfilment_path() {
        let mut status = OrderStatus::Pending;
        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Completed,
        ] {
            status = status.transition_to(next).unwrap();
        }
        assert!(status.is_terminal());
    }

    #[test]
    fn cannot_cancel_after_shipping() {
        assert!(OrderStatus::Shipped
            .transition_to(OrderStatus::Cancelled)
            .is_err());
        assert!(OrderStatus::Confirmed
            .transition_to(OrderStatus::Cancelled)
            .is_ok());
    }

    #[test]
    fn parties_have_distinct_powers() {
        assert!(OrderParty::Supplier.may_set(OrderStatus::Shipped));
        assert!(!OrderParty::Supplier.may_set(OrderStatus::Completed));
        assert!(OrderParty::Buyer.may_set(OrderStatus::Completed));
        assert!(!OrderParty::Buyer.may_set(OrderStatus::Shipped));
        assert!(OrderParty::Admin.may_set(OrderStatus::Delivered));
    }

    #[test]
    fn order_built_from_award() {
        let award = AwardedQuote {
            quote_id: Uuid::new_v4(),
            rfq_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            quantity: 100,
            unit_price: 40_000,
            total_amount: 4_000_000,
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let order = NewOrder::from_award(&award, 250, now);

        assert_eq!(order.quote_id, award.quote_id);
        assert_eq!(order.rfq_id, award.rfq_id);
        assert_eq!(order.commission.amount, 100_000);
        assert_eq!(order.commission.supplier_payout, 3_900_000);
        assert!(order.order_number.starts_with("B24-20240615-"));
        assert_eq!(order.order_number.len(), "B24-20240615-".len() + 8);
    }
}
