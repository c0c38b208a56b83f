//! Notification domain types
//!
//! In-app notifications written when quotes and orders change hands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification type enum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    // Quote-related
    QuoteReceived,
    QuoteAccepted,
    QuoteRejected,
    QuoteWithdrawn,

    // RFQ-related
    RfqClosed,

    // Order-related
    OrderStatusChanged,

    // Account
    SupplierVerified,

    System,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_default();
        write!(f, "{}", s.trim_matches('"'))
    }
}

impl From<String> for NotificationType {
    fn from(s: String) -> Self {
        serde_json::from_value(serde_json::Value::String(s)).unwrap_or(NotificationType::System)
    }
}

/// Response DTO for notification
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NotificationResponse {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: Option<String>,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Query params for listing notifications
#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: Option<bool>,
}

/// Unread count response
#[derive(Debug, Clone, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// Mark notifications as read; omit ids to mark everything
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub notification_ids: Option<Vec<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_uses_snake_case_text() {
        assert_eq!(NotificationType::QuoteReceived.to_string(), "quote_received");
        assert_eq!(
            NotificationType::from("order_status_changed".to_string()),
            NotificationType::OrderStatusChanged
        );
        assert_eq!(
            NotificationType::from("something_else".to_string()),
            NotificationType::System
        );
    }
}
