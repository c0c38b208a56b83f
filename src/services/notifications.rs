//! Notification service
//!
//! Writes in-app notifications when marketplace events happen. Callers run
//! these after their own transaction commits; a failed notification is
//! logged and never fails the originating request.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::notifications::NotificationType;
use crate::domain::orders::OrderStatus;
use crate::domain::rfqs::RfqStatus;

/// Create a notification for a user
pub async fn create_notification(
    db: &PgPool,
    user_id: Uuid,
    notification_type: NotificationType,
    title: &str,
    message: Option<&str>,
    data: serde_json::Value,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let type_str = notification_type.to_string();

    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, type, title, message, data)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&type_str)
    .bind(title)
    .bind(message)
    .bind(&data)
    .execute(db)
    .await?;

    tracing::debug!(
        user_id = %user_id,
        notification_type = %type_str,
        notification_id = %id,
        "Notification created"
    );

    Ok(id)
}

fn log_failure(result: Result<Uuid, sqlx::Error>, user_id: Uuid, what: &str) {
    if let Err(e) = result {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to send {} notification", what);
    }
}

/// Rupees with two decimals from paise
fn rupees(paise: i64) -> String {
    format!("₹{}.{:02}", paise / 100, (paise % 100).abs())
}

pub async fn notify_quote_received(
    db: &PgPool,
    buyer_id: Uuid,
    rfq_id: Uuid,
    rfq_title: &str,
    supplier_name: &str,
    total_amount: i64,
) {
    let result = create_notification(
        db,
        buyer_id,
        NotificationType::QuoteReceived,
        &format!("New quote on {}", rfq_title),
        Some(&format!(
            "{} quoted {} in total",
            supplier_name,
            rupees(total_amount)
        )),
        serde_json::json!({
            "rfq_id": rfq_id,
            "supplier_name": supplier_name,
            "total_amount": total_amount,
        }),
    )
    .await;
    log_failure(result, buyer_id, "quote received");
}

pub async fn notify_quote_accepted(
    db: &PgPool,
    supplier_id: Uuid,
    rfq_id: Uuid,
    rfq_title: &str,
    order_id: Uuid,
    order_number: &str,
) {
    let result = create_notification(
        db,
        supplier_id,
        NotificationType::QuoteAccepted,
        "Your quote was accepted!",
        Some(&format!(
            "Your quote for '{}' won. Order {} has been created.",
            rfq_title, order_number
        )),
        serde_json::json!({
            "rfq_id": rfq_id,
            "order_id": order_id,
            "order_number": order_number,
        }),
    )
    .await;
    log_failure(result, supplier_id, "quote accepted");
}

/// Tell suppliers whose pending quotes lost to an awarded quote.
pub async fn notify_quotes_rejected(
    db: &PgPool,
    supplier_ids: &[Uuid],
    rfq_id: Uuid,
    rfq_title: &str,
) {
    for &supplier_id in supplier_ids {
        let result = create_notification(
            db,
            supplier_id,
            NotificationType::QuoteRejected,
            "Quote not selected",
            Some(&format!(
                "Your quote for '{}' was not selected. Keep quoting on other RFQs!",
                rfq_title
            )),
            serde_json::json!({ "rfq_id": rfq_id }),
        )
        .await;
        log_failure(result, supplier_id, "quote rejected");
    }
}

/// Tell suppliers with pending quotes that the buyer ended the RFQ
/// without an award.
pub async fn notify_rfq_closed(
    db: &PgPool,
    supplier_ids: &[Uuid],
    rfq_id: Uuid,
    rfq_title: &str,
    status: RfqStatus,
) {
    for &supplier_id in supplier_ids {
        let result = create_notification(
            db,
            supplier_id,
            NotificationType::RfqClosed,
            &format!("RFQ {} was {}", rfq_title, status),
            Some("The buyer ended this RFQ without an award. Your quote has been closed."),
            serde_json::json!({ "rfq_id": rfq_id, "status": status }),
        )
        .await;
        log_failure(result, supplier_id, "RFQ closed");
    }
}

pub async fn notify_quote_withdrawn(
    db: &PgPool,
    buyer_id: Uuid,
    rfq_id: Uuid,
    rfq_title: &str,
    supplier_name: &str,
) {
    let result = create_notification(
        db,
        buyer_id,
        NotificationType::QuoteWithdrawn,
        &format!("Quote withdrawn on {}", rfq_title),
        Some(&format!("{} withdrew their quote", supplier_name)),
        serde_json::json!({ "rfq_id": rfq_id }),
    )
    .await;
    log_failure(result, buyer_id, "quote withdrawn");
}

pub async fn notify_order_status(
    db: &PgPool,
    recipient_id: Uuid,
    order_id: Uuid,
    order_number: &str,
    status: OrderStatus,
) {
    let result = create_notification(
        db,
        recipient_id,
        NotificationType::OrderStatusChanged,
        &format!("Order {} is now {}", order_number, status),
        None,
        serde_json::json!({
            "order_id": order_id,
            "order_number": order_number,
            "status": status,
        }),
    )
    .await;
    log_failure(result, recipient_id, "order status");
}

pub async fn notify_supplier_verified(db: &PgPool, supplier_id: Uuid, verified: bool) {
    let (title, message) = if verified {
        (
            "Your business is verified",
            "Verified suppliers rank higher in RFQ matches.",
        )
    } else {
        (
            "Verification removed",
            "Contact support if you believe this is a mistake.",
        )
    };

    let result = create_notification(
        db,
        supplier_id,
        NotificationType::SupplierVerified,
        title,
        Some(message),
        serde_json::json!({ "verified": verified }),
    )
    .await;
    log_failure(result, supplier_id, "verification");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rupee_formatting() {
        assert_eq!(rupees(0), "₹0.00");
        assert_eq!(rupees(5), "₹0.05");
        assert_eq!(rupees(1_234_567), "₹12345.67");
    }
}
