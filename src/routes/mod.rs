pub mod admin;
pub mod health;
pub mod leads;
pub mod matching;
pub mod me;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod quotes;
pub mod rfqs;
pub mod suppliers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Current user
        .route(
            "/me",
            get(me::get_me).post(me::onboard).put(me::update_me),
        )
        // Supplier directory
        .route("/suppliers", get(suppliers::list_suppliers))
        .route("/suppliers/:supplier_id", get(suppliers::get_supplier))
        // Product catalogue
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:product_id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        // RFQs
        .route("/rfqs", get(rfqs::list_open_rfqs).post(rfqs::create_rfq))
        .route("/rfqs/mine", get(rfqs::list_my_rfqs))
        .route("/rfqs/:rfq_id", get(rfqs::get_rfq).put(rfqs::update_rfq))
        .route("/rfqs/:rfq_id/close", post(rfqs::close_rfq))
        .route("/rfqs/:rfq_id/cancel", post(rfqs::cancel_rfq))
        .route("/rfqs/:rfq_id/matches", get(matching::get_matches))
        // Quotes (nested under RFQs)
        .route(
            "/rfqs/:rfq_id/quotes",
            get(quotes::list_rfq_quotes).post(quotes::submit_quote),
        )
        .route("/quotes/mine", get(quotes::list_my_quotes))
        .route("/quotes/:quote_id/withdraw", post(quotes::withdraw_quote))
        .route("/quotes/:quote_id/accept", post(quotes::accept_quote))
        // Orders
        .route("/orders", get(orders::list_orders))
        .route("/orders/:order_id", get(orders::get_order))
        .route("/orders/:order_id/status", post(orders::update_order_status))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notifications::get_unread_count),
        )
        .route("/notifications/read", post(notifications::mark_read))
        // Admin
        .route("/admin/stats", get(admin::get_admin_stats))
        .route("/admin/users", get(admin::list_users))
        .route(
            "/admin/suppliers/:user_id/verify",
            post(admin::verify_supplier),
        )
        .route("/admin/users/:user_id/active", post(admin::set_user_active))
        .route(
            "/admin/leads",
            get(leads::list_leads).post(leads::import_leads),
        )
        .route(
            "/admin/leads/:lead_id",
            axum::routing::patch(leads::update_lead),
        )
}
