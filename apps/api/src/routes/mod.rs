pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::billing::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Stateless engine endpoints
        .route("/api/v1/invoices/reference", get(handlers::handle_reference))
        .route("/api/v1/invoices/quote", post(handlers::handle_quote))
        .route("/api/v1/invoices/layout", post(handlers::handle_layout))
        .route("/api/v1/invoices/pdf", post(handlers::handle_pdf))
        // Stored invoices
        .route(
            "/api/v1/invoices",
            get(handlers::handle_list).post(handlers::handle_create),
        )
        .route(
            "/api/v1/invoices/:id",
            get(handlers::handle_get)
                .put(handlers::handle_update)
                .delete(handlers::handle_delete),
        )
        .route(
            "/api/v1/invoices/:id/status",
            patch(handlers::handle_update_status),
        )
        .route("/api/v1/invoices/:id/pdf", get(handlers::handle_get_pdf))
        .with_state(state)
}
