use std::sync::Arc;

use crate::billing::store::InvoiceStore;
use crate::config::Config;
use crate::layout::PageConfig;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres-backed in production, in-memory without `DATABASE_URL`.
    pub store: Arc<dyn InvoiceStore>,
    /// Page geometry and glyph policy, fixed at startup.
    pub page_config: PageConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn InvoiceStore>, config: &Config) -> Self {
        Self {
            store,
            page_config: config.page_config(),
        }
    }
}
