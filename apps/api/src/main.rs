mod billing;
mod config;
mod db;
mod errors;
mod layout;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::billing::store::{InvoiceStore, MemoryInvoiceStore, PgInvoiceStore};
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparseable env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting patent-invoicing v{}", env!("CARGO_PKG_VERSION"));

    // Initialize invoice storage
    let store: Arc<dyn InvoiceStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            run_migrations(&pool).await?;
            Arc::new(PgInvoiceStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; invoices are kept in memory and lost on restart");
            Arc::new(MemoryInvoiceStore::new())
        }
    };

    let state = AppState::new(store, &config);
    info!(
        "Layout page config: {:?} ({}x{} mm), glyph policy {:?}",
        state.page_config.size,
        state.page_config.width_mm,
        state.page_config.height_mm,
        state.page_config.glyph_policy
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
