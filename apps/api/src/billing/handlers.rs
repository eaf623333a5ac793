use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::billing::amounts::{compute_amounts, price_invoice, ComputedAmounts, PricedInvoice};
use crate::billing::store::StoredInvoice;
use crate::errors::AppError;
use crate::layout::primitives::Page;
use crate::layout::{pdf_filename, render, render_pdf, PageConfig};
use crate::models::currency::Currency;
use crate::models::invoice::{FeeLine, FeeType, Invoice, InvoiceStatus};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QuoteRequest {
    #[serde(default)]
    pub fees: Vec<FeeLine>,
}

#[derive(Serialize)]
pub struct LayoutResponse {
    pub page_count: usize,
    pub pages: Vec<Page>,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: InvoiceStatus,
}

#[derive(Serialize)]
pub struct CurrencyOption {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
}

#[derive(Serialize)]
pub struct LabeledOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Choices an invoice form offers, in display order.
#[derive(Serialize)]
pub struct ReferenceData {
    pub currencies: Vec<CurrencyOption>,
    pub fee_types: Vec<LabeledOption>,
    pub statuses: Vec<&'static str>,
}

fn priced(invoice: Invoice) -> Result<PricedInvoice, AppError> {
    price_invoice(invoice).map_err(|e| {
        warn!(field = e.field(), line = ?e.line(), "Rejected invoice input: {e}");
        AppError::from(e)
    })
}

async fn layout_pages(invoice: PricedInvoice, config: PageConfig) -> Result<Vec<Page>, AppError> {
    let pages = tokio::task::spawn_blocking(move || render(&invoice, &config))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in layout: {e}")))??;
    Ok(pages)
}

async fn pdf_response(invoice: PricedInvoice, config: PageConfig) -> Result<Response, AppError> {
    let filename = pdf_filename(invoice.invoice_number());
    let bytes = tokio::task::spawn_blocking(move || render_pdf(&invoice, &config))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF render: {e}")))??;

    info!("Rendered {filename} ({} bytes)", bytes.len());
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid Content-Disposition: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(Bytes::from(bytes)),
    )
        .into_response())
}

async fn load(state: &AppState, id: Uuid) -> Result<StoredInvoice, AppError> {
    state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Stateless
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/invoices/reference
pub async fn handle_reference() -> Json<ReferenceData> {
    Json(ReferenceData {
        currencies: Currency::ALL
            .into_iter()
            .map(|c| CurrencyOption {
                code: c.code(),
                symbol: c.symbol(),
                name: c.name(),
            })
            .collect(),
        fee_types: FeeType::ALL
            .into_iter()
            .map(|t| LabeledOption {
                value: t.as_str(),
                label: t.label(),
            })
            .collect(),
        statuses: InvoiceStatus::ALL.iter().map(InvoiceStatus::as_str).collect(),
    })
}

/// POST /api/v1/invoices/quote
pub async fn handle_quote(Json(req): Json<QuoteRequest>) -> Result<Json<ComputedAmounts>, AppError> {
    let amounts = compute_amounts(&req.fees).map_err(|e| {
        warn!(field = e.field(), line = ?e.line(), "Rejected quote: {e}");
        AppError::from(e)
    })?;
    Ok(Json(amounts))
}

/// POST /api/v1/invoices/layout
pub async fn handle_layout(
    State(state): State<AppState>,
    Json(invoice): Json<Invoice>,
) -> Result<Json<LayoutResponse>, AppError> {
    let invoice = priced(invoice)?;
    let pages = layout_pages(invoice, state.page_config).await?;
    info!("Laid out {} page(s)", pages.len());
    Ok(Json(LayoutResponse {
        page_count: pages.len(),
        pages,
    }))
}

/// POST /api/v1/invoices/pdf
pub async fn handle_pdf(
    State(state): State<AppState>,
    Json(invoice): Json<Invoice>,
) -> Result<Response, AppError> {
    let invoice = priced(invoice)?;
    pdf_response(invoice, state.page_config).await
}

// ────────────────────────────────────────────────────────────────────────────
// Stored invoices
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/invoices
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<StoredInvoice>>, AppError> {
    Ok(Json(state.store.list().await?))
}

/// POST /api/v1/invoices
pub async fn handle_create(
    State(state): State<AppState>,
    Json(invoice): Json<Invoice>,
) -> Result<(StatusCode, Json<StoredInvoice>), AppError> {
    let invoice = priced(invoice)?;
    let stored = state.store.create(invoice).await?;
    info!("Created invoice {} ({})", stored.id, stored.invoice.invoice_number());
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/v1/invoices/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredInvoice>, AppError> {
    Ok(Json(load(&state, id).await?))
}

/// PUT /api/v1/invoices/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(invoice): Json<Invoice>,
) -> Result<Json<StoredInvoice>, AppError> {
    let invoice = priced(invoice)?;
    let stored = state
        .store
        .update(id, invoice)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {id} not found")))?;
    Ok(Json(stored))
}

/// PATCH /api/v1/invoices/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> Result<StatusCode, AppError> {
    if !state.store.update_status(id, req.status).await? {
        return Err(AppError::NotFound(format!("Invoice {id} not found")));
    }
    info!("Invoice {id} marked {}", req.status);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/invoices/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete(id).await? {
        return Err(AppError::NotFound(format!("Invoice {id} not found")));
    }
    info!("Deleted invoice {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/invoices/:id/pdf
pub async fn handle_get_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let stored = load(&state, id).await?;
    pdf_response(stored.invoice, state.page_config).await
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
