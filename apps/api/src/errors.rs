use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

/// Malformed fee line or invoice input. Raised before any layout work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("fee line {line}: quantity must be greater than zero (got {value})")]
    NonPositiveQuantity { line: usize, value: Decimal },

    #[error("fee line {line}: unit_price must not be negative (got {value})")]
    NegativeUnitPrice { line: usize, value: Decimal },

    #[error("fee line {line}: description must not be blank")]
    BlankDescription { line: usize },

    #[error("fee line {line}: amount exceeds the representable range")]
    AmountOverflow { line: usize },

    #[error("required field '{field}' is missing")]
    MissingField { field: &'static str },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::NonPositiveQuantity { .. } => "quantity",
            ValidationError::NegativeUnitPrice { .. } => "unit_price",
            ValidationError::BlankDescription { .. } => "description",
            ValidationError::AmountOverflow { .. } => "amount",
            ValidationError::MissingField { field } => *field,
        }
    }

    /// Zero-based fee line index, for fee line errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            ValidationError::NonPositiveQuantity { line, .. }
            | ValidationError::NegativeUnitPrice { line, .. }
            | ValidationError::BlankDescription { line }
            | ValidationError::AmountOverflow { line } => Some(*line),
            ValidationError::MissingField { .. } => None,
        }
    }
}

/// A text run that cannot be represented in the output document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("field '{field}' contains '{ch}' (U+{:04X}), which the document font cannot render", codepoint(.ch))]
    UnsupportedGlyph { field: String, ch: char },
}

fn codepoint(ch: &char) -> u32 {
    *ch as u32
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                e.to_string(),
            ),
            AppError::Render(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "RENDER_ERROR",
                e.to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
