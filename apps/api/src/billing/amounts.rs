//! Amount engine: derives per-line amounts and the invoice total from fee lines.
//!
//! Rounding happens at exactly two points, both through [`round2`]:
//! - each line: `amount = round2(quantity × unit_price)`
//! - the invoice: `total = round2(Σ amount)`
//!
//! Lines are rounded before summing so the printed line amounts always add up to
//! the printed total. Everything here is pure and deterministic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::billing::validation::{validate_details, validate_fee_line};
use crate::errors::ValidationError;
use crate::models::currency::Currency;
use crate::models::invoice::{FeeLine, FeeType, Invoice, InvoiceDetails};

/// Largest line amount or total accepted: `9999999999999999.99`.
///
/// Matches the `NUMERIC(18, 2)` amount columns, and keeps every amount well
/// inside the range where `Decimal` can hold a scale of 2.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, 2);

/// Rounds to 2 decimal places, half-up, and pins the scale to exactly 2.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// A fee line with its derived amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedFee {
    pub description: String,
    pub fee_type: FeeType,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

/// Result of [`compute_amounts`]: fees in input order plus their total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedAmounts {
    pub fees: Vec<PricedFee>,
    pub total_amount: Decimal,
}

/// An invoice whose amounts were derived by this engine.
///
/// Fields are private: the only way to obtain one is [`price_invoice`], so the
/// total can never be supplied independently of the fees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedInvoice {
    #[serde(flatten)]
    details: InvoiceDetails,
    fees: Vec<PricedFee>,
    total_amount: Decimal,
}

impl PricedInvoice {
    pub fn details(&self) -> &InvoiceDetails {
        &self.details
    }

    pub fn fees(&self) -> &[PricedFee] {
        &self.fees
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn currency(&self) -> Currency {
        self.details.currency
    }

    pub fn invoice_number(&self) -> &str {
        &self.details.invoice_number
    }

    /// The input form of this invoice, without derived amounts.
    pub fn to_invoice(&self) -> Invoice {
        Invoice {
            details: self.details.clone(),
            fees: self
                .fees
                .iter()
                .map(|f| FeeLine {
                    description: f.description.clone(),
                    fee_type: f.fee_type,
                    quantity: f.quantity,
                    unit_price: f.unit_price,
                })
                .collect(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core functions
// ────────────────────────────────────────────────────────────────────────────

/// Prices every fee line and sums the rounded amounts.
///
/// Fails on the first line with a non-positive quantity, a negative unit price,
/// or a line amount or running total above [`MAX_AMOUNT`]. Output order
/// matches input order.
pub fn compute_amounts(fees: &[FeeLine]) -> Result<ComputedAmounts, ValidationError> {
    let priced = fees
        .iter()
        .enumerate()
        .map(|(line, fee)| price_fee(line, fee))
        .collect::<Result<Vec<_>, _>>()?;

    let mut sum = Decimal::ZERO;
    for (line, fee) in priced.iter().enumerate() {
        sum = sum
            .checked_add(fee.amount)
            .filter(|s| *s <= MAX_AMOUNT)
            .ok_or(ValidationError::AmountOverflow { line })?;
    }

    Ok(ComputedAmounts {
        fees: priced,
        total_amount: round2(sum),
    })
}

/// Validates the invoice fields, then prices its fees.
pub fn price_invoice(invoice: Invoice) -> Result<PricedInvoice, ValidationError> {
    validate_details(&invoice.details)?;
    let ComputedAmounts { fees, total_amount } = compute_amounts(&invoice.fees)?;
    Ok(PricedInvoice {
        details: invoice.details,
        fees,
        total_amount,
    })
}

fn price_fee(line: usize, fee: &FeeLine) -> Result<PricedFee, ValidationError> {
    validate_fee_line(line, fee)?;
    let amount = fee
        .quantity
        .checked_mul(fee.unit_price)
        .map(round2)
        .filter(|a| *a <= MAX_AMOUNT)
        .ok_or(ValidationError::AmountOverflow { line })?;
    Ok(PricedFee {
        description: fee.description.clone(),
        fee_type: fee.fee_type,
        quantity: fee.quantity,
        unit_price: fee.unit_price,
        amount,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
