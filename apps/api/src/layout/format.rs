//! Field formatting for the printed document.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::billing::amounts::round2;
use crate::models::currency::Currency;

/// `{value}` with exactly two decimals, half-up.
pub fn format_amount(value: Decimal) -> String {
    round2(value).to_string()
}

/// `{symbol}{value}`, e.g. `CA$1250.00`.
pub fn format_money(value: Decimal, currency: Currency) -> String {
    format!("{}{}", currency.symbol(), format_amount(value))
}

/// `{symbol}{value} {code}`, e.g. `৳500.00 BDT`.
pub fn format_total(value: Decimal, currency: Currency) -> String {
    format!("{} {}", format_money(value, currency), currency.code())
}

/// Minimal decimal form: `2.50` → `2.5`, `3.000` → `3`.
pub fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

/// Locale-neutral long form, e.g. `5 March 2024`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}
