use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::currency::Currency;

// ────────────────────────────────────────────────────────────────────────────
// Enumerations
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    Filing,
    Search,
    Examination,
    Maintenance,
    Professional,
}

impl FeeType {
    pub const ALL: [FeeType; 5] = [
        FeeType::Filing,
        FeeType::Search,
        FeeType::Examination,
        FeeType::Maintenance,
        FeeType::Professional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::Filing => "filing",
            FeeType::Search => "search",
            FeeType::Examination => "examination",
            FeeType::Maintenance => "maintenance",
            FeeType::Professional => "professional",
        }
    }

    /// Label used on input forms and listings.
    pub fn label(&self) -> &'static str {
        match self {
            FeeType::Filing => "Filing Fee",
            FeeType::Search => "Search Fee",
            FeeType::Examination => "Examination Fee",
            FeeType::Maintenance => "Maintenance Fee",
            FeeType::Professional => "Professional Service",
        }
    }

    /// Label that fits the narrow Type column of the printed table.
    pub fn short_label(&self) -> &'static str {
        match self {
            FeeType::Filing => "Filing",
            FeeType::Search => "Search",
            FeeType::Examination => "Examination",
            FeeType::Maintenance => "Maintenance",
            FeeType::Professional => "Professional",
        }
    }
}

impl FromStr for FeeType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown fee type '{s}'"))
    }
}

/// Display vocabulary only; transition rules live outside the billing core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvoiceStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown invoice status '{s}'"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Invoice input
// ────────────────────────────────────────────────────────────────────────────

/// One billable item as entered. `amount` is never part of the input; it is
/// derived by the amount engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeLine {
    pub description: String,
    pub fee_type: FeeType,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patent {
    pub number: String,
    pub title: String,
}

/// Everything on an invoice except its fee lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDetails {
    pub invoice_number: String,
    pub client: Client,
    pub patent: Patent,
    pub currency: Currency,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A complete invoice as supplied by the input or persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(flatten)]
    pub details: InvoiceDetails,
    #[serde(default)]
    pub fees: Vec<FeeLine>,
}

// ────────────────────────────────────────────────────────────────────────────
// Storage rows
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub client_name: String,
    pub client_email: String,
    pub client_address: String,
    pub patent_number: String,
    pub patent_title: String,
    pub currency: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: String,
    pub notes: Option<String>,
    /// Written for reporting queries; never read back as the invoice total.
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceFeeRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub position: i32,
    pub description: String,
    pub fee_type: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl InvoiceRow {
    /// Reassembles the domain invoice from a row and its fee rows (already in
    /// `position` order).
    pub fn into_invoice(self, fees: Vec<InvoiceFeeRow>) -> anyhow::Result<Invoice> {
        let fees = fees
            .into_iter()
            .map(|f| {
                Ok(FeeLine {
                    description: f.description,
                    fee_type: f.fee_type.parse()?,
                    quantity: f.quantity,
                    unit_price: f.unit_price,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Invoice {
            details: InvoiceDetails {
                invoice_number: self.invoice_number,
                client: Client {
                    name: self.client_name,
                    email: self.client_email,
                    address: self.client_address,
                },
                patent: Patent {
                    number: self.patent_number,
                    title: self.patent_title,
                },
                currency: self.currency.parse()?,
                issue_date: self.issue_date,
                due_date: self.due_date,
                status: self.status.parse()?,
                notes: self.notes,
            },
            fees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_invoice_json_shape() {
        let json = r#"{
            "invoice_number": "INV-7",
            "client": {"name": "Acme", "email": "ip@acme.test", "address": "1 Main St"},
            "patent": {"number": "US 1,234,567", "title": "Widget"},
            "currency": "USD",
            "issue_date": "2024-03-05",
            "due_date": "2024-04-04",
            "status": "draft",
            "fees": [
                {"description": "Filing", "fee_type": "filing", "quantity": 1, "unit_price": "500.00"}
            ]
        }"#;
        let invoice: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.details.invoice_number, "INV-7");
        assert_eq!(invoice.details.currency, Currency::Usd);
        assert_eq!(invoice.details.notes, None);
        assert_eq!(invoice.fees.len(), 1);
        assert_eq!(invoice.fees[0].quantity, dec("1"));
        assert_eq!(invoice.fees[0].unit_price, dec("500.00"));
    }

    #[test]
    fn test_enum_strings_round_trip() {
        for t in FeeType::ALL {
            assert_eq!(t.as_str().parse::<FeeType>().unwrap(), t);
        }
        for s in InvoiceStatus::ALL {
            assert_eq!(s.as_str().parse::<InvoiceStatus>().unwrap(), s);
        }
        assert!("void".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_fee_type_labels() {
        assert_eq!(FeeType::Professional.label(), "Professional Service");
        assert_eq!(FeeType::Professional.short_label(), "Professional");
        assert_eq!(FeeType::Filing.label(), "Filing Fee");
    }

    #[test]
    fn test_row_into_invoice_keeps_fee_order() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let row = InvoiceRow {
            id,
            invoice_number: "INV-1".to_string(),
            client_name: "Acme".to_string(),
            client_email: "ip@acme.test".to_string(),
            client_address: "1 Main St".to_string(),
            patent_number: "CA 3,000,000".to_string(),
            patent_title: "Widget".to_string(),
            currency: "CAD".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            status: "sent".to_string(),
            notes: Some("Net 30".to_string()),
            total_amount: dec("0"),
            created_at: now,
            updated_at: now,
        };
        let fee = |position: i32, description: &str| InvoiceFeeRow {
            id: Uuid::new_v4(),
            invoice_id: id,
            position,
            description: description.to_string(),
            fee_type: "search".to_string(),
            quantity: dec("1"),
            unit_price: dec("10"),
            amount: dec("10"),
            created_at: now,
        };

        let invoice = row.into_invoice(vec![fee(0, "first"), fee(1, "second")]).unwrap();
        assert_eq!(invoice.details.currency, Currency::Cad);
        assert_eq!(invoice.details.status, InvoiceStatus::Sent);
        assert_eq!(invoice.fees[0].description, "first");
        assert_eq!(invoice.fees[1].description, "second");
        assert_eq!(invoice.fees[1].fee_type, FeeType::Search);
    }
}
