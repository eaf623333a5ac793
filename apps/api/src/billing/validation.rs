use rust_decimal::Decimal;

use crate::errors::ValidationError;
use crate::models::invoice::{FeeLine, InvoiceDetails};

/// Rejects invoices with a blank required text field.
///
/// Fields are checked in the order they appear on the printed document, so the
/// reported field is the first one a reader would notice missing.
pub fn validate_details(details: &InvoiceDetails) -> Result<(), ValidationError> {
    let required: [(&'static str, &str); 6] = [
        ("invoice_number", details.invoice_number.as_str()),
        ("client.name", details.client.name.as_str()),
        ("client.email", details.client.email.as_str()),
        ("client.address", details.client.address.as_str()),
        ("patent.number", details.patent.number.as_str()),
        ("patent.title", details.patent.title.as_str()),
    ];

    match required.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(ValidationError::MissingField { field: *field }),
        None => Ok(()),
    }
}

/// Checks one fee line. `line` is its zero-based position in the invoice.
pub fn validate_fee_line(line: usize, fee: &FeeLine) -> Result<(), ValidationError> {
    if fee.description.trim().is_empty() {
        return Err(ValidationError::BlankDescription { line });
    }
    if fee.quantity <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveQuantity {
            line,
            value: fee.quantity,
        });
    }
    if fee.unit_price.is_sign_negative() && !fee.unit_price.is_zero() {
        return Err(ValidationError::NegativeUnitPrice {
            line,
            value: fee.unit_price,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::currency::Currency;
    use crate::models::invoice::{Client, FeeType, InvoiceStatus, Patent};
    use chrono::NaiveDate;

    fn details() -> InvoiceDetails {
        InvoiceDetails {
            invoice_number: "INV-1".to_string(),
            client: Client {
                name: "Acme".to_string(),
                email: "ip@acme.test".to_string(),
                address: "1 Main St".to_string(),
            },
            patent: Patent {
                number: "EP 1 000 000".to_string(),
                title: "Widget".to_string(),
            },
            currency: Currency::Cny,
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            status: InvoiceStatus::Draft,
            notes: None,
        }
    }

    fn line(quantity: Decimal, unit_price: Decimal) -> FeeLine {
        FeeLine {
            description: "Search".to_string(),
            fee_type: FeeType::Search,
            quantity,
            unit_price,
        }
    }

    #[test]
    fn test_complete_details_pass() {
        assert!(validate_details(&details()).is_ok());
    }

    #[test]
    fn test_first_blank_field_is_reported() {
        let mut d = details();
        d.patent.title = String::new();
        d.client.email = "\t".to_string();
        let err = validate_details(&d).unwrap_err();
        assert_eq!(err.field(), "client.email");
    }

    #[test]
    fn test_notes_are_optional() {
        let mut d = details();
        d.notes = Some(String::new());
        assert!(validate_details(&d).is_ok());
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = validate_fee_line(3, &line(Decimal::new(-1, 0), Decimal::ONE)).unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.field(), "quantity");
    }

    #[test]
    fn test_negative_zero_price_accepted() {
        let mut zero = Decimal::ZERO;
        zero.set_sign_negative(true);
        assert!(validate_fee_line(0, &line(Decimal::ONE, zero)).is_ok());
    }

    #[test]
    fn test_blank_description_rejected() {
        let mut fee = line(Decimal::ONE, Decimal::ONE);
        fee.description = " \n ".to_string();
        let err = validate_fee_line(4, &fee).unwrap_err();
        assert_eq!(err, ValidationError::BlankDescription { line: 4 });
        assert_eq!(err.field(), "description");

        fee.description = String::new();
        assert!(validate_fee_line(4, &fee).is_err());
    }

    #[test]
    fn test_small_positive_quantity_accepted() {
        assert!(validate_fee_line(0, &line(Decimal::new(1, 4), Decimal::ONE)).is_ok());
    }
}
