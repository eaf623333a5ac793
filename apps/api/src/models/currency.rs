//! Static currency table: one display symbol and one display name per currency.
//!
//! The table is closed. Amounts are always denominated in the invoice's single
//! currency and are never converted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "CAD")]
    Cad,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "BDT")]
    Bdt,
    #[serde(rename = "CNY")]
    Cny,
}

/// Display metadata for a currency.
///
/// `pdf_symbol` is what the PDF flattener writes when the display symbol has no
/// WinAnsi encoding in the base-14 fonts (only the Taka sign today).
#[derive(Debug)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    pub pdf_symbol: &'static str,
}

static CAD_INFO: CurrencyInfo = CurrencyInfo {
    code: "CAD",
    symbol: "CA$",
    name: "Canadian Dollar",
    pdf_symbol: "CA$",
};

static USD_INFO: CurrencyInfo = CurrencyInfo {
    code: "USD",
    symbol: "$",
    name: "US Dollar",
    pdf_symbol: "$",
};

static BDT_INFO: CurrencyInfo = CurrencyInfo {
    code: "BDT",
    symbol: "\u{09F3}",
    name: "Bangladeshi Taka",
    pdf_symbol: "Tk",
};

static CNY_INFO: CurrencyInfo = CurrencyInfo {
    code: "CNY",
    symbol: "\u{00A5}",
    name: "Chinese Yuan",
    pdf_symbol: "\u{00A5}",
};

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Cad, Currency::Usd, Currency::Bdt, Currency::Cny];

    pub fn info(self) -> &'static CurrencyInfo {
        match self {
            Currency::Cad => &CAD_INFO,
            Currency::Usd => &USD_INFO,
            Currency::Bdt => &BDT_INFO,
            Currency::Cny => &CNY_INFO,
        }
    }

    pub fn code(self) -> &'static str {
        self.info().code
    }

    pub fn symbol(self) -> &'static str {
        self.info().symbol
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn pdf_symbol(self) -> &'static str {
        self.info().pdf_symbol
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown currency code '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_table_matches_published_mapping() {
        assert_eq!(Currency::Cad.symbol(), "CA$");
        assert_eq!(Currency::Usd.symbol(), "$");
        assert_eq!(Currency::Bdt.symbol(), "৳");
        assert_eq!(Currency::Cny.symbol(), "¥");
    }

    #[test]
    fn test_name_table_matches_published_mapping() {
        assert_eq!(Currency::Cad.name(), "Canadian Dollar");
        assert_eq!(Currency::Usd.name(), "US Dollar");
        assert_eq!(Currency::Bdt.name(), "Bangladeshi Taka");
        assert_eq!(Currency::Cny.name(), "Chinese Yuan");
    }

    #[test]
    fn test_only_taka_needs_a_pdf_fallback() {
        for currency in Currency::ALL {
            if currency == Currency::Bdt {
                assert_eq!(currency.pdf_symbol(), "Tk");
            } else {
                assert_eq!(currency.pdf_symbol(), currency.symbol());
            }
        }
    }

    #[test]
    fn test_code_parses_back() {
        for currency in Currency::ALL {
            assert_eq!(currency.code().parse::<Currency>().unwrap(), currency);
        }
        assert!("EUR".parse::<Currency>().is_err());
    }

    #[test]
    fn test_serde_uses_iso_code() {
        let json = serde_json::to_string(&Currency::Bdt).unwrap();
        assert_eq!(json, "\"BDT\"");
        let back: Currency = serde_json::from_str("\"CNY\"").unwrap();
        assert_eq!(back, Currency::Cny);
    }
}
