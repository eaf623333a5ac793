//! Free-text screening against the document font.
//!
//! Every user-supplied string is checked before layout begins, in the order
//! the fields appear on the page. Whitespace and control characters become
//! plain spaces (newlines survive in multi-line fields); anything else the
//! font cannot encode is handled per [`GlyphPolicy`].

use crate::billing::amounts::PricedInvoice;
use crate::errors::RenderError;
use crate::layout::font_metrics::{supports_char, GlyphPolicy};

const SUBSTITUTE: char = '?';

/// The invoice's free-text fields, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentText {
    pub invoice_number: String,
    pub client_name: String,
    pub client_email: String,
    pub client_address: String,
    pub patent_number: String,
    pub patent_title: String,
    /// One per fee line, same order.
    pub descriptions: Vec<String>,
    /// `None` when notes are absent or blank.
    pub notes: Option<String>,
}

pub fn prepare_text(invoice: &PricedInvoice, policy: GlyphPolicy) -> Result<DocumentText, RenderError> {
    let details = invoice.details();

    let invoice_number = screen("invoice_number", &details.invoice_number, false, policy)?;
    let client_name = screen("client.name", &details.client.name, false, policy)?;
    let client_email = screen("client.email", &details.client.email, false, policy)?;
    let client_address = screen("client.address", &details.client.address, true, policy)?;
    let patent_number = screen("patent.number", &details.patent.number, false, policy)?;
    let patent_title = screen("patent.title", &details.patent.title, true, policy)?;

    let descriptions = invoice
        .fees()
        .iter()
        .enumerate()
        .map(|(i, fee)| screen(&format!("fees[{i}].description"), &fee.description, true, policy))
        .collect::<Result<Vec<_>, _>>()?;

    let notes = match details.notes.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => Some(screen("notes", n, true, policy)?),
        _ => None,
    };

    Ok(DocumentText {
        invoice_number,
        client_name,
        client_email,
        client_address,
        patent_number,
        patent_title,
        descriptions,
        notes,
    })
}

/// Screens one field. `multiline` keeps `\n`; otherwise it becomes a space.
pub fn screen(field: &str, text: &str, multiline: bool, policy: GlyphPolicy) -> Result<String, RenderError> {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\n' && multiline {
            out.push('\n');
        } else if ch.is_whitespace() || ch.is_control() {
            out.push(' ');
        } else if supports_char(ch) {
            out.push(ch);
        } else {
            match policy {
                GlyphPolicy::Reject => {
                    return Err(RenderError::UnsupportedGlyph {
                        field: field.to_string(),
                        ch,
                    })
                }
                GlyphPolicy::Substitute => out.push(SUBSTITUTE),
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_and_cp1252_pass_through() {
        let text = "Société Générale – “Zürich” €";
        assert_eq!(screen("client.name", text, false, GlyphPolicy::Reject).unwrap(), text);
    }

    #[test]
    fn test_reject_names_field_and_char() {
        let err = screen("notes", "Paid in \u{09F3}", true, GlyphPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            RenderError::UnsupportedGlyph {
                field: "notes".to_string(),
                ch: '\u{09F3}'
            }
        );
    }

    #[test]
    fn test_substitute_replaces_each_char() {
        let out = screen("patent.title", "光学 lens", true, GlyphPolicy::Substitute).unwrap();
        assert_eq!(out, "?? lens");
    }

    #[test]
    fn test_newlines_kept_only_when_multiline() {
        assert_eq!(screen("a", "x\ny", true, GlyphPolicy::Reject).unwrap(), "x\ny");
        assert_eq!(screen("a", "x\ny", false, GlyphPolicy::Reject).unwrap(), "x y");
        assert_eq!(screen("a", "x\ty\r", true, GlyphPolicy::Reject).unwrap(), "x y ");
    }

    #[test]
    fn test_unicode_spaces_become_plain_spaces() {
        let out = screen("a", "x\u{2003}y", false, GlyphPolicy::Reject).unwrap();
        assert_eq!(out, "x y");
    }
}
