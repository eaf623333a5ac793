//! Flattens laid-out pages into a PDF document with `pdf-writer`.
//!
//! Fonts are the base-14 Helvetica pair with WinAnsiEncoding, so nothing is
//! embedded. Page coordinates are converted from top-left millimetres to
//! bottom-left points.

use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

use crate::billing::amounts::PricedInvoice;
use crate::errors::RenderError;
use crate::layout::engine::render;
use crate::layout::font_metrics::{encode_winansi, get_metrics, FontWeight, PageConfig, MM_PER_PT};
use crate::layout::primitives::{Page, Primitive, TextAnchor};
use crate::models::currency::Currency;

const REGULAR_FONT: Name<'static> = Name(b"F1");
const BOLD_FONT: Name<'static> = Name(b"F2");
const RULE_WIDTH_PT: f32 = 0.57;

/// Renders `invoice` and returns the finished PDF bytes.
pub fn render_pdf(invoice: &PricedInvoice, config: &PageConfig) -> Result<Vec<u8>, RenderError> {
    let pages = render(invoice, config)?;
    write_pdf(&pages, invoice.currency())
}

/// Suggested download name for an invoice document.
pub fn pdf_filename(invoice_number: &str) -> String {
    let safe: String = invoice_number
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect();
    format!("invoice-{safe}.pdf")
}

/// Serializes already laid-out pages. `currency` decides how its symbol is
/// written when the font cannot encode it.
pub fn write_pdf(pages: &[Page], currency: Currency) -> Result<Vec<u8>, RenderError> {
    let mut pdf = Pdf::new();
    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let regular_id = Ref::new(3);
    let bold_id = Ref::new(4);
    let mut next_id = 5;

    pdf.catalog(catalog_id).pages(page_tree_id);

    let mut page_ids = Vec::with_capacity(pages.len());
    for page in pages {
        let page_id = Ref::new(next_id);
        let content_id = Ref::new(next_id + 1);
        next_id += 2;
        page_ids.push(page_id);

        let content = draw_page(page, currency)?;

        {
            let mut pdf_page = pdf.page(page_id);
            pdf_page
                .media_box(Rect::new(0.0, 0.0, mm_to_pt(page.width), mm_to_pt(page.height)))
                .parent(page_tree_id)
                .contents(content_id);
            pdf_page
                .resources()
                .fonts()
                .pair(REGULAR_FONT, regular_id)
                .pair(BOLD_FONT, bold_id);
        }
        pdf.stream(content_id, &content);
    }

    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    pdf.type1_font(regular_id)
        .base_font(Name(FontWeight::Regular.base_font().as_bytes()))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_id)
        .base_font(Name(FontWeight::Bold.base_font().as_bytes()))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    Ok(pdf.finish())
}

fn draw_page(page: &Page, currency: Currency) -> Result<Vec<u8>, RenderError> {
    let mut content = Content::new();
    let height = page.height;

    for primitive in &page.primitives {
        match primitive {
            Primitive::FilledRect {
                x,
                y,
                width,
                height: h,
                gray,
            } => {
                content
                    .save_state()
                    .set_fill_gray(gray_level(*gray))
                    .rect(mm_to_pt(*x), mm_to_pt(height - y - h), mm_to_pt(*width), mm_to_pt(*h))
                    .fill_nonzero()
                    .restore_state();
            }
            Primitive::Rule {
                x1,
                y1,
                x2,
                y2,
                gray,
            } => {
                content
                    .save_state()
                    .set_stroke_gray(gray_level(*gray))
                    .set_line_width(RULE_WIDTH_PT)
                    .move_to(mm_to_pt(*x1), mm_to_pt(height - y1))
                    .line_to(mm_to_pt(*x2), mm_to_pt(height - y2))
                    .stroke()
                    .restore_state();
            }
            Primitive::Text {
                x,
                y,
                text,
                weight,
                size_pt,
                anchor,
            } => {
                let text = pdf_text(text, currency);
                let bytes = encode_winansi(&text).map_err(|ch| RenderError::UnsupportedGlyph {
                    field: format!("page {} text", page.number),
                    ch,
                })?;
                let width_pt = get_metrics(*weight).measure_str(&text) * size_pt;
                let left_pt = match anchor {
                    TextAnchor::Left => mm_to_pt(*x),
                    TextAnchor::Center => mm_to_pt(*x) - width_pt / 2.0,
                    TextAnchor::Right => mm_to_pt(*x) - width_pt,
                };
                let font = match weight {
                    FontWeight::Regular => REGULAR_FONT,
                    FontWeight::Bold => BOLD_FONT,
                };
                content
                    .begin_text()
                    .set_font(font, *size_pt)
                    .next_line(left_pt, mm_to_pt(height - y))
                    .show(Str(&bytes))
                    .end_text();
            }
        }
    }

    Ok(content.finish())
}

/// Swaps the currency's display symbol for its font-safe fallback.
fn pdf_text(text: &str, currency: Currency) -> String {
    if currency.symbol() == currency.pdf_symbol() {
        text.to_string()
    } else {
        text.replace(currency.symbol(), currency.pdf_symbol())
    }
}

fn mm_to_pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

fn gray_level(gray: u8) -> f32 {
    f32::from(gray) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::amounts::price_invoice;
    use crate::models::invoice::{
        Client, FeeLine, FeeType, Invoice, InvoiceDetails, InvoiceStatus, Patent,
    };
    use chrono::NaiveDate;

    fn invoice(currency: Currency, fee_count: usize) -> PricedInvoice {
        price_invoice(Invoice {
            details: InvoiceDetails {
                invoice_number: "INV/7".to_string(),
                client: Client {
                    name: "Padma Textiles".to_string(),
                    email: "legal@padma.test".to_string(),
                    address: "12 Motijheel, Dhaka".to_string(),
                },
                patent: Patent {
                    number: "BD 1005".to_string(),
                    title: "Loom tension regulator".to_string(),
                },
                currency,
                issue_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                due_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
                status: InvoiceStatus::Sent,
                notes: Some("Thank you.".to_string()),
            },
            fees: (0..fee_count)
                .map(|i| FeeLine {
                    description: format!("Maintenance year {i}"),
                    fee_type: FeeType::Maintenance,
                    quantity: "1".parse().unwrap(),
                    unit_price: "500".parse().unwrap(),
                })
                .collect(),
        })
        .unwrap()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn count_pages(pdf: &[u8]) -> usize {
        let needle = b"/Type /Page";
        pdf.windows(needle.len() + 1)
            .filter(|w| &w[..needle.len()] == needle && w[needle.len()] != b's')
            .count()
    }

    #[test]
    fn test_pdf_has_header_fonts_and_pages() {
        let bytes = render_pdf(&invoice(Currency::Usd, 1), &PageConfig::a4()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, b"/Helvetica-Bold"));
        assert!(contains(&bytes, b"/WinAnsiEncoding"));
        assert!(contains(&bytes, b"($500.00)"));
        assert_eq!(count_pages(&bytes), 1);
    }

    #[test]
    fn test_one_pdf_page_per_layout_page() {
        let inv = invoice(Currency::Usd, 60);
        let config = PageConfig::a4();
        let pages = render(&inv, &config).unwrap();
        assert!(pages.len() > 1);
        let bytes = render_pdf(&inv, &config).unwrap();
        assert_eq!(count_pages(&bytes), pages.len());
    }

    #[test]
    fn test_taka_written_with_fallback_symbol() {
        let bytes = render_pdf(&invoice(Currency::Bdt, 1), &PageConfig::a4()).unwrap();
        assert!(contains(&bytes, b"(Tk500.00)"));
        assert!(contains(&bytes, b"(Tk500.00 BDT)"));
    }

    #[test]
    fn test_yuan_sign_needs_no_fallback() {
        assert_eq!(pdf_text("\u{00A5}500.00", Currency::Cny), "\u{00A5}500.00");
        let bytes = render_pdf(&invoice(Currency::Cny, 1), &PageConfig::a4()).unwrap();
        assert!(!contains(&bytes, b"Tk"));
    }

    #[test]
    fn test_unencodable_text_fails_flattening() {
        let page = Page {
            number: 3,
            width: 210.0,
            height: 297.0,
            content_width: 170.0,
            content_height: 257.0,
            primitives: vec![Primitive::text(
                20.0,
                20.0,
                "中",
                FontWeight::Regular,
                10.0,
                TextAnchor::Left,
            )],
        };
        let err = write_pdf(&[page], Currency::Usd).unwrap_err();
        assert_eq!(
            err,
            RenderError::UnsupportedGlyph {
                field: "page 3 text".to_string(),
                ch: '中'
            }
        );
    }

    #[test]
    fn test_pdf_filename_is_path_safe() {
        assert_eq!(pdf_filename("INV-2024-001"), "invoice-INV-2024-001.pdf");
        assert_eq!(pdf_filename("INV/7 a"), "invoice-INV_7_a.pdf");
    }

    #[test]
    fn test_mm_to_pt() {
        assert!((mm_to_pt(210.0) - 595.2756).abs() < 1e-2);
    }
}
