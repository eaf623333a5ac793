//! Block producer: turns an invoice into a flat sequence of layout blocks.
//!
//! Each block knows its own height and carries its primitives relative to its
//! top edge (y = 0). x coordinates are already absolute. Placement on pages is
//! left entirely to [`crate::layout::paginate`].

use crate::billing::amounts::{PricedFee, PricedInvoice};
use crate::layout::font_metrics::{get_metrics, FontWeight, PageConfig};
use crate::layout::format::{format_date, format_money, format_quantity, format_total};
use crate::layout::glyphs::DocumentText;
use crate::layout::paginate::Slot;
use crate::layout::primitives::{Primitive, TextAnchor};
use crate::layout::wrap::wrap_text;
use crate::models::currency::Currency;

// ────────────────────────────────────────────────────────────────────────────
// Geometry (mm unless noted)
// ────────────────────────────────────────────────────────────────────────────

const TITLE: &str = "INVOICE";
const TITLE_SIZE_PT: f32 = 24.0;
const TITLE_ADVANCE: f32 = 15.0;

const BODY_SIZE_PT: f32 = 10.0;
const LABEL_SIZE_PT: f32 = 12.0;
const LINE_ADVANCE: f32 = 6.0;

const META_GAP: f32 = 9.0;
const ADDRESS_WIDTH: f32 = 80.0;
const PARTY_GAP: f32 = 10.0;
const PATENT_GAP: f32 = 15.0;

const TABLE_SIZE_PT: f32 = 9.0;
const TABLE_HEADER_HEIGHT: f32 = 8.0;
const TABLE_HEADER_ADVANCE: f32 = 10.0;
const TABLE_HEADER_BASELINE: f32 = 6.0;
const TABLE_HEADER_GRAY: u8 = 240;
const ROW_BASELINE: f32 = 4.0;
const ROW_LINE_ADVANCE: f32 = 5.0;
const MIN_ROW_HEIGHT: f32 = 8.0;
const CELL_PADDING: f32 = 2.0;

/// Description, Type, Qty, Unit Price, Amount.
pub const COLUMN_FRACTIONS: [f32; 5] = [0.39, 0.19, 0.08, 0.17, 0.17];
const COLUMN_TITLES: [&str; 5] = ["Description", "Type", "Qty", "Unit Price", "Amount"];

const TOTAL_RULE_OFFSET: f32 = 5.0;
const TOTAL_BASELINE: f32 = 15.0;
const TOTAL_SIZE_PT: f32 = 14.0;
const TOTAL_LABEL_INSET: f32 = 60.0;
const TOTAL_LABEL: &str = "Total:";
const TOTAL_LABEL_GAP: f32 = 3.0;
const RULE_GRAY: u8 = 200;

const NOTES_GAP: f32 = 15.0;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub slot: Slot,
    pub primitives: Vec<Primitive>,
}

/// Horizontal layout of the fee table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Columns {
    pub x: [f32; 5],
    pub width: [f32; 5],
}

impl Columns {
    pub fn new(left: f32, total_width: f32) -> Self {
        let mut x = [0.0; 5];
        let mut width = [0.0; 5];
        let mut cursor = left;
        for (i, fraction) in COLUMN_FRACTIONS.iter().enumerate() {
            x[i] = cursor;
            width[i] = total_width * fraction;
            cursor += width[i];
        }
        Columns { x, width }
    }

    fn text_left(&self, col: usize) -> f32 {
        self.x[col] + CELL_PADDING
    }

    fn text_right(&self, col: usize) -> f32 {
        self.x[col] + self.width[col] - CELL_PADDING
    }

    /// Width available to the wrapped description text.
    pub fn description_width(&self) -> f32 {
        self.cell_width(0)
    }

    fn cell_width(&self, col: usize) -> f32 {
        self.width[col] - 2.0 * CELL_PADDING
    }
}

/// Point size at which `text` fits in `max_width` mm, never larger than
/// `size_pt`. Single-line cells shrink instead of spilling into a neighbour.
fn fitted_size(text: &str, weight: FontWeight, size_pt: f32, max_width: f32) -> f32 {
    let width = get_metrics(weight).width_mm(text, size_pt);
    if width <= max_width {
        size_pt
    } else {
        size_pt * max_width / width
    }
}

/// Height of a fee row whose description wraps to `lines` lines.
pub fn row_height(lines: usize) -> f32 {
    (lines as f32 * ROW_LINE_ADVANCE).max(MIN_ROW_HEIGHT)
}

/// Height of the table header band, including the gap below it.
#[cfg(test)]
pub fn table_header_advance() -> f32 {
    TABLE_HEADER_ADVANCE
}

// ────────────────────────────────────────────────────────────────────────────
// Producer
// ────────────────────────────────────────────────────────────────────────────

struct Producer<'a> {
    config: &'a PageConfig,
    blocks: Vec<Block>,
}

impl Producer<'_> {
    fn left(&self) -> f32 {
        self.config.margin_left_mm
    }

    fn push(&mut self, slot: Slot, primitives: Vec<Primitive>) {
        self.blocks.push(Block { slot, primitives });
    }

    /// A single text line whose baseline sits on the block top.
    fn line(&mut self, text: String, weight: FontWeight, size_pt: f32, slot: Slot) {
        let x = self.left();
        self.push(
            slot,
            vec![Primitive::text(x, 0.0, text, weight, size_pt, TextAnchor::Left)],
        );
    }

    /// Wrapped body text, one block per line so long paragraphs can break.
    fn paragraph(&mut self, text: &str, width: f32) {
        for line in wrap_text(text, FontWeight::Regular, BODY_SIZE_PT, width) {
            self.line(line, FontWeight::Regular, BODY_SIZE_PT, Slot::flow(LINE_ADVANCE));
        }
    }
}

/// Produces the blocks of one invoice in reading order.
pub fn build_blocks(invoice: &PricedInvoice, text: &DocumentText, config: &PageConfig) -> Vec<Block> {
    let mut p = Producer {
        config,
        blocks: Vec::new(),
    };
    let details = invoice.details();
    let content_width = config.content_width();

    // ── header band ──
    let centre = config.margin_left_mm + content_width / 2.0;
    p.push(
        Slot::flow(TITLE_ADVANCE),
        vec![Primitive::text(
            centre,
            0.0,
            TITLE,
            FontWeight::Bold,
            TITLE_SIZE_PT,
            TextAnchor::Center,
        )],
    );
    let meta = [
        format!("Invoice Number: {}", text.invoice_number),
        format!("Issue Date: {}", format_date(details.issue_date)),
        format!("Due Date: {}", format_date(details.due_date)),
        format!("Status: {}", details.status.as_str().to_uppercase()),
    ];
    for line in meta {
        p.line(line, FontWeight::Regular, BODY_SIZE_PT, Slot::flow(LINE_ADVANCE));
    }

    // ── party band ──
    p.line(
        "Bill To:".to_string(),
        FontWeight::Bold,
        LABEL_SIZE_PT,
        Slot::flow(LINE_ADVANCE).after_gap(META_GAP).kept_with_next(),
    );
    p.line(
        text.client_name.clone(),
        FontWeight::Regular,
        BODY_SIZE_PT,
        Slot::flow(LINE_ADVANCE),
    );
    p.line(
        text.client_email.clone(),
        FontWeight::Regular,
        BODY_SIZE_PT,
        Slot::flow(LINE_ADVANCE),
    );
    p.paragraph(&text.client_address, ADDRESS_WIDTH);

    // ── patent band ──
    p.line(
        "Patent Information:".to_string(),
        FontWeight::Bold,
        LABEL_SIZE_PT,
        Slot::flow(LINE_ADVANCE).after_gap(PARTY_GAP).kept_with_next(),
    );
    p.line(
        format!("Patent Number: {}", text.patent_number),
        FontWeight::Regular,
        BODY_SIZE_PT,
        Slot::flow(LINE_ADVANCE),
    );
    p.paragraph(&format!("Patent Title: {}", text.patent_title), content_width);

    // ── table ──
    let columns = Columns::new(config.margin_left_mm, content_width);
    p.push(
        Slot::table_header(TABLE_HEADER_ADVANCE).after_gap(PATENT_GAP),
        table_header(&columns, config),
    );
    let currency = invoice.currency();
    for (fee, description) in invoice.fees().iter().zip(&text.descriptions) {
        let (slot, primitives) = fee_row(fee, description, &columns, currency);
        p.push(slot, primitives);
    }

    // ── total band ──
    let right = config.content_right();
    let total = format_total(invoice.total_amount(), currency);
    let total_room = TOTAL_LABEL_INSET
        - get_metrics(FontWeight::Bold).width_mm(TOTAL_LABEL, TOTAL_SIZE_PT)
        - TOTAL_LABEL_GAP;
    let total_size = fitted_size(&total, FontWeight::Bold, TOTAL_SIZE_PT, total_room);
    p.push(
        Slot::flow(TOTAL_BASELINE),
        vec![
            Primitive::Rule {
                x1: config.margin_left_mm,
                y1: TOTAL_RULE_OFFSET,
                x2: right,
                y2: TOTAL_RULE_OFFSET,
                gray: RULE_GRAY,
            },
            Primitive::text(
                right - TOTAL_LABEL_INSET,
                TOTAL_BASELINE,
                TOTAL_LABEL,
                FontWeight::Bold,
                TOTAL_SIZE_PT,
                TextAnchor::Left,
            ),
            Primitive::text(
                right,
                TOTAL_BASELINE,
                total,
                FontWeight::Bold,
                total_size,
                TextAnchor::Right,
            ),
        ],
    );

    // ── notes band ──
    if let Some(notes) = &text.notes {
        let lines = wrap_text(notes, FontWeight::Regular, BODY_SIZE_PT, content_width);
        if !lines.is_empty() {
            p.line(
                "Notes:".to_string(),
                FontWeight::Bold,
                BODY_SIZE_PT,
                Slot::flow(LINE_ADVANCE).after_gap(NOTES_GAP).kept_with_next(),
            );
            for line in lines {
                p.line(line, FontWeight::Regular, BODY_SIZE_PT, Slot::flow(LINE_ADVANCE));
            }
        }
    }

    p.blocks
}

fn table_header(columns: &Columns, config: &PageConfig) -> Vec<Primitive> {
    let mut primitives = vec![Primitive::FilledRect {
        x: config.margin_left_mm,
        y: 0.0,
        width: config.content_width(),
        height: TABLE_HEADER_HEIGHT,
        gray: TABLE_HEADER_GRAY,
    }];
    for (col, title) in COLUMN_TITLES.iter().enumerate() {
        let (x, anchor) = if col >= 3 {
            (columns.text_right(col), TextAnchor::Right)
        } else {
            (columns.text_left(col), TextAnchor::Left)
        };
        primitives.push(Primitive::text(
            x,
            TABLE_HEADER_BASELINE,
            *title,
            FontWeight::Bold,
            TABLE_SIZE_PT,
            anchor,
        ));
    }
    primitives
}

fn fee_row(
    fee: &PricedFee,
    description: &str,
    columns: &Columns,
    currency: Currency,
) -> (Slot, Vec<Primitive>) {
    let lines = wrap_text(
        description,
        FontWeight::Regular,
        TABLE_SIZE_PT,
        columns.description_width(),
    );
    let height = row_height(lines.len());

    let cell = |col: usize, text: String, anchor: TextAnchor| {
        let x = match anchor {
            TextAnchor::Right => columns.text_right(col),
            _ => columns.text_left(col),
        };
        let size = fitted_size(&text, FontWeight::Regular, TABLE_SIZE_PT, columns.cell_width(col));
        Primitive::text(x, ROW_BASELINE, text, FontWeight::Regular, size, anchor)
    };

    let mut primitives: Vec<Primitive> = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            Primitive::text(
                columns.text_left(0),
                ROW_BASELINE + i as f32 * ROW_LINE_ADVANCE,
                line,
                FontWeight::Regular,
                TABLE_SIZE_PT,
                TextAnchor::Left,
            )
        })
        .collect();
    primitives.push(cell(1, fee.fee_type.short_label().to_string(), TextAnchor::Left));
    primitives.push(cell(2, format_quantity(fee.quantity), TextAnchor::Left));
    primitives.push(cell(3, format_money(fee.unit_price, currency), TextAnchor::Right));
    primitives.push(cell(4, format_money(fee.amount, currency), TextAnchor::Right));

    (Slot::row(height), primitives)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
