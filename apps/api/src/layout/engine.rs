//! Document layout engine entry point.
//!
//! `render` is a pure function of the priced invoice and the page config:
//! screen free text, produce blocks, pack them into pages, then translate each
//! block's primitives to its placement.

use crate::billing::amounts::PricedInvoice;
use crate::errors::RenderError;
use crate::layout::blocks::build_blocks;
use crate::layout::font_metrics::PageConfig;
use crate::layout::glyphs::prepare_text;
use crate::layout::paginate::{paginate, Frame, Slot};
use crate::layout::primitives::Page;

/// Lays out `invoice` as an ordered, non-empty sequence of pages.
pub fn render(invoice: &PricedInvoice, config: &PageConfig) -> Result<Vec<Page>, RenderError> {
    let text = prepare_text(invoice, config.glyph_policy)?;
    let blocks = build_blocks(invoice, &text, config);

    let slots: Vec<Slot> = blocks.iter().map(|b| b.slot).collect();
    let frame = Frame {
        top: config.margin_top_mm,
        bottom: config.bottom_threshold(),
    };

    let pages = paginate(&slots, frame)
        .into_iter()
        .enumerate()
        .map(|(i, placements)| Page {
            number: i + 1,
            width: config.width_mm,
            height: config.height_mm,
            content_width: config.content_width(),
            content_height: config.content_height(),
            primitives: placements
                .iter()
                .flat_map(|p| blocks[p.slot].primitives.iter().map(move |prim| prim.shifted(p.y)))
                .collect(),
        })
        .collect();

    Ok(pages)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
