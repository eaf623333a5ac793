//! Greedy word wrap against the static font metrics.
//!
//! - Explicit newlines always start a new line; blank interior lines survive.
//! - Words are separated by any whitespace and re-joined with single spaces.
//! - A word wider than the column is split by characters into chunks that fit.
//!   A single glyph wider than the column stands alone on its line.

use crate::layout::font_metrics::{get_metrics, mm_to_em, FontMetricTable, FontWeight};

/// Wraps `text` to a column `width_mm` wide at the given face and size.
///
/// Returns no lines for blank text and at least one line otherwise.
pub fn wrap_text(text: &str, weight: FontWeight, size_pt: f32, width_mm: f32) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let metrics = get_metrics(weight);
    let max_em = mm_to_em(width_mm, size_pt);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph, metrics, max_em, &mut lines);
    }
    lines
}

fn wrap_paragraph(paragraph: &str, metrics: &FontMetricTable, max_em: f32, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in paragraph.split_whitespace() {
        let word_w = metrics.measure_str(word);

        if word_w > max_em {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let mut chunks = split_long_word(word, metrics, max_em);
            // The tail chunk keeps accepting words like any other line.
            if let Some(tail) = chunks.pop() {
                out.extend(chunks);
                current_width = metrics.measure_str(&tail);
                current = tail;
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_width = word_w;
        } else if current_width + metrics.space_width + word_w > max_em {
            out.push(std::mem::replace(&mut current, word.to_string()));
            current_width = word_w;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += metrics.space_width + word_w;
        }
    }

    // Blank paragraphs still take a line.
    out.push(current);
}

fn split_long_word(word: &str, metrics: &FontMetricTable, max_em: f32) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for ch in word.chars() {
        let w = metrics.char_width(ch);
        if !current.is_empty() && current_width + w > max_em {
            parts.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        current.push(ch);
        current_width += w;
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
