//! Page packing: folds a sequence of block heights into pages.
//!
//! Works purely on [`Slot`]s so the break rules can be tested without drawing
//! anything. Rules:
//! - A block goes on the current page unless the page already holds content
//!   and `y + gap + height` would pass the bottom threshold.
//! - `gap_before` is dropped at the top of a page.
//! - A `keep_with_next` block also needs room for the block after it.
//! - A table row that forces a break is preceded on the new page by a copy of
//!   the most recent table header.
//! - A block on a fresh page is always placed, even if it is taller than the
//!   page. Blocks are never split.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    Flow,
    TableHeader,
    TableRow,
}

/// Vertical footprint of one block, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub gap_before: f32,
    pub height: f32,
    pub keep_with_next: bool,
    pub role: SlotRole,
}

impl Slot {
    pub fn flow(height: f32) -> Self {
        Slot {
            gap_before: 0.0,
            height,
            keep_with_next: false,
            role: SlotRole::Flow,
        }
    }

    pub fn row(height: f32) -> Self {
        Slot {
            role: SlotRole::TableRow,
            ..Slot::flow(height)
        }
    }

    pub fn table_header(height: f32) -> Self {
        Slot {
            keep_with_next: true,
            role: SlotRole::TableHeader,
            ..Slot::flow(height)
        }
    }

    pub fn after_gap(mut self, gap: f32) -> Self {
        self.gap_before = gap;
        self
    }

    pub fn kept_with_next(mut self) -> Self {
        self.keep_with_next = true;
        self
    }
}

/// Usable vertical band of every page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub top: f32,
    pub bottom: f32,
}

/// Slot `slot` drawn with its top edge at `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub slot: usize,
    pub y: f32,
}

/// Packs `slots` in order. Always returns at least one (possibly empty) page.
pub fn paginate(slots: &[Slot], frame: Frame) -> Vec<Vec<Placement>> {
    let mut pages: Vec<Vec<Placement>> = vec![Vec::new()];
    let mut y = frame.top;
    // Nothing but a repeated table header on the current page yet.
    let mut fresh = true;
    let mut header: Option<usize> = None;

    for (i, slot) in slots.iter().enumerate() {
        if slot.role == SlotRole::TableHeader {
            header = Some(i);
        }

        let mut needed = slot.gap_before + slot.height;
        if slot.keep_with_next {
            if let Some(next) = slots.get(i + 1) {
                needed += next.gap_before + next.height;
            }
        }

        if !fresh && y + needed > frame.bottom {
            pages.push(Vec::new());
            y = frame.top;
            fresh = true;

            if slot.role == SlotRole::TableRow {
                if let Some(h) = header {
                    push(&mut pages, Placement { slot: h, y });
                    y += slots[h].height;
                }
            }
        }

        if !fresh {
            y += slot.gap_before;
        }
        push(&mut pages, Placement { slot: i, y });
        y += slot.height;
        if slot.role != SlotRole::TableHeader {
            fresh = false;
        }
    }

    pages
}

fn push(pages: &mut [Vec<Placement>], placement: Placement) {
    if let Some(page) = pages.last_mut() {
        page.push(placement);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FRAME: Frame = Frame {
        top: 20.0,
        bottom: 277.0,
    };

    fn slots_on(pages: &[Vec<Placement>], page: usize) -> Vec<usize> {
        pages[page].iter().map(|p| p.slot).collect()
    }

    #[test]
    fn test_empty_input_yields_one_empty_page() {
        let pages = paginate(&[], FRAME);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn test_blocks_stack_from_top() {
        let pages = paginate(&[Slot::flow(15.0), Slot::flow(6.0).after_gap(9.0)], FRAME);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0][0].y, 20.0);
        assert_eq!(pages[0][1].y, 44.0);
    }

    #[test]
    fn test_exact_fit_does_not_break() {
        // 20 + 257 == 277: touching the threshold is allowed.
        let pages = paginate(&[Slot::flow(200.0), Slot::flow(57.0)], FRAME);
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_overflow_breaks_and_drops_gap() {
        let pages = paginate(&[Slot::flow(200.0), Slot::flow(57.5).after_gap(5.0)], FRAME);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1][0], Placement { slot: 1, y: 20.0 });
    }

    #[test]
    fn test_row_break_repeats_header() {
        let slots = [
            Slot::flow(100.0),
            Slot::table_header(10.0),
            Slot::row(100.0),
            Slot::row(100.0),
        ];
        let pages = paginate(&slots, FRAME);
        assert_eq!(pages.len(), 2);
        assert_eq!(slots_on(&pages, 0), vec![0, 1, 2]);
        assert_eq!(slots_on(&pages, 1), vec![1, 3]);
        assert_eq!(pages[1][0].y, 20.0);
        assert_eq!(pages[1][1].y, 30.0);
    }

    #[test]
    fn test_flow_break_does_not_repeat_header() {
        let slots = [
            Slot::table_header(10.0),
            Slot::row(240.0),
            Slot::flow(15.0),
        ];
        let pages = paginate(&slots, FRAME);
        assert_eq!(pages.len(), 2);
        assert_eq!(slots_on(&pages, 1), vec![2]);
    }

    #[test]
    fn test_header_is_kept_with_first_row() {
        let slots = [
            Slot::flow(240.0),
            Slot::table_header(10.0).after_gap(5.0),
            Slot::row(8.0),
        ];
        let pages = paginate(&slots, FRAME);
        assert_eq!(pages.len(), 2);
        assert_eq!(slots_on(&pages, 0), vec![0]);
        assert_eq!(slots_on(&pages, 1), vec![1, 2]);
    }

    #[test]
    fn test_header_without_rows_stays_put() {
        let slots = [Slot::flow(200.0), Slot::table_header(10.0), Slot::flow(15.0)];
        let pages = paginate(&slots, FRAME);
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_oversized_row_is_placed_whole_on_fresh_page() {
        let slots = [
            Slot::table_header(10.0),
            Slot::row(50.0),
            Slot::row(400.0),
            Slot::row(10.0),
        ];
        let pages = paginate(&slots, FRAME);
        assert_eq!(pages.len(), 3);
        assert_eq!(slots_on(&pages, 1), vec![0, 2]);
        assert_eq!(slots_on(&pages, 2), vec![0, 3]);
    }

    #[test]
    fn test_label_kept_with_first_line() {
        let slots = [
            Slot::flow(250.0),
            Slot::flow(6.0).after_gap(0.0).kept_with_next(),
            Slot::flow(6.0),
        ];
        let pages = paginate(&slots, FRAME);
        assert_eq!(slots_on(&pages, 1), vec![1, 2]);
    }

    // ── optimality ──────────────────────────────────────────────────────────

    /// Minimum number of contiguous groups whose heights each fit `capacity`.
    fn optimal_pages(heights: &[f32], capacity: f32) -> usize {
        let n = heights.len();
        let mut best = vec![usize::MAX; n + 1];
        best[0] = 0;
        for end in 1..=n {
            let mut sum = 0.0_f32;
            for start in (0..end).rev() {
                sum += heights[start];
                if sum > capacity {
                    break;
                }
                if best[start] != usize::MAX {
                    best[end] = best[end].min(best[start] + 1);
                }
            }
        }
        best[n].max(1)
    }

    proptest! {
        #[test]
        fn prop_greedy_page_count_is_optimal(
            header_halves in 0u32..40,
            row_halves in prop::collection::vec(1u32..200, 0..40),
        ) {
            // Half-millimetre steps keep every sum exact in f32.
            let header = header_halves as f32 * 0.5;
            let capacity = FRAME.bottom - FRAME.top - header;
            let heights: Vec<f32> = row_halves
                .iter()
                .map(|h| (*h as f32 * 0.5).min(capacity))
                .collect();

            let mut slots = vec![Slot::table_header(header)];
            slots.extend(heights.iter().map(|h| Slot::row(*h)));
            let pages = paginate(&slots, FRAME);

            prop_assert_eq!(pages.len(), optimal_pages(&heights, capacity));
            for page in &pages {
                prop_assert_eq!(page[0].slot, 0, "every page opens with the header");
                for p in page {
                    prop_assert!(p.y + slots[p.slot].height <= FRAME.bottom);
                }
            }
        }
    }
}
