// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Fixed-row-height windowing. Everything here is O(1) in the item count; only
//! `ViewportWindow::slice` touches the visible rows.

use std::ops::Range;

pub const DEFAULT_OVERSCAN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub row_height: u32,
    pub container_height: u32,
    pub overscan: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            row_height: 1,
            container_height: 0,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

impl Viewport {
    pub fn new(row_height: u32, container_height: u32, overscan: usize) -> Self {
        Self {
            row_height,
            container_height,
            overscan,
        }
    }

    /// A zero row height is a bad measurement, not a reason to divide by zero.
    pub fn effective_row_height(&self) -> u64 {
        u64::from(self.row_height.max(1))
    }

    /// Rows that fit in the container, never less than one so the row under the
    /// scroll offset is always part of the window.
    pub fn visible_rows(&self) -> usize {
        let row_height = self.effective_row_height();
        let rows = u64::from(self.container_height).div_ceil(row_height);
        usize::try_from(rows).unwrap_or(usize::MAX).max(1)
    }

    pub fn total_height(&self, item_count: usize) -> u64 {
        (item_count as u64).saturating_mul(self.effective_row_height())
    }

    pub fn max_scroll_top(&self, item_count: usize) -> u64 {
        self.total_height(item_count)
            .saturating_sub(u64::from(self.container_height))
    }

    pub fn clamp_scroll_top(&self, item_count: usize, scroll_top: u64) -> u64 {
        scroll_top.min(self.max_scroll_top(item_count))
    }

    /// Smallest scroll change that brings row `index` fully into view.
    pub fn scroll_to_reveal(&self, item_count: usize, scroll_top: u64, index: usize) -> u64 {
        if item_count == 0 {
            return 0;
        }
        let row_height = self.effective_row_height();
        let index = index.min(item_count - 1) as u64;
        let row_top = index.saturating_mul(row_height);
        let row_bottom = row_top.saturating_add(row_height);
        let container = u64::from(self.container_height);

        let next = if row_top < scroll_top {
            row_top
        } else if row_bottom > scroll_top.saturating_add(container) {
            row_bottom.saturating_sub(container)
        } else {
            scroll_top
        };
        self.clamp_scroll_top(item_count, next)
    }

    /// Row index at the top edge of the container for `scroll_top`.
    pub fn first_visible_index(&self, scroll_top: u64) -> usize {
        usize::try_from(scroll_top / self.effective_row_height()).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportWindow {
    pub start_index: usize,
    pub end_index: usize,
    pub offset_px: u64,
    pub total_height_px: u64,
}

impl ViewportWindow {
    pub fn range(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }

    /// The window applied to `items`; bounds are re-clamped so a window computed
    /// for a longer sequence can never index past the end of a shorter one.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end_index.min(items.len());
        let start = self.start_index.min(end);
        &items[start..end]
    }
}

pub fn compute_window(item_count: usize, viewport: &Viewport, scroll_top: u64) -> ViewportWindow {
    let row_height = viewport.effective_row_height();
    let raw_start = viewport.first_visible_index(scroll_top);
    let end_index = raw_start
        .saturating_add(viewport.visible_rows())
        .saturating_add(viewport.overscan)
        .min(item_count);
    let start_index = raw_start.saturating_sub(viewport.overscan).min(end_index);

    ViewportWindow {
        start_index,
        end_index,
        offset_px: (start_index as u64).saturating_mul(row_height),
        total_height_px: viewport.total_height(item_count),
    }
}

#[cfg(test)]
mod tests {
    use super::{Viewport, ViewportWindow, compute_window};
    use proptest::prelude::*;

    #[test]
    fn window_for_large_list_matches_row_math() {
        let viewport = Viewport::new(60, 400, 0);
        let window = compute_window(1000, &viewport, 1200);
        assert_eq!(
            window,
            ViewportWindow {
                start_index: 20,
                end_index: 27,
                offset_px: 1200,
                total_height_px: 60_000,
            }
        );
    }

    #[test]
    fn overscan_extends_both_edges_and_clamps_at_zero() {
        let viewport = Viewport::new(60, 400, 10);
        let top = compute_window(1000, &viewport, 0);
        assert_eq!((top.start_index, top.end_index), (0, 17));

        let middle = compute_window(1000, &viewport, 1200);
        assert_eq!((middle.start_index, middle.end_index), (10, 37));
        assert_eq!(middle.offset_px, 600);
    }

    #[test]
    fn window_clamps_to_a_shrunken_sequence() {
        let viewport = Viewport::new(60, 400, 3);
        let stale_scroll = 1200;
        let window = compute_window(5, &viewport, stale_scroll);
        assert!(window.end_index <= 5);
        assert!(window.start_index <= window.end_index);
        assert!(window.is_empty());

        let rows = vec!["a", "b", "c"];
        let wide = ViewportWindow {
            start_index: 1,
            end_index: 40,
            offset_px: 60,
            total_height_px: 2400,
        };
        assert_eq!(wide.slice(&rows), &["b", "c"]);
    }

    #[test]
    fn zero_row_height_is_treated_as_one() {
        let viewport = Viewport::new(0, 10, 0);
        let window = compute_window(100, &viewport, 5);
        assert_eq!((window.start_index, window.end_index), (5, 15));
        assert_eq!(window.total_height_px, 100);
    }

    #[test]
    fn empty_list_yields_empty_window() {
        let window = compute_window(0, &Viewport::new(20, 400, 5), 0);
        assert!(window.is_empty());
        assert_eq!(window.total_height_px, 0);
    }

    #[test]
    fn scroll_clamps_to_last_page() {
        let viewport = Viewport::new(10, 50, 0);
        assert_eq!(viewport.max_scroll_top(20), 150);
        assert_eq!(viewport.clamp_scroll_top(20, 900), 150);
        assert_eq!(viewport.clamp_scroll_top(3, 900), 0);
    }

    #[test]
    fn scroll_to_reveal_moves_minimally() {
        let viewport = Viewport::new(10, 50, 0);
        assert_eq!(viewport.scroll_to_reveal(100, 0, 2), 0);
        assert_eq!(viewport.scroll_to_reveal(100, 0, 7), 30);
        assert_eq!(viewport.scroll_to_reveal(100, 300, 4), 40);
        assert_eq!(viewport.scroll_to_reveal(100, 0, 500), 950);
        assert_eq!(viewport.scroll_to_reveal(0, 120, 3), 0);
    }

    proptest! {
        #[test]
        fn window_bounds_hold(
            item_count in 0_usize..5_000,
            row_height in 1_u32..200,
            container_height in 0_u32..2_000,
            scroll_top in 0_u64..1_000_000,
            overscan in 0_usize..12,
        ) {
            let viewport = Viewport::new(row_height, container_height, overscan);
            let window = compute_window(item_count, &viewport, scroll_top);
            prop_assert!(window.start_index <= window.end_index);
            prop_assert!(window.end_index <= item_count);
            prop_assert_eq!(window.total_height_px, item_count as u64 * u64::from(row_height));
            prop_assert_eq!(window.offset_px, window.start_index as u64 * u64::from(row_height));
        }

        #[test]
        fn window_covers_row_under_scroll_offset(
            item_count in 0_usize..5_000,
            row_height in 1_u32..200,
            container_height in 0_u32..2_000,
            scroll_top in 0_u64..1_000_000,
            overscan in 0_usize..12,
        ) {
            let viewport = Viewport::new(row_height, container_height, overscan);
            let window = compute_window(item_count, &viewport, scroll_top);
            let anchor = (scroll_top / u64::from(row_height)) as usize;
            if anchor < item_count {
                prop_assert!(window.contains(anchor));
            }
        }
    }
}
