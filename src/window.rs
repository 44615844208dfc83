//! Virtual window calculator
//!
//! Maps a scroll position to the contiguous index range a renderer has to
//! materialize. Pure arithmetic, no caching and no queries: fetching the
//! range is the caller's job (see [`crate::view::ViewState`]).

use crate::engine::Page;
use serde::Serialize;

/// Half-open index range `[start_index, end_index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WindowRange {
    pub start_index: usize,
    pub end_index: usize,
}

impl WindowRange {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    /// The listing page that materializes this window.
    pub fn to_page(&self) -> Page {
        Page::new(self.start_index, self.len())
    }

    /// Height of the spacer above the first materialized row.
    pub fn top_spacer_px(&self, row_height_px: f64) -> f64 {
        self.start_index as f64 * row_height_px
    }

    /// Height of the spacer below the last materialized row.
    pub fn bottom_spacer_px(&self, total: usize, row_height_px: f64) -> f64 {
        total.saturating_sub(self.end_index) as f64 * row_height_px
    }
}

/// Compute the window for one scroll position.
///
/// `visible = ceil(viewport / row)`, `start = max(0, floor(scroll / row) - buffer)`,
/// `end = min(total, start + visible + 2 * buffer)`. A row height that is not
/// a positive finite number yields an empty window; negative scroll offsets
/// count as zero.
pub fn compute_window(
    scroll_offset_px: f64,
    viewport_height_px: f64,
    row_height_px: f64,
    buffer_rows: usize,
    total: usize,
) -> WindowRange {
    if !(row_height_px.is_finite() && row_height_px > 0.0) {
        return WindowRange::default();
    }

    let scroll = if scroll_offset_px.is_finite() {
        scroll_offset_px.max(0.0)
    } else {
        0.0
    };
    let viewport = if viewport_height_px.is_finite() {
        viewport_height_px.max(0.0)
    } else {
        0.0
    };

    // float -> usize casts saturate
    let visible_rows = (viewport / row_height_px).ceil() as usize;
    let first_row = (scroll / row_height_px).floor() as usize;

    let start_index = first_row.saturating_sub(buffer_rows).min(total);
    let end_index = start_index
        .saturating_add(visible_rows)
        .saturating_add(buffer_rows.saturating_mul(2))
        .min(total);

    WindowRange {
        start_index,
        end_index,
    }
}

/// Fixed geometry of a scrolling list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub row_height_px: f64,
    pub viewport_height_px: f64,
    pub buffer_rows: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            row_height_px: 40.0,
            viewport_height_px: 800.0,
            buffer_rows: 5,
        }
    }
}

impl Viewport {
    pub fn window(&self, scroll_offset_px: f64, total: usize) -> WindowRange {
        compute_window(
            scroll_offset_px,
            self.viewport_height_px,
            self.row_height_px,
            self.buffer_rows,
            total,
        )
    }

    /// Total scrollable height for `total` rows.
    pub fn content_height_px(&self, total: usize) -> f64 {
        total as f64 * self.row_height_px
    }
}
