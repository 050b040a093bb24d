//! Viewport coordinator.
//!
//! Pure state machine from scroll offset to a buffered block range. It
//! owns the cumulative height index for one document and decides, at most
//! once per animation frame, whether a new range should be requested.
//!
//! Two concerns are kept apart:
//! - **mode**: is the visible span inside the loaded range right now?
//! - **gate**: is it time to ask for a new range? (hysteresis + cooldown)
//!
//! A swap perturbs the measured scroll height, which produces a scroll
//! event, which would produce another swap. The gate breaks that loop; the
//! settle debounce guarantees the resting position is loaded anyway.
//!
//! No I/O happens here. Time is passed in by the caller.

pub mod height_index;
mod types;

pub use height_index::HeightIndex;
pub use types::{DisplayMode, ViewportUpdate};

use crate::config::ViewportTuning;
use crate::model::BlockRange;
use std::time::Instant;
use tracing::debug;

/// Where a scroll offset lands in the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Block containing the top edge of the viewport.
    pub first_visible: usize,
    /// Block containing the bottom edge of the viewport.
    pub last_visible: usize,
    /// Buffered range around the visible span.
    pub range: BlockRange,
    /// Offset of `range.start_block`.
    pub translate_y: f64,
}

/// Scroll-to-range state machine for one document.
#[derive(Debug, Clone)]
pub struct ViewportCoordinator {
    tuning: ViewportTuning,
    index: HeightIndex,
    viewport_height: f64,
    scroll_top: f64,
    pending_scroll: Option<f64>,
    settle_deadline: Option<Instant>,
    loaded: Option<BlockRange>,
    last_emitted: Option<BlockRange>,
    last_emission_at: Option<Instant>,
    mode: DisplayMode,
}

impl ViewportCoordinator {
    /// Create a coordinator over per-block heights.
    pub fn new(tuning: ViewportTuning, heights: &[f64], viewport_height: f64) -> Self {
        Self {
            tuning,
            index: HeightIndex::from_heights(heights),
            viewport_height: viewport_height.max(0.0),
            scroll_top: 0.0,
            pending_scroll: None,
            settle_deadline: None,
            loaded: None,
            last_emitted: None,
            last_emission_at: None,
            mode: DisplayMode::Flyover,
        }
    }

    /// Forget everything about the previous document.
    pub fn reset(&mut self, heights: &[f64]) {
        *self = Self::new(self.tuning, heights, self.viewport_height);
    }

    // ===== Heights =====

    /// Replace all block heights (manifest replaced or width changed).
    pub fn set_heights(&mut self, heights: &[f64]) {
        self.index = HeightIndex::from_heights(heights);
        if let Some(loaded) = self.loaded {
            self.loaded = Some(loaded.clamp_to(self.index.len()));
        }
    }

    /// Update the height of a single block. Out-of-range indices are ignored.
    pub fn update_height(&mut self, index: usize, height: f64) -> bool {
        self.index.set(index, height)
    }

    /// The cumulative height index.
    pub fn index(&self) -> &HeightIndex {
        &self.index
    }

    /// Number of blocks in the document.
    pub fn block_count(&self) -> usize {
        self.index.len()
    }

    /// Full document height, which sizes the scroll spacer.
    pub fn total_height(&self) -> f64 {
        self.index.total()
    }

    /// Offset of block `index`'s top edge (clamped).
    pub fn offset_of(&self, index: usize) -> f64 {
        self.index.cumulative(index)
    }

    // ===== Viewport state =====

    /// Change the visible height of the scroll container.
    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height.max(0.0);
    }

    /// Record the range the Window actually materialized.
    pub fn set_loaded_range(&mut self, range: BlockRange) {
        self.loaded = Some(range.clamp_to(self.index.len()));
    }

    /// The range currently materialized, if any.
    pub fn loaded_range(&self) -> Option<BlockRange> {
        self.loaded
    }

    /// The last range emitted, if any.
    pub fn last_emitted(&self) -> Option<BlockRange> {
        self.last_emitted
    }

    /// Mode of the most recent placement.
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Last processed scroll offset.
    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Most recent scroll offset, including one not yet processed by a frame.
    pub fn latest_scroll_top(&self) -> f64 {
        self.pending_scroll.unwrap_or(self.scroll_top)
    }

    /// True when a scroll event is waiting for the next frame.
    pub fn has_pending_scroll(&self) -> bool {
        self.pending_scroll.is_some()
    }

    /// Adopt a scroll offset written by the window itself.
    ///
    /// Neither throttled nor debounced; the echoed scroll event is
    /// suppressed by the window. A pending scroll value is replaced so the
    /// next frame or settle places the written offset.
    pub fn sync_scroll_top(&mut self, scroll_top: f64) {
        let scroll_top = scroll_top.max(0.0);
        self.scroll_top = scroll_top;
        if self.pending_scroll.is_some() {
            self.pending_scroll = Some(scroll_top);
        }
    }

    /// Earliest instant at which [`poll_settle`](Self::poll_settle) will fire.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.settle_deadline
    }

    // ===== Scroll pipeline =====

    /// Record a scroll event.
    ///
    /// Only the latest value is kept until the next frame. Every call
    /// re-arms the settle debounce.
    pub fn handle_scroll(&mut self, scroll_top: f64, now: Instant) {
        let scroll_top = if scroll_top.is_finite() {
            scroll_top.max(0.0)
        } else {
            0.0
        };
        self.pending_scroll = Some(scroll_top);
        self.settle_deadline = Some(now + self.tuning.settle_debounce);
    }

    /// Process the pending scroll value, if any, once per frame.
    pub fn on_frame(&mut self, now: Instant) -> Option<ViewportUpdate> {
        let scroll_top = self.pending_scroll.take()?;
        self.scroll_top = scroll_top;

        let placement = self.place(scroll_top);
        self.mode = self.classify(&placement);

        if !self.should_emit(&placement, now) {
            debug!(
                first_visible = placement.first_visible,
                range = %placement.range,
                mode = %self.mode,
                "Range change gated"
            );
            return None;
        }

        Some(self.emit(&placement, self.mode, now))
    }

    /// Fire the settle update once the debounce has expired.
    ///
    /// Bypasses the gate. Returns `None` before the deadline and after the
    /// update has already fired for the current burst of scrolling.
    pub fn poll_settle(&mut self, now: Instant) -> Option<ViewportUpdate> {
        let deadline = self.settle_deadline?;
        if now < deadline {
            return None;
        }
        self.settle_deadline = None;

        if let Some(scroll_top) = self.pending_scroll.take() {
            self.scroll_top = scroll_top;
        }
        let placement = self.place(self.scroll_top);
        self.mode = DisplayMode::Settle;
        Some(self.emit(&placement, DisplayMode::Settle, now))
    }

    /// Emit the range for the current position unconditionally.
    ///
    /// Used right after a document opens, before any scroll happened.
    pub fn request_initial(&mut self, now: Instant) -> ViewportUpdate {
        let placement = self.place(self.scroll_top);
        self.mode = DisplayMode::Settle;
        self.emit(&placement, DisplayMode::Settle, now)
    }

    /// Place a scroll offset without touching any state.
    pub fn place(&self, scroll_top: f64) -> Placement {
        let count = self.index.len();
        let Some(first_visible) = self.index.locate(scroll_top) else {
            return Placement {
                first_visible: 0,
                last_visible: 0,
                range: BlockRange::default(),
                translate_y: 0.0,
            };
        };

        let bottom = (scroll_top + self.viewport_height - 1.0).max(scroll_top);
        let last_visible = self
            .index
            .locate(bottom)
            .unwrap_or(first_visible)
            .max(first_visible);

        let buffer = self.tuning.buffer_blocks;
        let max_loaded = self.tuning.max_loaded_blocks;
        // Leftover budget beyond both buffers extends the range forward
        let blocks_per_viewport = (last_visible - first_visible + 1)
            .max(max_loaded.saturating_sub(buffer.saturating_mul(2)));

        let start = first_visible.saturating_sub(buffer);
        let end = first_visible
            .saturating_add(blocks_per_viewport)
            .saturating_add(buffer)
            .min(count)
            .min(start.saturating_add(max_loaded));
        let range = BlockRange::new(start, end);

        Placement {
            first_visible,
            last_visible,
            range,
            translate_y: self.index.cumulative(start),
        }
    }

    fn classify(&self, placement: &Placement) -> DisplayMode {
        let visible = BlockRange::new(placement.first_visible, placement.last_visible + 1);
        match self.loaded {
            Some(loaded) if loaded.covers(visible) => DisplayMode::Smooth,
            _ => DisplayMode::Flyover,
        }
    }

    fn should_emit(&self, placement: &Placement, now: Instant) -> bool {
        let (Some(last_range), Some(last_at)) = (self.last_emitted, self.last_emission_at) else {
            return true;
        };

        if placement.range == last_range {
            return false;
        }
        if now.saturating_duration_since(last_at) < self.tuning.cooldown {
            return false;
        }
        self.near_loaded_edge(placement.first_visible)
    }

    fn near_loaded_edge(&self, first_visible: usize) -> bool {
        let Some(loaded) = self.loaded else {
            return true;
        };
        let margin = self.tuning.hysteresis_blocks;
        let count = self.index.len();

        // Document start and end are never edges worth loading past
        let near_start =
            loaded.start_block > 0 && first_visible < loaded.start_block.saturating_add(margin);
        let near_end =
            loaded.end_block < count && first_visible.saturating_add(margin) >= loaded.end_block;
        near_start || near_end
    }

    fn emit(&mut self, placement: &Placement, mode: DisplayMode, now: Instant) -> ViewportUpdate {
        self.last_emitted = Some(placement.range);
        self.last_emission_at = Some(now);

        let update = ViewportUpdate {
            start_block: placement.range.start_block,
            end_block: placement.range.end_block,
            mode,
            translate_y: placement.translate_y,
        };
        debug!(
            first_visible = placement.first_visible,
            range = %placement.range,
            mode = %mode,
            translate_y = update.translate_y,
            "Viewport update emitted"
        );
        update
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
