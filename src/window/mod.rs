//! Persistent window.
//!
//! Orchestrates one open document: the oracle supplies heights, the
//! coordinator decides which range should be mounted, and the window
//! fetches that range from the store and swaps it into the editing
//! surface. Measurements flow back into the oracle and from there into the
//! coordinator's index and the scroll spacer.
//!
//! The host owns the event loop. It forwards scroll events, animation
//! frames, timers and measurements, and executes the [`FetchTicket`]s the
//! window hands out (synchronously via [`PersistentWindow::fetch_and_apply`]
//! or later via [`PersistentWindow::complete_fetch`]).

pub mod fetch;
pub mod headless;
pub mod surface;

pub use fetch::{FetchOutcome, FetchTicket, FetchTracker};
pub use headless::{HeadlessContainer, HeadlessSurface};
pub use surface::{
    EditingSurface, ScrollContainer, SetContentOptions, SurfaceChange, TransactionTag,
};

use crate::config::WindowConfig;
use crate::logging::document_span;
use crate::coordinator::{DisplayMode, ViewportCoordinator, ViewportUpdate};
use crate::metrics::TextMetricsCache;
use crate::model::{BlockId, BlockManifest, BlockRange, DocId, StoreError, WindowError};
use crate::oracle::LayoutOracle;
use crate::store::{reassemble, BlockContent, BlockStore, WindowEdit};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::span::EnteredSpan;
use tracing::{debug, info, warn, Span};

/// Smallest anchor movement worth a corrective scroll.
const DRIFT_EPSILON: f64 = 0.5;

/// Per-document state, dropped wholesale on close.
#[derive(Debug)]
struct OpenDocument {
    doc_id: DocId,
    manifests: Vec<BlockManifest>,
    positions: HashMap<BlockId, usize>,
    oracle: LayoutOracle,
    coordinator: ViewportCoordinator,
    loaded: Option<BlockRange>,
    anchor: f64,
    span: Span,
}

fn index_positions(manifests: &[BlockManifest]) -> HashMap<BlockId, usize> {
    manifests
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id.clone(), i))
        .collect()
}

/// Windowed editor over a document of any size.
#[derive(Debug)]
pub struct PersistentWindow<S, C> {
    config: WindowConfig,
    surface: S,
    container: C,
    spare_metrics: Option<TextMetricsCache>,
    document: Option<OpenDocument>,
    fetches: FetchTracker,
    container_width: f64,
    viewport_height: f64,
    suppressed_scroll: Option<f64>,
    dimmed: bool,
}

impl<S: EditingSurface, C: ScrollContainer> PersistentWindow<S, C> {
    /// Create a window with no document open.
    pub fn new(
        config: WindowConfig,
        surface: S,
        container: C,
        metrics: TextMetricsCache,
        container_width: f64,
        viewport_height: f64,
    ) -> Self {
        Self {
            config,
            surface,
            container,
            spare_metrics: Some(metrics),
            document: None,
            fetches: FetchTracker::new(),
            container_width,
            viewport_height,
            suppressed_scroll: None,
            dimmed: false,
        }
    }

    // ===== Accessors =====

    /// The editing surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The editing surface, mutably (hosts apply user edits through it).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The scroll container.
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Open document, if any.
    pub fn doc_id(&self) -> Option<&DocId> {
        self.document.as_ref().map(|d| &d.doc_id)
    }

    /// Range currently mounted in the surface.
    pub fn loaded_range(&self) -> Option<BlockRange> {
        self.document.as_ref().and_then(|d| d.loaded)
    }

    /// Full document height.
    pub fn total_height(&self) -> f64 {
        self.document
            .as_ref()
            .map_or(0.0, |d| d.coordinator.total_height())
    }

    /// Manifests of the open document.
    pub fn manifests(&self) -> &[BlockManifest] {
        self.document
            .as_ref()
            .map(|d| d.manifests.as_slice())
            .unwrap_or_default()
    }

    /// Oracle of the open document.
    pub fn oracle(&self) -> Option<&LayoutOracle> {
        self.document.as_ref().map(|d| &d.oracle)
    }

    /// Coordinator of the open document.
    pub fn coordinator(&self) -> Option<&ViewportCoordinator> {
        self.document.as_ref().map(|d| &d.coordinator)
    }

    /// Whether mounted content is dimmed (flyover).
    pub fn is_dimmed(&self) -> bool {
        self.dimmed
    }

    /// Earliest instant the host should call [`on_timer`](Self::on_timer).
    pub fn next_deadline(&self) -> Option<Instant> {
        let doc = self.document.as_ref()?;
        match (
            doc.coordinator.next_deadline(),
            doc.oracle.next_flush_deadline(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ===== Lifecycle =====

    /// Open the document at `path`, replacing any open document.
    ///
    /// Returns the ticket for the initial range; `None` for an empty document.
    pub fn open<B: BlockStore + ?Sized>(
        &mut self,
        store: &mut B,
        path: &Path,
        now: Instant,
    ) -> Result<Option<FetchTicket>, WindowError> {
        if let Err(err) = self.close(store, now) {
            warn!(error = %err, "Closing previous document failed");
        }

        let handle = store.open_document(path)?;
        let span = document_span(&handle.doc_id);
        let _entered = span.clone().entered();
        let metrics = self
            .spare_metrics
            .take()
            .unwrap_or_else(TextMetricsCache::unavailable);
        let mut oracle = LayoutOracle::new(handle.doc_id.clone(), &self.config, metrics);

        match store.load_height_cache(&handle.doc_id) {
            Ok(entries) => {
                let seeded = oracle.seed(entries);
                debug!(doc_id = %handle.doc_id, seeded, "Seeded measured heights");
            }
            Err(err) => warn!(doc_id = %handle.doc_id, error = %err, "Loading height cache failed"),
        }

        let heights = oracle.heights_for(&handle.blocks, self.container_width);
        let mut coordinator =
            ViewportCoordinator::new(self.config.viewport, &heights, self.viewport_height);

        self.fetches.bump_epoch();
        self.container.set_spacer_height(coordinator.total_height());
        self.container.set_anchor_offset(0.0);
        self.write_scroll_top(0.0);
        self.set_dimmed(false);

        info!(
            doc_id = %handle.doc_id,
            blocks = handle.total_blocks,
            total_height = coordinator.total_height(),
            "Document opened"
        );

        let update = coordinator.request_initial(now);
        self.document = Some(OpenDocument {
            doc_id: handle.doc_id,
            positions: index_positions(&handle.blocks),
            manifests: handle.blocks,
            oracle,
            coordinator,
            loaded: None,
            anchor: 0.0,
            span,
        });

        if update.range().is_empty() {
            return Ok(None);
        }
        Ok(self.apply_update(update))
    }

    /// Flush pending corrections and close the open document.
    pub fn close<B: BlockStore + ?Sized>(
        &mut self,
        store: &mut B,
        now: Instant,
    ) -> Result<(), WindowError> {
        let _entered = self.enter_document();
        let Some(mut doc) = self.document.take() else {
            return Ok(());
        };

        self.fetches.bump_epoch();
        self.suppressed_scroll = None;
        self.set_dimmed(false);

        let flushed = doc.oracle.flush_now(store, now);
        let closed = store.close_document(&doc.doc_id);
        info!(doc_id = %doc.doc_id, flush = ?flushed, "Document closed");

        self.spare_metrics = Some(doc.oracle.into_metrics());
        closed.map_err(WindowError::from)
    }

    // ===== Scroll pipeline =====

    /// Forward a scroll event from the container.
    ///
    /// The echo of the window's own corrective scroll write is ignored.
    pub fn on_scroll(&mut self, scroll_top: f64, now: Instant) {
        if let Some(expected) = self.suppressed_scroll.take() {
            if (expected - scroll_top).abs() < 1.0 {
                return;
            }
        }
        if let Some(doc) = self.document.as_mut() {
            doc.coordinator.handle_scroll(scroll_top, now);
        }
    }

    /// Run the once-per-frame coordinator step.
    ///
    /// The dim follows the mode of every processed frame, gated or not.
    pub fn on_animation_frame(&mut self, now: Instant) -> Option<FetchTicket> {
        let _entered = self.enter_document();
        let doc = self.document.as_mut()?;
        if !doc.coordinator.has_pending_scroll() {
            return None;
        }
        let update = doc.coordinator.on_frame(now);
        let flyover = doc.coordinator.mode() == DisplayMode::Flyover;
        self.set_dimmed(flyover);
        self.apply_update(update?)
    }

    /// Run due timers: the settle debounce and the height flush.
    pub fn on_timer<B: BlockStore + ?Sized>(
        &mut self,
        store: &mut B,
        now: Instant,
    ) -> Option<FetchTicket> {
        let _entered = self.enter_document();
        let doc = self.document.as_mut()?;
        doc.oracle.poll_flush(store, now);
        let update = doc.coordinator.poll_settle(now)?;
        self.apply_update(update)
    }

    fn apply_update(&mut self, update: ViewportUpdate) -> Option<FetchTicket> {
        if !update.mode.fetches() {
            self.set_dimmed(true);
            return None;
        }

        let doc = self.document.as_ref()?;
        let range = update.range();
        if doc.loaded == Some(range) {
            // Already mounted; anything in flight would move it away
            self.fetches.cancel_current();
            self.set_dimmed(false);
            return None;
        }
        if self.fetches.in_flight() == Some(range) {
            return None;
        }

        let ticket = self.fetches.issue(doc.doc_id.clone(), range);
        debug!(
            range = %range,
            mode = %update.mode,
            generation = ticket.generation,
            "Fetch issued"
        );
        Some(ticket)
    }

    // ===== Fetch completion =====

    /// Execute `ticket` against `store` and mount the result.
    pub fn fetch_and_apply<B: BlockStore + ?Sized>(
        &mut self,
        store: &mut B,
        ticket: &FetchTicket,
    ) -> FetchOutcome {
        let result = store.get_blocks(&ticket.doc_id, ticket.range, &ticket.token);
        self.complete_fetch(ticket, result)
    }

    /// Mount the result of `ticket` if it is still the expected fetch.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<BlockContent>, StoreError>,
    ) -> FetchOutcome {
        let _entered = self.enter_document();
        let is_current_doc = self
            .document
            .as_ref()
            .is_some_and(|d| d.doc_id == ticket.doc_id);
        if !is_current_doc || !self.fetches.accepts(ticket) {
            debug!(range = %ticket.range, generation = ticket.generation, "Stale fetch discarded");
            return FetchOutcome::Discarded;
        }
        self.fetches.finish(ticket);

        let blocks = match result {
            Ok(blocks) => blocks,
            Err(StoreError::Cancelled) => return FetchOutcome::Discarded,
            Err(err) => {
                warn!(range = %ticket.range, error = %err, "Fetch failed; keeping mounted content");
                return FetchOutcome::Failed(err);
            }
        };

        self.surface
            .set_content(&reassemble(&blocks), SetContentOptions::viewport_shift());

        let Some(doc) = self.document.as_mut() else {
            return FetchOutcome::Discarded;
        };
        doc.loaded = Some(ticket.range);
        doc.coordinator.set_loaded_range(ticket.range);
        doc.anchor = doc.coordinator.offset_of(ticket.range.start_block);
        self.container.set_anchor_offset(doc.anchor);
        self.set_dimmed(false);

        debug!(range = %ticket.range, blocks = blocks.len(), "Range mounted");
        FetchOutcome::Applied(ticket.range)
    }

    // ===== Measurement =====

    /// Feed per-block measured heights back. Returns how many changed.
    pub fn on_blocks_measured(&mut self, measurements: &[(BlockId, f64)], now: Instant) -> usize {
        let _entered = self.enter_document();
        let Some(doc) = self.document.as_mut() else {
            return 0;
        };

        let mut changed = 0;
        for (block_id, height) in measurements {
            if !doc.oracle.apply_dom_correction(block_id, *height, now) {
                continue;
            }
            if let Some(&index) = doc.positions.get(block_id) {
                doc.coordinator.update_height(index, *height);
            }
            changed += 1;
        }

        if changed > 0 {
            self.reconcile_layout();
        }
        changed
    }

    /// Fallback when only the total mounted height is observable: split it
    /// evenly across the loaded blocks.
    pub fn on_content_resized(&mut self, total_height: f64, now: Instant) -> usize {
        let Some(doc) = self.document.as_ref() else {
            return 0;
        };
        let Some(loaded) = doc.loaded.filter(|r| !r.is_empty()) else {
            return 0;
        };

        let per_block = total_height / loaded.len() as f64;
        let measurements: Vec<(BlockId, f64)> = doc.manifests[loaded.indices()]
            .iter()
            .map(|m| (m.id.clone(), per_block))
            .collect();
        self.on_blocks_measured(&measurements, now)
    }

    /// The container was resized.
    pub fn on_container_resize(&mut self, width: f64, viewport_height: f64, now: Instant) {
        let _entered = self.enter_document();
        let width_changed = (width - self.container_width).abs() > f64::EPSILON;
        self.container_width = width;
        self.viewport_height = viewport_height;

        let Some(doc) = self.document.as_mut() else {
            return;
        };
        doc.coordinator.set_viewport_height(viewport_height);
        if width_changed {
            let heights = doc.oracle.heights_for(&doc.manifests, width);
            doc.coordinator.set_heights(&heights);
        }

        self.reconcile_layout();

        // Re-place the corrected position on the next frame
        if let Some(doc) = self.document.as_mut() {
            let scroll_top = doc.coordinator.latest_scroll_top();
            doc.coordinator.handle_scroll(scroll_top, now);
        }
    }

    /// Resize the spacer and keep the mounted content where the user sees it.
    fn reconcile_layout(&mut self) {
        let Some(doc) = self.document.as_mut() else {
            return;
        };
        self.container
            .set_spacer_height(doc.coordinator.total_height());

        let Some(loaded) = doc.loaded else {
            return;
        };
        let anchor = doc.coordinator.offset_of(loaded.start_block);
        let drift = anchor - doc.anchor;
        if drift.abs() < DRIFT_EPSILON {
            return;
        }

        doc.anchor = anchor;
        self.container.set_anchor_offset(anchor);

        let scroll_top = (doc.coordinator.latest_scroll_top() + drift).max(0.0);
        doc.coordinator.sync_scroll_top(scroll_top);
        debug!(drift, scroll_top, "Corrective scroll after layout change");
        self.write_scroll_top(scroll_top);
    }

    fn enter_document(&self) -> Option<EnteredSpan> {
        self.document.as_ref().map(|doc| doc.span.clone().entered())
    }

    fn write_scroll_top(&mut self, scroll_top: f64) {
        self.container.set_scroll_top(scroll_top);
        self.suppressed_scroll = Some(scroll_top);
    }

    fn set_dimmed(&mut self, dimmed: bool) {
        if self.dimmed != dimmed {
            self.dimmed = dimmed;
            self.container.set_dimmed(dimmed);
        }
    }

    // ===== Editing =====

    /// Turn a surface change into an edit of the loaded range.
    ///
    /// Changes tagged as viewport shifts are the window's own swaps and
    /// produce nothing.
    pub fn on_surface_change(&self, change: &SurfaceChange) -> Option<WindowEdit> {
        if change.is_viewport_shift() {
            return None;
        }
        let loaded = self.document.as_ref()?.loaded?;
        Some(WindowEdit {
            range: loaded,
            markdown: change.markdown.clone(),
        })
    }

    /// Write an edit through the store and adopt the re-scanned manifests.
    ///
    /// Returns the loaded range after the edit, which may have grown or
    /// shrunk as blocks were split or merged.
    pub fn commit_edit<B: BlockStore + ?Sized>(
        &mut self,
        store: &mut B,
        edit: &WindowEdit,
    ) -> Result<BlockRange, WindowError> {
        let _entered = self.enter_document();
        let doc = self.document.as_mut().ok_or(WindowError::NoDocument)?;
        let result = store.update_visible_window(&doc.doc_id, edit)?;

        let old_total = doc.manifests.len();
        let new_total = result.new_total_blocks;
        let range = edit.range.clamp_to(old_total);
        let new_end = (range.end_block + new_total)
            .saturating_sub(old_total)
            .clamp(range.start_block, new_total);
        let loaded = BlockRange::new(range.start_block, new_end);

        doc.oracle.retain_manifests(&result.blocks);
        let heights = doc.oracle.heights_for(&result.blocks, self.container_width);
        doc.positions = index_positions(&result.blocks);
        doc.manifests = result.blocks;
        doc.coordinator.set_heights(&heights);
        doc.coordinator.set_loaded_range(loaded);
        doc.loaded = Some(loaded);

        // Content fetched before the edit must not overwrite it
        self.fetches.cancel_current();

        info!(
            doc_id = %doc.doc_id,
            loaded = %loaded,
            total_blocks = new_total,
            "Edit committed"
        );
        self.reconcile_layout();
        Ok(loaded)
    }
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;
