//! Window test harness
//!
//! Wraps PersistentWindow<HeadlessSurface, HeadlessContainer> with an
//! in-memory store and a manual clock, so tests read as sequences of user
//! actions: open, scroll, wait, measure, edit.

use crate::config::WindowConfig;
use crate::metrics::{CellMeasureSurface, TextMetricsCache};
use crate::model::{BlockId, DocId, WindowError};
use crate::store::MemoryBlockStore;
use crate::window::{
    FetchOutcome, FetchTicket, HeadlessContainer, HeadlessSurface, PersistentWindow,
};
use std::path::Path;
use std::time::{Duration, Instant};

/// Path the default document is registered under.
pub const DOC_PATH: &str = "doc.md";

/// Height of one uniform test block.
pub const BLOCK_HEIGHT: f64 = 28.0;

/// Markdown with `count` one-line paragraphs, `Block 0` .. `Block {count-1}`.
pub fn uniform_markdown(count: usize) -> String {
    (0..count)
        .map(|i| format!("Block {i}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Headless window plus store and clock.
pub struct WindowHarness {
    /// Window under test.
    pub window: PersistentWindow<HeadlessSurface, HeadlessContainer>,
    /// Backing store.
    pub store: MemoryBlockStore,
    now: Instant,
}

impl WindowHarness {
    /// Harness over a registered document of `count` uniform blocks,
    /// 600px wide with an 800px viewport. Nothing is opened yet.
    pub fn uniform(count: usize) -> Self {
        let mut store = MemoryBlockStore::new();
        store
            .insert_markdown(DOC_PATH, &uniform_markdown(count))
            .expect("register test document");
        Self::with_store(store, WindowConfig::default())
    }

    /// Harness over an existing store.
    pub fn with_store(store: MemoryBlockStore, config: WindowConfig) -> Self {
        let window = PersistentWindow::new(
            config,
            HeadlessSurface::new(),
            HeadlessContainer::new(),
            TextMetricsCache::new(Box::new(CellMeasureSurface::default())),
            600.0,
            800.0,
        );
        Self {
            window,
            store,
            now: Instant::now(),
        }
    }

    // ===== Clock =====

    /// Current harness time.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Advance the clock without running anything.
    pub fn advance(&mut self, ms: u64) {
        self.now += Duration::from_millis(ms);
    }

    // ===== Actions =====

    /// Open the default document and return the initial ticket.
    pub fn open(&mut self) -> Option<FetchTicket> {
        self.open_path(DOC_PATH)
    }

    /// Open the document at `path` and return the initial ticket.
    pub fn open_path(&mut self, path: &str) -> Option<FetchTicket> {
        self.window
            .open(&mut self.store, Path::new(path), self.now)
            .expect("open document")
    }

    /// Open and mount the initial range.
    pub fn open_and_load(&mut self) {
        if let Some(ticket) = self.open() {
            self.fetch(&ticket);
        }
    }

    /// Close the open document.
    pub fn close(&mut self) -> Result<(), WindowError> {
        self.window.close(&mut self.store, self.now)
    }

    /// Execute `ticket` against the store.
    pub fn fetch(&mut self, ticket: &FetchTicket) -> FetchOutcome {
        self.window.fetch_and_apply(&mut self.store, ticket)
    }

    /// Scroll to `scroll_top` and run one animation frame.
    pub fn scroll_frame(&mut self, scroll_top: f64) -> Option<FetchTicket> {
        self.window.on_scroll(scroll_top, self.now);
        self.window.on_animation_frame(self.now)
    }

    /// Scroll so block `index` is at the top, run one frame.
    pub fn scroll_to_block(&mut self, index: usize) -> Option<FetchTicket> {
        self.scroll_frame(index as f64 * BLOCK_HEIGHT)
    }

    /// Wait `ms` and run due timers.
    pub fn wait(&mut self, ms: u64) -> Option<FetchTicket> {
        self.advance(ms);
        self.window.on_timer(&mut self.store, self.now)
    }

    /// Scroll to block `index`, let the settle debounce fire, and mount
    /// whatever it asked for.
    pub fn settle_at_block(&mut self, index: usize) -> Option<FetchOutcome> {
        if let Some(ticket) = self.scroll_to_block(index) {
            self.fetch(&ticket);
        }
        let ticket = self.wait(200)?;
        Some(self.fetch(&ticket))
    }

    // ===== Inspection =====

    /// Id of the open document.
    pub fn doc_id(&self) -> DocId {
        self.window.doc_id().cloned().expect("document open")
    }

    /// Id of block `index` in the open document.
    pub fn block_id(&self, index: usize) -> BlockId {
        self.window.manifests()[index].id.clone()
    }

    /// Current surface content.
    pub fn content(&self) -> &str {
        &self.window.surface().content
    }

    /// Scroll container state.
    pub fn container(&self) -> &HeadlessContainer {
        self.window.container()
    }
}
