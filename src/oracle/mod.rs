//! Layout oracle.
//!
//! Per-document height cache. Every block has a height at all times: an
//! estimate until the block is rendered and measured, then the measured
//! (`dom`) value. Measured values always win over estimates and are only
//! dropped by explicit invalidation or a content change.
//!
//! Corrections are written behind to the block store once the stream of
//! measurements goes quiet.

mod flush;

pub use flush::{CorrectionQueue, FlushOutcome};

use crate::config::{OracleTuning, WindowConfig};
use crate::estimator::{estimate, Typography};
use crate::metrics::TextMetricsCache;
use crate::model::{BlockId, BlockManifest, BlockType, DocId, HeightCacheEntry, HeightSource};
use crate::store::BlockStore;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct CachedHeight {
    entry: HeightCacheEntry,
    /// Unknown for seeded entries until the manifest is seen
    block_type: Option<BlockType>,
    content_hash: Option<u64>,
    /// Width an estimate was computed at; `None` for measured heights
    estimated_at: Option<f64>,
}

/// Height cache and estimator front-end for one document.
#[derive(Debug)]
pub struct LayoutOracle {
    doc_id: DocId,
    tuning: OracleTuning,
    typography: Typography,
    metrics: TextMetricsCache,
    entries: HashMap<BlockId, CachedHeight>,
    reference_width: Option<f64>,
    queue: CorrectionQueue,
}

impl LayoutOracle {
    /// Create an empty oracle for `doc_id`.
    pub fn new(doc_id: DocId, config: &WindowConfig, mut metrics: TextMetricsCache) -> Self {
        metrics.prewarm(&config.typography.paragraph.font);
        Self {
            doc_id,
            tuning: config.oracle,
            typography: config.typography.clone(),
            metrics,
            entries: HashMap::new(),
            reference_width: None,
            queue: CorrectionQueue::new(
                config.oracle.flush_quiet_window,
                config.oracle.max_flush_failures,
            ),
        }
    }

    /// Document this oracle belongs to.
    pub fn doc_id(&self) -> &DocId {
        &self.doc_id
    }

    /// Give the shared metrics cache back when the document closes.
    pub fn into_metrics(self) -> TextMetricsCache {
        self.metrics
    }

    // ===== Queries =====

    /// Heights for every manifest, keyed by block id.
    ///
    /// Measured heights are returned unchanged. Everything else is
    /// estimated at `container_width` and cached as an estimate.
    pub fn compute_all(
        &mut self,
        manifests: &[BlockManifest],
        container_width: f64,
    ) -> HashMap<BlockId, f64> {
        let heights = self.heights_for(manifests, container_width);
        manifests
            .iter()
            .map(|m| m.id.clone())
            .zip(heights)
            .collect()
    }

    /// Same as [`compute_all`](Self::compute_all), in manifest order.
    pub fn heights_for(&mut self, manifests: &[BlockManifest], container_width: f64) -> Vec<f64> {
        self.set_container_width(container_width);
        manifests
            .iter()
            .map(|m| self.height_of(m, container_width))
            .collect()
    }

    fn height_of(&mut self, manifest: &BlockManifest, width: f64) -> f64 {
        if let Some(cached) = self.entries.get_mut(&manifest.id) {
            let same_content = cached
                .content_hash
                .map_or(true, |hash| hash == manifest.content_hash);
            if same_content {
                if cached.entry.is_dom() {
                    cached.block_type.get_or_insert(manifest.block_type);
                    cached.content_hash.get_or_insert(manifest.content_hash);
                    return cached.entry.height;
                }
                if cached.estimated_at == Some(width) {
                    return cached.entry.height;
                }
            }
        }

        let height = estimate(
            manifest,
            &self.typography,
            width,
            &mut self.metrics,
            self.tuning.default_block_height,
        );
        self.entries.insert(
            manifest.id.clone(),
            CachedHeight {
                entry: HeightCacheEntry::estimated(manifest.id.clone(), height),
                block_type: Some(manifest.block_type),
                content_hash: Some(manifest.content_hash),
                estimated_at: Some(width),
            },
        );
        height
    }

    /// Cached height of one block.
    pub fn height(&self, block_id: &BlockId) -> Option<f64> {
        self.entries.get(block_id).map(|c| c.entry.height)
    }

    /// Cached entry of one block.
    pub fn entry(&self, block_id: &BlockId) -> Option<&HeightCacheEntry> {
        self.entries.get(block_id).map(|c| &c.entry)
    }

    /// Source of the cached height of one block.
    pub fn source(&self, block_id: &BlockId) -> Option<HeightSource> {
        self.entries.get(block_id).map(|c| c.entry.source)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ===== Corrections =====

    /// Record a measured height.
    ///
    /// Ignored (returns `false`) when within the tolerance of the cached
    /// value or not a finite non-negative number. Otherwise the entry
    /// becomes `dom` immediately and is queued for persistence.
    pub fn apply_dom_correction(&mut self, block_id: &BlockId, height: f64, now: Instant) -> bool {
        if !height.is_finite() || height < 0.0 {
            return false;
        }

        let entry = HeightCacheEntry::dom(block_id.clone(), height);
        match self.entries.get_mut(block_id) {
            Some(cached) if (cached.entry.height - height).abs() <= self.tuning.dom_tolerance => {
                return false;
            }
            Some(cached) => {
                debug!(
                    block_id = %block_id,
                    from = cached.entry.height,
                    to = height,
                    "DOM correction"
                );
                cached.entry = entry.clone();
                cached.estimated_at = None;
            }
            None => {
                self.entries.insert(
                    block_id.clone(),
                    CachedHeight {
                        entry: entry.clone(),
                        block_type: None,
                        content_hash: None,
                        estimated_at: None,
                    },
                );
            }
        }

        if !self.queue.is_session_only() {
            self.queue.push(entry, now);
        }
        true
    }

    /// Drop measured heights so the next query re-estimates them.
    ///
    /// Width-independent blocks (code fences, rules, front matter) keep
    /// their measured heights. Returns the number of entries dropped.
    pub fn invalidate(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, cached| {
            !cached.entry.is_dom()
                || cached
                    .block_type
                    .is_some_and(BlockType::is_width_independent)
        });
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!(doc_id = %self.doc_id, dropped, "Invalidated measured heights");
        }
        dropped
    }

    /// Track the container width; invalidates when it moves by at least the
    /// reflow threshold since the last invalidation.
    pub fn set_container_width(&mut self, width: f64) -> bool {
        match self.reference_width {
            None => {
                self.reference_width = Some(width);
                false
            }
            Some(reference) if (reference - width).abs() >= self.tuning.reflow_threshold => {
                self.reference_width = Some(width);
                self.invalidate();
                true
            }
            Some(_) => false,
        }
    }

    /// Width measured heights are currently valid for.
    pub fn container_width(&self) -> Option<f64> {
        self.reference_width
    }

    /// Load measured heights persisted by an earlier session.
    ///
    /// Estimated entries in `entries` are ignored; existing measurements are
    /// kept. Returns the number of entries seeded.
    pub fn seed(&mut self, entries: Vec<HeightCacheEntry>) -> usize {
        let mut seeded = 0;
        for entry in entries.into_iter().filter(HeightCacheEntry::is_dom) {
            if self.entries.get(&entry.block_id).is_some_and(|c| c.entry.is_dom()) {
                continue;
            }
            self.entries.insert(
                entry.block_id.clone(),
                CachedHeight {
                    entry,
                    block_type: None,
                    content_hash: None,
                    estimated_at: None,
                },
            );
            seeded += 1;
        }
        seeded
    }

    /// Forget blocks that disappeared or whose content changed.
    ///
    /// Returns the number of entries dropped.
    pub fn retain_manifests(&mut self, manifests: &[BlockManifest]) -> usize {
        let live: HashMap<&BlockId, u64> = manifests
            .iter()
            .map(|m| (&m.id, m.content_hash))
            .collect();
        let before = self.entries.len();
        self.entries.retain(|id, cached| match live.get(id) {
            Some(&hash) => cached.content_hash.map_or(true, |h| h == hash),
            None => false,
        });
        before - self.entries.len()
    }

    // ===== Persistence =====

    /// Number of corrections waiting to be written.
    pub fn pending_corrections(&self) -> usize {
        self.queue.len()
    }

    /// When the next flush becomes due, if anything is queued.
    pub fn next_flush_deadline(&self) -> Option<Instant> {
        self.queue.deadline()
    }

    /// True once persistence has been abandoned for this session.
    pub fn is_session_only(&self) -> bool {
        self.queue.is_session_only()
    }

    /// Write queued corrections if the quiet window has elapsed.
    pub fn poll_flush<S: BlockStore + ?Sized>(&mut self, store: &mut S, now: Instant) -> FlushOutcome {
        if self.queue.is_session_only() {
            return FlushOutcome::SessionOnly;
        }
        if self.queue.is_empty() {
            return FlushOutcome::Idle;
        }
        if !self.queue.is_due(now) {
            return FlushOutcome::NotDue;
        }
        self.write_batch(store, now)
    }

    /// Write queued corrections regardless of the quiet window.
    pub fn flush_now<S: BlockStore + ?Sized>(&mut self, store: &mut S, now: Instant) -> FlushOutcome {
        if self.queue.is_session_only() {
            return FlushOutcome::SessionOnly;
        }
        if self.queue.is_empty() {
            return FlushOutcome::Idle;
        }
        self.write_batch(store, now)
    }

    fn write_batch<S: BlockStore + ?Sized>(&mut self, store: &mut S, now: Instant) -> FlushOutcome {
        let batch = self.queue.take();
        let count = batch.len();

        match store.update_height_cache(&self.doc_id, &batch) {
            Ok(()) => {
                self.queue.record_success();
                debug!(doc_id = %self.doc_id, count, "Flushed height corrections");
                FlushOutcome::Flushed(count)
            }
            Err(err) => {
                if self.queue.requeue(batch, now) {
                    warn!(
                        doc_id = %self.doc_id,
                        error = %err,
                        "Height persistence failing repeatedly; keeping corrections in memory only"
                    );
                    FlushOutcome::SessionOnly
                } else {
                    warn!(
                        doc_id = %self.doc_id,
                        error = %err,
                        count,
                        "Height flush failed; batch re-queued"
                    );
                    FlushOutcome::Failed
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "oracle_tests.rs"]
mod tests;
