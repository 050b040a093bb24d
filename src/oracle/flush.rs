//! Write-behind queue for measured heights.

use crate::model::{BlockId, HeightCacheEntry};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Result of a flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing queued.
    Idle,
    /// Queued, but the quiet window has not elapsed.
    NotDue,
    /// The batch was written.
    Flushed(usize),
    /// The write failed; the batch is queued again.
    Failed,
    /// Persistence has been abandoned for this session.
    SessionOnly,
}

/// Pending corrections, debounced and retried.
///
/// A newer correction for a block replaces an older queued one. A failed
/// batch goes back in the queue unless a newer correction superseded it.
#[derive(Debug, Clone)]
pub struct CorrectionQueue {
    pending: HashMap<BlockId, HeightCacheEntry>,
    deadline: Option<Instant>,
    quiet_window: Duration,
    consecutive_failures: u32,
    max_failures: u32,
    session_only: bool,
}

impl CorrectionQueue {
    /// Create an empty queue.
    pub fn new(quiet_window: Duration, max_failures: u32) -> Self {
        Self {
            pending: HashMap::new(),
            deadline: None,
            quiet_window,
            consecutive_failures: 0,
            max_failures,
            session_only: false,
        }
    }

    /// Queue a correction and restart the quiet window.
    pub fn push(&mut self, entry: HeightCacheEntry, now: Instant) {
        self.pending.insert(entry.block_id.clone(), entry);
        self.deadline = Some(now + self.quiet_window);
    }

    /// Whether a batch should be written at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline) && !self.pending.is_empty()
    }

    /// When the next batch becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        if self.pending.is_empty() || self.session_only {
            None
        } else {
            self.deadline
        }
    }

    /// Take every queued entry, ordered by block id.
    pub fn take(&mut self) -> Vec<HeightCacheEntry> {
        self.deadline = None;
        let mut batch: Vec<_> = self.pending.drain().map(|(_, entry)| entry).collect();
        batch.sort_by(|a, b| a.block_id.cmp(&b.block_id));
        batch
    }

    /// Put a failed batch back and schedule a retry.
    ///
    /// Returns `true` when this failure exhausted the retry budget.
    pub fn requeue(&mut self, batch: Vec<HeightCacheEntry>, now: Instant) -> bool {
        for entry in batch {
            self.pending.entry(entry.block_id.clone()).or_insert(entry);
        }
        self.deadline = Some(now + self.quiet_window);
        self.consecutive_failures += 1;

        if !self.session_only && self.consecutive_failures >= self.max_failures {
            self.session_only = true;
            return true;
        }
        false
    }

    /// Record a successful write.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// True once persistence has been abandoned.
    pub fn is_session_only(&self) -> bool {
        self.session_only
    }

    /// Number of queued corrections.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, height: f64) -> HeightCacheEntry {
        HeightCacheEntry::dom(BlockId::new(id).unwrap(), height)
    }

    fn queue() -> CorrectionQueue {
        CorrectionQueue::new(Duration::from_millis(200), 3)
    }

    #[test]
    fn due_only_after_quiet_window() {
        let mut q = queue();
        let now = Instant::now();
        q.push(entry("a", 10.0), now);
        assert!(!q.is_due(now + Duration::from_millis(199)));
        assert!(q.is_due(now + Duration::from_millis(200)));
    }

    #[test]
    fn each_push_restarts_quiet_window() {
        let mut q = queue();
        let now = Instant::now();
        q.push(entry("a", 10.0), now);
        q.push(entry("b", 10.0), now + Duration::from_millis(150));
        assert!(!q.is_due(now + Duration::from_millis(300)));
        assert!(q.is_due(now + Duration::from_millis(350)));
    }

    #[test]
    fn newer_correction_replaces_queued_one() {
        let mut q = queue();
        let now = Instant::now();
        q.push(entry("a", 10.0), now);
        q.push(entry("a", 20.0), now);
        let batch = q.take();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].height, 20.0);
    }

    #[test]
    fn take_is_sorted_and_empties_queue() {
        let mut q = queue();
        let now = Instant::now();
        q.push(entry("c", 1.0), now);
        q.push(entry("a", 1.0), now);
        let ids: Vec<_> = q.take().into_iter().map(|e| e.block_id.to_string()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(q.is_empty());
        assert_eq!(q.deadline(), None);
    }

    #[test]
    fn requeue_keeps_newer_corrections() {
        let mut q = queue();
        let now = Instant::now();
        q.push(entry("a", 10.0), now);
        let batch = q.take();
        q.push(entry("a", 30.0), now);
        q.requeue(batch, now);
        assert_eq!(q.take()[0].height, 30.0);
    }

    #[test]
    fn requeue_schedules_retry_after_quiet_window() {
        let mut q = queue();
        let now = Instant::now();
        q.push(entry("a", 10.0), now);
        let batch = q.take();
        let later = now + Duration::from_millis(500);
        q.requeue(batch, later);
        assert!(!q.is_due(later));
        assert!(q.is_due(later + Duration::from_millis(200)));
    }

    #[test]
    fn exhausting_retries_switches_to_session_only_once() {
        let mut q = queue();
        let now = Instant::now();
        q.push(entry("a", 10.0), now);

        let mut signals = 0;
        for _ in 0..5 {
            let batch = q.take();
            if q.requeue(batch, now) {
                signals += 1;
            }
        }
        assert_eq!(signals, 1);
        assert!(q.is_session_only());
        assert_eq!(q.len(), 1);
        assert_eq!(q.deadline(), None);
    }

    #[test]
    fn success_resets_failure_count() {
        let mut q = queue();
        let now = Instant::now();
        for _ in 0..2 {
            q.push(entry("a", 10.0), now);
            let batch = q.take();
            q.requeue(batch, now);
        }
        q.record_success();
        q.push(entry("a", 10.0), now);
        let batch = q.take();
        assert!(!q.requeue(batch, now));
        assert!(!q.is_session_only());
    }
}
