//! Fetch tickets and staleness tracking.
//!
//! Store calls may complete after the window has moved on. Every fetch is
//! issued as a ticket; only the ticket matching the current expectation
//! may be mounted.

use crate::cancel::CancellationToken;
use crate::model::{BlockRange, DocId, StoreError};

/// One outstanding request for a block range.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    /// Document the range belongs to.
    pub doc_id: DocId,
    /// Document epoch at issue time; bumped on every open/close.
    pub epoch: u64,
    /// Monotonic fetch counter within the epoch.
    pub generation: u64,
    /// Requested blocks.
    pub range: BlockRange,
    /// Cancelled as soon as a newer fetch is issued.
    pub token: CancellationToken,
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Content was mounted; the range is now loaded.
    Applied(BlockRange),
    /// The result was stale (superseded, cancelled or for another document).
    Discarded,
    /// The store failed; mounted content was left in place.
    Failed(StoreError),
}

/// Tracks the single fetch whose result may be mounted.
#[derive(Debug, Default)]
pub struct FetchTracker {
    epoch: u64,
    generation: u64,
    expected: Option<(u64, BlockRange)>,
    token: Option<CancellationToken>,
}

impl FetchTracker {
    /// Create a tracker at epoch 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current document epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Range of the fetch currently expected, if any.
    pub fn in_flight(&self) -> Option<BlockRange> {
        self.expected.map(|(_, range)| range)
    }

    /// Issue a ticket for `range`, cancelling the previous one.
    pub fn issue(&mut self, doc_id: DocId, range: BlockRange) -> FetchTicket {
        self.cancel_current();
        self.generation += 1;
        let token = CancellationToken::new();
        self.expected = Some((self.generation, range));
        self.token = Some(token.clone());

        FetchTicket {
            doc_id,
            epoch: self.epoch,
            generation: self.generation,
            range,
            token,
        }
    }

    /// Whether `ticket` is the one currently expected.
    pub fn accepts(&self, ticket: &FetchTicket) -> bool {
        ticket.epoch == self.epoch
            && self.expected == Some((ticket.generation, ticket.range))
            && !ticket.token.is_cancelled()
    }

    /// Mark `ticket` as completed. No-op for stale tickets.
    pub fn finish(&mut self, ticket: &FetchTicket) {
        if self.accepts(ticket) {
            self.expected = None;
            self.token = None;
        }
    }

    /// Start a new epoch; every outstanding ticket becomes stale.
    pub fn bump_epoch(&mut self) {
        self.cancel_current();
        self.epoch += 1;
    }

    /// Cancel the outstanding ticket, if any.
    pub fn cancel_current(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.expected = None;
    }
}
