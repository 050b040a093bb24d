//! Cooperative cancellation for block fetches.
//!
//! The window issues one token per fetch and cancels it as soon as a newer
//! fetch supersedes it. Stores that load blocks incrementally (or on
//! another thread) check the token and stop early.

use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared cancellation flag.
///
/// All clones observe the same state.
///
/// # Example
///
/// ```
/// use persistent_window::CancellationToken;
///
/// let token = CancellationToken::new();
/// let store_side = token.clone();
/// token.cancel();
/// assert!(store_side.is_cancelled());
/// ```
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the non-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token and every clone of it. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once `cancel()` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
