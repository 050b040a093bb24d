//! Error types for the persistent window.
//!
//! This module defines a hierarchical error taxonomy using `thiserror` for structured error
//! handling. Errors compose via `?` and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error for the `pwin` binary
//!   - [`WindowError`] - Orchestration failures (no open document, store failures)
//!     - [`StoreError`] - Block store failures (unknown document, backend errors, cancellation)
//!   - `ConfigError` / `LoggingError` - startup failures (see `config` and `logging`)
//!
//! # Error Recovery Strategy
//!
//! Only opening a document is fatal to the window. Everything that happens while a
//! document is mounted degrades instead of failing:
//!
//! - **Fetch failure**: logged, previously mounted content stays in place
//! - **Height persistence failure**: batch re-queued; repeated failure degrades to
//!   session-only caching
//! - **Measurement surface missing**: estimates fall back to the default block height
//! - **Out-of-range block indices**: clamped
//! - **Stale fetch results**: discarded, never applied

use super::identifiers::DocId;
use thiserror::Error;

/// Top-level error for the simulator binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Logging could not be initialised.
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// The window failed.
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// The simulator could not read or decode its input.
    #[error("Input error: {0}")]
    Input(String),

    /// Writing simulator output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by a [`BlockStore`](crate::store::BlockStore).
///
/// # Recovery Patterns
///
/// - **DocumentNotFound**: the document was closed or never opened; the window treats
///   this as a failed fetch and keeps what is mounted
/// - **Cancelled**: the request was superseded; the window discards it silently
/// - **Backend**: anything else the backend reports, surfaced as a failed fetch or a
///   re-queued height batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No document registered under the requested path.
    ///
    /// Raised by `open_document` when the store does not know the path.
    #[error("No document at path: {path}")]
    PathNotFound {
        /// The path that was requested.
        path: String,
    },

    /// The document ID is not (or no longer) open.
    #[error("Document not found: {doc_id}")]
    DocumentNotFound {
        /// The unknown document.
        doc_id: DocId,
    },

    /// The request's cancellation token fired before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// Backend failure with a message from the store.
    #[error("Block store error: {0}")]
    Backend(String),
}

/// Errors returned by [`PersistentWindow`](crate::window::PersistentWindow) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// An operation needing an open document was called with none open.
    #[error("No document is open")]
    NoDocument,

    /// The block store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
