//! Persistent Window
//!
//! Virtualized editing window for documents of unbounded size. Only a
//! buffered slice of blocks is ever mounted in the editing surface; the
//! rest of the document exists as heights in a cumulative index so the
//! scrollbar reflects the full document.
//!
//! Layers, bottom up:
//! - [`model`]: identifiers, manifests, height entries, errors
//! - [`metrics`] and [`estimator`]: text width measurement and height estimates
//! - [`oracle`]: authoritative per-block heights, DOM corrections, persistence
//! - [`coordinator`]: scroll offset to block range, mode and gating
//! - [`store`]: the block store seam and an in-memory implementation
//! - [`window`]: orchestration of all of the above for one open document

pub mod cancel;
pub mod config;
pub mod coordinator;
pub mod estimator;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod oracle;
pub mod store;
pub mod window;

pub use cancel::CancellationToken;
pub use config::WindowConfig;
pub use coordinator::{DisplayMode, HeightIndex, ViewportCoordinator, ViewportUpdate};
pub use oracle::LayoutOracle;
pub use store::{BlockStore, MemoryBlockStore};
pub use window::PersistentWindow;

#[cfg(test)]
mod test_harness;
