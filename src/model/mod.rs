//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod error;
pub mod height;
pub mod identifiers;
pub mod manifest;
pub mod range;

// Re-export for convenience
pub use error::{AppError, StoreError, WindowError};
pub use height::{HeightCacheEntry, HeightSource};
pub use identifiers::{BlockId, DocId, InvalidBlockId, InvalidDocId};
pub use manifest::{fnv1a_hash, BlockManifest, BlockType};
pub use range::BlockRange;
