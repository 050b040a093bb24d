//! Core identifier newtypes with smart constructors.
//!
//! All identifiers validate non-empty strings at construction time.
//! Raw constructors are never exported - use smart constructors only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a block, assigned by the block store scanner.
///
/// Survives re-scans for blocks whose content did not move, which is what
/// lets measured heights outlive a structural edit elsewhere in the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockId(String);

impl BlockId {
    /// Smart constructor: validates non-empty block ID
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidBlockId> {
        let raw = raw.into();
        if raw.is_empty() {
            Err(InvalidBlockId::Empty)
        } else {
            Ok(Self(raw))
        }
    }

    /// Sequential identifier (`b<n>`) as assigned by a scanner.
    pub fn sequential(n: u64) -> Self {
        Self(format!("b{n}"))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BlockId {
    type Error = InvalidBlockId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BlockId> for String {
    fn from(id: BlockId) -> Self {
        id.0
    }
}

/// Document identifier handed out by the block store on open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocId(String);

impl DocId {
    /// Smart constructor: validates non-empty document ID
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidDocId> {
        let raw = raw.into();
        if raw.is_empty() {
            Err(InvalidDocId::Empty)
        } else {
            Ok(Self(raw))
        }
    }

    /// Derive a document ID from a path, normalising separators.
    pub fn from_path(path: &std::path::Path) -> Result<Self, InvalidDocId> {
        Self::new(path.to_string_lossy().replace('\\', "/"))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocId {
    type Error = InvalidDocId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocId> for String {
    fn from(id: DocId) -> Self {
        id.0
    }
}

// ===== Error Types =====

/// Rejected block identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidBlockId {
    /// Identifier was the empty string.
    #[error("Block ID cannot be empty")]
    Empty,
}

/// Rejected document identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDocId {
    /// Identifier was the empty string.
    #[error("Document ID cannot be empty")]
    Empty,
}

// ===== Tests =====
