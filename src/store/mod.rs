//! Block store interface.
//!
//! The store owns full document content. The window only ever holds the
//! slice it fetched, and writes user edits back as a window replacement.
//! The store also mirrors measured heights so they survive reopening.

mod memory;

pub use memory::MemoryBlockStore;

use crate::cancel::CancellationToken;
use crate::model::{BlockId, BlockManifest, BlockRange, DocId, HeightCacheEntry, StoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Returned by [`BlockStore::open_document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHandle {
    /// Identifier for all later calls.
    pub doc_id: DocId,
    /// Path the document was opened from.
    pub path: String,
    /// Number of blocks, equal to `blocks.len()`.
    pub total_blocks: usize,
    /// Manifest of every block, in document order.
    pub blocks: Vec<BlockManifest>,
}

/// Markdown for one block, returned by [`BlockStore::get_blocks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockContent {
    /// Block identifier.
    pub id: BlockId,
    /// Block markdown.
    pub markdown: String,
}

/// Replacement of a block range with edited markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEdit {
    /// Blocks being replaced.
    pub range: BlockRange,
    /// New markdown for the whole range; may split or merge blocks.
    pub markdown: String,
}

/// Returned by [`BlockStore::update_visible_window`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowUpdateResult {
    /// Block count after the edit.
    pub new_total_blocks: usize,
    /// Manifest of every block after the edit.
    pub blocks: Vec<BlockManifest>,
}

/// Backend holding full document content.
///
/// Ranges passed in are clamped to the document; an out-of-range request
/// returns fewer blocks, never an error.
pub trait BlockStore {
    /// Open (or reopen) the document at `path`.
    fn open_document(&mut self, path: &Path) -> Result<DocumentHandle, StoreError>;

    /// Markdown for blocks in `range`.
    ///
    /// Implementations may return [`StoreError::Cancelled`] once `cancel`
    /// fires.
    fn get_blocks(
        &mut self,
        doc_id: &DocId,
        range: BlockRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<BlockContent>, StoreError>;

    /// Replace `edit.range` with a re-scan of `edit.markdown`.
    fn update_visible_window(
        &mut self,
        doc_id: &DocId,
        edit: &WindowEdit,
    ) -> Result<WindowUpdateResult, StoreError>;

    /// Persist measured heights.
    fn update_height_cache(
        &mut self,
        doc_id: &DocId,
        entries: &[HeightCacheEntry],
    ) -> Result<(), StoreError>;

    /// Previously persisted heights. Stores without a mirror return nothing.
    fn load_height_cache(&mut self, _doc_id: &DocId) -> Result<Vec<HeightCacheEntry>, StoreError> {
        Ok(Vec::new())
    }

    /// Release the document.
    fn close_document(&mut self, doc_id: &DocId) -> Result<(), StoreError>;
}

/// Join fetched blocks into the markdown mounted in the editing surface.
pub fn reassemble(blocks: &[BlockContent]) -> String {
    blocks
        .iter()
        .map(|b| b.markdown.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
