//! In-memory block store.
//!
//! Documents are registered by path, either from markdown (split at blank
//! lines) or from ready-made manifests. Window edits are re-split the same
//! way and spliced back. The height mirror survives close/reopen.
//!
//! Failure injection and call counters make it the store used by tests,
//! benches and the `pwin` simulator.

use super::{BlockContent, BlockStore, DocumentHandle, WindowEdit, WindowUpdateResult};
use crate::cancel::CancellationToken;
use crate::model::{BlockId, BlockManifest, BlockRange, BlockType, DocId, HeightCacheEntry, StoreError};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug)]
struct StoredDocument {
    path: String,
    blocks: Vec<BlockManifest>,
    open: bool,
}

/// Block store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    documents: HashMap<DocId, StoredDocument>,
    heights: HashMap<DocId, HashMap<BlockId, HeightCacheEntry>>,
    next_id: u64,
    failing_height_writes: u32,
    get_blocks_calls: usize,
}

impl MemoryBlockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register markdown under `path`, splitting it into blocks.
    ///
    /// Replaces any document previously registered there.
    pub fn insert_markdown(&mut self, path: impl AsRef<Path>, markdown: &str) -> Result<DocId, StoreError> {
        let blocks = split_blocks(markdown, true)
            .into_iter()
            .map(|(block_type, text)| BlockManifest::new(self.fresh_id(), block_type, &text))
            .collect();
        self.insert_manifests(path, blocks)
    }

    /// Register ready-made manifests under `path`.
    ///
    /// Each manifest's `text_content` doubles as its markdown.
    pub fn insert_manifests(
        &mut self,
        path: impl AsRef<Path>,
        blocks: Vec<BlockManifest>,
    ) -> Result<DocId, StoreError> {
        let path = path.as_ref();
        let doc_id = doc_id_for(path)?;
        self.documents.insert(
            doc_id.clone(),
            StoredDocument {
                path: doc_id.as_str().to_string(),
                blocks,
                open: false,
            },
        );
        Ok(doc_id)
    }

    /// Make the next `count` height-cache writes fail.
    pub fn fail_height_writes(&mut self, count: u32) {
        self.failing_height_writes = count;
    }

    /// Number of `get_blocks` calls served so far.
    pub fn get_blocks_calls(&self) -> usize {
        self.get_blocks_calls
    }

    /// Whether `doc_id` is currently open.
    pub fn is_open(&self, doc_id: &DocId) -> bool {
        self.documents.get(doc_id).is_some_and(|doc| doc.open)
    }

    /// Heights persisted for `doc_id`, ordered by block id.
    pub fn persisted_heights(&self, doc_id: &DocId) -> Vec<HeightCacheEntry> {
        let mut entries: Vec<_> = self
            .heights
            .get(doc_id)
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.block_id.cmp(&b.block_id));
        entries
    }

    /// Full markdown of a registered document.
    pub fn document_markdown(&self, doc_id: &DocId) -> Option<String> {
        self.documents.get(doc_id).map(|doc| {
            doc.blocks
                .iter()
                .map(|b| b.text_content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        })
    }

    fn fresh_id(&mut self) -> BlockId {
        let id = BlockId::sequential(self.next_id);
        self.next_id += 1;
        id
    }

    fn open_doc_mut(&mut self, doc_id: &DocId) -> Result<&mut StoredDocument, StoreError> {
        self.documents
            .get_mut(doc_id)
            .filter(|doc| doc.open)
            .ok_or_else(|| StoreError::DocumentNotFound {
                doc_id: doc_id.clone(),
            })
    }
}

impl BlockStore for MemoryBlockStore {
    fn open_document(&mut self, path: &Path) -> Result<DocumentHandle, StoreError> {
        let doc_id = doc_id_for(path)?;
        let doc = self
            .documents
            .get_mut(&doc_id)
            .ok_or_else(|| StoreError::PathNotFound {
                path: path.display().to_string(),
            })?;
        doc.open = true;

        info!(doc_id = %doc_id, blocks = doc.blocks.len(), "Opened document");
        Ok(DocumentHandle {
            doc_id,
            path: doc.path.clone(),
            total_blocks: doc.blocks.len(),
            blocks: doc.blocks.clone(),
        })
    }

    fn get_blocks(
        &mut self,
        doc_id: &DocId,
        range: BlockRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<BlockContent>, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        self.get_blocks_calls += 1;

        let doc = self.open_doc_mut(doc_id)?;
        let range = range.clamp_to(doc.blocks.len());
        Ok(doc.blocks[range.indices()]
            .iter()
            .map(|b| BlockContent {
                id: b.id.clone(),
                markdown: b.text_content.clone(),
            })
            .collect())
    }

    fn update_visible_window(
        &mut self,
        doc_id: &DocId,
        edit: &WindowEdit,
    ) -> Result<WindowUpdateResult, StoreError> {
        let split = split_blocks(&edit.markdown, false);
        let mut next_id = self.next_id;
        let doc = self.open_doc_mut(doc_id)?;
        let range = edit.range.clamp_to(doc.blocks.len());

        // Unchanged blocks keep their ids so measured heights stay valid
        let old = &doc.blocks[range.indices()];
        let mut cursor = 0;
        let replacement: Vec<BlockManifest> = split
            .into_iter()
            .map(|(block_type, text)| {
                let reused = old[cursor..]
                    .iter()
                    .position(|b| b.text_content == text && b.block_type == block_type);
                match reused {
                    Some(offset) => {
                        let block = old[cursor + offset].clone();
                        cursor += offset + 1;
                        block
                    }
                    None => {
                        let id = BlockId::sequential(next_id);
                        next_id += 1;
                        BlockManifest::new(id, block_type, &text)
                    }
                }
            })
            .collect();

        doc.blocks.splice(range.indices(), replacement);
        let result = WindowUpdateResult {
            new_total_blocks: doc.blocks.len(),
            blocks: doc.blocks.clone(),
        };
        self.next_id = next_id;

        info!(
            doc_id = %doc_id,
            range = %range,
            total_blocks = result.new_total_blocks,
            "Window updated"
        );
        Ok(result)
    }

    fn update_height_cache(
        &mut self,
        doc_id: &DocId,
        entries: &[HeightCacheEntry],
    ) -> Result<(), StoreError> {
        if !self.documents.contains_key(doc_id) {
            return Err(StoreError::DocumentNotFound {
                doc_id: doc_id.clone(),
            });
        }
        if self.failing_height_writes > 0 {
            self.failing_height_writes -= 1;
            return Err(StoreError::Backend("height cache write failed".to_string()));
        }

        let mirror = self.heights.entry(doc_id.clone()).or_default();
        for entry in entries {
            mirror.insert(entry.block_id.clone(), entry.clone());
        }
        debug!(doc_id = %doc_id, count = entries.len(), "Persisted heights");
        Ok(())
    }

    fn load_height_cache(&mut self, doc_id: &DocId) -> Result<Vec<HeightCacheEntry>, StoreError> {
        Ok(self.persisted_heights(doc_id))
    }

    fn close_document(&mut self, doc_id: &DocId) -> Result<(), StoreError> {
        if let Some(doc) = self.documents.get_mut(doc_id) {
            doc.open = false;
        }
        info!(doc_id = %doc_id, "Closed document");
        Ok(())
    }
}

fn doc_id_for(path: &Path) -> Result<DocId, StoreError> {
    DocId::from_path(path).map_err(|_| StoreError::PathNotFound {
        path: path.display().to_string(),
    })
}

/// Split markdown into blocks at blank lines, keeping fenced code intact.
fn split_blocks(markdown: &str, document_start: bool) -> Vec<(BlockType, String)> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }
        if line.trim().is_empty() && !in_fence {
            push_block(&mut current, &mut blocks, document_start);
        } else {
            current.push(line);
        }
    }
    push_block(&mut current, &mut blocks, document_start);
    blocks
}

fn push_block(current: &mut Vec<&str>, blocks: &mut Vec<(BlockType, String)>, document_start: bool) {
    if current.is_empty() {
        return;
    }
    let text = current.join("\n");
    let at_start = document_start && blocks.is_empty();
    blocks.push((classify(&text, at_start), text));
    current.clear();
}

/// Block type from the first line. Only what height estimation needs.
fn classify(text: &str, at_document_start: bool) -> BlockType {
    let first = text.lines().next().unwrap_or("").trim_start();
    let multi_line = text.contains('\n');

    if at_document_start && first.trim_end() == "---" && multi_line {
        return BlockType::Frontmatter;
    }
    if first.starts_with("```") || first.starts_with("~~~") {
        return BlockType::CodeFence;
    }
    if first.starts_with('#') {
        let level = first.chars().take_while(|&c| c == '#').count();
        let rest = &first[level..];
        if level <= 6 && (rest.is_empty() || rest.starts_with(' ')) {
            return BlockType::heading(level as u8);
        }
        return BlockType::Paragraph;
    }
    if first.starts_with('>') {
        return BlockType::Blockquote;
    }
    if first.starts_with('|') {
        return BlockType::Table;
    }
    if matches!(first.trim_end(), "---" | "***" | "___") {
        return BlockType::HorizontalRule;
    }
    if first.starts_with("![") {
        return BlockType::Image;
    }
    if is_list_item(first) {
        return BlockType::List;
    }
    BlockType::Paragraph
}

fn is_list_item(line: &str) -> bool {
    if ["- ", "* ", "+ "].iter().any(|b| line.starts_with(b)) {
        return true;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && (line[digits..].starts_with(". ") || line[digits..].starts_with(") "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Title\n\nFirst paragraph.\n\n- one\n- two\n\n```rust\nfn main() {}\n\nlet x = 1;\n```\n\n| a | b |\n|---|---|\n| 1 | 2 |";

    fn open(store: &mut MemoryBlockStore, markdown: &str) -> DocumentHandle {
        store.insert_markdown("notes/doc.md", markdown).unwrap();
        store.open_document(Path::new("notes/doc.md")).unwrap()
    }

    fn types(handle: &DocumentHandle) -> Vec<BlockType> {
        handle.blocks.iter().map(|b| b.block_type).collect()
    }

    #[test]
    fn open_splits_at_blank_lines() {
        let mut store = MemoryBlockStore::new();
        let handle = open(&mut store, DOC);
        assert_eq!(handle.total_blocks, 5);
        assert_eq!(
            types(&handle),
            vec![
                BlockType::Heading1,
                BlockType::Paragraph,
                BlockType::List,
                BlockType::CodeFence,
                BlockType::Table,
            ]
        );
    }

    #[test]
    fn fenced_code_keeps_blank_lines() {
        let mut store = MemoryBlockStore::new();
        let handle = open(&mut store, DOC);
        assert_eq!(handle.blocks[3].line_count, 5);
        assert_eq!(handle.blocks[4].row_count, Some(3));
    }

    #[test]
    fn front_matter_only_at_document_start() {
        let mut store = MemoryBlockStore::new();
        let handle = open(&mut store, "---\ntitle: x\n---\n\nBody\n\n---");
        assert_eq!(
            types(&handle),
            vec![BlockType::Frontmatter, BlockType::Paragraph, BlockType::HorizontalRule]
        );
    }

    #[test]
    fn unknown_path_is_not_found() {
        let mut store = MemoryBlockStore::new();
        let err = store.open_document(Path::new("missing.md")).unwrap_err();
        assert!(matches!(err, StoreError::PathNotFound { .. }));
    }

    #[test]
    fn get_blocks_clamps_range() {
        let mut store = MemoryBlockStore::new();
        let handle = open(&mut store, DOC);
        let blocks = store
            .get_blocks(&handle.doc_id, BlockRange::new(3, 50), &CancellationToken::new())
            .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].id, handle.blocks[3].id);
        assert_eq!(store.get_blocks_calls(), 1);
    }

    #[test]
    fn get_blocks_honors_cancellation() {
        let mut store = MemoryBlockStore::new();
        let handle = open(&mut store, DOC);
        let token = CancellationToken::new();
        token.cancel();
        let err = store
            .get_blocks(&handle.doc_id, BlockRange::new(0, 2), &token)
            .unwrap_err();
        assert_eq!(err, StoreError::Cancelled);
        assert_eq!(store.get_blocks_calls(), 0);
    }

    #[test]
    fn closed_document_rejects_reads() {
        let mut store = MemoryBlockStore::new();
        let handle = open(&mut store, DOC);
        store.close_document(&handle.doc_id).unwrap();
        assert!(!store.is_open(&handle.doc_id));
        let err = store
            .get_blocks(&handle.doc_id, BlockRange::new(0, 1), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound { .. }));
    }

    #[test]
    fn window_edit_splits_and_reuses_unchanged_ids() {
        let mut store = MemoryBlockStore::new();
        let handle = open(&mut store, "Alpha\n\nBeta\n\nGamma");
        let edit = WindowEdit {
            range: BlockRange::new(0, 2),
            markdown: "Alpha\n\nInserted\n\nBeta".to_string(),
        };
        let result = store.update_visible_window(&handle.doc_id, &edit).unwrap();

        assert_eq!(result.new_total_blocks, 4);
        assert_eq!(result.blocks[0].id, handle.blocks[0].id);
        assert_eq!(result.blocks[2].id, handle.blocks[1].id);
        assert_eq!(result.blocks[3].id, handle.blocks[2].id);
        assert!(handle.blocks.iter().all(|b| b.id != result.blocks[1].id));
        assert_eq!(
            store.document_markdown(&handle.doc_id).unwrap(),
            "Alpha\n\nInserted\n\nBeta\n\nGamma"
        );
    }

    #[test]
    fn window_edit_merging_blocks_shrinks_document() {
        let mut store = MemoryBlockStore::new();
        let handle = open(&mut store, "Alpha\n\nBeta\n\nGamma");
        let edit = WindowEdit {
            range: BlockRange::new(0, 2),
            markdown: "Alpha Beta".to_string(),
        };
        let result = store.update_visible_window(&handle.doc_id, &edit).unwrap();
        assert_eq!(result.new_total_blocks, 2);
        assert_eq!(result.blocks[1].id, handle.blocks[2].id);
    }

    #[test]
    fn height_mirror_survives_reopen() {
        let mut store = MemoryBlockStore::new();
        let handle = open(&mut store, DOC);
        let entry = HeightCacheEntry::dom(handle.blocks[0].id.clone(), 45.0);
        store
            .update_height_cache(&handle.doc_id, std::slice::from_ref(&entry))
            .unwrap();
        store.close_document(&handle.doc_id).unwrap();

        let reopened = store.open_document(Path::new("notes/doc.md")).unwrap();
        let loaded = store.load_height_cache(&reopened.doc_id).unwrap();
        assert_eq!(loaded, vec![entry]);
    }

    #[test]
    fn injected_failures_are_consumed() {
        let mut store = MemoryBlockStore::new();
        let handle = open(&mut store, DOC);
        let entry = HeightCacheEntry::dom(handle.blocks[0].id.clone(), 45.0);
        store.fail_height_writes(2);

        assert!(store.update_height_cache(&handle.doc_id, &[entry.clone()]).is_err());
        assert!(store.update_height_cache(&handle.doc_id, &[entry.clone()]).is_err());
        assert!(store.update_height_cache(&handle.doc_id, &[entry]).is_ok());
        assert_eq!(store.persisted_heights(&handle.doc_id).len(), 1);
    }

    #[test]
    fn classify_recognises_headings_and_lists() {
        assert_eq!(classify("### Third", false), BlockType::Heading3);
        assert_eq!(classify("#hashtag", false), BlockType::Paragraph);
        assert_eq!(classify("12. item", false), BlockType::List);
        assert_eq!(classify("> quote", false), BlockType::Blockquote);
        assert_eq!(classify("![alt](a.png)", false), BlockType::Image);
    }
}
