//! Block manifests produced by the block store scanner.

use super::identifiers::BlockId;
use serde::{Deserialize, Serialize};

/// Semantic block type, used to pick a height estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    /// Plain paragraph.
    Paragraph,
    /// `#` heading.
    Heading1,
    /// `##` heading.
    Heading2,
    /// `###` heading.
    Heading3,
    /// `####` heading.
    Heading4,
    /// `#####` heading.
    Heading5,
    /// `######` heading.
    Heading6,
    /// Bullet or ordered list (one block per contiguous list).
    List,
    /// `>` quotation.
    Blockquote,
    /// Fenced code block.
    CodeFence,
    /// Pipe table.
    Table,
    /// Thematic break.
    HorizontalRule,
    /// Standalone image.
    Image,
    /// Embedded content resolved by the editing surface.
    Embed,
    /// YAML front matter, never rendered.
    Frontmatter,
}

impl BlockType {
    /// Heading level for heading types.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            BlockType::Heading1 => Some(1),
            BlockType::Heading2 => Some(2),
            BlockType::Heading3 => Some(3),
            BlockType::Heading4 => Some(4),
            BlockType::Heading5 => Some(5),
            BlockType::Heading6 => Some(6),
            _ => None,
        }
    }

    /// Heading type for a level, clamped to 1..=6.
    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => BlockType::Heading1,
            2 => BlockType::Heading2,
            3 => BlockType::Heading3,
            4 => BlockType::Heading4,
            5 => BlockType::Heading5,
            _ => BlockType::Heading6,
        }
    }

    /// Whether the rendered height of this type is independent of container width.
    ///
    /// Code fences overflow horizontally instead of wrapping, rules are
    /// constant and front matter is never shown.
    pub fn is_width_independent(self) -> bool {
        matches!(
            self,
            BlockType::CodeFence | BlockType::HorizontalRule | BlockType::Frontmatter
        )
    }
}

/// Metadata describing one block, without its markdown body.
///
/// Immutable between scans; replaced wholesale when the store re-scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockManifest {
    /// Stable block identifier.
    pub id: BlockId,
    /// Semantic type.
    pub block_type: BlockType,
    /// Raw text of the block, used for wrap estimation.
    #[serde(default)]
    pub text_content: String,
    /// Number of source lines (code fences).
    #[serde(default)]
    pub line_count: u32,
    /// Number of rows (tables).
    #[serde(default)]
    pub row_count: Option<u32>,
    /// Number of columns (tables).
    #[serde(default)]
    pub col_count: Option<u32>,
    /// Height / width ratio (images), when known.
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
    /// Font family overriding the type default.
    #[serde(default)]
    pub font_override: Option<String>,
    /// FNV-1a hash of the block markdown, for change detection across scans.
    #[serde(default)]
    pub content_hash: u64,
}

impl BlockManifest {
    /// Build a manifest from its markdown, filling line count and hash.
    pub fn new(id: BlockId, block_type: BlockType, markdown: &str) -> Self {
        let (row_count, col_count) = if block_type == BlockType::Table {
            let rows = markdown.lines().count() as u32;
            let cols = markdown
                .lines()
                .next()
                .unwrap_or("")
                .chars()
                .filter(|&c| c == '|')
                .count()
                .saturating_sub(1) as u32;
            (Some(rows), Some(cols.max(1)))
        } else {
            (None, None)
        };

        Self {
            id,
            block_type,
            text_content: markdown.to_string(),
            line_count: markdown.lines().count() as u32,
            row_count,
            col_count,
            aspect_ratio: None,
            font_override: None,
            content_hash: fnv1a_hash(markdown),
        }
    }

    /// Set the image aspect ratio hint.
    pub fn with_aspect_ratio(mut self, ratio: f64) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Set the font family override.
    pub fn with_font_override(mut self, family: impl Into<String>) -> Self {
        self.font_override = Some(family.into());
        self
    }
}

/// FNV-1a 64-bit hash, matching the block store's change detection.
pub fn fnv1a_hash(s: &str) -> u64 {
    let mut hash: u64 = 14_695_981_039_346_656_037;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1_099_511_628_211);
    }
    hash
}
