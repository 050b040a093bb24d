//! Typography constants the estimator works from.
//!
//! These mirror the editing surface's stylesheet. When the stylesheet
//! changes, these must change with it or every estimate drifts.

use crate::metrics::FontSpec;
use crate::model::BlockType;

/// Font, line height and vertical margins of a text-flow block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font used for wrap measurement.
    pub font: FontSpec,
    /// Height of one rendered line.
    pub line_height: f64,
    /// Space above the block.
    pub margin_top: f64,
    /// Space below the block.
    pub margin_bottom: f64,
    /// Horizontal indent subtracted from the available width.
    pub indent: f64,
}

impl TextStyle {
    fn new(font: FontSpec, line_height: f64, margin_top: f64, margin_bottom: f64) -> Self {
        Self {
            font,
            line_height,
            margin_top,
            margin_bottom,
            indent: 0.0,
        }
    }

    fn indented(mut self, indent: f64) -> Self {
        self.indent = indent;
        self
    }
}

/// Code fence box model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodeStyle {
    /// Height of one code line.
    pub line_height: f64,
    /// Inner padding, applied top and bottom.
    pub padding: f64,
    /// Border width, applied top and bottom.
    pub border: f64,
    /// Space above the fence.
    pub margin_top: f64,
    /// Space below the fence.
    pub margin_bottom: f64,
}

/// Table box model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStyle {
    /// Fixed height of every row.
    pub row_height: f64,
    /// Space above the table.
    pub margin_top: f64,
    /// Space below the table.
    pub margin_bottom: f64,
}

/// Complete set of per-type constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    /// Paragraphs (and unknown types).
    pub paragraph: TextStyle,
    /// Headings, indexed by level - 1.
    pub headings: [TextStyle; 6],
    /// Lists.
    pub list: TextStyle,
    /// Block quotes.
    pub blockquote: TextStyle,
    /// Code fences.
    pub code: CodeStyle,
    /// Tables.
    pub table: TableStyle,
    /// Thematic break, including its margins.
    pub rule_height: f64,
    /// Image height when the aspect ratio is unknown.
    pub image_placeholder_height: f64,
}

impl Default for Typography {
    fn default() -> Self {
        let body = |size: f32, weight: u16| FontSpec::new("Inter", size, weight);
        Self {
            paragraph: TextStyle::new(body(16.0, 400), 24.0, 0.0, 4.0),
            headings: [
                TextStyle::new(body(32.0, 700), 40.0, 24.0, 12.0),
                TextStyle::new(body(26.0, 700), 34.0, 20.0, 10.0),
                TextStyle::new(body(22.0, 600), 30.0, 18.0, 8.0),
                TextStyle::new(body(19.0, 600), 26.0, 16.0, 8.0),
                TextStyle::new(body(17.0, 600), 24.0, 14.0, 6.0),
                TextStyle::new(body(16.0, 600), 24.0, 12.0, 6.0),
            ],
            list: TextStyle::new(body(16.0, 400), 24.0, 0.0, 8.0).indented(24.0),
            blockquote: TextStyle::new(body(16.0, 400), 24.0, 8.0, 8.0).indented(20.0),
            code: CodeStyle {
                line_height: 20.0,
                padding: 12.0,
                border: 1.0,
                margin_top: 8.0,
                margin_bottom: 8.0,
            },
            table: TableStyle {
                row_height: 36.0,
                margin_top: 8.0,
                margin_bottom: 8.0,
            },
            rule_height: 33.0,
            image_placeholder_height: 200.0,
        }
    }
}

impl Typography {
    /// Text style for a text-flow block type; `None` for metadata-driven types.
    ///
    /// Unknown and embed types render like paragraphs.
    pub fn text_style(&self, block_type: BlockType) -> Option<&TextStyle> {
        match block_type {
            BlockType::Paragraph | BlockType::Embed => Some(&self.paragraph),
            BlockType::List => Some(&self.list),
            BlockType::Blockquote => Some(&self.blockquote),
            other => other
                .heading_level()
                .map(|level| &self.headings[usize::from(level) - 1]),
        }
    }

    /// Same typography with every text style set to `family`.
    pub fn with_font_family(&self, family: &str) -> Self {
        let mut out = self.clone();
        out.paragraph.font = out.paragraph.font.with_family(family);
        out.list.font = out.list.font.with_family(family);
        out.blockquote.font = out.blockquote.font.with_family(family);
        for heading in &mut out.headings {
            heading.font = heading.font.with_family(family);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_paragraph_is_twenty_eight_pixels() {
        let t = Typography::default();
        let p = &t.paragraph;
        assert_eq!(p.line_height + p.margin_top + p.margin_bottom, 28.0);
    }

    #[test]
    fn headings_resolve_by_level() {
        let t = Typography::default();
        let h3 = t.text_style(BlockType::Heading3).unwrap();
        assert_eq!(h3, &t.headings[2]);
    }

    #[test]
    fn metadata_types_have_no_text_style() {
        let t = Typography::default();
        assert!(t.text_style(BlockType::CodeFence).is_none());
        assert!(t.text_style(BlockType::Table).is_none());
        assert!(t.text_style(BlockType::Image).is_none());
    }

    #[test]
    fn embed_uses_paragraph_style() {
        let t = Typography::default();
        assert_eq!(t.text_style(BlockType::Embed), Some(&t.paragraph));
    }

    #[test]
    fn with_font_family_changes_text_styles_only() {
        let t = Typography::default().with_font_family("Georgia");
        assert_eq!(t.paragraph.font.family, "Georgia");
        assert_eq!(t.headings[0].font.family, "Georgia");
        assert_eq!(t.list.font.family, "Georgia");
        assert_eq!(t.code, Typography::default().code);
    }
}
