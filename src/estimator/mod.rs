//! Block height estimation.
//!
//! Pure functions from a block manifest, typography and available width to
//! a pixel height. The oracle trusts these numbers until a measurement
//! disproves them, which only works because they are deterministic:
//! identical inputs always produce identical output.

pub mod text_flow;
pub mod typography;

pub use typography::{CodeStyle, TableStyle, TextStyle, Typography};

use crate::metrics::TextMetricsCache;
use crate::model::{BlockManifest, BlockType};
use text_flow::{count_wrapped_lines, strip_markers};

/// Estimate the rendered height of one block.
///
/// Dispatches on [`BlockType`]:
/// - text-flow types wrap their text greedily at `available_width`
/// - code fences, tables, rules, images and front matter use their hints
/// - anything else is estimated as a paragraph
///
/// Falls back to `fallback_height` when text cannot be measured or the
/// result is not a finite non-negative number.
pub fn estimate(
    manifest: &BlockManifest,
    typography: &Typography,
    available_width: f64,
    metrics: &mut TextMetricsCache,
    fallback_height: f64,
) -> f64 {
    let height = match manifest.block_type {
        BlockType::CodeFence => Some(code_fence_height(manifest, typography)),
        BlockType::Table => Some(table_height(manifest, typography)),
        BlockType::HorizontalRule => Some(typography.rule_height),
        BlockType::Image => Some(image_height(manifest, typography, available_width)),
        BlockType::Frontmatter => Some(0.0),
        other => {
            let style = typography
                .text_style(other)
                .unwrap_or(&typography.paragraph);
            text_flow_height(manifest, style, available_width, metrics)
        }
    };

    match height {
        Some(h) if h.is_finite() && h >= 0.0 => h,
        _ => fallback_height,
    }
}

fn text_flow_height(
    manifest: &BlockManifest,
    style: &TextStyle,
    available_width: f64,
    metrics: &mut TextMetricsCache,
) -> Option<f64> {
    let width = available_width - style.indent;
    if !(width > 0.0) {
        return None;
    }

    let font = match &manifest.font_override {
        Some(family) => style.font.with_family(family),
        None => style.font.clone(),
    };
    let text = strip_markers(manifest.block_type, &manifest.text_content);
    let lines = count_wrapped_lines(&text, &font, width, metrics)?;

    Some(f64::from(lines) * style.line_height + style.margin_top + style.margin_bottom)
}

// Code renders with horizontal overflow, so there is no wrapping.
fn code_fence_height(manifest: &BlockManifest, typography: &Typography) -> f64 {
    let code = &typography.code;
    let lines = if manifest.line_count > 0 {
        manifest.line_count
    } else {
        manifest.text_content.lines().count().max(1) as u32
    };
    f64::from(lines) * code.line_height
        + 2.0 * code.padding
        + 2.0 * code.border
        + code.margin_top
        + code.margin_bottom
}

fn table_height(manifest: &BlockManifest, typography: &Typography) -> f64 {
    let table = &typography.table;
    let rows = manifest
        .row_count
        .unwrap_or_else(|| manifest.line_count.max(1));
    f64::from(rows) * table.row_height + table.margin_top + table.margin_bottom
}

fn image_height(manifest: &BlockManifest, typography: &Typography, available_width: f64) -> f64 {
    match manifest.aspect_ratio {
        Some(ratio) if ratio > 0.0 && available_width > 0.0 => ratio * available_width,
        _ => typography.image_placeholder_height,
    }
}
