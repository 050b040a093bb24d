//! Greedy word-wrap line counting.

use crate::metrics::{FontSpec, TextMetricsCache};
use crate::model::BlockType;

/// Count rendered lines for `text` wrapped into `available_width`.
///
/// Each physical line (split on `\n`) wraps greedily: words accumulate until
/// the next one would overflow. A word wider than the whole line takes
/// `ceil(word / available)` lines on its own. Blank physical lines count as
/// one line. The result is at least 1.
///
/// Returns `None` when a width could not be measured.
pub fn count_wrapped_lines(
    text: &str,
    font: &FontSpec,
    available_width: f64,
    metrics: &mut TextMetricsCache,
) -> Option<u32> {
    let space = metrics.width_of(" ", font)?;
    let mut total = 0u32;

    for physical in text.split('\n') {
        let mut lines = 0u32;
        let mut current = 0.0f64;
        let mut saw_word = false;

        for word in physical.split_whitespace() {
            saw_word = true;
            let width = metrics.width_of(word, font)?;

            if width > available_width {
                if current > 0.0 {
                    lines += 1;
                }
                lines += (width / available_width).ceil() as u32;
                current = 0.0;
                continue;
            }

            let needed = if current > 0.0 {
                current + space + width
            } else {
                width
            };
            if needed > available_width {
                lines += 1;
                current = width;
            } else {
                current = needed;
            }
        }

        if current > 0.0 || !saw_word {
            lines += 1;
        }
        total += lines;
    }

    Some(total.max(1))
}

/// Strip the markdown markers that render as decoration, not text.
///
/// Heading hashes, quote chevrons and list bullets would otherwise be
/// counted as words. Only the leading marker of each line is removed.
pub fn strip_markers(block_type: BlockType, text: &str) -> String {
    text.split('\n')
        .map(|line| strip_line_marker(block_type, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_line_marker(block_type: BlockType, line: &str) -> &str {
    let trimmed = line.trim_start();
    match block_type {
        t if t.heading_level().is_some() => trimmed.trim_start_matches('#').trim_start(),
        BlockType::Blockquote => trimmed.trim_start_matches('>').trim_start(),
        BlockType::List => strip_list_bullet(trimmed),
        _ => line,
    }
}

fn strip_list_bullet(line: &str) -> &str {
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest;
        }
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest;
        }
    }
    line
}
