//! Coordinator output types.

use crate::model::BlockRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the Window should treat an emitted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayMode {
    /// Visible blocks are inside the loaded range; fetch the new buffer.
    Smooth,
    /// Visible blocks are outside the loaded range; dim, do not fetch.
    Flyover,
    /// Scrolling stopped; always fetch the resting range.
    Settle,
}

impl DisplayMode {
    /// Whether the Window fetches content for this mode.
    pub fn fetches(self) -> bool {
        !matches!(self, DisplayMode::Flyover)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayMode::Smooth => "smooth",
            DisplayMode::Flyover => "flyover",
            DisplayMode::Settle => "settle",
        };
        f.write_str(name)
    }
}

/// A range-change decision emitted by the coordinator.
///
/// `translate_y` is the document-space offset of `start_block`, where the
/// Window anchors the mounted content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportUpdate {
    /// First block to load (inclusive).
    pub start_block: usize,
    /// Last block to load (exclusive).
    pub end_block: usize,
    /// Display mode for this update.
    pub mode: DisplayMode,
    /// Pixel offset of `start_block`.
    pub translate_y: f64,
}

impl ViewportUpdate {
    /// The block range this update asks for.
    pub fn range(&self) -> BlockRange {
        BlockRange::new(self.start_block, self.end_block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_flyover_skips_fetch() {
        assert!(DisplayMode::Smooth.fetches());
        assert!(DisplayMode::Settle.fetches());
        assert!(!DisplayMode::Flyover.fetches());
    }

    #[test]
    fn update_serializes_camel_case() {
        let update = ViewportUpdate {
            start_block: 400,
            end_block: 700,
            mode: DisplayMode::Smooth,
            translate_y: 11_200.0,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(
            json,
            r#"{"startBlock":400,"endBlock":700,"mode":"smooth","translateY":11200.0}"#
        );
    }

    #[test]
    fn range_matches_bounds() {
        let update = ViewportUpdate {
            start_block: 3,
            end_block: 9,
            mode: DisplayMode::Settle,
            translate_y: 0.0,
        };
        assert_eq!(update.range(), BlockRange::new(3, 9));
    }
}
