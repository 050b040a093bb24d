//! Half-open block index ranges.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open range `[start_block, end_block)` of block indices.
///
/// Used both for the range the coordinator wants loaded and for the range
/// actually materialized in the editing surface.
///
/// # Invariants
/// - `start_block <= end_block`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawBlockRange")]
pub struct BlockRange {
    /// First block (inclusive).
    pub start_block: usize,
    /// Last block (exclusive).
    pub end_block: usize,
}

/// Wire form, normalized through [`BlockRange::new`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlockRange {
    start_block: usize,
    end_block: usize,
}

impl From<RawBlockRange> for BlockRange {
    fn from(raw: RawBlockRange) -> Self {
        Self::new(raw.start_block, raw.end_block)
    }
}

impl BlockRange {
    /// Create a new range. An inverted range collapses to empty at `start`.
    pub fn new(start_block: usize, end_block: usize) -> Self {
        Self {
            start_block,
            end_block: end_block.max(start_block),
        }
    }

    /// Number of blocks in the range.
    pub fn len(&self) -> usize {
        self.end_block.saturating_sub(self.start_block)
    }

    /// Check if range is empty.
    pub fn is_empty(&self) -> bool {
        self.start_block == self.end_block
    }

    /// Iterate over block indices in the range.
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start_block..self.end_block
    }

    /// Check if a specific block index is inside the range.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_block && index < self.end_block
    }

    /// Check if `other` lies entirely inside this range.
    pub fn covers(&self, other: BlockRange) -> bool {
        other.start_block >= self.start_block && other.end_block <= self.end_block
    }

    /// Clamp both ends to `count` blocks.
    pub fn clamp_to(&self, count: usize) -> Self {
        Self::new(self.start_block.min(count), self.end_block.min(count))
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_block, self.end_block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn new_creates_range_with_given_values() {
            let range = BlockRange::new(5, 10);
            assert_eq!(range.start_block, 5);
            assert_eq!(range.end_block, 10);
        }

        #[test]
        fn inverted_range_collapses_to_empty() {
            let range = BlockRange::new(10, 5);
            assert_eq!(range, BlockRange::new(10, 10));
            assert!(range.is_empty());
        }

        #[test]
        fn default_creates_empty_range_at_zero() {
            let range = BlockRange::default();
            assert_eq!(range.start_block, 0);
            assert!(range.is_empty());
        }
    }

    mod length_and_contains {
        use super::*;

        #[test]
        fn len_returns_difference_between_indices() {
            assert_eq!(BlockRange::new(5, 10).len(), 5);
        }

        #[test]
        fn contains_is_half_open() {
            let range = BlockRange::new(5, 10);
            assert!(range.contains(5));
            assert!(range.contains(9));
            assert!(!range.contains(10));
            assert!(!range.contains(4));
        }

        #[test]
        fn indices_iterates_from_start_to_end_exclusive() {
            let indices: Vec<_> = BlockRange::new(5, 8).indices().collect();
            assert_eq!(indices, vec![5, 6, 7]);
        }

        #[test]
        fn covers_requires_full_containment() {
            let loaded = BlockRange::new(100, 400);
            assert!(loaded.covers(BlockRange::new(100, 400)));
            assert!(loaded.covers(BlockRange::new(150, 200)));
            assert!(!loaded.covers(BlockRange::new(390, 410)));
            assert!(!loaded.covers(BlockRange::new(90, 110)));
        }
    }

    #[test]
    fn clamp_to_limits_both_ends() {
        assert_eq!(BlockRange::new(250, 600).clamp_to(300), BlockRange::new(250, 300));
        assert_eq!(BlockRange::new(400, 600).clamp_to(300), BlockRange::new(300, 300));
    }

    #[test]
    fn display_uses_interval_notation() {
        assert_eq!(BlockRange::new(0, 300).to_string(), "[0, 300)");
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(BlockRange::new(1, 2)).unwrap();
        assert_eq!(json["startBlock"], 1);
        assert_eq!(json["endBlock"], 2);
    }

    #[test]
    fn inverted_wire_range_collapses_to_empty() {
        let range: BlockRange =
            serde_json::from_str(r#"{"startBlock": 9, "endBlock": 3}"#).unwrap();
        assert_eq!(range, BlockRange::new(9, 9));
        assert_eq!(range.len(), 0);
        assert!(range.is_empty());
    }

    #[test]
    fn len_of_hand_built_inverted_range_is_zero() {
        let range = BlockRange {
            start_block: 9,
            end_block: 3,
        };
        assert_eq!(range.len(), 0);
    }
}
