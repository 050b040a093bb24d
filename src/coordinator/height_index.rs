//! HeightIndex - O(log n) cumulative offsets and offset lookup via Fenwick tree
//!
//! Block heights are fractional pixels. They are stored as fixed-point
//! sub-pixel units so prefix sums are exact and never drift with the order
//! of updates.
//!
//! # Complexity
//!
//! - `from_heights`: O(n log n)
//! - `set`: O(log n)
//! - `cumulative`: O(log n)
//! - `locate`: O(log n)
//! - `total`: O(1)
//! - `height`: O(1)

/// Sub-pixel units per pixel.
pub const UNITS_PER_PX: i64 = 64;

fn to_units(px: f64) -> i64 {
    if px.is_finite() && px > 0.0 {
        (px * UNITS_PER_PX as f64).round() as i64
    } else {
        0
    }
}

fn to_px(units: i64) -> f64 {
    units as f64 / UNITS_PER_PX as f64
}

/// Cumulative block offsets for one document.
///
/// `cumulative(i)` is the document-space Y of block `i`'s top edge, i.e.
/// the sum of heights of blocks `[0, i)`.
#[derive(Debug, Clone, Default)]
pub struct HeightIndex {
    /// Fenwick tree backing storage, exactly one slot per block
    tree: Vec<i64>,
    /// Per-block heights in units, for O(1) deltas on `set`
    heights: Vec<i64>,
    /// Sum of all heights in units
    total: i64,
}

impl HeightIndex {
    /// Builds an index from per-block pixel heights.
    ///
    /// Negative or non-finite heights are stored as zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use persistent_window::coordinator::HeightIndex;
    /// let index = HeightIndex::from_heights(&[10.0, 20.0, 15.0]);
    /// assert_eq!(index.len(), 3);
    /// assert_eq!(index.cumulative(2), 30.0);
    /// assert_eq!(index.total(), 45.0);
    /// ```
    pub fn from_heights(heights: &[f64]) -> Self {
        let heights: Vec<i64> = heights.iter().copied().map(to_units).collect();
        let mut tree = vec![0i64; heights.len()];
        for (i, &h) in heights.iter().enumerate() {
            if h != 0 {
                fenwick::array::update(&mut tree, i, h);
            }
        }
        let total = heights.iter().sum();
        Self {
            tree,
            heights,
            total,
        }
    }

    /// Sets the height of block `index`.
    ///
    /// Returns `false` (and changes nothing) when `index` is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// # use persistent_window::coordinator::HeightIndex;
    /// let mut index = HeightIndex::from_heights(&[3.0, 4.0, 5.0]);
    /// assert!(index.set(1, 10.0));
    /// assert_eq!(index.cumulative(2), 13.0);
    /// assert!(!index.set(3, 1.0));
    /// ```
    pub fn set(&mut self, index: usize, height: f64) -> bool {
        let Some(current) = self.heights.get(index).copied() else {
            return false;
        };

        let next = to_units(height);
        let delta = next - current;
        if delta != 0 {
            fenwick::array::update(&mut self.tree, index, delta);
            self.heights[index] = next;
            self.total += delta;
        }
        true
    }

    /// Height of block `index` in pixels, `None` when out of range.
    pub fn height(&self, index: usize) -> Option<f64> {
        self.heights.get(index).copied().map(to_px)
    }

    /// Sum of heights of blocks `[0, index)` in pixels.
    ///
    /// `index` is clamped to `len()`, so `cumulative(len())` equals `total()`.
    pub fn cumulative(&self, index: usize) -> f64 {
        to_px(self.cumulative_units(index))
    }

    fn cumulative_units(&self, index: usize) -> i64 {
        let index = index.min(self.len());
        if index == 0 {
            0
        } else if index == self.len() {
            self.total
        } else {
            fenwick::array::prefix_sum(&self.tree, index - 1)
        }
    }

    /// Finds the block containing the document-space `offset`.
    ///
    /// Returns the `i` with `cumulative(i) <= offset < cumulative(i + 1)`.
    /// Zero-height blocks never contain an offset. Offsets below zero map
    /// to the first block; offsets at or past `total()` map to the last.
    /// Returns `None` only for an empty index.
    ///
    /// # Examples
    ///
    /// ```
    /// # use persistent_window::coordinator::HeightIndex;
    /// let index = HeightIndex::from_heights(&[10.0, 20.0, 15.0]);
    /// assert_eq!(index.locate(0.0), Some(0));
    /// assert_eq!(index.locate(10.0), Some(1));
    /// assert_eq!(index.locate(29.9), Some(1));
    /// assert_eq!(index.locate(30.0), Some(2));
    /// assert_eq!(index.locate(1000.0), Some(2));
    /// ```
    pub fn locate(&self, offset: f64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }

        let len = self.len();
        let mut remaining = to_units(offset);
        // Top-down descent: `pos` blocks fit entirely at or above the offset
        let mut pos = 0;
        let mut step = 1usize << len.ilog2();
        while step > 0 {
            let next = pos + step;
            if next <= len && self.tree[next - 1] <= remaining {
                pos = next;
                remaining -= self.tree[next - 1];
            }
            step >>= 1;
        }

        Some(pos.min(len - 1))
    }

    /// Total height of all blocks in pixels.
    pub fn total(&self) -> f64 {
        to_px(self.total)
    }

    /// Number of blocks in the index.
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Returns true if the index contains no blocks.
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Per-block heights in pixels, in document order.
    pub fn heights(&self) -> Vec<f64> {
        self.heights.iter().copied().map(to_px).collect()
    }
}
