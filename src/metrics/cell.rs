//! Measurement by Unicode display width.

use super::{FontSpec, MeasurementSurface};
use unicode_width::UnicodeWidthStr;

/// Measures text as `display cells × font size × advance ratio`.
///
/// Wide (CJK) characters count as two cells and zero-width marks as none,
/// so estimates stay reasonable for mixed-script text. Used when no real
/// rendering surface exists: headless hosts, the simulator, tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMeasureSurface {
    /// Average advance of one cell as a fraction of the font size.
    pub advance_ratio: f64,
    /// Extra width factor applied to bold (weight >= 600) text.
    pub bold_factor: f64,
}

impl CellMeasureSurface {
    /// Surface with the given advance ratio and no bold adjustment.
    pub fn new(advance_ratio: f64) -> Self {
        Self {
            advance_ratio,
            bold_factor: 1.0,
        }
    }
}

impl Default for CellMeasureSurface {
    fn default() -> Self {
        Self {
            advance_ratio: 0.5,
            bold_factor: 1.05,
        }
    }
}

impl MeasurementSurface for CellMeasureSurface {
    fn measure(&mut self, text: &str, font: &FontSpec) -> Option<f64> {
        let cells = UnicodeWidthStr::width(text) as f64;
        let weight = if font.weight >= 600 {
            self.bold_factor
        } else {
            1.0
        };
        Some(cells * f64::from(font.size_px) * self.advance_ratio * weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(size: f32, weight: u16) -> FontSpec {
        FontSpec::new("mono", size, weight)
    }

    #[test]
    fn ascii_width_is_cells_times_advance() {
        let mut surface = CellMeasureSurface::new(0.5);
        assert_eq!(surface.measure("abcd", &font(16.0, 400)), Some(32.0));
    }

    #[test]
    fn wide_characters_take_two_cells() {
        let mut surface = CellMeasureSurface::new(0.5);
        assert_eq!(surface.measure("漢", &font(16.0, 400)), Some(16.0));
    }

    #[test]
    fn bold_text_is_wider() {
        let mut surface = CellMeasureSurface::default();
        let regular = surface.measure("word", &font(16.0, 400)).unwrap();
        let bold = surface.measure("word", &font(16.0, 700)).unwrap();
        assert!(bold > regular);
    }
}
