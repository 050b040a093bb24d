//! Text metrics cache.
//!
//! Width lookups happen for every word of every block the estimator sees,
//! so single characters are cached per `(font, char)`. Longer strings are
//! measured directly: their key space is unbounded and caching them would
//! only grow memory.

pub mod cell;

pub use cell::CellMeasureSurface;

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::debug;

/// Characters measured by [`TextMetricsCache::prewarm`].
const COMMON_CHARSET: &str =
    " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// A font as the measurement surface understands it.
#[derive(Debug, Clone)]
pub struct FontSpec {
    /// Family name (e.g. "Inter", "monospace").
    pub family: String,
    /// Size in CSS pixels.
    pub size_px: f32,
    /// CSS weight (400 regular, 700 bold).
    pub weight: u16,
}

impl FontSpec {
    /// Build a font spec.
    pub fn new(family: impl Into<String>, size_px: f32, weight: u16) -> Self {
        Self {
            family: family.into(),
            size_px,
            weight,
        }
    }

    /// Same font with a different family.
    pub fn with_family(&self, family: &str) -> Self {
        Self {
            family: family.to_string(),
            ..self.clone()
        }
    }
}

// Size compares by bit pattern so fonts can key a HashMap.
impl PartialEq for FontSpec {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
            && self.size_px.to_bits() == other.size_px.to_bits()
            && self.weight == other.weight
    }
}

impl Eq for FontSpec {}

impl Hash for FontSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.size_px.to_bits().hash(state);
        self.weight.hash(state);
    }
}

/// Off-screen surface able to measure rendered text width.
///
/// Returns `None` when measurement is impossible (surface torn down, font
/// not loaded). Callers fall back to fixed heights instead of failing.
pub trait MeasurementSurface {
    /// Width of `text` rendered in `font`, in pixels.
    fn measure(&mut self, text: &str, font: &FontSpec) -> Option<f64>;
}

/// Shared width cache backed by one measurement surface.
pub struct TextMetricsCache {
    surface: Option<Box<dyn MeasurementSurface>>,
    glyphs: HashMap<FontSpec, HashMap<char, f64>>,
}

impl TextMetricsCache {
    /// Cache backed by `surface`.
    pub fn new(surface: Box<dyn MeasurementSurface>) -> Self {
        Self {
            surface: Some(surface),
            glyphs: HashMap::new(),
        }
    }

    /// Cache with no surface; every lookup returns `None`.
    pub fn unavailable() -> Self {
        Self {
            surface: None,
            glyphs: HashMap::new(),
        }
    }

    /// Whether a measurement surface is attached.
    pub fn is_available(&self) -> bool {
        self.surface.is_some()
    }

    /// Width of `text` in `font`.
    ///
    /// Single characters hit the per-font cache; anything longer is measured
    /// directly. The empty string is zero wide without touching the surface.
    pub fn width_of(&mut self, text: &str, font: &FontSpec) -> Option<f64> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Some(0.0),
            (Some(c), None) => self.char_width(c, font),
            _ => self.surface.as_mut()?.measure(text, font),
        }
    }

    /// Measure the common character set for `font` ahead of time.
    pub fn prewarm(&mut self, font: &FontSpec) {
        if self.surface.is_none() {
            return;
        }
        for c in COMMON_CHARSET.chars() {
            let _ = self.char_width(c, font);
        }
        debug!(
            family = %font.family,
            size = font.size_px,
            glyphs = self.glyphs.get(font).map_or(0, HashMap::len),
            "Prewarmed glyph widths"
        );
    }

    /// Number of cached `(font, char)` widths.
    pub fn cached_glyphs(&self) -> usize {
        self.glyphs.values().map(HashMap::len).sum()
    }

    /// Drop all cached widths (e.g. after a font finished loading).
    pub fn clear(&mut self) {
        self.glyphs.clear();
    }

    fn char_width(&mut self, c: char, font: &FontSpec) -> Option<f64> {
        if let Some(width) = self.glyphs.get(font).and_then(|g| g.get(&c)) {
            return Some(*width);
        }
        let mut buf = [0u8; 4];
        let width = self.surface.as_mut()?.measure(c.encode_utf8(&mut buf), font)?;
        self.glyphs
            .entry(font.clone())
            .or_default()
            .insert(c, width);
        Some(width)
    }
}

impl fmt::Debug for TextMetricsCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextMetricsCache")
            .field("available", &self.is_available())
            .field("cached_glyphs", &self.cached_glyphs())
            .finish()
    }
}
