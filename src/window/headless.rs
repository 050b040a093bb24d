//! Headless surface and container that record what the window does.
//!
//! Used by the simulator and tests in place of a real editor and DOM.

use super::surface::{EditingSurface, ScrollContainer, SetContentOptions};

/// Editing surface that keeps the last content and every replacement.
#[derive(Debug, Default, Clone)]
pub struct HeadlessSurface {
    /// Current content.
    pub content: String,
    /// Every `set_content` call, oldest first.
    pub history: Vec<(String, SetContentOptions)>,
}

impl HeadlessSurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of content replacements so far.
    pub fn replacements(&self) -> usize {
        self.history.len()
    }
}

impl EditingSurface for HeadlessSurface {
    fn set_content(&mut self, markdown: &str, options: SetContentOptions) {
        self.content = markdown.to_string();
        self.history.push((markdown.to_string(), options));
    }
}

/// Scroll container state without a DOM.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HeadlessContainer {
    /// Spacer height (full document height).
    pub spacer_height: f64,
    /// Offset of the mounted content.
    pub anchor_offset: f64,
    /// Whether mounted content is dimmed.
    pub dimmed: bool,
    /// Current scroll position.
    pub scroll_top: f64,
    /// Programmatic scroll writes, oldest first.
    pub scroll_writes: Vec<f64>,
}

impl HeadlessContainer {
    /// Create a container scrolled to the top.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScrollContainer for HeadlessContainer {
    fn set_spacer_height(&mut self, height: f64) {
        self.spacer_height = height;
    }

    fn set_anchor_offset(&mut self, offset: f64) {
        self.anchor_offset = offset;
    }

    fn set_dimmed(&mut self, dimmed: bool) {
        self.dimmed = dimmed;
    }

    fn set_scroll_top(&mut self, scroll_top: f64) {
        self.scroll_top = scroll_top;
        self.scroll_writes.push(scroll_top);
    }
}
