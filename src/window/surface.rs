//! Host-side collaborators of the window.
//!
//! The window never renders anything itself. It drives an editing surface
//! (rich-text editor holding the loaded slice) and a scroll container
//! (native scrolling element sized to the full document).

use serde::{Deserialize, Serialize};

/// Tag attached to a content transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionTag {
    /// Content swapped in by the window; not a user edit.
    ViewportShift,
    /// Any other host-defined tag.
    Other(String),
}

/// Options for [`EditingSurface::set_content`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetContentOptions {
    /// Whether the replacement is recorded in undo history.
    pub add_to_history: bool,
    /// Tag carried by the resulting change notification.
    pub tag: Option<TransactionTag>,
}

impl SetContentOptions {
    /// Non-undoable replacement tagged as a viewport shift.
    pub fn viewport_shift() -> Self {
        Self {
            add_to_history: false,
            tag: Some(TransactionTag::ViewportShift),
        }
    }
}

/// Rich-text surface holding the loaded slice of the document.
pub trait EditingSurface {
    /// Replace the whole content.
    fn set_content(&mut self, markdown: &str, options: SetContentOptions);
}

/// Change notification forwarded by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceChange {
    /// Tags of the transaction that caused the change.
    #[serde(default)]
    pub tags: Vec<TransactionTag>,
    /// Surface content after the change.
    pub markdown: String,
}

impl SurfaceChange {
    /// A change made by the user (no tags).
    pub fn user(markdown: impl Into<String>) -> Self {
        Self {
            tags: Vec::new(),
            markdown: markdown.into(),
        }
    }

    /// True when the change came from a window content swap.
    pub fn is_viewport_shift(&self) -> bool {
        self.tags.contains(&TransactionTag::ViewportShift)
    }
}

/// Native scrolling element.
///
/// The spacer gives the scrollbar the full document height; the mounted
/// content is positioned at the anchor offset inside it.
pub trait ScrollContainer {
    /// Resize the spacer to the full document height.
    fn set_spacer_height(&mut self, height: f64);
    /// Move the mounted content to `offset` in document space.
    fn set_anchor_offset(&mut self, offset: f64);
    /// Dim or undim the mounted content.
    fn set_dimmed(&mut self, dimmed: bool);
    /// Programmatic scroll. The host will echo this as a scroll event.
    fn set_scroll_top(&mut self, scroll_top: f64);
}
