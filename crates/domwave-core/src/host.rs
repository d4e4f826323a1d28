#![forbid(unsafe_code)]

//! Host abstractions over a live (or in-memory) document.
//!
//! Two seams:
//! - [`GridHost`] is the node-level surface the grid applier drives. Nodes
//!   are opaque handles, so the applier never builds selector strings for
//!   rows or cells.
//! - [`DocumentHost`] is the selector-level shim surface exported to the host
//!   program. Every operation treats an unresolvable selector as harmless:
//!   reads return a default and writes do nothing.

use thiserror::Error;

/// A host DOM call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host operation `{operation}` failed: {message}")]
pub struct HostError {
    pub operation: &'static str,
    pub message: String,
}

impl HostError {
    #[must_use]
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Where adjacent markup lands relative to a target element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Before the element, as a previous sibling.
    BeforeBegin,
    /// Inside the element, before its first child.
    AfterBegin,
    /// Inside the element, after its last child.
    BeforeEnd,
    /// After the element, as a next sibling.
    AfterEnd,
}

impl InsertPosition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeBegin => "beforebegin",
            Self::AfterBegin => "afterbegin",
            Self::BeforeEnd => "beforeend",
            Self::AfterEnd => "afterend",
        }
    }

    /// Parse a position keyword, ignoring ASCII case and surrounding space.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "beforebegin" => Some(Self::BeforeBegin),
            "afterbegin" => Some(Self::AfterBegin),
            "beforeend" => Some(Self::BeforeEnd),
            "afterend" => Some(Self::AfterEnd),
            _ => None,
        }
    }
}

/// Node-level operations needed to apply grid batches.
pub trait GridHost {
    /// Opaque element handle. Equality is node identity.
    type Node: Clone + PartialEq;

    /// First element matching `selector` in document order.
    fn resolve(&self, selector: &str) -> Option<Self::Node>;

    /// Parent element, `None` for detached nodes and the root.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Element children in document order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Class tokens of `node`.
    fn class_names(&self, node: &Self::Node) -> Vec<String>;

    /// Create a detached element with the given tag and class attribute.
    fn create_element(&mut self, tag: &str, class: &str) -> Result<Self::Node, HostError>;

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Parse `markup` and insert it at `position` relative to `anchor`.
    ///
    /// Returns the top-level elements the fragment produced, in order.
    fn insert_markup(
        &mut self,
        anchor: &Self::Node,
        position: InsertPosition,
        markup: &str,
    ) -> Result<Vec<Self::Node>, HostError>;

    /// Detach `node` from its parent.
    fn detach(&mut self, node: &Self::Node) -> Result<(), HostError>;
}

/// Selector-level document shims.
pub trait DocumentHost {
    /// Inner markup of the first match, or `""`.
    fn inner_html(&self, selector: &str) -> String;

    fn set_inner_html(&mut self, selector: &str, html: &str);

    /// Set `style.left` / `style.top` in pixels.
    fn set_position(&mut self, selector: &str, left: i32, top: i32);

    /// Set `style.width` / `style.height` in pixels.
    fn set_size(&mut self, selector: &str, width: i32, height: i32);

    /// Client width of the document element, `0` without a document.
    fn client_width(&self) -> i32;

    /// Client height of the document element, `0` without a document.
    fn client_height(&self) -> i32;

    fn set_display(&mut self, selector: &str, display: &str);

    /// Replace the whole inline style (`style.cssText`).
    fn set_style(&mut self, selector: &str, css_text: &str);

    fn focus(&mut self, selector: &str);

    /// Scroll the element so its last line is visible.
    fn scroll_to_bottom(&mut self, selector: &str);

    /// Current vertical scroll offset, or `0`.
    fn scroll_top(&self, selector: &str) -> i32;

    /// Open `url` in a new browsing context.
    fn open_new_tab(&mut self, url: &str);

    /// URL hash fragment without the leading `#`.
    fn hash(&self) -> String;

    fn set_hash(&mut self, hash: &str);

    /// Insert markup adjacent to the first match. `false` when nothing matched.
    fn insert(&mut self, selector: &str, position: InsertPosition, html: &str) -> bool;

    /// Detach the first match. `false` when nothing matched.
    fn remove(&mut self, selector: &str) -> bool;

    /// Line of the text caret within the element.
    ///
    /// `-1` without a selection range, `0` when the selector matches nothing.
    /// See [`crate::cursor::count_caret_lines`] for the counting rule.
    fn cursor_line(&mut self, selector: &str) -> i32;
}

/// Format a pixel length the way inline styles expect it.
#[must_use]
pub fn px(value: i32) -> String {
    format!("{value}px")
}
