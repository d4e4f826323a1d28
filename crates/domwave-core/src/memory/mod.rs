#![forbid(unsafe_code)]

//! In-memory document.
//!
//! [`MemoryDocument`] is an arena-backed element tree implementing both
//! [`GridHost`] and [`DocumentHost`]. It stands in for the browser document
//! in tests and lets native hosts drive the same grid logic.
//!
//! The document starts as `<html><body></body></html>`. Markup is parsed
//! with the HTML5 fragment algorithm in the context of the element it lands
//! in. Removing a node (by `remove`, `detach`, or replacing inner markup)
//! frees its whole subtree; slots are reused, and a [`NodeId`] carries a
//! generation so handles to freed nodes read as absent instead of aliasing
//! whatever reuses the slot.

mod markup;
pub mod selector;

use crate::cursor::{NO_SELECTION, count_caret_lines};
use crate::host::{DocumentHost, GridHost, HostError, InsertPosition, px};
#[cfg(feature = "tracing")]
use crate::logging::warn;
use crate::style::StyleDeclaration;
#[cfg(not(feature = "tracing"))]
use crate::warn;
use markup::{Fragment, escape_attr, escape_text, is_raw_text, is_void, parse_fragment};
use selector::{ElementTree, Selector};

/// Elements whose rendered text ends with a line break.
const BLOCK_ELEMENTS: [&str; 14] = [
    "address", "blockquote", "div", "dl", "fieldset", "form", "h1", "h2", "h3", "li", "ol", "p",
    "pre", "ul",
];

/// Handle to a node in a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Arena slot. Slots are reused once their node is freed.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    scroll_top: i32,
    scroll_height: i32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Caret position: a character offset into an element's rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Caret {
    element: NodeId,
    offset: usize,
}

/// Arena-backed document implementing the host traits.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
    root: NodeId,
    body: NodeId,
    viewport: (i32, i32),
    hash: String,
    opened_tabs: Vec<String>,
    focused: Option<NodeId>,
    caret: Option<Caret>,
    marker_seq: u64,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Empty document with a 1024x768 viewport.
    #[must_use]
    pub fn new() -> Self {
        let placeholder = NodeId {
            index: 0,
            generation: 0,
        };
        let mut doc = Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            root: placeholder,
            body: placeholder,
            viewport: (1024, 768),
            hash: String::new(),
            opened_tabs: Vec::new(),
            focused: None,
            caret: None,
            marker_seq: 0,
        };
        let root = doc.alloc(NodeKind::Element {
            tag: "html".to_owned(),
            attrs: Vec::new(),
        });
        let body = doc.alloc(NodeKind::Element {
            tag: "body".to_owned(),
            attrs: Vec::new(),
        });
        doc.link(root, body, None);
        doc.root = root;
        doc.body = body;
        doc
    }

    /// Document whose `<body>` holds `markup`.
    #[must_use]
    pub fn with_body(markup: &str) -> Self {
        let mut doc = Self::new();
        let body = doc.body;
        doc.replace_children(body, markup);
        doc
    }

    /// Serialized contents of `<body>`.
    #[must_use]
    pub fn body_html(&self) -> String {
        self.serialize_children(self.body)
    }

    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    /// Arena slots in use or waiting for reuse.
    #[must_use]
    pub fn allocated_slots(&self) -> usize {
        self.slots.len()
    }

    /// Nodes currently alive, attached or not.
    #[must_use]
    pub fn live_nodes(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn set_viewport(&mut self, width: i32, height: i32) {
        self.viewport = (width, height);
    }

    /// URLs passed to [`DocumentHost::open_new_tab`], oldest first.
    #[must_use]
    pub fn opened_tabs(&self) -> &[String] {
        &self.opened_tabs
    }

    #[must_use]
    pub const fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Set the scrollable content height of the first match.
    pub fn set_scroll_height(&mut self, selector: &str, height: i32) -> bool {
        let Some(node) = self.query(selector).and_then(|id| self.node_mut(id)) else {
            return false;
        };
        node.scroll_height = height;
        true
    }

    /// Place the caret `offset` characters into the rendered text of the
    /// first match.
    pub fn set_caret(&mut self, selector: &str, offset: usize) -> bool {
        let Some(element) = self.query(selector) else {
            return false;
        };
        self.caret = Some(Caret { element, offset });
        true
    }

    pub fn clear_caret(&mut self) {
        self.caret = None;
    }

    /// Inline style property of the first match.
    #[must_use]
    pub fn style_property(&self, selector: &str, property: &str) -> Option<String> {
        let id = self.query(selector)?;
        let decl = StyleDeclaration::parse(self.attr(id, "style").unwrap_or(""));
        decl.get(property).map(str::to_owned)
    }

    /// Attribute of the first match.
    #[must_use]
    pub fn attribute_of(&self, selector: &str, name: &str) -> Option<String> {
        let id = self.query(selector)?;
        self.attr(id, name).map(str::to_owned)
    }

    /// First element matching `selector` in document order.
    #[must_use]
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    /// Every element matching `selector`, in document order.
    ///
    /// An unparsable selector matches nothing.
    #[must_use]
    pub fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(%err, "selector rejected; treating as no match");
                return Vec::new();
            }
        };
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if parsed.matches(self, id) {
                out.push(id);
            }
            stack.extend(self.child_ids(id).iter().rev().copied());
        }
        out
    }

    /// Serialized inner markup of `id`, `""` for freed handles.
    #[must_use]
    pub fn node_inner_html(&self, id: NodeId) -> String {
        self.serialize_children(id)
    }

    /// Serialized outer markup of `id`, `""` for freed handles.
    #[must_use]
    pub fn node_outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize(id, &mut out);
        out
    }

    /// Rendered text of `id`: text nodes verbatim, `<br>` as a line break,
    /// and a line break after every block element.
    #[must_use]
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_text(id, None, &mut out);
        out
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn child_ids(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            parent: None,
            children: Vec::new(),
            kind,
            scroll_top: 0,
            scroll_height: 0,
        };
        let reused = self
            .free_list
            .pop()
            .and_then(|index| self.slots.get_mut(index).map(|slot| (index, slot)));
        if let Some((index, slot)) = reused {
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Free `id` and all its descendants. `id` must already be unlinked.
    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current.index) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(current.index);
            stack.extend(node.children);
            if self.focused == Some(current) {
                self.focused = None;
            }
            if self.caret.is_some_and(|caret| caret.element == current) {
                self.caret = None;
            }
        }
    }

    /// Unlink `id` from its parent and free its subtree.
    fn discard(&mut self, id: NodeId) {
        self.unlink(id);
        self.free_subtree(id);
    }

    fn is_element(&self, id: NodeId) -> bool {
        matches!(
            self.node(id).map(|node| &node.kind),
            Some(NodeKind::Element { .. })
        )
    }

    fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    fn set_attr(&mut self, id: NodeId, name: &str, value: String) {
        if let Some(Node {
            kind: NodeKind::Element { attrs, .. },
            ..
        }) = self.node_mut(id)
        {
            match attrs.iter_mut().find(|(key, _)| key == name) {
                Some(entry) => entry.1 = value,
                None => attrs.push((name.to_owned(), value)),
            }
        }
    }

    fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(Node {
            kind: NodeKind::Element { attrs, .. },
            ..
        }) = self.node_mut(id)
        {
            attrs.retain(|(key, _)| key != name);
        }
    }

    fn update_style(&mut self, id: NodeId, edit: impl FnOnce(&mut StyleDeclaration)) {
        let mut decl = StyleDeclaration::parse(self.attr(id, "style").unwrap_or(""));
        edit(&mut decl);
        if decl.is_empty() {
            self.remove_attr(id, "style");
        } else {
            self.set_attr(id, "style", decl.to_css_text());
        }
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.node(id).and_then(|node| node.parent);
        }
        false
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.node_mut(id).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|child| *child != id);
        }
    }

    /// Attach `child` under `parent` at `index` (end when `None`).
    fn link(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.unlink(child);
        let Some(parent_node) = self.node_mut(parent) else {
            return;
        };
        let len = parent_node.children.len();
        parent_node
            .children
            .insert(index.unwrap_or(len).min(len), child);
        if let Some(child_node) = self.node_mut(child) {
            child_node.parent = Some(parent);
        }
    }

    fn build(&mut self, fragment: Fragment) -> NodeId {
        match fragment {
            Fragment::Text(text) => self.alloc(NodeKind::Text(text)),
            Fragment::Comment(text) => self.alloc(NodeKind::Comment(text)),
            Fragment::Element {
                tag,
                attrs,
                children,
            } => {
                let id = self.alloc(NodeKind::Element { tag, attrs });
                for child in children {
                    let child_id = self.build(child);
                    self.link(id, child_id, None);
                }
                id
            }
        }
    }

    /// Tag used as the parsing context for markup placed under `id`.
    fn context_tag(&self, id: NodeId) -> String {
        self.tag_name(id).unwrap_or("body").to_owned()
    }

    fn replace_children(&mut self, id: NodeId, markup: &str) {
        let context = self.context_tag(id);
        let Some(node) = self.node_mut(id) else {
            return;
        };
        for child in std::mem::take(&mut node.children) {
            if let Some(child_node) = self.node_mut(child) {
                child_node.parent = None;
            }
            self.free_subtree(child);
        }
        for fragment in parse_fragment(&context, markup) {
            let child = self.build(fragment);
            self.link(id, child, None);
        }
    }

    /// Parse `markup` and place it relative to `anchor`; returns the new
    /// top-level element ids.
    fn insert_adjacent(
        &mut self,
        anchor: NodeId,
        position: InsertPosition,
        markup: &str,
    ) -> Result<Vec<NodeId>, HostError> {
        if !self.is_element(anchor) {
            return Err(HostError::new("insertAdjacentHTML", "target is not an element"));
        }
        let (parent, mut index) = match position {
            InsertPosition::AfterBegin => (anchor, 0),
            InsertPosition::BeforeEnd => (anchor, self.child_ids(anchor).len()),
            InsertPosition::BeforeBegin | InsertPosition::AfterEnd => {
                let parent = self
                    .node(anchor)
                    .and_then(|node| node.parent)
                    .ok_or_else(|| {
                        HostError::new(
                            "insertAdjacentHTML",
                            "NoModificationAllowedError: target has no parent",
                        )
                    })?;
                let at = self
                    .child_ids(parent)
                    .iter()
                    .position(|child| *child == anchor)
                    .unwrap_or(0);
                let at = if position == InsertPosition::AfterEnd {
                    at + 1
                } else {
                    at
                };
                (parent, at)
            }
        };
        let context = self.context_tag(parent);
        let mut elements = Vec::new();
        for fragment in parse_fragment(&context, markup) {
            let id = self.build(fragment);
            self.link(parent, id, Some(index));
            index += 1;
            if self.is_element(id) {
                elements.push(id);
            }
        }
        Ok(elements)
    }

    fn serialize_children(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.child_ids(id) {
            self.serialize(*child, &mut out);
        }
        out
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => {
                let raw = node
                    .parent
                    .and_then(|parent| self.tag_name(parent))
                    .is_some_and(is_raw_text);
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if is_void(tag) {
                    return;
                }
                for child in &node.children {
                    self.serialize(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    /// Render text, splicing `marker` in at the caret when the walk passes
    /// through the caret element.
    fn render_text(&self, id: NodeId, marker: Option<(&Caret, &str)>, out: &mut String) {
        if let Some((caret, token)) = marker.filter(|(caret, _)| caret.element == id) {
            let mut own = String::new();
            self.render_text(id, None, &mut own);
            let split = own
                .char_indices()
                .nth(caret.offset)
                .map_or(own.len(), |(byte, _)| byte);
            out.push_str(&own[..split]);
            out.push_str(token);
            out.push_str(&own[split..]);
            return;
        }
        for child in self.child_ids(id) {
            let Some(node) = self.node(*child) else {
                continue;
            };
            match &node.kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Comment(_) => {}
                NodeKind::Element { tag, .. } => {
                    if tag == "br" {
                        out.push('\n');
                        continue;
                    }
                    self.render_text(*child, marker, out);
                    if BLOCK_ELEMENTS.contains(&tag.as_str()) {
                        out.push('\n');
                    }
                }
            }
        }
    }
}

impl ElementTree for MemoryDocument {
    type Id = NodeId;

    fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?
            .parent
            .filter(|parent| self.is_element(*parent))
    }

    fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attr(id, name)
    }
}

impl GridHost for MemoryDocument {
    type Node = NodeId;

    fn resolve(&self, selector: &str) -> Option<NodeId> {
        self.query(selector)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.parent_element(*node)
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.child_ids(*node)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    fn class_names(&self, node: &NodeId) -> Vec<String> {
        self.attr(*node, "class")
            .unwrap_or("")
            .split_ascii_whitespace()
            .map(str::to_owned)
            .collect()
    }

    fn create_element(&mut self, tag: &str, class: &str) -> Result<NodeId, HostError> {
        let valid = tag.starts_with(|c: char| c.is_ascii_alphabetic())
            && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(HostError::new(
                "createElement",
                format!("InvalidCharacterError: {tag:?}"),
            ));
        }
        let mut attrs = Vec::new();
        if !class.is_empty() {
            attrs.push(("class".to_owned(), class.to_owned()));
        }
        Ok(self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        }))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        if !self.is_element(*parent)
            || self.node(*child).is_none()
            || self.is_ancestor_or_self(*child, *parent)
        {
            return Err(HostError::new(
                "appendChild",
                "HierarchyRequestError: invalid parent",
            ));
        }
        self.link(*parent, *child, None);
        Ok(())
    }

    fn insert_markup(
        &mut self,
        anchor: &NodeId,
        position: InsertPosition,
        markup: &str,
    ) -> Result<Vec<NodeId>, HostError> {
        self.insert_adjacent(*anchor, position, markup)
    }

    fn detach(&mut self, node: &NodeId) -> Result<(), HostError> {
        if *node == self.root {
            return Err(HostError::new(
                "remove",
                "NoModificationAllowedError: document element",
            ));
        }
        self.discard(*node);
        Ok(())
    }
}

impl DocumentHost for MemoryDocument {
    fn inner_html(&self, selector: &str) -> String {
        self.query(selector)
            .map(|id| self.serialize_children(id))
            .unwrap_or_default()
    }

    fn set_inner_html(&mut self, selector: &str, html: &str) {
        if let Some(id) = self.query(selector) {
            self.replace_children(id, html);
        }
    }

    fn set_position(&mut self, selector: &str, left: i32, top: i32) {
        if let Some(id) = self.query(selector) {
            self.update_style(id, |decl| {
                decl.set("left", &px(left));
                decl.set("top", &px(top));
            });
        }
    }

    fn set_size(&mut self, selector: &str, width: i32, height: i32) {
        if let Some(id) = self.query(selector) {
            self.update_style(id, |decl| {
                decl.set("width", &px(width));
                decl.set("height", &px(height));
            });
        }
    }

    fn client_width(&self) -> i32 {
        self.viewport.0
    }

    fn client_height(&self) -> i32 {
        self.viewport.1
    }

    fn set_display(&mut self, selector: &str, display: &str) {
        if let Some(id) = self.query(selector) {
            self.update_style(id, |decl| decl.set("display", display));
        }
    }

    fn set_style(&mut self, selector: &str, css_text: &str) {
        if let Some(id) = self.query(selector) {
            self.update_style(id, |decl| *decl = StyleDeclaration::parse(css_text));
        }
    }

    fn focus(&mut self, selector: &str) {
        if let Some(id) = self.query(selector) {
            self.focused = Some(id);
        }
    }

    fn scroll_to_bottom(&mut self, selector: &str) {
        if let Some(node) = self.query(selector).and_then(|id| self.node_mut(id)) {
            node.scroll_top = node.scroll_height;
        }
    }

    fn scroll_top(&self, selector: &str) -> i32 {
        self.query(selector)
            .and_then(|id| self.node(id))
            .map_or(0, |node| node.scroll_top)
    }

    fn open_new_tab(&mut self, url: &str) {
        self.opened_tabs.push(url.to_owned());
    }

    fn hash(&self) -> String {
        self.hash.clone()
    }

    fn set_hash(&mut self, hash: &str) {
        self.hash = hash.strip_prefix('#').unwrap_or(hash).to_owned();
    }

    fn insert(&mut self, selector: &str, position: InsertPosition, html: &str) -> bool {
        let Some(id) = self.query(selector) else {
            return false;
        };
        match self.insert_adjacent(id, position, html) {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, selector, "insert rejected");
                false
            }
        }
    }

    fn remove(&mut self, selector: &str) -> bool {
        match self.query(selector) {
            Some(id) if id != self.root => {
                self.discard(id);
                true
            }
            _ => false,
        }
    }

    fn cursor_line(&mut self, selector: &str) -> i32 {
        let Some(id) = self.query(selector) else {
            return 0;
        };
        let Some(caret) = self.caret else {
            return NO_SELECTION;
        };
        self.marker_seq += 1;
        let marker = format!("domwave-caret-{:016x}", self.marker_seq);
        let mut text = String::new();
        self.render_text(id, Some((&caret, &marker)), &mut text);
        count_caret_lines(&text, &marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn body_markup_round_trips() {
        let html = r#"<div id="grid" class="board"><div class="row0"><span class="col0">a</span></div></div><br><!--x-->"#;
        assert_eq!(MemoryDocument::with_body(html).body_html(), html);
    }

    #[test]
    fn inner_html_reads_and_writes() {
        let mut doc = MemoryDocument::with_body(r#"<p id="a">old</p>"#);
        assert_eq!(doc.inner_html("#a"), "old");
        doc.set_inner_html("#a", "<b>new</b>");
        assert_eq!(doc.inner_html("#a"), "<b>new</b>");
        assert_eq!(doc.inner_html("#missing"), "");
        doc.set_inner_html("#missing", "ignored");
        assert_eq!(doc.body_html(), r#"<p id="a"><b>new</b></p>"#);
    }

    #[test]
    fn position_size_and_display_edit_inline_style() {
        let mut doc = MemoryDocument::with_body(r#"<div id="w" style="color: red"></div>"#);
        doc.set_position("#w", 10, -4);
        doc.set_size("#w", 80, 24);
        doc.set_display("#w", "none");
        assert_eq!(
            doc.attribute_of("#w", "style").as_deref(),
            Some("color: red; left: 10px; top: -4px; width: 80px; height: 24px; display: none;")
        );
        doc.set_display("#w", "");
        assert_eq!(doc.style_property("#w", "display"), None);
    }

    #[test]
    fn set_style_replaces_the_whole_declaration() {
        let mut doc = MemoryDocument::with_body(r#"<div id="w" style="left: 1px"></div>"#);
        doc.set_style("#w", "top: 2px; opacity: 0.5");
        assert_eq!(
            doc.attribute_of("#w", "style").as_deref(),
            Some("top: 2px; opacity: 0.5;")
        );
        doc.set_style("#w", "");
        assert_eq!(doc.attribute_of("#w", "style"), None);
    }

    #[test]
    fn focus_and_remove_interact() {
        let mut doc = MemoryDocument::with_body(r#"<div id="box"><input id="field"></div>"#);
        doc.focus("#nope");
        assert_eq!(doc.focused(), None);
        doc.focus("#field");
        assert_eq!(doc.focused(), doc.query("#field"));
        assert!(doc.remove("#box"));
        assert_eq!(doc.focused(), None);
        assert!(!doc.remove("#box"));
    }

    #[test]
    fn scroll_to_bottom_uses_scroll_height() {
        let mut doc = MemoryDocument::with_body(r#"<pre id="log"></pre>"#);
        assert_eq!(doc.scroll_top("#log"), 0);
        assert!(doc.set_scroll_height("#log", 480));
        doc.scroll_to_bottom("#log");
        assert_eq!(doc.scroll_top("#log"), 480);
        assert_eq!(doc.scroll_top("#missing"), 0);
    }

    #[test]
    fn hash_is_stored_without_leading_marker() {
        let mut doc = MemoryDocument::new();
        assert_eq!(doc.hash(), "");
        doc.set_hash("#section-2");
        assert_eq!(doc.hash(), "section-2");
        doc.set_hash("plain");
        assert_eq!(doc.hash(), "plain");
    }

    #[test]
    fn open_new_tab_is_recorded() {
        let mut doc = MemoryDocument::new();
        doc.open_new_tab("https://example.com/docs");
        assert_eq!(doc.opened_tabs().to_vec(), vec!["https://example.com/docs".to_owned()]);
    }

    #[test]
    fn insert_at_each_position() {
        let mut doc = MemoryDocument::with_body(r#"<ul id="l"><li>b</li></ul>"#);
        assert!(doc.insert("#l", InsertPosition::AfterBegin, "<li>a</li>"));
        assert!(doc.insert("#l", InsertPosition::BeforeEnd, "<li>c</li>"));
        assert!(doc.insert("#l", InsertPosition::BeforeBegin, "<h1>t</h1>"));
        assert!(doc.insert("#l", InsertPosition::AfterEnd, "<p>end</p>"));
        assert_eq!(
            doc.body_html(),
            r#"<h1>t</h1><ul id="l"><li>a</li><li>b</li><li>c</li></ul><p>end</p>"#
        );
        assert!(!doc.insert("#missing", InsertPosition::BeforeEnd, "x"));
    }

    #[test]
    fn insert_beside_the_root_is_rejected() {
        let mut doc = MemoryDocument::new();
        assert!(!doc.insert("html", InsertPosition::AfterEnd, "<p>x</p>"));
    }

    #[test]
    fn viewport_is_configurable() {
        let mut doc = MemoryDocument::new();
        doc.set_viewport(640, 480);
        assert_eq!((doc.client_width(), doc.client_height()), (640, 480));
    }

    #[test]
    fn cursor_line_without_selection_or_target() {
        let mut doc = MemoryDocument::with_body(r#"<div id="ed">a<br>b</div>"#);
        assert_eq!(doc.cursor_line("#missing"), 0);
        assert_eq!(doc.cursor_line("#ed"), NO_SELECTION);
    }

    #[test]
    fn cursor_line_counts_lines_before_caret() {
        let mut doc =
            MemoryDocument::with_body(r#"<div id="ed"><div>one</div><div>two</div><div>three</div></div>"#);
        assert_eq!(doc.inner_text(doc.query("#ed").expect("editor")), "one\ntwo\nthree\n");
        assert!(doc.set_caret("#ed", 0));
        assert_eq!(doc.cursor_line("#ed"), 0);
        assert!(doc.set_caret("#ed", 5));
        assert_eq!(doc.cursor_line("#ed"), 1);
        assert!(doc.set_caret("#ed", 9));
        assert_eq!(doc.cursor_line("#ed"), 2);
    }

    #[test]
    fn cursor_line_with_caret_inside_nested_element() {
        let mut doc = MemoryDocument::with_body(
            r#"<div id="ed"><p>a</p><p id="second">bc</p></div>"#,
        );
        assert!(doc.set_caret("#second", 1));
        assert_eq!(doc.cursor_line("#ed"), 1);
    }

    #[test]
    fn cursor_line_with_caret_outside_counts_all_lines() {
        let mut doc =
            MemoryDocument::with_body(r#"<div id="ed">a<br>b<br>c</div><p id="other">x</p>"#);
        assert!(doc.set_caret("#other", 0));
        assert_eq!(doc.cursor_line("#ed"), 2);
        doc.clear_caret();
        assert_eq!(doc.cursor_line("#ed"), NO_SELECTION);
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let mut doc = MemoryDocument::with_body(r#"<p id="a">x</p>"#);
        assert_eq!(doc.inner_html("p:first-child"), "");
        assert!(!doc.remove("[id=a]"));
    }

    #[test]
    fn detached_nodes_are_freed_and_their_slots_reused() {
        let mut doc = MemoryDocument::with_body(r#"<div id="c"><span class="col1">x</span></div>"#);
        let span = doc.query(".col1").expect("span");
        let live = doc.live_nodes();
        doc.detach(&span).expect("detach");
        assert_eq!(doc.live_nodes(), live - 2);
        assert_eq!(GridHost::parent(&doc, &span), None);
        assert_eq!(doc.node_outer_html(span), "");
        assert_eq!(doc.inner_html("#c"), "");

        let first = doc.create_element("b", "").expect("element");
        let second = doc.create_element("i", "").expect("element");
        assert_eq!(doc.allocated_slots(), live);
        let reused = [first, second]
            .into_iter()
            .find(|id| id.index() == span.index())
            .expect("span slot reused");
        assert_ne!(reused.generation(), span.generation());
        assert_eq!(doc.node_outer_html(span), "");
    }

    #[test]
    fn stale_handles_are_rejected_as_children() {
        let mut doc = MemoryDocument::with_body(r#"<div id="c"></div><p id="gone"></p>"#);
        let gone = doc.query("#gone").expect("p");
        assert!(doc.remove("#gone"));
        let container = doc.query("#c").expect("div");
        assert!(doc.append_child(&container, &gone).is_err());
    }

    #[test]
    fn the_root_cannot_be_removed() {
        let mut doc = MemoryDocument::with_body("<p>x</p>");
        assert!(!doc.remove("html"));
        let root = doc.query("html").expect("root");
        assert!(doc.detach(&root).is_err());
        assert_eq!(doc.body_html(), "<p>x</p>");
    }

    #[test]
    fn replacing_inner_html_frees_the_old_children() {
        let mut doc = MemoryDocument::with_body(r#"<div id="w"></div>"#);
        doc.set_inner_html("#w", "<ul><li>a</li><li>b</li></ul>");
        let slots = doc.allocated_slots();
        for round in 0..100 {
            doc.set_inner_html("#w", &format!("<ul><li>{round}</li><li>b</li></ul>"));
        }
        assert_eq!(doc.allocated_slots(), slots);
    }

    #[test]
    fn focus_and_caret_clear_when_their_node_is_freed() {
        let mut doc = MemoryDocument::with_body(r#"<div id="ed"><input id="field"></div>"#);
        doc.focus("#field");
        assert!(doc.set_caret("#field", 0));
        doc.set_inner_html("#ed", "<b>fresh</b>");
        assert_eq!(doc.focused(), None);
        assert_eq!(doc.cursor_line("#ed"), NO_SELECTION);
    }

    #[test]
    fn long_update_streams_keep_the_arena_bounded() {
        use crate::{GridApplier, GridMutation};

        let mut doc = MemoryDocument::with_body(r#"<div id="grid"></div>"#);
        let mut applier = GridApplier::default();
        applier
            .apply(&mut doc, "#grid", &[GridMutation::insert(0, r#"<span class="col0">0</span>"#)])
            .expect("insert");
        let slots = doc.allocated_slots();
        for step in 1..=10_000 {
            let cell = format!(r#"<span class="col0">{step}</span>"#);
            applier
                .apply(&mut doc, "#grid", &[GridMutation::update(0, 0, cell)])
                .expect("update");
        }
        // One replacement cell is alive next to the old one during an update.
        assert!(doc.allocated_slots() <= slots + 2);
        assert_eq!(
            doc.inner_html("#grid"),
            r#"<div class="row0"><span class="col0">10000</span></div>"#
        );
    }

    #[test]
    fn markup_is_parsed_in_the_context_of_its_parent() {
        let mut doc = MemoryDocument::with_body(r#"<table><tbody id="rows"></tbody></table>"#);
        doc.set_inner_html("#rows", "<tr><td>a</td></tr>");
        assert_eq!(doc.inner_html("#rows"), "<tr><td>a</td></tr>");
        assert!(doc.insert("#rows", InsertPosition::BeforeEnd, "<tr><td>b</td></tr>"));
        assert_eq!(doc.query_all("td").len(), 2);

        doc.set_inner_html("body", r#"<div id="d"></div>"#);
        doc.set_inner_html("#d", "<tr><td>c</td></tr>");
        assert_eq!(doc.inner_html("#d"), "c");
    }

    #[test]
    fn text_and_attributes_are_escaped_on_serialization() {
        let html = r#"<p title="a &quot;b&quot; &amp; c">a &amp; b &lt; c</p><style>a > b {}</style>"#;
        assert_eq!(MemoryDocument::with_body(html).body_html(), html);
        let doc = MemoryDocument::with_body("<p>1 < 2</p>");
        assert_eq!(doc.body_html(), "<p>1 &lt; 2</p>");
        assert_eq!(doc.inner_text(doc.body()), "1 < 2\n");
    }

    #[test]
    fn append_child_rejects_cycles() {
        let mut doc = MemoryDocument::with_body(r#"<div id="outer"><div id="inner"></div></div>"#);
        let outer = doc.query("#outer").expect("outer");
        let inner = doc.query("#inner").expect("inner");
        assert!(doc.append_child(&inner, &outer).is_err());
        assert!(doc.append_child(&outer, &outer).is_err());
    }

    #[test]
    fn create_element_validates_tag() {
        let mut doc = MemoryDocument::new();
        assert!(doc.create_element("div", "row0").is_ok());
        assert!(doc.create_element("1div", "").is_err());
        assert!(doc.create_element("di v", "").is_err());
    }
}
