#![forbid(unsafe_code)]

//! Host traits implemented against the live browser document.
//!
//! Every selector lookup goes through `querySelector`. A selector the
//! browser rejects is treated as matching nothing and logged once per call.

use domwave_core::cursor::{NO_SELECTION, count_caret_lines};
use domwave_core::host::px;
use domwave_core::{DocumentHost, GridHost, HostError, InsertPosition};
use tracing::{trace, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CssStyleDeclaration, Document, Element, HtmlElement, HtmlTemplateElement, Window};

/// Best-effort message from a thrown JS value.
fn js_message(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn host_error(operation: &'static str, err: &JsValue) -> HostError {
    HostError::new(operation, js_message(err))
}

/// The page's window and document.
#[derive(Debug, Clone)]
pub struct WebDocument {
    window: Window,
    document: Document,
    marker_seq: u64,
}

impl WebDocument {
    /// Bind to the global `window.document`, if there is one.
    #[must_use]
    pub fn current() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self {
            window,
            document,
            marker_seq: 0,
        })
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    fn element(&self, selector: &str) -> Option<Element> {
        match self.document.query_selector(selector) {
            Ok(found) => found,
            Err(err) => {
                warn!(selector, error = %js_message(&err), "invalid selector; treating as no match");
                None
            }
        }
    }

    fn html_element(&self, selector: &str) -> Option<HtmlElement> {
        self.element(selector)?.dyn_into::<HtmlElement>().ok()
    }

    fn style(&self, selector: &str) -> Option<CssStyleDeclaration> {
        self.html_element(selector).map(|element| element.style())
    }

    fn set_style_property(style: &CssStyleDeclaration, name: &str, value: &str) {
        if let Err(err) = style.set_property(name, value) {
            warn!(name, value, error = %js_message(&err), "style property rejected");
        }
    }

    /// Parse `markup` into a detached fragment, returning it together with
    /// its top-level elements.
    fn parse_markup(&self, markup: &str) -> Result<(web_sys::DocumentFragment, Vec<Element>), HostError> {
        let template = self
            .document
            .create_element("template")
            .map_err(|err| host_error("createElement", &err))?
            .dyn_into::<HtmlTemplateElement>()
            .map_err(|_| HostError::new("createElement", "template element unavailable"))?;
        template.set_inner_html(markup);
        let content = template.content();
        let collection = content.children();
        let elements = (0..collection.length())
            .filter_map(|index| collection.item(index))
            .collect();
        Ok((content, elements))
    }

    fn next_marker(&mut self) -> String {
        self.marker_seq += 1;
        // Random salt keeps the marker from colliding with page text.
        let salt = (js_sys::Math::random() * f64::from(u32::MAX)) as u32;
        format!("domwave-caret-{:x}-{salt:08x}", self.marker_seq)
    }
}

impl GridHost for WebDocument {
    type Node = Element;

    fn resolve(&self, selector: &str) -> Option<Element> {
        self.element(selector)
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn children(&self, node: &Element) -> Vec<Element> {
        let collection = node.children();
        (0..collection.length())
            .filter_map(|index| collection.item(index))
            .collect()
    }

    fn class_names(&self, node: &Element) -> Vec<String> {
        node.class_name()
            .split_ascii_whitespace()
            .map(str::to_owned)
            .collect()
    }

    fn create_element(&mut self, tag: &str, class: &str) -> Result<Element, HostError> {
        let element = self
            .document
            .create_element(tag)
            .map_err(|err| host_error("createElement", &err))?;
        if !class.is_empty() {
            element.set_class_name(class);
        }
        Ok(element)
    }

    fn append_child(&mut self, parent: &Element, child: &Element) -> Result<(), HostError> {
        parent
            .append_child(child)
            .map(drop)
            .map_err(|err| host_error("appendChild", &err))
    }

    fn insert_markup(
        &mut self,
        anchor: &Element,
        position: InsertPosition,
        markup: &str,
    ) -> Result<Vec<Element>, HostError> {
        let needs_parent = matches!(
            position,
            InsertPosition::BeforeBegin | InsertPosition::AfterEnd
        );
        if needs_parent && anchor.parent_node().is_none() {
            return Err(HostError::new(
                "insertAdjacentHTML",
                "NoModificationAllowedError: target has no parent",
            ));
        }
        let (fragment, elements) = self.parse_markup(markup)?;
        let placed = match position {
            InsertPosition::BeforeBegin => anchor.before_with_node_1(&fragment),
            InsertPosition::AfterBegin => anchor.prepend_with_node_1(&fragment),
            InsertPosition::BeforeEnd => anchor.append_with_node_1(&fragment),
            InsertPosition::AfterEnd => anchor.after_with_node_1(&fragment),
        };
        placed.map_err(|err| host_error("insertAdjacentHTML", &err))?;
        trace!(
            position = position.as_str(),
            elements = elements.len(),
            "markup inserted"
        );
        Ok(elements)
    }

    fn detach(&mut self, node: &Element) -> Result<(), HostError> {
        node.remove();
        Ok(())
    }
}

impl DocumentHost for WebDocument {
    fn inner_html(&self, selector: &str) -> String {
        self.element(selector)
            .map(|element| element.inner_html())
            .unwrap_or_default()
    }

    fn set_inner_html(&mut self, selector: &str, html: &str) {
        if let Some(element) = self.element(selector) {
            element.set_inner_html(html);
        }
    }

    fn set_position(&mut self, selector: &str, left: i32, top: i32) {
        if let Some(style) = self.style(selector) {
            Self::set_style_property(&style, "left", &px(left));
            Self::set_style_property(&style, "top", &px(top));
        }
    }

    fn set_size(&mut self, selector: &str, width: i32, height: i32) {
        if let Some(style) = self.style(selector) {
            Self::set_style_property(&style, "width", &px(width));
            Self::set_style_property(&style, "height", &px(height));
        }
    }

    fn client_width(&self) -> i32 {
        self.document
            .document_element()
            .map_or(0, |root| root.client_width())
    }

    fn client_height(&self) -> i32 {
        self.document
            .document_element()
            .map_or(0, |root| root.client_height())
    }

    fn set_display(&mut self, selector: &str, display: &str) {
        if let Some(style) = self.style(selector) {
            Self::set_style_property(&style, "display", display);
        }
    }

    fn set_style(&mut self, selector: &str, css_text: &str) {
        if let Some(style) = self.style(selector) {
            style.set_css_text(css_text);
        }
    }

    fn focus(&mut self, selector: &str) {
        if let Some(element) = self.html_element(selector)
            && let Err(err) = element.focus()
        {
            warn!(selector, error = %js_message(&err), "focus failed");
        }
    }

    fn scroll_to_bottom(&mut self, selector: &str) {
        if let Some(element) = self.element(selector) {
            element.set_scroll_top(element.scroll_height());
        }
    }

    fn scroll_top(&self, selector: &str) -> i32 {
        self.element(selector)
            .map_or(0, |element| element.scroll_top())
    }

    fn open_new_tab(&mut self, url: &str) {
        if let Err(err) = self.window.open_with_url_and_target(url, "_blank") {
            warn!(url, error = %js_message(&err), "window.open failed");
        }
    }

    fn hash(&self) -> String {
        let hash = self.window.location().hash().unwrap_or_default();
        hash.strip_prefix('#').unwrap_or(&hash).to_owned()
    }

    fn set_hash(&mut self, hash: &str) {
        if let Err(err) = self.window.location().set_hash(hash) {
            warn!(hash, error = %js_message(&err), "location.hash rejected");
        }
    }

    fn insert(&mut self, selector: &str, position: InsertPosition, html: &str) -> bool {
        let Some(element) = self.element(selector) else {
            return false;
        };
        match element.insert_adjacent_html(position.as_str(), html) {
            Ok(()) => true,
            Err(err) => {
                warn!(selector, error = %js_message(&err), "insert rejected");
                false
            }
        }
    }

    fn remove(&mut self, selector: &str) -> bool {
        let Some(element) = self.element(selector) else {
            return false;
        };
        element.remove();
        true
    }

    fn cursor_line(&mut self, selector: &str) -> i32 {
        let Some(element) = self.element(selector) else {
            return 0;
        };
        let selection = match self.document.get_selection() {
            Ok(Some(selection)) if selection.range_count() > 0 => selection,
            _ => return NO_SELECTION,
        };
        let Ok(range) = selection.get_range_at(0) else {
            return NO_SELECTION;
        };
        range.collapse_with_to_start(true);

        let marker = self.next_marker();
        let Ok(span) = self.document.create_element("span") else {
            return NO_SELECTION;
        };
        let text_node = self.document.create_text_node(&marker);
        if span.append_child(&text_node).is_err() || range.insert_node(&span).is_err() {
            warn!(selector, "could not place caret marker");
            return NO_SELECTION;
        }
        let text = match element.dyn_ref::<HtmlElement>() {
            Some(html) => html.inner_text(),
            None => element.text_content().unwrap_or_default(),
        };
        span.remove();
        count_caret_lines(&text, &marker)
    }
}
