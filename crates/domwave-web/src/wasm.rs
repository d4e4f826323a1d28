#![forbid(unsafe_code)]

use std::str::FromStr;

use domwave_core::{DocumentHost, GridApplier, GridConfig, InsertPosition};
use tracing::{Level, debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::DOMWAVE_JS_API_VERSION;
use crate::console::ConsoleMakeWriter;
use crate::dom::WebDocument;

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Run `f` against the page document, or return `default` when there is none.
fn with_document<R>(default: R, f: impl FnOnce(&mut WebDocument) -> R) -> R {
    match WebDocument::current() {
        Some(mut doc) => f(&mut doc),
        None => default,
    }
}

fn require_document() -> Result<WebDocument, JsValue> {
    WebDocument::current().ok_or_else(|| JsValue::from_str("no document available"))
}

#[wasm_bindgen(js_name = getInnerHtml)]
pub fn get_inner_html(selector: &str) -> String {
    with_document(String::new(), |doc| doc.inner_html(selector))
}

#[wasm_bindgen(js_name = setInnerHtml)]
pub fn set_inner_html(selector: &str, html: &str) {
    with_document((), |doc| doc.set_inner_html(selector, html));
}

/// Set `style.left` / `style.top` in pixels.
#[wasm_bindgen(js_name = setPosition)]
pub fn set_position(selector: &str, left: i32, top: i32) {
    with_document((), |doc| doc.set_position(selector, left, top));
}

/// Alias of [`set_position`] kept for terminal-style callers.
#[wasm_bindgen(js_name = setLocation)]
pub fn set_location(selector: &str, left: i32, top: i32) {
    set_position(selector, left, top);
}

#[wasm_bindgen(js_name = setSize)]
pub fn set_size(selector: &str, width: i32, height: i32) {
    with_document((), |doc| doc.set_size(selector, width, height));
}

#[wasm_bindgen(js_name = getClientWidth)]
pub fn get_client_width() -> i32 {
    with_document(0, |doc| doc.client_width())
}

#[wasm_bindgen(js_name = getClientHeight)]
pub fn get_client_height() -> i32 {
    with_document(0, |doc| doc.client_height())
}

#[wasm_bindgen(js_name = setDisplay)]
pub fn set_display(selector: &str, display: &str) {
    with_document((), |doc| doc.set_display(selector, display));
}

#[wasm_bindgen(js_name = setStyle)]
pub fn set_style(selector: &str, css_text: &str) {
    with_document((), |doc| doc.set_style(selector, css_text));
}

#[wasm_bindgen]
pub fn focus(selector: &str) {
    with_document((), |doc| doc.focus(selector));
}

#[wasm_bindgen(js_name = scrollDown)]
pub fn scroll_down(selector: &str) {
    with_document((), |doc| doc.scroll_to_bottom(selector));
}

#[wasm_bindgen(js_name = getScrollTop)]
pub fn get_scroll_top(selector: &str) -> i32 {
    with_document(0, |doc| doc.scroll_top(selector))
}

#[wasm_bindgen(js_name = openNewTab)]
pub fn open_new_tab(url: &str) {
    with_document((), |doc| doc.open_new_tab(url));
}

/// URL hash without the leading `#`.
#[wasm_bindgen(js_name = getHash)]
pub fn get_hash() -> String {
    with_document(String::new(), |doc| doc.hash())
}

#[wasm_bindgen(js_name = setHash)]
pub fn set_hash(hash: &str) {
    with_document((), |doc| doc.set_hash(hash));
}

/// `insertAdjacentHTML` on the first match.
///
/// Returns `false` when nothing matched or `position` is not one of
/// `beforebegin`, `afterbegin`, `beforeend`, `afterend`.
#[wasm_bindgen]
pub fn insert(selector: &str, position: &str, html: &str) -> bool {
    let Some(position) = InsertPosition::parse(position) else {
        warn!(selector, position, "unknown insert position");
        return false;
    };
    with_document(false, |doc| doc.insert(selector, position, html))
}

#[wasm_bindgen]
pub fn remove(selector: &str) -> bool {
    with_document(false, |doc| doc.remove(selector))
}

/// Line of the text caret inside the element; `-1` without a selection.
#[wasm_bindgen(js_name = getCursorLine)]
pub fn get_cursor_line(selector: &str) -> i32 {
    with_document(0, |doc| doc.cursor_line(selector))
}

/// Apply a JSON batch to the container with a fresh index.
#[wasm_bindgen(js_name = applyGridUpdate)]
pub fn apply_grid_update(container_selector: &str, batch_json: &str) -> Result<(), JsValue> {
    let mut doc = require_document()?;
    GridApplier::<Element>::default()
        .apply_json(&mut doc, container_selector, batch_json)
        .map_err(to_js_error)
}

/// Install a console subscriber. `level` defaults to `info`.
///
/// Returns `false` when a subscriber was already installed.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: Option<String>) -> Result<bool, JsValue> {
    let level = match level.as_deref() {
        None | Some("") => Level::INFO,
        Some(raw) => Level::from_str(raw.trim()).map_err(to_js_error)?,
    };
    let installed = tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter)
        .with_ansi(false)
        .without_time()
        .with_max_level(level)
        .try_init()
        .is_ok();
    if installed {
        debug!(%level, "console logging installed");
    }
    Ok(installed)
}

/// Stable semver of the JS surface.
#[wasm_bindgen(js_name = apiVersion)]
pub fn api_version() -> String {
    DOMWAVE_JS_API_VERSION.to_owned()
}

/// Grid bound to one container, keeping its node index across batches.
#[wasm_bindgen]
pub struct DomWaveGrid {
    container_selector: String,
    applier: GridApplier<Element>,
}

#[wasm_bindgen]
impl DomWaveGrid {
    /// `options` may set `rowTag`, `rowClassPrefix` and `columnClassPrefix`.
    #[wasm_bindgen(constructor)]
    pub fn new(container_selector: String, options: JsValue) -> Result<DomWaveGrid, JsValue> {
        let config = if options.is_undefined() || options.is_null() {
            GridConfig::default()
        } else {
            let json: String = js_sys::JSON::stringify(&options)?.into();
            serde_json::from_str::<GridConfig>(&json).map_err(to_js_error)?
        };
        let applier = GridApplier::new(config).map_err(to_js_error)?;
        Ok(Self {
            container_selector,
            applier,
        })
    }

    #[wasm_bindgen(getter, js_name = containerSelector)]
    pub fn container_selector(&self) -> String {
        self.container_selector.clone()
    }

    /// Apply a JSON batch. A malformed batch is rejected before any change.
    pub fn apply(&mut self, batch_json: &str) -> Result<(), JsValue> {
        let mut doc = require_document()?;
        self.applier
            .apply_json(&mut doc, &self.container_selector, batch_json)
            .map_err(to_js_error)
    }

    /// Drop the cached index; the next batch rebuilds it from the page.
    pub fn reset(&mut self) {
        self.applier.reset();
    }
}
