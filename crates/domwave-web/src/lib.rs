#![forbid(unsafe_code)]

//! WASM frontend for domwave.
//!
//! Exposes the [`domwave_core::DocumentHost`] shims and the grid applier to
//! JavaScript through `wasm-bindgen`, backed by the live browser document:
//! - selector-level shims (inner markup, inline style, viewport, focus,
//!   scroll, URL hash, adjacent insert, remove, caret line),
//! - `applyGridUpdate` for one-shot JSON batches,
//! - `DomWaveGrid` for repeated batches against one container with a cached
//!   node index,
//! - `initLogging` to route `tracing` output to the browser console.

#[cfg(target_arch = "wasm32")]
mod console;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use dom::WebDocument;
#[cfg(target_arch = "wasm32")]
pub use wasm::DomWaveGrid;

/// Semver of the JS surface, independent of the crate version.
pub const DOMWAVE_JS_API_VERSION: &str = "1.0.0";

/// JS names exported as free functions, in declaration order.
pub const DOMWAVE_JS_FUNCTIONS: &[&str] = &[
    "getInnerHtml",
    "setInnerHtml",
    "setPosition",
    "setLocation",
    "setSize",
    "getClientWidth",
    "getClientHeight",
    "setDisplay",
    "setStyle",
    "focus",
    "scrollDown",
    "getScrollTop",
    "openNewTab",
    "getHash",
    "setHash",
    "insert",
    "remove",
    "getCursorLine",
    "applyGridUpdate",
    "initLogging",
    "apiVersion",
];

/// Native builds compile this crate as a stub so workspace checks stay green
/// on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct DomWaveGrid {
    container_selector: String,
}

#[cfg(not(target_arch = "wasm32"))]
impl DomWaveGrid {
    #[must_use]
    pub fn new(container_selector: &str) -> Self {
        Self {
            container_selector: container_selector.to_owned(),
        }
    }

    #[must_use]
    pub fn container_selector(&self) -> &str {
        &self.container_selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn function_names_are_unique_camel_case() {
        let mut seen = std::collections::HashSet::new();
        for name in DOMWAVE_JS_FUNCTIONS {
            assert!(seen.insert(*name), "duplicate export {name}");
            assert!(name.starts_with(|c: char| c.is_ascii_lowercase()));
            assert!(!name.contains('_'));
        }
        assert_eq!(DOMWAVE_JS_FUNCTIONS.len(), 21);
    }

    #[test]
    fn api_version_is_semver() {
        let parts: Vec<u32> = DOMWAVE_JS_API_VERSION
            .split('.')
            .map(|part| part.parse().expect("numeric component"))
            .collect();
        assert_eq!(parts.len(), 3);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn native_stub_keeps_its_selector() {
        let grid = DomWaveGrid::new("#grid");
        assert_eq!(grid.container_selector(), "#grid");
        assert_eq!(DomWaveGrid::default().container_selector(), "");
    }
}
