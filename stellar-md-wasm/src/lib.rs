//! WASM bindings for `stellar-md`.
//!
//! Exposes the directive renderer to JavaScript via wasm-bindgen.
//! Call `render_html()` for the HTML fragment, `render()` for a JSON result
//! with headings and diagnostics, or `check()` for diagnostics alone.

use stellar_md::{RenderOptions, Renderer};
use wasm_bindgen::prelude::*;

/// Render a document and return the HTML fragment.
///
/// The tab script is included when the document contains tabs.
#[wasm_bindgen]
pub fn render_html(input: &str) -> String {
    stellar_md::render(input)
}

/// Render a document and return the result as JSON.
///
/// Returns `{ html, headings, diagnostics }`. Pass `tab_script = false` when
/// the page already loads the tab script once for all posts.
#[wasm_bindgen]
pub fn render(input: &str, tab_script: Option<bool>) -> String {
    let renderer = Renderer::with_options(RenderOptions {
        tab_script: tab_script.unwrap_or(true),
        ..RenderOptions::default()
    });
    serde_json::to_string(&renderer.render(input)).unwrap_or_else(|_| "{}".to_string())
}

/// Headings of a rendered document as an array of `{ level, text, id }`
/// objects, for building a table of contents.
#[wasm_bindgen]
pub fn headings(input: &str) -> Result<JsValue, JsError> {
    let result = Renderer::new().render(input);
    serde_wasm_bindgen::to_value(&result.headings).map_err(|e| JsError::new(&e.to_string()))
}

/// Check a document and return diagnostics as JSON.
///
/// Returns a JSON array of `{ severity, message, span, code }` objects.
/// An empty array means every directive is well formed.
#[wasm_bindgen]
pub fn check(input: &str) -> String {
    serde_json::to_string(&stellar_md::check(input)).unwrap_or_else(|_| "[]".to_string())
}

/// The client-side tab switching script, for pages that load it once.
#[wasm_bindgen]
pub fn tab_script() -> String {
    stellar_md::TAB_SCRIPT.to_string()
}
