//! WASM bindings for step-reveal annotation.
//!
//! `annotate_html` works anywhere WASM runs, including Workers. The
//! `annotate_document` entry point needs a browser `window` and annotates
//! the live DOM, so a deck can call it once the document has loaded.

use reveal_core::{AnnotationReport, INNER_STEP_CLASS, STRICT_SELECTOR};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Result of annotating an HTML string.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnnotateResult {
    /// The annotated HTML.
    pub html: String,
    /// Step containers with reveal enabled.
    pub steps: usize,
    /// List items matching the pattern.
    pub matched: usize,
    /// Items that gained the inner-step class.
    pub added: usize,
}

/// Annotate inner steps in an HTML document.
///
/// # Arguments
/// * `html` - A complete HTML document
///
/// # Returns
/// A JavaScript object `{ html, steps, matched, added }`.
#[wasm_bindgen]
pub fn annotate_html(html: &str) -> Result<JsValue, JsValue> {
    let result = annotate_html_impl(html);

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn annotate_html_impl(html: &str) -> AnnotateResult {
    let (html, report) = reveal_html::annotate_html(html);
    let AnnotationReport {
        steps,
        matched,
        added,
    } = report;

    AnnotateResult {
        html,
        steps,
        matched,
        added,
    }
}

/// Annotate inner steps in the page's live document.
///
/// Adds the inner-step class through `classList`, which ignores labels that
/// are already present. Returns the number of matching list items.
#[wasm_bindgen]
pub fn annotate_document() -> Result<u32, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document available"))?;

    let items = document.query_selector_all(STRICT_SELECTOR)?;
    for i in 0..items.length() {
        if let Some(element) = items.get(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok()) {
            element.class_list().add_1(INNER_STEP_CLASS)?;
        }
    }

    Ok(items.length())
}
