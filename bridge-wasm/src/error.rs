//! Conversion of JavaScript exceptions into bridge errors.

use bridge_traits::error::BridgeError;
use wasm_bindgen::{JsCast, JsValue};

/// Render a thrown JavaScript value as text.
pub(crate) fn js_message(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        text
    } else if let Some(js_err) = err.dyn_ref::<js_sys::Error>() {
        js_err.message().into()
    } else {
        format!("{err:?}")
    }
}

/// Wrap a JavaScript exception raised while performing `context`.
pub(crate) fn js_error(context: &str, err: JsValue) -> BridgeError {
    BridgeError::OperationFailed(format!("{context}: {}", js_message(&err)))
}

/// `fetch` rejects only when the network layer fails (DNS, CORS, offline).
pub(crate) fn fetch_error(err: JsValue) -> BridgeError {
    BridgeError::Network(js_message(&err))
}
