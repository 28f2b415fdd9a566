//! Convenience helpers for wiring all wasm bridge implementations together.
//!
//! Host shells can use [`build_wasm_bridges`] to construct the browser
//! adapters in one call. The result mirrors the role that the `bridge-desktop`
//! crate plays for native targets, giving wasm builds a single entry point for
//! assembling bridge trait objects.

use std::sync::Arc;

use bridge_traits::{
    error::Result as BridgeResult, http::HttpClient, navigation::Navigator, time::Timer,
};

use crate::{http::WasmHttpClient, navigation::WindowNavigator, timer::GlooTimer};

/// Fully constructed wasm bridge objects ready for injection into the core.
pub struct WasmBridgeSet {
    /// HTTP client powered by browser `fetch`.
    pub http_client: Arc<dyn HttpClient>,
    /// History/Location navigator for the current window.
    pub navigator: Arc<dyn Navigator>,
    /// `setTimeout` delay source.
    pub timer: Arc<dyn Timer>,
}

impl WasmBridgeSet {
    /// Convenience accessor to clone the HTTP client.
    pub fn http(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.http_client)
    }

    /// Convenience accessor to clone the navigator.
    pub fn navigator(&self) -> Arc<dyn Navigator> {
        Arc::clone(&self.navigator)
    }

    /// Convenience accessor to clone the timer.
    pub fn timer(&self) -> Arc<dyn Timer> {
        Arc::clone(&self.timer)
    }
}

/// Build the default wasm bridge stack.
///
/// Hosts should call this during startup (e.g. inside their wasm-bindgen
/// entry point) and pass the returned trait objects into the session
/// controller. Panics are routed to the browser console from here on.
pub fn build_wasm_bridges() -> BridgeResult<WasmBridgeSet> {
    console_error_panic_hook::set_once();

    Ok(WasmBridgeSet {
        http_client: Arc::new(WasmHttpClient::new()?),
        navigator: Arc::new(WindowNavigator::new()?),
        timer: Arc::new(GlooTimer),
    })
}
