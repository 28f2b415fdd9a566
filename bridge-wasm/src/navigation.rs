//! Browser navigation through the History and Location APIs.

use bridge_traits::{
    error::{BridgeError, Result as BridgeResult},
    navigation::{NavigationTarget, Navigator},
};
use tracing::debug;
use wasm_bindgen::JsValue;
use web_sys::{Event, Window};

use crate::error::js_error;

/// [`Navigator`] for the current browser window.
///
/// Client-side commands update the history stack and dispatch a `popstate`
/// event so that routers listening for it re-render. `Reload` and `External`
/// hand the whole page to `location.assign`.
pub struct WindowNavigator {
    window: Window,
}

impl WindowNavigator {
    /// Bind to the current browser window.
    pub fn new() -> BridgeResult<Self> {
        let window =
            web_sys::window().ok_or_else(|| BridgeError::NotAvailable("window".to_string()))?;
        Ok(Self { window })
    }

    fn notify_router(&self) -> BridgeResult<()> {
        let event = Event::new("popstate").map_err(|err| js_error("create popstate", err))?;
        self.window
            .dispatch_event(&event)
            .map_err(|err| js_error("dispatch popstate", err))?;
        Ok(())
    }
}

impl Navigator for WindowNavigator {
    fn navigate(&self, target: NavigationTarget) -> BridgeResult<()> {
        debug!(target = %target, "navigate");
        match &target {
            NavigationTarget::Push(path) => {
                let history = self
                    .window
                    .history()
                    .map_err(|err| js_error("window.history", err))?;
                history
                    .push_state_with_url(&JsValue::NULL, "", Some(path))
                    .map_err(|err| js_error("history.pushState", err))?;
                self.notify_router()
            }
            NavigationTarget::Replace(path) => {
                let history = self
                    .window
                    .history()
                    .map_err(|err| js_error("window.history", err))?;
                history
                    .replace_state_with_url(&JsValue::NULL, "", Some(path))
                    .map_err(|err| js_error("history.replaceState", err))?;
                self.notify_router()
            }
            NavigationTarget::Reload(location) | NavigationTarget::External(location) => self
                .window
                .location()
                .assign(location)
                .map_err(|err| js_error("location.assign", err)),
        }
    }

    fn current_route(&self) -> Option<String> {
        self.window.location().pathname().ok()
    }
}
