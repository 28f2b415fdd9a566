//! Navigation Abstraction
//!
//! The core never touches `window.location` or a router directly. It issues
//! navigation commands through the host-provided [`Navigator`], which keeps the
//! session state machine independent of any rendering framework.

use std::fmt;

use crate::error::Result;
use crate::platform::PlatformSendSync;

/// A navigation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// Client-side navigation that adds a history entry.
    Push(String),
    /// Client-side navigation that replaces the current history entry.
    Replace(String),
    /// Full top-level load of an in-app path. Discards all in-memory state,
    /// including the session store.
    Reload(String),
    /// Full top-level redirect to another origin (identity provider).
    External(String),
}

impl NavigationTarget {
    /// Path or URL the command points at.
    pub fn location(&self) -> &str {
        match self {
            NavigationTarget::Push(to)
            | NavigationTarget::Replace(to)
            | NavigationTarget::Reload(to)
            | NavigationTarget::External(to) => to,
        }
    }

    /// Whether the command leaves the current application instance.
    pub fn is_full_page(&self) -> bool {
        matches!(
            self,
            NavigationTarget::Reload(_) | NavigationTarget::External(_)
        )
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            NavigationTarget::Push(_) => "push",
            NavigationTarget::Replace(_) => "replace",
            NavigationTarget::Reload(_) => "reload",
            NavigationTarget::External(_) => "external",
        };
        write!(f, "{} {}", kind, self.location())
    }
}

/// Host navigation capability.
///
/// Implementations:
/// - **Web**: `history.pushState` / `replaceState` / `location.assign`
/// - **Desktop**: in-process route history consumed by the host shell
pub trait Navigator: PlatformSendSync {
    /// Perform a navigation command.
    fn navigate(&self, target: NavigationTarget) -> Result<()>;

    /// The route the application is currently showing, if known.
    fn current_route(&self) -> Option<String> {
        None
    }
}
