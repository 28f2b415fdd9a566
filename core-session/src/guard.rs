//! # Route Guard
//!
//! Decides per navigated view whether to render it, show a loading
//! placeholder or send the visitor to the public entry.
//!
//! Route classification comes first and is a static allow-list: only listed
//! routes are public, everything else (including unknown routes) is
//! protected. [`decide`] is pure; [`RouteGuard::enforce`] performs the
//! redirect it asks for.

use bridge_traits::navigation::{NavigationTarget, Navigator};
use core_runtime::config::Routes;
use core_runtime::events::{CoreEvent, EventBus, NavigationEvent};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Result, SessionError};
use crate::types::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

/// What the host should render for a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not known yet. Neutral placeholder, no protected content.
    ShowLoading,
    Render,
    /// Render nothing while navigating to `to`.
    Redirect { to: String },
}

/// Public allow-list plus the redirect target for anonymous visitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    public: Vec<String>,
    public_entry: String,
}

impl RoutePolicy {
    pub fn new<I, S>(public: I, public_entry: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            public: public
                .into_iter()
                .map(|route| normalize(route.as_ref()).to_string())
                .collect(),
            public_entry: public_entry.into(),
        }
    }

    pub fn from_routes(routes: &Routes) -> Self {
        Self::new(&routes.public, routes.public_entry.clone())
    }

    pub fn public_entry(&self) -> &str {
        &self.public_entry
    }

    pub fn classify(&self, route: &str) -> RouteClass {
        let route = normalize(route);
        if self.public.iter().any(|public| public == route) {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::from_routes(&Routes::default())
    }
}

/// Path part of a route without query, fragment or trailing slash.
fn normalize(route: &str) -> &str {
    let path = route.split(['?', '#']).next().unwrap_or(route);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Guard decision for `route` under `state`.
pub fn decide(policy: &RoutePolicy, state: &SessionState, route: &str) -> GuardDecision {
    let class = policy.classify(route);
    match (state, class) {
        (SessionState::Unknown, _) => GuardDecision::ShowLoading,
        (SessionState::Authenticated(_), _) => GuardDecision::Render,
        (SessionState::Anonymous, RouteClass::Public) => GuardDecision::Render,
        (SessionState::Anonymous, RouteClass::Protected) => GuardDecision::Redirect {
            to: policy.public_entry.clone(),
        },
    }
}

pub struct RouteGuard {
    policy: RoutePolicy,
    navigator: Arc<dyn Navigator>,
    event_bus: EventBus,
}

impl RouteGuard {
    pub fn new(policy: RoutePolicy, navigator: Arc<dyn Navigator>, event_bus: EventBus) -> Self {
        Self {
            policy,
            navigator,
            event_bus,
        }
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    pub fn decide(&self, state: &SessionState, route: &str) -> GuardDecision {
        decide(&self.policy, state, route)
    }

    /// Decide and, for a redirect, replace the current history entry with
    /// the public entry.
    pub fn enforce(&self, state: &SessionState, route: &str) -> Result<GuardDecision> {
        let decision = self.decide(state, route);
        debug!(route, state = state.as_str(), decision = ?decision, "Route guard evaluated");

        if let GuardDecision::Redirect { to } = &decision {
            info!(from = route, to = %to, "Redirecting anonymous visitor away from protected route");
            self.navigator
                .navigate(NavigationTarget::Replace(to.clone()))
                .map_err(|e| SessionError::Navigation(e.to_string()))?;
            let _ = self
                .event_bus
                .emit(CoreEvent::Navigation(NavigationEvent::Redirected {
                    to: to.clone(),
                    reason: "guard".to_string(),
                }));
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::User;
    use bridge_traits::error::Result as BridgeResult;
    use std::sync::Mutex;

    fn authenticated() -> SessionState {
        SessionState::Authenticated(User::new("a@b.com", "A", None, "g").unwrap())
    }

    #[test]
    fn test_classification_is_fail_closed() {
        let policy = RoutePolicy::default();

        assert_eq!(policy.classify("/"), RouteClass::Public);
        assert_eq!(policy.classify("/login/"), RouteClass::Public);
        assert_eq!(policy.classify("/auth/callback?error=x"), RouteClass::Public);
        assert_eq!(policy.classify("/dashboard"), RouteClass::Protected);
        assert_eq!(policy.classify("/never-heard-of-it"), RouteClass::Protected);
        assert_eq!(policy.classify("/login/extra"), RouteClass::Protected);
    }

    #[test]
    fn test_decision_table() {
        let policy = RoutePolicy::default();

        assert_eq!(
            decide(&policy, &SessionState::Unknown, "/dashboard"),
            GuardDecision::ShowLoading
        );
        assert_eq!(
            decide(&policy, &SessionState::Unknown, "/"),
            GuardDecision::ShowLoading
        );
        assert_eq!(
            decide(&policy, &authenticated(), "/dashboard"),
            GuardDecision::Render
        );
        assert_eq!(decide(&policy, &authenticated(), "/login"), GuardDecision::Render);
        assert_eq!(
            decide(&policy, &SessionState::Anonymous, "/dashboard"),
            GuardDecision::Redirect {
                to: "/".to_string()
            }
        );
        assert_eq!(
            decide(&policy, &SessionState::Anonymous, "/login"),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_decision_is_pure() {
        let policy = RoutePolicy::default();
        let states = [SessionState::Unknown, authenticated(), SessionState::Anonymous];
        let routes = ["/", "/login", "/dashboard", "/chat/42", ""];

        for state in &states {
            for route in routes {
                assert_eq!(decide(&policy, state, route), decide(&policy, state, route));
            }
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        targets: Mutex<Vec<NavigationTarget>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, target: NavigationTarget) -> BridgeResult<()> {
            self.targets.lock().unwrap().push(target);
            Ok(())
        }
    }

    #[test]
    fn test_enforce_replaces_history_on_redirect_only() {
        let navigator = Arc::new(RecordingNavigator::default());
        let guard = RouteGuard::new(
            RoutePolicy::default(),
            navigator.clone(),
            EventBus::new(4),
        );

        guard.enforce(&SessionState::Unknown, "/dashboard").unwrap();
        guard.enforce(&authenticated(), "/dashboard").unwrap();
        assert!(navigator.targets.lock().unwrap().is_empty());

        guard.enforce(&SessionState::Anonymous, "/dashboard").unwrap();
        assert_eq!(
            *navigator.targets.lock().unwrap(),
            vec![NavigationTarget::Replace("/".to_string())]
        );
    }
}
