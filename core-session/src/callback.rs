//! # Callback Resolver
//!
//! Completes the identity provider redirect. The gateway has already set the
//! session cookie by the time the browser lands here, so the resolver never
//! touches the session store: it only updates its display state and
//! navigates. The route guard and verifier take over from there.

use bridge_traits::navigation::{NavigationTarget, Navigator};
use bridge_traits::time::Timer;
use core_runtime::config::SessionConfig;
use core_runtime::events::{CoreEvent, EventBus, NavigationEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::error::{Result, SessionError};

pub const SUCCESS_MESSAGE: &str = "Sign-in successful! Redirecting...";
const FAILURE_PREFIX: &str = "Sign-in failed";

/// Query parameters of the callback landing route. Empty values count as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub token: Option<String>,
    pub user: Option<String>,
    pub error: Option<String>,
    pub auth: Option<String>,
}

impl CallbackParams {
    /// Parse a query string. Accepts a bare query (`a=1&b=2`), one with a
    /// leading `?`, or a full path/URL with a query and fragment.
    pub fn parse(input: &str) -> Self {
        let query = match input.split_once('?') {
            Some((_, query)) => query,
            None if input.contains('=') => input,
            None => "",
        };
        let query = query.split('#').next().unwrap_or(query);

        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "token" => &mut params.token,
                "user" => &mut params.user,
                "error" => &mut params.error,
                "auth" => &mut params.auth,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// Error first, then either success marker, otherwise the direct path.
    pub fn outcome(&self) -> CallbackOutcome {
        if let Some(error) = &self.error {
            return CallbackOutcome::Failed {
                message: format!("{}: {}", FAILURE_PREFIX, error),
            };
        }

        let legacy_token = self.token.is_some() && self.user.is_some();
        let marked = self.auth.as_deref() == Some("success");
        if legacy_token || marked {
            CallbackOutcome::Succeeded
        } else {
            CallbackOutcome::Direct
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Failed { message: String },
    /// Show the success state, wait, then go to the protected landing.
    Succeeded,
    /// Cookie already set server-side; navigate without delay.
    Direct,
}

/// What the callback page displays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CallbackView {
    #[default]
    Processing,
    Success { message: String },
    /// Rendered with a retry action, see [`CallbackResolver::retry`].
    Error { message: String },
}

pub struct CallbackResolver {
    navigator: Arc<dyn Navigator>,
    timer: Arc<dyn Timer>,
    event_bus: EventBus,
    protected_landing: String,
    login_route: String,
    delay: Duration,
    view: watch::Sender<CallbackView>,
}

impl CallbackResolver {
    pub fn new(config: &SessionConfig, event_bus: EventBus) -> Self {
        let (view, _) = watch::channel(CallbackView::Processing);
        Self {
            navigator: Arc::clone(&config.navigator),
            timer: Arc::clone(&config.timer),
            event_bus,
            protected_landing: config.routes.protected_landing.clone(),
            login_route: config.routes.login.clone(),
            delay: config.callback_delay,
            view,
        }
    }

    pub fn view(&self) -> CallbackView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CallbackView> {
        self.view.subscribe()
    }

    /// Resolve the landing URL's query and perform the resulting navigation.
    #[instrument(skip(self, query))]
    pub async fn resolve(&self, query: &str) -> Result<CallbackOutcome> {
        let outcome = CallbackParams::parse(query).outcome();

        match &outcome {
            CallbackOutcome::Failed { message } => {
                warn!(message = %message, "Identity provider reported an error");
                self.view.send_replace(CallbackView::Error {
                    message: message.clone(),
                });
            }
            CallbackOutcome::Succeeded => {
                info!(delay_ms = self.delay.as_millis() as u64, "Sign-in completed");
                self.view.send_replace(CallbackView::Success {
                    message: SUCCESS_MESSAGE.to_string(),
                });
                self.timer.sleep(self.delay).await;
                self.navigate(NavigationTarget::Push(self.protected_landing.clone()), "callback")?;
            }
            CallbackOutcome::Direct => {
                info!("No callback parameters; continuing to protected landing");
                self.navigate(NavigationTarget::Push(self.protected_landing.clone()), "callback")?;
            }
        }

        Ok(outcome)
    }

    /// Retry action offered on the error view.
    pub fn retry(&self) -> Result<()> {
        self.view.send_replace(CallbackView::Processing);
        self.navigate(NavigationTarget::Push(self.login_route.clone()), "callback_retry")
    }

    fn navigate(&self, target: NavigationTarget, reason: &str) -> Result<()> {
        let to = target.location().to_string();
        self.navigator
            .navigate(target)
            .map_err(|e| SessionError::Navigation(e.to_string()))?;
        let _ = self
            .event_bus
            .emit(CoreEvent::Navigation(NavigationEvent::Redirected {
                to,
                reason: reason.to_string(),
            }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes_error_message() {
        let params = CallbackParams::parse("?error=access%20denied+by+user");
        assert_eq!(params.error.as_deref(), Some("access denied by user"));
        assert_eq!(
            params.outcome(),
            CallbackOutcome::Failed {
                message: "Sign-in failed: access denied by user".to_string()
            }
        );
    }

    #[test]
    fn test_parse_accepts_full_urls() {
        let params = CallbackParams::parse("https://app.example.com/auth/callback?auth=success#top");
        assert_eq!(params.auth.as_deref(), Some("success"));
        assert_eq!(params.outcome(), CallbackOutcome::Succeeded);
    }

    #[test]
    fn test_legacy_token_needs_both_fields() {
        assert_eq!(
            CallbackParams::parse("token=t&user=a%40b.com").outcome(),
            CallbackOutcome::Succeeded
        );
        assert_eq!(
            CallbackParams::parse("token=t").outcome(),
            CallbackOutcome::Direct
        );
    }

    #[test]
    fn test_error_wins_over_success_markers() {
        let outcome = CallbackParams::parse("auth=success&error=state_mismatch").outcome();
        assert!(matches!(outcome, CallbackOutcome::Failed { .. }));
    }

    #[test]
    fn test_empty_values_are_ignored() {
        assert_eq!(CallbackParams::parse("?error=&token="), CallbackParams::default());
        assert_eq!(CallbackParams::parse("").outcome(), CallbackOutcome::Direct);
        assert_eq!(
            CallbackParams::parse("/auth/callback").outcome(),
            CallbackOutcome::Direct
        );
    }
}
