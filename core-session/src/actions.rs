//! User-initiated session commands: starting the identity provider login and
//! logging out.

use bridge_traits::navigation::{NavigationTarget, Navigator};
use core_runtime::events::{CoreEvent, EventBus, NavigationEvent, SessionEvent, SignOutReason};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{Result, SessionError};
use crate::store::SessionStore;
use crate::transport::ApiClient;
use crate::types::LoginStartResponse;

pub struct SessionActions {
    api: Arc<ApiClient>,
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    event_bus: EventBus,
}

impl SessionActions {
    pub fn new(
        api: Arc<ApiClient>,
        store: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            api,
            store,
            navigator,
            event_bus,
        }
    }

    /// Ask the gateway for the identity provider URL and leave the
    /// application for it. Session state is untouched.
    ///
    /// # Errors
    ///
    /// [`SessionError::LoginUnavailable`] when the gateway answers without a
    /// usable URL, transport errors otherwise.
    #[instrument(skip(self))]
    pub async fn start_login(&self) -> Result<()> {
        let path = self.api.config().endpoints.login.clone();
        let body: LoginStartResponse = self.api.get_json(&path).await?;

        let auth_url = match (body.success, body.auth_url) {
            (true, Some(url)) if !url.trim().is_empty() => url,
            _ => {
                let message = body
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "unknown error".to_string());
                warn!(message = %message, "Gateway did not provide a login URL");
                return Err(SessionError::LoginUnavailable(message));
            }
        };

        info!("Redirecting to identity provider");
        let _ = self
            .event_bus
            .emit(CoreEvent::Session(SessionEvent::LoginRedirect));
        self.navigate(NavigationTarget::External(auth_url), "login")
    }

    /// Log out. Always ends `Anonymous` locally, whatever the gateway says.
    ///
    /// Clearing the store supersedes any verification still in flight.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let path = self.api.config().endpoints.logout.clone();
        let result = self.api.post(&path).await;

        // A 401 already went through the interceptor, which cleared the store
        // and reloaded at the public entry.
        let already_redirected = matches!(result, Err(SessionError::AuthenticationLost { .. }));
        if let Err(err) = &result {
            warn!(error = %err, "Logout request failed; clearing local session anyway");
        }

        self.store.clear_user();
        if already_redirected {
            return Ok(());
        }

        info!("Logged out");
        let _ = self
            .event_bus
            .emit(CoreEvent::Session(SessionEvent::SignedOut {
                reason: SignOutReason::Logout,
            }));
        let public_entry = self.api.config().routes.public_entry.clone();
        self.navigate(NavigationTarget::Push(public_entry), "logout")
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
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
    use bridge_traits::time::Timer;
    use core_runtime::config::SessionConfig;
    use crate::types::{SessionState, User};
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedHttpClient {
        responses: Mutex<Vec<BridgeResult<HttpResponse>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpClient for ScriptedHttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses.lock().unwrap().remove(0)
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

    struct NoopTimer;

    #[async_trait]
    impl Timer for NoopTimer {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn actions(
        responses: Vec<BridgeResult<HttpResponse>>,
    ) -> (
        SessionActions,
        Arc<ScriptedHttpClient>,
        Arc<RecordingNavigator>,
        Arc<SessionStore>,
    ) {
        let http = Arc::new(ScriptedHttpClient {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        });
        let navigator = Arc::new(RecordingNavigator::default());
        let config = SessionConfig::builder()
            .gateway_base_url("https://gateway.example.com")
            .http_client(http.clone())
            .navigator(navigator.clone())
            .timer(Arc::new(NoopTimer))
            .build()
            .unwrap();
        let store = Arc::new(SessionStore::new());
        let bus = EventBus::new(16);
        let api = Arc::new(ApiClient::new(Arc::new(config), store.clone(), bus.clone()));
        let actions = SessionActions::new(api, store.clone(), navigator.clone(), bus);
        (actions, http, navigator, store)
    }

    #[tokio::test]
    async fn test_start_login_redirects_to_provider() {
        let (actions, http, navigator, store) = actions(vec![Ok(HttpResponse::new(
            200,
            r#"{"success":true,"auth_url":"https://accounts.google.com/o/oauth2/auth?x=1"}"#,
        ))]);

        actions.start_login().await.unwrap();

        assert_eq!(
            *navigator.targets.lock().unwrap(),
            vec![NavigationTarget::External(
                "https://accounts.google.com/o/oauth2/auth?x=1".to_string()
            )]
        );
        assert_eq!(
            http.requests.lock().unwrap()[0].url,
            "https://gateway.example.com/auth/google/login"
        );
        assert!(store.state().is_unknown());
    }

    #[tokio::test]
    async fn test_start_login_without_url_is_unavailable() {
        let (actions, _, navigator, _) = actions(vec![Ok(HttpResponse::new(
            200,
            r#"{"success":false,"message":"provider disabled"}"#,
        ))]);

        assert_eq!(
            actions.start_login().await.unwrap_err(),
            SessionError::LoginUnavailable("provider disabled".to_string())
        );
        assert!(navigator.targets.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_posts_and_returns_to_public_entry() {
        let (actions, http, navigator, store) =
            actions(vec![Ok(HttpResponse::new(200, r#"{"success":true}"#))]);
        store.set_user(User::new("a@b.com", "A", None, "g").unwrap());

        actions.logout().await.unwrap();

        assert_eq!(http.requests.lock().unwrap()[0].method, HttpMethod::Post);
        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(
            *navigator.targets.lock().unwrap(),
            vec![NavigationTarget::Push("/".to_string())]
        );
    }

    #[tokio::test]
    async fn test_logout_survives_network_failure() {
        let (actions, _, navigator, store) =
            actions(vec![Err(BridgeError::Network("offline".into()))]);
        store.set_user(User::new("a@b.com", "A", None, "g").unwrap());

        actions.logout().await.unwrap();

        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(navigator.targets.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_logout_with_dead_session_navigates_once() {
        let (actions, _, navigator, store) = actions(vec![Ok(HttpResponse::new(401, ""))]);
        store.set_user(User::new("a@b.com", "A", None, "g").unwrap());

        actions.logout().await.unwrap();

        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(
            *navigator.targets.lock().unwrap(),
            vec![NavigationTarget::Reload("/".to_string())]
        );
    }
}
