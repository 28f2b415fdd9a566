//! # Verification Bootstrapper
//!
//! Populates the session store from the gateway's point of view, once per
//! top-level mount.
//!
//! ## Outcomes
//!
//! | Gateway answer                       | Store           |
//! |--------------------------------------|-----------------|
//! | 200 `{success: true, user}`          | `Authenticated` |
//! | 200 `{success: false}` or 401        | `Anonymous`     |
//! | timeout, network, 5xx, bad payload   | `Anonymous` + `error!` log |
//!
//! The loading flag is raised when the request starts and cleared by
//! whichever writer settles the ticket: this verification, a newer one, or a
//! logout that superseded it. When the mount ends first the result is
//! discarded.

use core_runtime::events::{CoreEvent, EventBus, SessionEvent, SignOutReason};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::error::{Result, SessionError};
use crate::scope::MountScope;
use crate::store::SessionStore;
use crate::transport::ApiClient;
use crate::types::{SessionState, User, VerifyResponse};

/// What a call to [`SessionVerifier::verify`] left in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Authenticated(User),
    Anonymous,
    /// The mount ended or a newer writer took over before the result could
    /// be applied.
    Discarded,
}

impl VerificationOutcome {
    fn from_state(state: &SessionState) -> Self {
        match state {
            SessionState::Authenticated(user) => VerificationOutcome::Authenticated(user.clone()),
            SessionState::Anonymous => VerificationOutcome::Anonymous,
            SessionState::Unknown => VerificationOutcome::Discarded,
        }
    }
}

pub struct SessionVerifier {
    api: Arc<ApiClient>,
    store: Arc<SessionStore>,
    event_bus: EventBus,
}

impl SessionVerifier {
    pub fn new(api: Arc<ApiClient>, store: Arc<SessionStore>, event_bus: EventBus) -> Self {
        Self {
            api,
            store,
            event_bus,
        }
    }

    /// Verify the session for `scope`.
    ///
    /// Only the first call per mount issues a request. Later calls wait for
    /// the store to settle and report what it holds. A mount whose result
    /// was superseded by another mount's verification waits for that one;
    /// if it is abandoned and leaves the store `Unknown`, the mount verifies
    /// again.
    #[instrument(skip(self, scope), fields(mount = %scope.id()))]
    pub async fn verify(&self, scope: &MountScope) -> VerificationOutcome {
        if scope.is_cancelled() {
            debug!("Mount already ended; skipping verification");
            return VerificationOutcome::Discarded;
        }

        if !scope.claim_verification() {
            debug!("Verification already issued for this mount");
            return self.settle(scope).await;
        }

        match self.attempt(scope).await {
            Attempt::Applied(outcome) => outcome,
            Attempt::Cancelled => VerificationOutcome::Discarded,
            Attempt::Superseded => {
                let snapshot = self.store.snapshot();
                if !snapshot.loading && !snapshot.state.is_unknown() {
                    // A logout or explicit user change settled the store.
                    VerificationOutcome::Discarded
                } else {
                    self.settle(scope).await
                }
            }
        }
    }

    /// One verification round-trip under a fresh ticket.
    async fn attempt(&self, scope: &MountScope) -> Attempt {
        let ticket = self.store.begin_verification(scope.id());
        let _ = self
            .event_bus
            .emit(CoreEvent::Session(SessionEvent::VerificationStarted));

        let result = tokio::select! {
            biased;
            _ = scope.cancelled() => {
                self.store.abandon_verification(&ticket);
                debug!("Mount ended during verification; result discarded");
                return Attempt::Cancelled;
            }
            result = self.fetch_user() => result,
        };

        let (user, reason) = match result {
            Ok(Some(user)) => (Some(user), None),
            Ok(None) => {
                debug!("Gateway reported an unsuccessful verification");
                (None, Some(SignOutReason::NotAuthenticated))
            }
            Err(err) if err.is_expected() => {
                debug!("No active session");
                (None, Some(SignOutReason::NotAuthenticated))
            }
            Err(err) => {
                error!(error = %err, recoverable = err.is_recoverable(), "Session verification failed");
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Session(SessionEvent::VerificationFailed {
                        message: err.to_string(),
                        recoverable: err.is_recoverable(),
                    }));
                (None, Some(SignOutReason::VerificationFailed))
            }
        };

        if scope.is_cancelled() {
            self.store.abandon_verification(&ticket);
            debug!("Mount ended during verification; result discarded");
            return Attempt::Cancelled;
        }

        if !self.store.complete_verification(&ticket, user.clone()) {
            return Attempt::Superseded;
        }

        let outcome = match (user, reason) {
            (Some(user), _) => {
                info!(email = %user.redacted_email(), "Session verified");
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Session(SessionEvent::SignedIn {
                        email: user.redacted_email(),
                    }));
                VerificationOutcome::Authenticated(user)
            }
            (None, reason) => {
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Session(SessionEvent::SignedOut {
                        reason: reason.unwrap_or(SignOutReason::NotAuthenticated),
                    }));
                VerificationOutcome::Anonymous
            }
        };
        Attempt::Applied(outcome)
    }

    /// `Ok(None)` when the gateway answered but reported no user.
    async fn fetch_user(&self) -> Result<Option<User>> {
        let path = self.api.config().endpoints.verify.clone();
        let body: VerifyResponse = self.api.get_json(&path).await?;

        match (body.success, body.user) {
            (true, Some(payload)) => User::try_from(payload).map(Some),
            (true, None) => Err(SessionError::InvalidPayload(
                "successful verification without a user".to_string(),
            )),
            (false, _) => Ok(None),
        }
    }

    /// Wait until no verification is outstanding. A store still `Unknown`
    /// at that point has nobody working on it, so this mount verifies again.
    async fn settle(&self, scope: &MountScope) -> VerificationOutcome {
        loop {
            let mut rx = self.store.subscribe();
            let state = tokio::select! {
                biased;
                _ = scope.cancelled() => return VerificationOutcome::Discarded,
                settled = rx.wait_for(|snapshot| !snapshot.loading) => match settled {
                    Ok(snapshot) => snapshot.state.clone(),
                    Err(_) => return VerificationOutcome::Discarded,
                },
            };

            if !state.is_unknown() {
                return VerificationOutcome::from_state(&state);
            }

            debug!("Store left unverified by another mount; verifying again");
            match self.attempt(scope).await {
                Attempt::Applied(outcome) => return outcome,
                Attempt::Cancelled => return VerificationOutcome::Discarded,
                Attempt::Superseded => continue,
            }
        }
    }
}

enum Attempt {
    Applied(VerificationOutcome),
    Cancelled,
    /// A newer ticket owns the store.
    Superseded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bridge_traits::navigation::{NavigationTarget, Navigator};
    use bridge_traits::time::Timer;
    use core_runtime::config::SessionConfig;
    use core_runtime::events::EventStream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedHttpClient {
        responses: Mutex<Vec<BridgeResult<HttpResponse>>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpClient for ScriptedHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
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

    struct Fixture {
        verifier: SessionVerifier,
        store: Arc<SessionStore>,
        http: Arc<ScriptedHttpClient>,
        navigator: Arc<RecordingNavigator>,
        bus: EventBus,
    }

    fn fixture(responses: Vec<BridgeResult<HttpResponse>>) -> Fixture {
        let http = Arc::new(ScriptedHttpClient {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
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

        Fixture {
            verifier: SessionVerifier::new(api, store.clone(), bus.clone()),
            store,
            http,
            navigator,
            bus,
        }
    }

    const VERIFIED: &str =
        r#"{"success":true,"user":{"email":"a@b.com","name":"Alice","picture":"https://img/a.png","google_id":"g-1"}}"#;

    #[tokio::test]
    async fn test_successful_verification_authenticates() {
        let fx = fixture(vec![Ok(HttpResponse::new(200, VERIFIED))]);
        let mut events = EventStream::new(fx.bus.subscribe());

        let outcome = fx.verifier.verify(&MountScope::new()).await;

        let user = match outcome {
            VerificationOutcome::Authenticated(user) => user,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(user.display_name(), "Alice");
        assert_eq!(user.avatar_url(), Some("https://img/a.png"));
        assert!(fx.store.state().is_authenticated());
        assert!(!fx.store.is_loading());

        assert!(matches!(
            events.try_recv(),
            Some(Ok(CoreEvent::Session(SessionEvent::VerificationStarted)))
        ));
        assert_eq!(
            events.try_recv().unwrap().unwrap(),
            CoreEvent::Session(SessionEvent::SignedIn {
                email: "a***@b.com".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_success_false_is_anonymous() {
        let fx = fixture(vec![Ok(HttpResponse::new(200, r#"{"success":false}"#))]);
        assert_eq!(
            fx.verifier.verify(&MountScope::new()).await,
            VerificationOutcome::Anonymous
        );
        assert_eq!(fx.store.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_network_failure_is_anonymous_and_reported() {
        let fx = fixture(vec![Err(BridgeError::Network("refused".into()))]);
        let mut events = EventStream::new(fx.bus.subscribe());

        assert_eq!(
            fx.verifier.verify(&MountScope::new()).await,
            VerificationOutcome::Anonymous
        );
        assert!(fx.navigator.targets.lock().unwrap().is_empty());

        let _started = events.try_recv();
        assert!(matches!(
            events.try_recv(),
            Some(Ok(CoreEvent::Session(SessionEvent::VerificationFailed {
                recoverable: true,
                ..
            })))
        ));
        assert_eq!(
            events.try_recv().unwrap().unwrap(),
            CoreEvent::Session(SessionEvent::SignedOut {
                reason: SignOutReason::VerificationFailed
            })
        );
    }

    #[tokio::test]
    async fn test_user_without_email_is_anonymous() {
        let fx = fixture(vec![Ok(HttpResponse::new(
            200,
            r#"{"success":true,"user":{"email":"","name":"Ghost"}}"#,
        ))]);
        assert_eq!(
            fx.verifier.verify(&MountScope::new()).await,
            VerificationOutcome::Anonymous
        );
    }

    #[tokio::test]
    async fn test_second_call_on_same_mount_does_not_refetch() {
        let fx = fixture(vec![Ok(HttpResponse::new(200, VERIFIED))]);
        let scope = MountScope::new();

        let first = fx.verifier.verify(&scope).await;
        let second = fx.verifier.verify(&scope).await;

        assert_eq!(first, second);
        assert_eq!(fx.http.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_mount_skips_request() {
        let fx = fixture(Vec::new());
        let scope = MountScope::new();
        scope.cancel();

        assert_eq!(
            fx.verifier.verify(&scope).await,
            VerificationOutcome::Discarded
        );
        assert_eq!(fx.http.calls.load(Ordering::SeqCst), 0);
        assert!(fx.store.state().is_unknown());
    }
}
