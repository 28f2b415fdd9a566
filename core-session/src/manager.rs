//! # Session Controller
//!
//! Single entry point the host application holds. Owns the session store and
//! wires the transport, verifier, route guard and actions around it.
//!
//! ## Usage
//!
//! ```no_run
//! use core_runtime::config::SessionConfig;
//! use core_session::{GuardDecision, SessionController};
//!
//! # async fn run(config: SessionConfig) -> core_session::Result<()> {
//! let controller = SessionController::new(config);
//!
//! // Top-level mount of the application shell.
//! let scope = controller.mount();
//! controller.bootstrap(&scope).await;
//!
//! match controller.enforce_guard("/dashboard")? {
//!     GuardDecision::Render => { /* protected content */ }
//!     GuardDecision::ShowLoading => { /* placeholder */ }
//!     GuardDecision::Redirect { .. } => { /* render nothing */ }
//! }
//! # Ok(())
//! # }
//! ```

use core_runtime::config::SessionConfig;
use core_runtime::events::{EventBus, EventStream};
use std::sync::Arc;
use tracing::{debug, error};

use crate::actions::SessionActions;
use crate::bootstrap::{SessionVerifier, VerificationOutcome};
use crate::callback::CallbackResolver;
use crate::error::Result;
use crate::guard::{GuardDecision, RouteGuard, RoutePolicy};
use crate::scope::MountScope;
use crate::store::SessionStore;
use crate::transport::ApiClient;

pub struct SessionController {
    config: Arc<SessionConfig>,
    store: Arc<SessionStore>,
    event_bus: EventBus,
    api: Arc<ApiClient>,
    verifier: SessionVerifier,
    guard: RouteGuard,
    actions: SessionActions,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_event_bus(config, EventBus::default())
    }

    /// Controller publishing on an existing bus.
    pub fn with_event_bus(config: SessionConfig, event_bus: EventBus) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(SessionStore::new());
        let api = Arc::new(ApiClient::new(
            Arc::clone(&config),
            Arc::clone(&store),
            event_bus.clone(),
        ));
        let verifier =
            SessionVerifier::new(Arc::clone(&api), Arc::clone(&store), event_bus.clone());
        let guard = RouteGuard::new(
            RoutePolicy::from_routes(&config.routes),
            Arc::clone(&config.navigator),
            event_bus.clone(),
        );
        let actions = SessionActions::new(
            Arc::clone(&api),
            Arc::clone(&store),
            Arc::clone(&config.navigator),
            event_bus.clone(),
        );

        Self {
            config,
            store,
            event_bus,
            api,
            verifier,
            guard,
            actions,
        }
    }

    /// Controller configured from the process environment.
    ///
    /// # Errors
    ///
    /// [`SessionError::ConfigurationMissing`](crate::SessionError::ConfigurationMissing)
    /// when the gateway URL is not set.
    pub fn from_env() -> Result<Self> {
        let config = SessionConfig::from_env()
            .and_then(|builder| builder.build())
            .map_err(|e| {
                error!(error = %e, "Session configuration rejected");
                e
            })?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    /// Transport for the application's own gateway calls. Shares the 401
    /// interception with the session core.
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Start a top-level mount. Keep the scope alive for as long as the
    /// mount; dropping it discards an outstanding verification.
    pub fn mount(&self) -> MountScope {
        let scope = MountScope::new();
        debug!(mount = %scope.id(), "Mount started");
        scope
    }

    /// Verify the session once for `scope`.
    pub async fn bootstrap(&self, scope: &MountScope) -> VerificationOutcome {
        self.verifier.verify(scope).await
    }

    /// Guard decision for `route` against the current state.
    pub fn guard(&self, route: &str) -> GuardDecision {
        self.guard.decide(&self.store.state(), route)
    }

    /// Guard decision for `route`, performing the redirect if one is needed.
    pub fn enforce_guard(&self, route: &str) -> Result<GuardDecision> {
        self.guard.enforce(&self.store.state(), route)
    }

    /// [`enforce_guard`](Self::enforce_guard) for the route the navigator
    /// reports, or the public entry when it reports none.
    pub fn enforce_current_route(&self) -> Result<GuardDecision> {
        let route = self
            .config
            .navigator
            .current_route()
            .unwrap_or_else(|| self.config.routes.public_entry.clone());
        self.enforce_guard(&route)
    }

    pub fn route_policy(&self) -> &RoutePolicy {
        self.guard.policy()
    }

    pub async fn start_login(&self) -> Result<()> {
        self.actions.start_login().await
    }

    pub async fn logout(&self) -> Result<()> {
        self.actions.logout().await
    }

    /// Resolver for one visit of the callback route.
    pub fn callback_resolver(&self) -> CallbackResolver {
        CallbackResolver::new(&self.config, self.event_bus.clone())
    }
}
