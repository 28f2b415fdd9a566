//! # Core Configuration Module
//!
//! Provides configuration management for the session core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `SessionConfig`
//! instance that holds all dependencies and settings for the session state
//! machine. It enforces fail-fast validation: every other behavior depends on
//! the gateway base URL, so its absence is reported immediately and loudly
//! instead of being silently defaulted.
//!
//! ## Required Settings
//!
//! - `gateway_base_url` - Absolute `http`/`https` URL of the gateway
//!   (`GATEWAY_API_URL` when loading from the environment)
//!
//! ## Bridges
//!
//! - `HttpClient` - Credentialed HTTP (desktop default: reqwest with a cookie jar)
//! - `Navigator` - Navigation commands (desktop default: in-process history)
//! - `Timer` - Delays (desktop default: Tokio timer)
//!
//! When the `desktop-shims` feature is enabled, desktop defaults are injected
//! automatically if not provided. Otherwise a missing bridge is reported as
//! [`Error::CapabilityMissing`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::SessionConfig;
//! use std::sync::Arc;
//!
//! let config = SessionConfig::builder()
//!     .gateway_base_url("https://gateway.example.com")
//!     .http_client(Arc::new(MyHttpClient))
//!     .navigator(Arc::new(MyNavigator))
//!     .timer(Arc::new(MyTimer))
//!     .build()?;
//! ```
//!
//! ### From the environment
//!
//! ```ignore
//! let config = SessionConfig::from_env()?
//!     .navigator(navigator)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::SessionConfig;
//!
//! // No gateway URL: fails before anything else is looked at.
//! let config = SessionConfig::builder()
//!     .build()
//!     .expect("Should fail - missing gateway URL");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, Navigator, Timer};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use url::Url;

/// Environment variable holding the gateway base URL.
pub const GATEWAY_URL_ENV: &str = "GATEWAY_API_URL";
/// Environment variable overriding the request timeout, in milliseconds.
pub const REQUEST_TIMEOUT_ENV: &str = "SESSION_REQUEST_TIMEOUT_MS";
/// Environment variable overriding the callback success delay, in milliseconds.
pub const CALLBACK_DELAY_ENV: &str = "SESSION_CALLBACK_DELAY_MS";

/// Upper bound on every gateway request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// How long the callback view shows "success" before moving on.
pub const DEFAULT_CALLBACK_DELAY: Duration = Duration::from_secs(2);

const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_CALLBACK_DELAY: Duration = Duration::from_secs(10);

/// Gateway endpoint paths, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Session verification; 401 here means "not logged in".
    pub verify: String,
    /// Server-side session invalidation.
    pub logout: String,
    /// Identity provider login start.
    pub login: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            verify: "/auth/verify".to_string(),
            logout: "/auth/logout".to_string(),
            login: "/auth/google/login".to_string(),
        }
    }
}

/// Application routes the core navigates between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    /// Unauthenticated landing page; target of every forced redirect.
    pub public_entry: String,
    /// Login page, target of the callback retry action.
    pub login: String,
    /// Identity provider landing route.
    pub callback: String,
    /// Where a completed sign-in ends up.
    pub protected_landing: String,
    /// Routes reachable without a session. Anything else is protected.
    pub public: Vec<String>,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            public_entry: "/".to_string(),
            login: "/login".to_string(),
            callback: "/auth/callback".to_string(),
            protected_landing: "/dashboard".to_string(),
            public: vec![
                "/".to_string(),
                "/login".to_string(),
                "/auth/callback".to_string(),
            ],
        }
    }
}

/// Session core configuration.
///
/// Use [`SessionConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct SessionConfig {
    /// Gateway base URL without a trailing slash
    pub gateway_base_url: String,

    /// Upper bound on every gateway request
    pub request_timeout: Duration,

    /// Delay between the callback success view and the protected landing
    pub callback_delay: Duration,

    /// Gateway endpoint paths
    pub endpoints: Endpoints,

    /// Application routes
    pub routes: Routes,

    /// HTTP client carrying the session cookie
    pub http_client: Arc<dyn HttpClient>,

    /// Host navigation
    pub navigator: Arc<dyn Navigator>,

    /// Delay source
    pub timer: Arc<dyn Timer>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("gateway_base_url", &self.gateway_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("callback_delay", &self.callback_delay)
            .field("endpoints", &self.endpoints)
            .field("routes", &self.routes)
            .field("http_client", &"HttpClient { ... }")
            .field("navigator", &"Navigator { ... }")
            .field("timer", &"Timer { ... }")
            .finish()
    }
}

impl SessionConfig {
    /// Creates a new builder for constructing a `SessionConfig`.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Builder pre-populated from the process environment.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigurationMissing`] when `GATEWAY_API_URL` is unset or
    /// blank, [`Error::Config`] when an optional override is not a number.
    pub fn from_env() -> Result<SessionConfigBuilder> {
        SessionConfigBuilder::from_lookup(|key| std::env::var(key).ok())
    }

    /// Absolute URL of a gateway endpoint path.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.gateway_base_url, path)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The base URL is an absolute http(s) URL
    /// - Request timeout is in (0, 120 s]
    /// - Callback delay is at most 10 s
    /// - Every route and endpoint path starts with `/`
    /// - The public entry and login route are on the public allow-list
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.gateway_base_url).map_err(|e| {
            Error::Config(format!(
                "Gateway base URL '{}' is not a valid URL: {}",
                self.gateway_base_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Gateway base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout > MAX_REQUEST_TIMEOUT {
            return Err(Error::Config(
                "Request timeout exceeds maximum of 120 seconds".to_string(),
            ));
        }
        if self.callback_delay > MAX_CALLBACK_DELAY {
            return Err(Error::Config(
                "Callback delay exceeds maximum of 10 seconds".to_string(),
            ));
        }

        let paths = [
            ("verify endpoint", &self.endpoints.verify),
            ("logout endpoint", &self.endpoints.logout),
            ("login endpoint", &self.endpoints.login),
            ("public entry route", &self.routes.public_entry),
            ("login route", &self.routes.login),
            ("callback route", &self.routes.callback),
            ("protected landing route", &self.routes.protected_landing),
        ];
        for (name, path) in paths
            .into_iter()
            .chain(self.routes.public.iter().map(|p| ("public route", p)))
        {
            if !path.starts_with('/') {
                return Err(Error::Config(format!(
                    "The {} must start with '/', got '{}'",
                    name, path
                )));
            }
        }

        for (name, route) in [
            ("public entry", &self.routes.public_entry),
            ("login", &self.routes.login),
        ] {
            if !self.routes.public.contains(route) {
                return Err(Error::Config(format!(
                    "The {} route '{}' must be on the public route list, \
                     otherwise anonymous visitors are redirected in a loop",
                    name, route
                )));
            }
        }

        Ok(())
    }
}

fn gateway_url_missing_error() -> Error {
    let err = Error::ConfigurationMissing {
        key: GATEWAY_URL_ENV.to_string(),
        message: "The gateway base URL is required and has no default. \
                  Set GATEWAY_API_URL or call .gateway_base_url() on the builder."
            .to_string(),
    };
    error!(key = GATEWAY_URL_ENV, "Gateway base URL is not configured");
    err
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing_error(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout).map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(capability_missing_error(
        "HttpClient",
        "HttpClient implementation is required for gateway calls. \
         Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
         Web: inject bridge_wasm::WasmHttpClient.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_navigator() -> Result<Arc<dyn Navigator>> {
    Ok(Arc::new(bridge_desktop::HistoryNavigator::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_navigator() -> Result<Arc<dyn Navigator>> {
    Err(capability_missing_error(
        "Navigator",
        "Navigator implementation is required for redirects. \
         Desktop: enable the 'desktop-shims' feature to use the default HistoryNavigator. \
         Web: inject bridge_wasm::WindowNavigator.",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_timer() -> Result<Arc<dyn Timer>> {
    Ok(Arc::new(bridge_desktop::TokioTimer))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_timer() -> Result<Arc<dyn Timer>> {
    Err(capability_missing_error(
        "Timer",
        "Timer implementation is required for the sign-in success delay. \
         Desktop: enable the 'desktop-shims' feature to use the default TokioTimer. \
         Web: inject bridge_wasm::GlooTimer.",
    ))
}

/// Builder for constructing [`SessionConfig`] instances.
///
/// Call [`build()`](SessionConfigBuilder::build) once every setting is in
/// place. The builder validates required settings and provides actionable
/// error messages.
#[derive(Default)]
pub struct SessionConfigBuilder {
    gateway_base_url: Option<String>,
    request_timeout: Option<Duration>,
    callback_delay: Option<Duration>,
    endpoints: Option<Endpoints>,
    routes: Option<Routes>,
    http_client: Option<Arc<dyn HttpClient>>,
    navigator: Option<Arc<dyn Navigator>>,
    timer: Option<Arc<dyn Timer>>,
}

impl SessionConfigBuilder {
    /// Builder populated through an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let read_millis = |key: &str| -> Result<Option<Duration>> {
            read(key)
                .map(|raw| {
                    raw.parse::<u64>().map(Duration::from_millis).map_err(|e| {
                        Error::Config(format!("{} must be a number of milliseconds: {}", key, e))
                    })
                })
                .transpose()
        };

        let gateway_base_url = read(GATEWAY_URL_ENV).ok_or_else(gateway_url_missing_error)?;

        Ok(Self {
            gateway_base_url: Some(gateway_base_url),
            request_timeout: read_millis(REQUEST_TIMEOUT_ENV)?,
            callback_delay: read_millis(CALLBACK_DELAY_ENV)?,
            ..Self::default()
        })
    }

    /// Sets the gateway base URL (required).
    ///
    /// A trailing slash is removed so endpoint paths can be appended as-is.
    pub fn gateway_base_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_base_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    ///
    /// Default: 10 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the callback success delay.
    ///
    /// Default: 2 seconds
    pub fn callback_delay(mut self, delay: Duration) -> Self {
        self.callback_delay = Some(delay);
        self
    }

    /// Overrides the gateway endpoint paths.
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Overrides the application routes.
    pub fn routes(mut self, routes: Routes) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// The client must attach the session cookie when asked to
    /// (`CredentialsMode::Include`).
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the navigator implementation.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Sets the timer implementation.
    pub fn timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Builds the final `SessionConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(SessionConfig)` on success, or an error if:
    /// - The gateway base URL is missing ([`Error::ConfigurationMissing`])
    /// - A bridge is missing and no default exists ([`Error::CapabilityMissing`])
    /// - Configuration values are invalid ([`Error::Config`])
    pub fn build(self) -> Result<SessionConfig> {
        let gateway_base_url = self
            .gateway_base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(gateway_url_missing_error)?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(request_timeout)?,
        };

        let navigator = match self.navigator {
            Some(navigator) => navigator,
            None => provide_default_navigator()?,
        };

        let timer = match self.timer {
            Some(timer) => timer,
            None => provide_default_timer()?,
        };

        let config = SessionConfig {
            gateway_base_url,
            request_timeout,
            callback_delay: self.callback_delay.unwrap_or(DEFAULT_CALLBACK_DELAY),
            endpoints: self.endpoints.unwrap_or_default(),
            routes: self.routes.unwrap_or_default(),
            http_client,
            navigator,
            timer,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse, NavigationTarget};
    use std::collections::HashMap;

    struct StubHttpClient;

    #[async_trait]
    impl HttpClient for StubHttpClient {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, BridgeError> {
            Ok(HttpResponse::new(200, ""))
        }
    }

    struct StubNavigator;

    impl Navigator for StubNavigator {
        fn navigate(&self, _target: NavigationTarget) -> std::result::Result<(), BridgeError> {
            Ok(())
        }
    }

    struct StubTimer;

    #[async_trait]
    impl Timer for StubTimer {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn builder() -> SessionConfigBuilder {
        SessionConfig::builder()
            .gateway_base_url("https://gateway.example.com/")
            .http_client(Arc::new(StubHttpClient))
            .navigator(Arc::new(StubNavigator))
            .timer(Arc::new(StubTimer))
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_builder_applies_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.gateway_base_url, "https://gateway.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.callback_delay, Duration::from_secs(2));
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(config.routes.public_entry, "/");
        assert_eq!(config.routes.protected_landing, "/dashboard");
        assert_eq!(
            config.routes.public,
            vec!["/", "/login", "/auth/callback"]
        );
        assert_eq!(
            config.endpoint_url(&config.endpoints.verify),
            "https://gateway.example.com/auth/verify"
        );
    }

    #[test]
    fn test_builder_requires_gateway_url() {
        let result = SessionConfig::builder()
            .http_client(Arc::new(StubHttpClient))
            .navigator(Arc::new(StubNavigator))
            .timer(Arc::new(StubTimer))
            .build();

        match result {
            Err(Error::ConfigurationMissing { key, .. }) => assert_eq!(key, GATEWAY_URL_ENV),
            other => panic!("expected ConfigurationMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_gateway_url_counts_as_missing() {
        let result = builder().gateway_base_url("   ").build();
        assert!(matches!(result, Err(Error::ConfigurationMissing { .. })));
    }

    #[test]
    fn test_validate_rejects_relative_or_foreign_urls() {
        assert!(matches!(
            builder().gateway_base_url("gateway.local").build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            builder().gateway_base_url("ftp://gateway.local").build(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        assert!(builder().request_timeout(Duration::ZERO).build().is_err());
        assert!(builder()
            .request_timeout(Duration::from_secs(121))
            .build()
            .is_err());
        assert!(builder()
            .request_timeout(Duration::from_secs(120))
            .build()
            .is_ok());
    }

    #[test]
    fn test_validate_callback_delay_bound() {
        assert!(builder()
            .callback_delay(Duration::from_secs(11))
            .build()
            .is_err());
        assert!(builder().callback_delay(Duration::ZERO).build().is_ok());
    }

    #[test]
    fn test_validate_routes_are_absolute() {
        let routes = Routes {
            protected_landing: "dashboard".to_string(),
            ..Routes::default()
        };
        let err = builder().routes(routes).build().unwrap_err();
        assert!(err.to_string().contains("protected landing route"));
    }

    #[test]
    fn test_validate_public_entry_must_be_public() {
        let routes = Routes {
            public: vec!["/login".to_string()],
            ..Routes::default()
        };
        let err = builder().routes(routes).build().unwrap_err();
        assert!(err.to_string().contains("public entry"));
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let builder = SessionConfigBuilder::from_lookup(lookup(&[
            (GATEWAY_URL_ENV, "http://localhost:8080"),
            (REQUEST_TIMEOUT_ENV, "2500"),
            (CALLBACK_DELAY_ENV, "0"),
        ]))
        .unwrap();

        let config = builder
            .http_client(Arc::new(StubHttpClient))
            .navigator(Arc::new(StubNavigator))
            .timer(Arc::new(StubTimer))
            .build()
            .unwrap();

        assert_eq!(config.gateway_base_url, "http://localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.callback_delay, Duration::ZERO);
    }

    #[test]
    fn test_from_lookup_fails_fast_without_gateway_url() {
        let result = SessionConfigBuilder::from_lookup(lookup(&[(REQUEST_TIMEOUT_ENV, "100")]));
        assert!(matches!(result, Err(Error::ConfigurationMissing { .. })));
    }

    #[test]
    fn test_from_lookup_rejects_non_numeric_overrides() {
        let result = SessionConfigBuilder::from_lookup(lookup(&[
            (GATEWAY_URL_ENV, "http://localhost:8080"),
            (REQUEST_TIMEOUT_ENV, "ten seconds"),
        ]));
        match result {
            Err(Error::Config(message)) => assert!(message.contains(REQUEST_TIMEOUT_ENV)),
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_bridge_is_capability_error() {
        let result = SessionConfig::builder()
            .gateway_base_url("https://gateway.example.com")
            .http_client(Arc::new(StubHttpClient))
            .timer(Arc::new(StubTimer))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "Navigator")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let config = SessionConfig::builder()
            .gateway_base_url("https://gateway.example.com")
            .build()
            .unwrap();

        assert!(config.navigator.current_route().is_none());
    }

    #[test]
    fn test_config_is_cloneable_and_debuggable() {
        let config = builder().build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.gateway_base_url, config.gateway_base_url);
        assert!(format!("{:?}", cloned).contains("HttpClient { ... }"));
    }
}
