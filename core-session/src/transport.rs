//! # Transport Layer
//!
//! Wraps the host [`HttpClient`] so every gateway call:
//! - carries the ambient session cookie (`credentials: include`)
//! - is bounded by the configured request timeout
//! - negotiates JSON payloads
//!
//! ## Interception
//!
//! A 401 from the verification endpoint is the ordinary "not logged in"
//! answer and comes back as [`SessionError::Unauthenticated`] for the caller
//! to absorb. A 401 from any other endpoint means the session died mid-use:
//! the store is cleared, the application is reloaded at the public entry, and
//! the caller still receives [`SessionError::AuthenticationLost`].

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::navigation::{NavigationTarget, Navigator};
use core_runtime::config::SessionConfig;
use core_runtime::events::{CoreEvent, EventBus, NavigationEvent, SessionEvent, SignOutReason};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::error::{Result, SessionError};
use crate::store::SessionStore;

/// Longest server error body echoed into [`SessionError::ServerError`].
const MAX_ERROR_BODY: usize = 200;

/// Error body shapes the gateway produces.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct ApiClient {
    config: Arc<SessionConfig>,
    http_client: Arc<dyn HttpClient>,
    navigator: Arc<dyn Navigator>,
    store: Arc<SessionStore>,
    event_bus: EventBus,
}

impl ApiClient {
    pub fn new(config: Arc<SessionConfig>, store: Arc<SessionStore>, event_bus: EventBus) -> Self {
        Self {
            http_client: Arc::clone(&config.http_client),
            navigator: Arc::clone(&config.navigator),
            config,
            store,
            event_bus,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Request for a gateway path with credentials, timeout and JSON
    /// negotiation applied.
    pub fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, self.config.endpoint_url(path))
            .with_credentials()
            .timeout(self.config.request_timeout)
            .accept_json()
    }

    /// `GET` a gateway path and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(HttpMethod::Get, path)).await?;
        decode(&response)
    }

    /// `POST` a JSON body and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let request = self
            .request(HttpMethod::Post, path)
            .json(body)
            .map_err(|e| SessionError::InvalidPayload(e.to_string()))?;
        let response = self.send(request).await?;
        decode(&response)
    }

    /// `POST` without a body, ignoring the response payload.
    pub async fn post(&self, path: &str) -> Result<HttpResponse> {
        self.send(self.request(HttpMethod::Post, path)).await
    }

    /// Execute a prepared request and apply the status rules.
    ///
    /// Only 2xx responses are returned. The 401 rule is picked from the
    /// request URL itself.
    #[instrument(skip(self, request), fields(method = request.method.as_str(), url = %request.url))]
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let path = self.gateway_path(&request.url);
        let response = self.http_client.execute(request).await.map_err(|e| {
            let err = SessionError::from(e);
            debug!(error = %err, "Gateway request failed");
            err
        })?;

        if response.is_success() {
            return Ok(response);
        }

        if response.is_unauthorized() {
            if self.is_verification_path(&path) {
                debug!("Verification endpoint reported no session");
                return Err(SessionError::Unauthenticated);
            }
            return Err(self.authentication_lost(&path));
        }

        Err(SessionError::ServerError {
            status: response.status,
            message: error_message(&response),
        })
    }

    /// Path of `url` relative to the gateway base, without query or fragment.
    fn gateway_path(&self, url: &str) -> String {
        match url.strip_prefix(self.config.gateway_base_url.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with(['/', '?', '#']) => {
                match strip_query(rest) {
                    "" => "/".to_string(),
                    path => path.to_string(),
                }
            }
            _ => Url::parse(url)
                .map(|parsed| parsed.path().to_string())
                .unwrap_or_else(|_| strip_query(url).to_string()),
        }
    }

    fn is_verification_path(&self, path: &str) -> bool {
        strip_query(path) == strip_query(&self.config.endpoints.verify)
    }

    /// Session died mid-use: clear local state and force a full reload at
    /// the public entry.
    fn authentication_lost(&self, path: &str) -> SessionError {
        let path = strip_query(path).to_string();
        let public_entry = self.config.routes.public_entry.clone();
        warn!(path = %path, to = %public_entry, "Session rejected by gateway; returning to public entry");

        self.store.clear_user();
        let _ = self
            .event_bus
            .emit(CoreEvent::Session(SessionEvent::AuthenticationLost {
                path: path.clone(),
            }));
        let _ = self
            .event_bus
            .emit(CoreEvent::Session(SessionEvent::SignedOut {
                reason: SignOutReason::SessionExpired,
            }));

        match self
            .navigator
            .navigate(NavigationTarget::Reload(public_entry.clone()))
        {
            Ok(()) => {
                let _ = self
                    .event_bus
                    .emit(CoreEvent::Navigation(NavigationEvent::Redirected {
                        to: public_entry,
                        reason: "session_expired".to_string(),
                    }));
            }
            Err(e) => error!(error = %e, "Forced navigation to public entry failed"),
        }

        SessionError::AuthenticationLost { path }
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body)
        .map_err(|e| SessionError::InvalidPayload(format!("malformed JSON body: {}", e)))
}

fn error_message(response: &HttpResponse) -> String {
    if let Ok(body) = serde_json::from_slice::<ErrorBody>(&response.body) {
        if let Some(message) = body.detail.or(body.message).or(body.error) {
            return message;
        }
    }

    match response.text() {
        Ok(text) if !text.trim().is_empty() => text.trim().chars().take(MAX_ERROR_BODY).collect(),
        _ => format!("HTTP {}", response.status),
    }
}
