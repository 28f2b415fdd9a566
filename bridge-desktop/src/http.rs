//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{CredentialsMode, HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Timeout applied when a request does not carry its own.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - A process-wide cookie jar standing in for the browser's cookie store, so a
///   session cookie set by the gateway is replayed on later requests
/// - A second, jar-less client for [`CredentialsMode::Omit`] requests
/// - Per-request timeouts reported as [`BridgeError::Timeout`]
/// - Optional retry with exponential backoff for idempotent requests
pub struct ReqwestHttpClient {
    client: Client,
    anonymous: Client,
    retry_policy: RetryPolicy,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Self::builder(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))?;
        let anonymous = Self::builder(timeout)
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            anonymous,
            retry_policy: RetryPolicy::none(),
        })
    }

    /// Create a new HTTP client from preconfigured reqwest clients.
    ///
    /// `client` is used for credentialed requests and should have a cookie
    /// store enabled.
    pub fn with_clients(client: Client, anonymous: Client) -> Self {
        Self {
            client,
            anonymous,
            retry_policy: RetryPolicy::none(),
        }
    }

    /// Retry policy applied by [`HttpClient::execute`].
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn builder(timeout: Duration) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("session-client/", env!("CARGO_PKG_VERSION")))
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    fn client_for(&self, credentials: CredentialsMode) -> &Client {
        match credentials {
            CredentialsMode::Omit => &self.anonymous,
            // No page origin exists on desktop; the jar is already scoped per host.
            CredentialsMode::SameOrigin | CredentialsMode::Include => &self.client,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self
            .client_for(request.credentials)
            .request(method, &request.url);

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    fn map_error(error: reqwest::Error, request: &HttpRequest) -> BridgeError {
        if error.is_timeout() {
            BridgeError::Timeout(request.timeout.unwrap_or(DEFAULT_TIMEOUT))
        } else if error.is_connect() {
            BridgeError::Network(format!("Connection failed: {}", error))
        } else if error.is_request() || error.is_body() {
            BridgeError::Network(error.to_string())
        } else {
            BridgeError::OperationFailed(error.to_string())
        }
    }

    async fn into_response(
        response: reqwest::Response,
        request: &HttpRequest,
    ) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(e, request))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// Execute request with retry logic.
    ///
    /// Only idempotent requests are retried. Timeouts are never retried since the
    /// request timeout bounds the whole operation from the caller's view. When
    /// retries on a 5xx/429 status are exhausted the last response is returned.
    async fn execute_with_retry_internal(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let max_attempts = if request.method.is_idempotent() {
            policy.max_attempts.max(1)
        } else {
            1
        };
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                attempt,
                max_attempts,
                method = request.method.as_str(),
                url = %request.url,
                credentials = request.credentials.as_str(),
                "Executing HTTP request"
            );

            let retryable = match self.build_request(&request).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let response = Self::into_response(response, &request).await?;
                    if (status >= 500 || status == 429) && attempt < max_attempts {
                        warn!(status, attempt, "HTTP request failed with retryable status");
                        true
                    } else {
                        return Ok(response);
                    }
                }
                Err(e) => {
                    let error = Self::map_error(e, &request);
                    warn!(error = %error, attempt, "HTTP request failed");
                    if matches!(error, BridgeError::Network(_)) && attempt < max_attempts {
                        true
                    } else {
                        return Err(error);
                    }
                }
            };

            if retryable {
                let delay = policy.delay_for(attempt);
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                sleep(delay).await;
            }
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_with_retry(request, self.retry_policy.clone())
            .await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        self.execute_with_retry_internal(request, policy).await
    }
}
