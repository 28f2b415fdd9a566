//! Integration tests for `ReqwestHttpClient` against a local mock gateway.

use bridge_desktop::ReqwestHttpClient;
use bridge_traits::{BridgeError, HttpClient, HttpMethod, HttpRequest, RetryPolicy};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn gateway_with_session_cookie() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/google/callback/redirect"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "session_token=abc123; Path=/; HttpOnly"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .and(header("cookie", "session_token=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "user": { "email": "a@b.com", "name": "A", "picture": null, "google_id": "g-1" }
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn credentialed_requests_replay_the_session_cookie() {
    let server = gateway_with_session_cookie().await;
    let client = ReqwestHttpClient::new().unwrap();

    let before = client
        .execute(
            HttpRequest::new(HttpMethod::Get, format!("{}/auth/verify", server.uri()))
                .with_credentials(),
        )
        .await
        .unwrap();
    assert_eq!(before.status, 401);

    client
        .execute(
            HttpRequest::new(
                HttpMethod::Get,
                format!("{}/auth/google/callback/redirect", server.uri()),
            )
            .with_credentials(),
        )
        .await
        .unwrap();

    let after = client
        .execute(
            HttpRequest::new(HttpMethod::Get, format!("{}/auth/verify", server.uri()))
                .with_credentials()
                .accept_json(),
        )
        .await
        .unwrap();
    assert_eq!(after.status, 200);
    let body: serde_json::Value = after.json().unwrap();
    assert_eq!(body["user"]["email"], "a@b.com");
}

#[tokio::test]
async fn omitted_credentials_do_not_send_the_cookie() {
    let server = gateway_with_session_cookie().await;
    let client = ReqwestHttpClient::new().unwrap();

    client
        .execute(
            HttpRequest::new(
                HttpMethod::Get,
                format!("{}/auth/google/callback/redirect", server.uri()),
            )
            .with_credentials(),
        )
        .await
        .unwrap();

    let response = client
        .execute(HttpRequest::new(
            HttpMethod::Get,
            format!("{}/auth/verify", server.uri()),
        )
        .credentials(bridge_traits::CredentialsMode::Omit))
        .await
        .unwrap();
    assert_eq!(response.status, 401);
}

#[tokio::test]
async fn slow_responses_surface_as_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = ReqwestHttpClient::new().unwrap();
    let result = client
        .execute(
            HttpRequest::new(HttpMethod::Get, format!("{}/auth/verify", server.uri()))
                .timeout(Duration::from_millis(50)),
        )
        .await;

    match result {
        Err(BridgeError::Timeout(after)) => assert_eq!(after, Duration::from_millis(50)),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn error_statuses_are_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReqwestHttpClient::new().unwrap().with_retry_policy(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        use_exponential_backoff: true,
    });

    // POST is never replayed, even with a retry policy in place.
    let response = client
        .execute(HttpRequest::new(
            HttpMethod::Post,
            format!("{}/auth/logout", server.uri()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status, 500);
    assert!(response.is_server_error());
}

#[tokio::test]
async fn idempotent_requests_retry_on_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = ReqwestHttpClient::new().unwrap();
    let response = client
        .execute_with_retry(
            HttpRequest::new(HttpMethod::Get, format!("{}/auth/verify", server.uri())),
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                use_exponential_backoff: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(response.status, 503);
}

#[tokio::test]
async fn unreachable_gateway_is_a_network_failure() {
    let client = ReqwestHttpClient::new().unwrap();
    // Port 9 (discard) is essentially never listening on loopback.
    let result = client
        .execute(
            HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:9/auth/verify")
                .timeout(Duration::from_secs(2)),
        )
        .await;

    assert!(matches!(
        result,
        Err(BridgeError::Network(_)) | Err(BridgeError::Timeout(_))
    ));
}
