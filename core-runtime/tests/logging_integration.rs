//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{
    init_logging, redact_email, redact_if_sensitive, LogFormat, LoggingConfig,
};

#[test]
fn test_pii_redaction_credentials() {
    assert_eq!(
        redact_if_sensitive("set_cookie", "session_token=abc; HttpOnly"),
        "[REDACTED]"
    );
    assert_eq!(redact_if_sensitive("Authorization", "Bearer x"), "[REDACTED]");
}

#[test]
fn test_pii_redaction_emails() {
    let redacted = redact_if_sensitive("user", "user@example.com");

    assert!(redacted.starts_with('u'));
    assert!(!redacted.contains("user@"));
    assert_eq!(redacted, redact_email("user@example.com"));
}

#[test]
fn test_pii_redaction_normal_values() {
    assert_eq!(redact_if_sensitive("status", "401"), "401");
    assert_eq!(redact_if_sensitive("path", "/auth/verify"), "/auth/verify");
}

#[test]
fn test_init_logging_only_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    assert!(init_logging(config.clone()).is_ok());
    assert!(init_logging(config).is_err());
}
