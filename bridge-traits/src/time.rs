//! Timer and Logging Abstractions
//!
//! Provides an injectable delay source and a logging sink so state transitions
//! can be tested deterministically and logs can reach the host console.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::{error::Result, platform::PlatformSendSync};

/// Delay source.
///
/// Native hosts back this with the Tokio timer wheel, browsers with
/// `setTimeout`. Tests substitute an implementation that records the requested
/// duration and returns immediately.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Timer: PlatformSendSync {
    /// Suspend the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Structured log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Target module/component
    pub target: String,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: HashMap<String, String>,
    /// Name of the span the event was recorded in
    pub span_id: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
            span_id: None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }
}

/// Logger sink trait
///
/// Forwards structured logs from the core to host logging pipelines:
/// - **Web**: Console API
/// - **Desktop**: Console, file logs, or system logging
///
/// Implementations must never receive raw credentials: the core only ever logs
/// redacted identities and never sees the session cookie.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait LoggerSink: PlatformSendSync {
    /// Forward a log entry to the host logging system
    async fn log(&self, entry: LogEntry) -> Result<()>;

    /// Flush any buffered logs
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Get the minimum log level that will be processed
    ///
    /// Logs below this level can be filtered out at the source for performance.
    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_log_entry_builder() {
        let entry = LogEntry::new(LogLevel::Info, "core_session", "Session verified")
            .with_field("outcome", "authenticated")
            .with_span_id("verify");

        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.target, "core_session");
        assert_eq!(entry.message, "Session verified");
        assert_eq!(
            entry.fields.get("outcome"),
            Some(&"authenticated".to_string())
        );
        assert_eq!(entry.span_id, Some("verify".to_string()));
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error > LogLevel::Warn);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert_eq!(LogLevel::Warn.as_filter_str(), "warn");
    }

    struct RecordingTimer {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Timer for RecordingTimer {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    #[tokio::test]
    async fn test_timer_is_object_safe() {
        let timer = RecordingTimer {
            slept: Mutex::new(Vec::new()),
        };
        let dyn_timer: &dyn Timer = &timer;
        dyn_timer.sleep(Duration::from_secs(2)).await;

        assert_eq!(*timer.slept.lock().unwrap(), vec![Duration::from_secs(2)]);
    }
}
