//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the session core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (browser, desktop shell, test harness).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP with cookie credentials and timeouts
//! - [`Navigator`](navigation::Navigator) - Client-side and full-page navigation commands
//! - [`Timer`](time::Timer) - Delay source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//! | Web      | `bridge-wasm`       |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing instead of silently substituting a default:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let navigator = builder.navigator
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "Navigator".to_string(),
//!         message: "Inject a Navigator implementation.".to_string(),
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should:
//!
//! - Report timeouts as `BridgeError::Timeout`
//! - Report connection failures as `BridgeError::Network`
//! - Return HTTP error statuses as ordinary responses, not errors
//!
//! ## Thread Safety
//!
//! On native targets every bridge trait requires `Send + Sync`; on `wasm32` the
//! bound is relaxed through [`PlatformSendSync`](platform::PlatformSendSync).

pub mod error;
pub mod http;
pub mod navigation;
pub mod platform;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{CredentialsMode, HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use navigation::{NavigationTarget, Navigator};
pub use time::{LogEntry, LogLevel, LoggerSink, Timer};
