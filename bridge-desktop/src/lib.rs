//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for native hosts
//! (macOS, Windows, Linux) and for integration tests.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` with a cookie jar as the ambient credential store
//! - `Navigator` as an in-process route history
//! - `Timer` using the Tokio timer wheel
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HistoryNavigator, ReqwestHttpClient, TokioTimer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http_client = Arc::new(ReqwestHttpClient::new()?);
//!     let navigator = Arc::new(HistoryNavigator::new());
//!     let timer = Arc::new(TokioTimer);
//!     // Hand the bridges to SessionConfig::builder()
//!     Ok(())
//! }
//! ```

mod http;
mod navigation;
mod timer;

pub use http::ReqwestHttpClient;
pub use navigation::{HistoryNavigator, DEFAULT_HISTORY_LIMIT};
pub use timer::TokioTimer;
