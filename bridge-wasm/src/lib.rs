//! WebAssembly Bridge Implementations
//!
//! This crate provides WebAssembly-compatible implementations of the bridge traits
//! defined in `bridge-traits`. These implementations use browser APIs through
//! `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It will not compile for native targets.
//!
//! # Implementations
//!
//! - `WasmHttpClient`: `fetch` with `credentials` and `AbortController` timeouts
//! - `WindowNavigator`: `history.pushState` / `location.assign`
//! - `GlooTimer`: `setTimeout` delays
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::build_wasm_bridges;
//! use core_runtime::config::SessionConfig;
//! use core_session::SessionController;
//!
//! let bridges = build_wasm_bridges()?;
//! let config = SessionConfig::builder()
//!     .gateway_base_url("https://gateway.example.com")
//!     .http_client(bridges.http())
//!     .navigator(bridges.navigator())
//!     .timer(bridges.timer())
//!     .build()?;
//! let controller = SessionController::new(config);
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod bootstrap;
mod error;
pub mod http;
pub mod navigation;
pub mod timer;

// Re-export commonly used types
pub use bootstrap::{build_wasm_bridges, WasmBridgeSet};
pub use http::WasmHttpClient;
pub use navigation::WindowNavigator;
pub use timer::GlooTimer;
