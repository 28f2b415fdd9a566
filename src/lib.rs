//! Workspace façade crate.
//!
//! Re-exports the session core so host applications can depend on
//! `session-workspace` alone and pick their platform through features:
//!
//! - `desktop-shims` (default): reqwest, Tokio timer and in-process navigator
//!   are used when the host injects nothing.
//! - `wasm`: browser bridges from `bridge-wasm` are available under
//!   [`wasm`].

pub use bridge_traits as bridge;
pub use core_runtime as runtime;
pub use core_session::*;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use bridge_wasm as wasm;
