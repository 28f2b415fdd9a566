//! # Session Core
//!
//! Client-side authentication state machine for an application that defers
//! identity to a remote gateway holding an httpOnly session cookie.
//!
//! ## Components
//!
//! - [`SessionStore`] - single source of truth for the session state
//! - [`ApiClient`] - credentialed transport with 401 interception
//! - [`SessionVerifier`] - once-per-mount verification
//! - [`RouteGuard`] / [`decide`] - render, placeholder or redirect per route
//! - [`CallbackResolver`] - identity provider landing route
//! - [`SessionActions`] - login start and logout
//! - [`SessionController`] - wires the above together
//!
//! ## State
//!
//! ```text
//!            verify ok                 logout / 401 elsewhere
//! Unknown ───────────────> Authenticated ───────────────────> Anonymous
//!    │                                                           ▲
//!    └──────────── verify 401 / failure ─────────────────────────┘
//! ```

pub mod actions;
pub mod bootstrap;
pub mod callback;
pub mod error;
pub mod guard;
pub mod manager;
pub mod scope;
pub mod store;
pub mod transport;
pub mod types;

pub use actions::SessionActions;
pub use bootstrap::{SessionVerifier, VerificationOutcome};
pub use callback::{CallbackOutcome, CallbackParams, CallbackResolver, CallbackView};
pub use error::{Result, SessionError};
pub use guard::{decide, GuardDecision, RouteClass, RouteGuard, RoutePolicy};
pub use manager::SessionController;
pub use scope::MountScope;
pub use store::{ListenerId, SessionListener, SessionStore, VerificationTicket};
pub use transport::ApiClient;
pub use types::{MountId, SessionSnapshot, SessionState, User};
