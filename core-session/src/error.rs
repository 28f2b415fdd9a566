use bridge_traits::BridgeError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The verification endpoint reported no session. Expected, not a fault.
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Authentication lost while calling {path}")]
    AuthenticationLost { path: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Required setting missing: {key} - {message}")]
    ConfigurationMissing { key: String, message: String },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),

    #[error("Login unavailable: {0}")]
    LoginUnavailable(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),
}

impl SessionError {
    /// `Unauthenticated` is the normal "not logged in" answer and is never
    /// surfaced to the user.
    pub fn is_expected(&self) -> bool {
        matches!(self, SessionError::Unauthenticated)
    }

    /// Whether the same call may succeed if repeated later.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SessionError::Timeout(_) | SessionError::NetworkFailure(_) => true,
            SessionError::ServerError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<BridgeError> for SessionError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Timeout(after) => SessionError::Timeout(after),
            BridgeError::Network(message) => SessionError::NetworkFailure(message),
            other => SessionError::NetworkFailure(other.to_string()),
        }
    }
}

impl From<core_runtime::Error> for SessionError {
    fn from(err: core_runtime::Error) -> Self {
        match err {
            core_runtime::Error::ConfigurationMissing { key, message } => {
                SessionError::ConfigurationMissing { key, message }
            }
            other => SessionError::Configuration(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
