use core_runtime::logging::redact_email;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, SessionError};

/// Authenticated identity as reported by the gateway.
///
/// Immutable once constructed. Re-verification replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    email: String,
    display_name: String,
    avatar_url: Option<String>,
    provider_id: String,
}

impl User {
    /// Build a user record. An empty email is rejected since it is the
    /// identity key.
    pub fn new(
        email: impl Into<String>,
        display_name: impl Into<String>,
        avatar_url: Option<String>,
        provider_id: impl Into<String>,
    ) -> Result<Self> {
        let email = email.into();
        if email.trim().is_empty() {
            return Err(SessionError::InvalidPayload(
                "user record has no email".to_string(),
            ));
        }

        Ok(Self {
            email,
            display_name: display_name.into(),
            avatar_url: avatar_url.filter(|url| !url.is_empty()),
            provider_id: provider_id.into(),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Email safe to put in logs and events.
    pub fn redacted_email(&self) -> String {
        redact_email(&self.email)
    }
}

/// User record as serialized by the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct UserPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub google_id: String,
}

impl TryFrom<UserPayload> for User {
    type Error = SessionError;

    fn try_from(payload: UserPayload) -> Result<Self> {
        User::new(payload.email, payload.name, payload.picture, payload.google_id)
    }
}

/// `GET /auth/verify` body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VerifyResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserPayload>,
}

/// `GET /auth/google/login` body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginStartResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Who the application believes is using it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not verified yet during this load.
    #[default]
    Unknown,
    Authenticated(User),
    Anonymous,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SessionState::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Unknown => "unknown",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the store handed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// A verification round-trip is outstanding.
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn current_user(&self) -> Option<&User> {
        self.state.user()
    }
}

/// Identifier of one top-level mount of the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountId(Uuid);

impl MountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
