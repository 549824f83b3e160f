//! Session keys and identity for one login attempt
//!
//! Cookie handling belongs to the host; the core only sees an opaque
//! per-browser [`SessionId`] installed by host middleware.

use thiserror::Error;

/// Session key holding the captured `SAMLRequest` between begin and process
pub const SAML_REQUEST_KEY: &str = "SAMLRequest";

/// Session key holding the captured `RelayState` between begin and process
pub const RELAY_STATE_KEY: &str = "RelayState";

/// Opaque identifier for the caller's session, supplied by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session storage errors
#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// Underlying store failure
    #[error("Session storage error: {0}")]
    StorageError(String),
}
