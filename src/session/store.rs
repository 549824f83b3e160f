//! Session storage for the begin → process step pair
//!
//! The store is a key/value mapping scoped by [`SessionId`]. The in-memory
//! implementation backs tests and single-process deployments; hosts with
//! external session backends implement the trait themselves.

use super::types::{SessionError, SessionId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Key/value session store scoped per browser session
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a value for `key` in `session`
    async fn get(&self, session: &SessionId, key: &str) -> Result<Option<String>, SessionError>;

    /// Write a value for `key` in `session`
    async fn insert(
        &self,
        session: &SessionId,
        key: &str,
        value: String,
    ) -> Result<(), SessionError>;

    /// Delete `key` from `session`
    async fn remove(&self, session: &SessionId, key: &str) -> Result<(), SessionError>;
}

/// In-memory session store
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, HashMap<String, String>>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session: &SessionId, key: &str) -> Result<Option<String>, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session.as_str())
            .and_then(|values| values.get(key).cloned()))
    }

    async fn insert(
        &self,
        session: &SessionId,
        key: &str,
        value: String,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session.as_str().to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, session: &SessionId, key: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if let Some(values) = sessions.get_mut(session.as_str()) {
            values.remove(key);
        }
        Ok(())
    }
}
