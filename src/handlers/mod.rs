//! HTTP orchestration for the login, logout, and metadata flows

pub mod login;
pub mod logout;
pub mod metadata;

pub use login::{login_begin, login_begin_post, login_process};
pub use logout::logout;
pub use metadata::get_metadata;

use crate::config::IdpConfig;
use crate::error::SamlResult;
use crate::provider::{IdentityProvider, IdpContext};
use crate::session::SessionStore;
use crate::sp::HandlerRegistry;
use std::sync::Arc;

/// Application state for the IdP endpoints.
///
/// Everything here is read-only after startup except the session store,
/// which is owned by the host.
#[derive(Clone)]
pub struct IdpState {
    pub config: Arc<IdpConfig>,
    pub registry: Arc<HandlerRegistry>,
    pub host: Arc<dyn IdentityProvider>,
    pub sessions: Arc<dyn SessionStore>,
}

impl IdpState {
    #[must_use]
    pub fn new(
        config: Arc<IdpConfig>,
        registry: Arc<HandlerRegistry>,
        host: Arc<dyn IdentityProvider>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            registry,
            host,
            sessions,
        }
    }

    /// Build the per-request IdP context
    pub fn context(&self) -> SamlResult<IdpContext> {
        IdpContext::new(
            Arc::clone(&self.config),
            Arc::clone(&self.registry),
            Arc::clone(&self.host),
        )
    }
}
