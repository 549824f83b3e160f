//! SAML 2.0 Identity Provider request-handling core
//!
//! This crate implements the IdP side of SP-initiated SSO:
//! - Capturing inbound `AuthnRequest`s and relay state (begin step)
//! - Trial-and-fallback resolution across registered SP handlers
//! - Assertion/Response building with optional XML signing
//! - A non-standard URL-based logout flow
//! - Metadata publishing
//!
//! Authentication itself stays with the host application: it implements
//! [`IdentityProvider`] against its own user store and login UI, registers
//! handler variants in the [`HandlerRegistry`], and mounts
//! [`idp_router`](router::idp_router) into its web stack.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod provider;
pub mod router;
pub mod saml;
pub mod services;
pub mod session;
pub mod sp;

pub use config::{IdpConfig, SpOptions, SpRegistration};
pub use error::{SamlError, SamlResult};
pub use handlers::IdpState;
pub use provider::{IdentityProvider, IdpContext, IdpUser};
pub use router::idp_router;
pub use saml::{DigestAlgorithm, SignatureAlgorithm, SigningCredentials};
pub use services::{Assertion, AuthnRequest, SamlResponse};
pub use session::{InMemorySessionStore, SessionId, SessionStore};
pub use sp::{resolve_login, HandlerRegistry, ResponseContext, SpHandler, StandardSpHandler};
