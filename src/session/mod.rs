//! Session state shared between the begin and process steps

pub mod store;
pub mod types;

pub use store::{InMemorySessionStore, SessionStore};
pub use types::{SessionError, SessionId, RELAY_STATE_KEY, SAML_REQUEST_KEY};
