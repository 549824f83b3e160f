//! IdP route definitions

use crate::handlers::{get_metadata, login_begin, login_begin_post, login_process, logout, IdpState};
use axum::{routing::get, Router};

/// Create the IdP router.
///
/// The host mounts this into its application and installs middleware that
/// provides the `SessionId` extension on every request.
pub fn idp_router(state: IdpState) -> Router {
    Router::new()
        .route("/saml/login/", get(login_begin).post(login_begin_post))
        .route("/saml/login/process/", get(login_process))
        .route("/saml/logout/", get(logout))
        .route("/saml/metadata.xml", get(get_metadata))
        .with_state(state)
}
