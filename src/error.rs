//! IdP-specific error types

use crate::session::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Result type for IdP operations
pub type SamlResult<T> = Result<T, SamlError>;

/// Errors raised while handling a SAML login attempt
#[derive(Debug, Error)]
pub enum SamlError {
    /// A handler (or the resolver as a whole) cannot process this request
    #[error("Cannot handle assertion: {0}")]
    CannotHandleAssertion(String),

    /// Invalid or malformed `AuthnRequest`
    #[error("Invalid AuthnRequest: {0}")]
    InvalidAuthnRequest(String),

    /// A requested name-id format has no mapping for the current user
    #[error("Unsupported user attribute: {0}")]
    UnsupportedAttribute(String),

    /// The current user lacks permission to complete the flow
    #[error("User not authorized: {0}")]
    UserNotAuthorized(String),

    /// The user must authenticate first; carries the login page URL
    #[error("Login required, redirecting to {0}")]
    LoginRedirect(String),

    /// A required request parameter was absent or empty
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    /// A required session key was absent at the process step
    #[error("Missing session state: {0}")]
    MissingSessionState(&'static str),

    /// No factory is registered for a configured handler identifier
    #[error("Unknown service provider handler: {0}")]
    UnknownHandler(String),

    /// Certificate or private key could not be loaded
    #[error("Credential error: {0}")]
    CredentialError(String),

    /// Response or assertion generation failed
    #[error("Response generation failed: {0}")]
    ResponseGenerationFailed(String),

    /// Metadata generation failed
    #[error("Metadata generation failed: {0}")]
    MetadataGenerationFailed(String),

    /// Session storage error
    #[error("Session error: {0}")]
    SessionError(#[from] SessionError),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl SamlError {
    /// True for the failures the resolver treats as "try the next handler":
    /// a deliberate not-mine signal, or a malformed payload the handler could
    /// not interpret. Everything else aborts resolution.
    #[must_use]
    pub fn is_not_mine(&self) -> bool {
        matches!(
            self,
            SamlError::CannotHandleAssertion(_) | SamlError::InvalidAuthnRequest(_)
        )
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for SamlError {
    fn into_response(self) -> Response {
        // The redirect-to-login signal is not an error page
        if let SamlError::LoginRedirect(url) = &self {
            return Redirect::to(url).into_response();
        }

        let (status, error_code) = match &self {
            SamlError::CannotHandleAssertion(_) => {
                (StatusCode::BAD_REQUEST, "cannot_handle_assertion")
            }
            SamlError::InvalidAuthnRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            SamlError::UnsupportedAttribute(_) => {
                (StatusCode::BAD_REQUEST, "unsupported_attribute")
            }
            SamlError::UserNotAuthorized(_) => (StatusCode::FORBIDDEN, "user_not_authorized"),
            SamlError::LoginRedirect(_) => unreachable!("handled above"),
            SamlError::MissingParameter(_) => (StatusCode::BAD_REQUEST, "missing_parameter"),
            SamlError::MissingSessionState(_) => {
                (StatusCode::BAD_REQUEST, "missing_session_state")
            }
            SamlError::UnknownHandler(_) => (StatusCode::INTERNAL_SERVER_ERROR, "unknown_handler"),
            SamlError::CredentialError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "credential_error")
            }
            SamlError::ResponseGenerationFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "response_generation_failed",
            ),
            SamlError::MetadataGenerationFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "metadata_generation_failed",
            ),
            SamlError::SessionError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "session_error"),
            SamlError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = match &self {
            SamlError::UserNotAuthorized(msg) => {
                tracing::error!(reason = %msg, "user not authorized");
                self.to_string()
            }
            SamlError::CredentialError(_) => {
                tracing::error!("IdP credential error");
                "A credential error occurred".to_string()
            }
            SamlError::ResponseGenerationFailed(msg) => {
                tracing::error!(reason = %msg, "SAML response generation failed");
                "Response generation failed".to_string()
            }
            SamlError::MetadataGenerationFailed(msg) => {
                tracing::error!(reason = %msg, "SAML metadata generation failed");
                "Metadata generation failed".to_string()
            }
            SamlError::SessionError(e) => {
                tracing::error!(error = %e, "session storage error");
                "A session storage error occurred".to_string()
            }
            SamlError::UnknownHandler(name) => {
                tracing::error!(handler = %name, "unknown service provider handler configured");
                "A configuration error occurred".to_string()
            }
            SamlError::InternalError(msg) => {
                tracing::error!(reason = %msg, "internal error");
                "An internal error occurred".to_string()
            }
            // Safe user-facing messages
            SamlError::CannotHandleAssertion(_)
            | SamlError::InvalidAuthnRequest(_)
            | SamlError::UnsupportedAttribute(_)
            | SamlError::LoginRedirect(_)
            | SamlError::MissingParameter(_)
            | SamlError::MissingSessionState(_) => self.to_string(),
        };

        let body = ErrorResponse {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
