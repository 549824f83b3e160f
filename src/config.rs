//! Process-wide IdP configuration
//!
//! Loaded once at startup by the host application (from whatever source it
//! prefers) and shared read-only across requests.

use crate::saml::{DigestAlgorithm, SignatureAlgorithm};
use serde::Deserialize;

/// Identity Provider configuration.
///
/// `certificate` and `private_key` are PEM strings; loading them from files
/// is the host's job. Signing is enabled only when both are present.
#[derive(Debug, Clone, Deserialize)]
pub struct IdpConfig {
    /// External base URL of this IdP, e.g. `https://idp.example.com`
    pub base_url: String,

    /// Automatically post the response form back to the SP once authenticated
    #[serde(default)]
    pub autosubmit: bool,

    /// X509 signing certificate, PEM-encoded
    #[serde(default)]
    pub certificate: Option<String>,

    /// Signing private key, PEM-encoded
    #[serde(default)]
    pub private_key: Option<String>,

    /// Signature algorithm used when signing responses
    #[serde(default)]
    pub signature_algorithm: SignatureAlgorithm,

    /// Digest algorithm used when signing responses
    #[serde(default)]
    pub digest_algorithm: DigestAlgorithm,

    /// Registered Service Providers, in resolution trial order
    #[serde(default)]
    pub service_providers: Vec<SpRegistration>,
}

impl IdpConfig {
    /// Responses are signed iff both the certificate and the private key are
    /// configured and non-empty. With either absent, responses go out
    /// unsigned.
    #[must_use]
    pub fn should_sign_responses(&self) -> bool {
        self.certificate_pem().is_some() && self.private_key_pem().is_some()
    }

    /// The configured certificate, treating an empty string as absent
    #[must_use]
    pub fn certificate_pem(&self) -> Option<&str> {
        self.certificate.as_deref().filter(|c| !c.is_empty())
    }

    /// The configured private key, treating an empty string as absent
    #[must_use]
    pub fn private_key_pem(&self) -> Option<&str> {
        self.private_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// One registered Service Provider: a handler identifier resolved through the
/// [`HandlerRegistry`](crate::sp::HandlerRegistry) plus its construction
/// options.
#[derive(Debug, Clone, Deserialize)]
pub struct SpRegistration {
    /// Registry identifier of the handler implementation
    pub handler: String,

    /// Construction options passed to the handler factory
    pub options: SpOptions,
}

/// Construction options for a Service Provider handler
#[derive(Debug, Clone, Deserialize)]
pub struct SpOptions {
    /// Human-readable name, used in logs and rendered pages
    pub display_name: String,

    /// The SP's entity id; inbound requests must carry this issuer
    pub entity_id: String,

    /// Assertion Consumer Service URL the response is posted to
    pub acs_url: String,

    /// The SP's certificate, PEM-encoded (SP-side signing, independent of
    /// the IdP pair)
    #[serde(default)]
    pub certificate: Option<String>,
}
