//! Name-id format URNs and defaults

/// Email-address name-id format, the only mapping the stock
/// [`IdentityProvider`](crate::provider::IdentityProvider) supports
pub const NAMEID_FORMAT_EMAIL: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:emailAddress";

/// Persistent name-id format
pub const NAMEID_FORMAT_PERSISTENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent";

/// Transient name-id format
pub const NAMEID_FORMAT_TRANSIENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:transient";

/// The format assumed when an `AuthnRequest` carries no `NameIDPolicy`
#[must_use]
pub fn default_nameid_format() -> &'static str {
    NAMEID_FORMAT_EMAIL
}
