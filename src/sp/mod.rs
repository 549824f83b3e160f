//! Service Provider handler contract
//!
//! One handler encapsulates everything specific to a single SP: recognizing
//! its requests, building its response, and describing how the result is
//! delivered. Handler variants are supplied by the host application; the
//! stock [`StandardSpHandler`] covers SPs with no special needs.

pub mod registry;
pub mod resolver;
pub mod standard;

pub use registry::{HandlerFactory, HandlerRegistry, STANDARD_HANDLER};
pub use resolver::resolve_login;
pub use standard::StandardSpHandler;

use crate::config::SpOptions;
use crate::error::{SamlError, SamlResult};
use crate::provider::{IdpContext, IdpUser};
use crate::saml::default_nameid_format;
use crate::services::{Assertion, AssertionBuilder, AuthnRequest, RequestParser, SamlResponse};
use serde::Serialize;
use std::collections::BTreeMap;

/// Rendering-agnostic values the boundary layer hands to its renderer after
/// a successful resolution
#[derive(Debug, Clone, Serialize)]
pub struct ResponseContext {
    /// The IdP's entity id
    pub idp_entity_id: String,
    /// Where the response form is posted
    pub acs_url: String,
    /// The serialized (base64) SAML response
    pub saml_response: String,
    /// Opaque state round-tripped back to the SP
    pub relay_state: String,
    /// Whether the form should submit itself
    pub autosubmit: bool,
    /// Display name of the resolved SP
    pub sp_display_name: String,
}

/// Everything specific to one registered Service Provider.
///
/// The default method bodies implement the standard protocol flow; variants
/// typically override only [`build_assertion`](SpHandler::build_assertion)
/// to inject extra attributes, the way a subclass would.
pub trait SpHandler: Send + Sync {
    /// The construction options this handler was registered with
    fn options(&self) -> &SpOptions;

    /// Human-readable name for logs and rendered pages
    fn display_name(&self) -> &str {
        &self.options().display_name
    }

    /// Decode and parse `raw_request`, accepting it only when it belongs to
    /// this SP.
    ///
    /// An issuer or ACS mismatch fails with `CannotHandleAssertion`; a
    /// payload this handler cannot interpret fails with
    /// `InvalidAuthnRequest`. Both are "not mine" signals to the resolver,
    /// not fatal errors.
    fn parse_authn_request(&self, raw_request: &str) -> SamlResult<AuthnRequest> {
        let request = RequestParser::parse(raw_request)?;

        let options = self.options();
        if request.issuer != options.entity_id {
            return Err(SamlError::CannotHandleAssertion(format!(
                "Issuer {} does not match {}",
                request.issuer, options.entity_id
            )));
        }
        if !urls_match(&request.acs_url, &options.acs_url) {
            return Err(SamlError::CannotHandleAssertion(format!(
                "ACS URL {} does not match {}",
                request.acs_url, options.acs_url
            )));
        }

        Ok(request)
    }

    /// Assemble the assertion for `request`.
    ///
    /// Override to add attribute key/value pairs on top of the default
    /// subject mapping.
    fn build_assertion(
        &self,
        ctx: &IdpContext,
        user: &IdpUser,
        request: &AuthnRequest,
    ) -> SamlResult<Assertion> {
        let name_id_format = request
            .name_id_format
            .clone()
            .unwrap_or_else(|| default_nameid_format().to_string());
        let subject = ctx.user_nameid(user, &name_id_format)?;
        let options = self.options();

        Ok(Assertion {
            subject,
            name_id_format,
            audience: options.entity_id.clone(),
            acs_url: options.acs_url.clone(),
            in_response_to: request.id.clone(),
            attributes: BTreeMap::new(),
        })
    }

    /// Build the response for a parsed request, signed iff the context signs
    /// responses.
    fn make_response(
        &self,
        ctx: &IdpContext,
        user: &IdpUser,
        request: &AuthnRequest,
    ) -> SamlResult<SamlResponse> {
        let assertion = self.build_assertion(ctx, user, request)?;
        let entity_id = ctx.entity_id();
        AssertionBuilder::new(&entity_id, ctx.signer(), ctx.digester())
            .build_response(&assertion)
    }

    /// Named values for the boundary layer's renderer
    fn get_response_context(
        &self,
        ctx: &IdpContext,
        _request: &AuthnRequest,
        response: &SamlResponse,
        relay_state: &str,
    ) -> ResponseContext {
        ResponseContext {
            idp_entity_id: ctx.entity_id(),
            acs_url: self.options().acs_url.clone(),
            saml_response: response.encoded.clone(),
            relay_state: relay_state.to_string(),
            autosubmit: ctx.autosubmit(),
            sp_display_name: self.display_name().to_string(),
        }
    }

    /// Whether `url` is one of this SP's registered redirect targets.
    /// Only consulted by the non-standard logout flow.
    fn is_valid_redirect(&self, url: &str) -> bool {
        urls_match(url, &self.options().acs_url)
    }
}

/// Compare two URLs after normalization: scheme and host case-insensitive,
/// trailing path slash ignored. Falls back to exact comparison for values
/// that do not parse as URLs.
#[must_use]
pub fn urls_match(a: &str, b: &str) -> bool {
    match (normalize_url(a), normalize_url(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

fn normalize_url(url_str: &str) -> Option<String> {
    let parsed = url::Url::parse(url_str).ok()?;

    let mut normalized = format!(
        "{}://{}",
        parsed.scheme().to_lowercase(),
        parsed.host_str()?.to_lowercase()
    );

    if let Some(port) = parsed.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }

    normalized.push_str(parsed.path().trim_end_matches('/'));

    if let Some(query) = parsed.query() {
        normalized.push('?');
        normalized.push_str(query);
    }

    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::urls_match;

    #[test]
    fn urls_match_ignores_host_case_and_trailing_slash() {
        assert!(urls_match(
            "https://SP.Example.com/saml/acs/",
            "https://sp.example.com/saml/acs"
        ));
        assert!(!urls_match(
            "https://sp.example.com/saml/acs/",
            "https://sp.example.com/other/"
        ));
    }

    #[test]
    fn urls_match_keeps_port_and_query_significant() {
        assert!(!urls_match(
            "https://sp.example.com:8443/acs/",
            "https://sp.example.com/acs/"
        ));
        assert!(!urls_match(
            "https://sp.example.com/acs/?next=a",
            "https://sp.example.com/acs/?next=b"
        ));
    }

    #[test]
    fn non_urls_compare_exactly() {
        assert!(urls_match("not-a-url", "not-a-url"));
        assert!(!urls_match("not-a-url", "other"));
    }
}
