//! Host capability contract and per-request IdP facade
//!
//! The core never implements authentication itself. The embedding
//! application supplies an [`IdentityProvider`] wired to its own user store
//! and login UI; [`IdpContext`] bundles it with the process-wide
//! configuration for the duration of one request.

use crate::config::{IdpConfig, SpRegistration};
use crate::error::{SamlError, SamlResult};
use crate::saml::{DigestAlgorithm, SigningCredentials, NAMEID_FORMAT_EMAIL};
use crate::services::{MetadataContext, Organization};
use crate::session::SessionId;
use crate::sp::{HandlerRegistry, SpHandler};
use async_trait::async_trait;
use std::sync::Arc;

/// The authenticated user as the host application exposes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpUser {
    pub username: String,
    pub email: String,
}

/// Authentication capability supplied by the host application.
///
/// `login_required` must either return `Ok(())` (the user is authenticated)
/// or fail with [`SamlError::LoginRedirect`] carrying the login page URL.
/// It never returns control silently for an unauthenticated user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Ensure a user is logged in, or abort with a redirect-to-login signal
    async fn login_required(&self, session: &SessionId) -> SamlResult<()>;

    /// Whether a user is currently logged in
    async fn is_user_logged_in(&self, session: &SessionId) -> bool;

    /// Terminate the logged-in user's session
    async fn logout(&self, session: &SessionId) -> SamlResult<()>;

    /// The currently logged-in user
    async fn get_current_user(&self, session: &SessionId) -> SamlResult<IdpUser>;

    /// Map a requested name-id format URN to a value for `user`.
    ///
    /// The default mapping supports only the email-address URN; override to
    /// extend.
    fn get_user_nameid(&self, user: &IdpUser, format: &str) -> SamlResult<String> {
        if format == NAMEID_FORMAT_EMAIL {
            return Ok(self.get_user_email(user));
        }
        Err(SamlError::UnsupportedAttribute(format!(
            "Can't fetch attribute {format} from user"
        )))
    }

    /// The email address for `user`
    fn get_user_email(&self, user: &IdpUser) -> String {
        user.email.clone()
    }
}

/// Per-request facade over the IdP's identity and capabilities.
///
/// Immutable for the request's lifetime; signing credentials are resolved at
/// construction so the signing-enabled invariant holds for the whole request.
pub struct IdpContext {
    config: Arc<IdpConfig>,
    registry: Arc<HandlerRegistry>,
    host: Arc<dyn IdentityProvider>,
    credentials: Option<SigningCredentials>,
}

impl IdpContext {
    /// Build a context for the current request.
    ///
    /// Fails with a credential error when a certificate/key pair is
    /// configured but unloadable. A half-configured pair (only one of the
    /// two) is not an error; it disables signing.
    pub fn new(
        config: Arc<IdpConfig>,
        registry: Arc<HandlerRegistry>,
        host: Arc<dyn IdentityProvider>,
    ) -> SamlResult<Self> {
        let credentials = match (config.certificate_pem(), config.private_key_pem()) {
            (Some(cert), Some(key)) => Some(SigningCredentials::from_pem(
                cert,
                key,
                config.signature_algorithm,
            )?),
            _ => None,
        };

        Ok(Self {
            config,
            registry,
            host,
            credentials,
        })
    }

    /// The unique identifier for this IdP; defaults to its metadata URL
    #[must_use]
    pub fn entity_id(&self) -> String {
        self.metadata_url()
    }

    /// URL of the Single Sign On endpoint (the begin step)
    #[must_use]
    pub fn sso_url(&self) -> String {
        format!("{}/saml/login/", self.base_url())
    }

    /// URL of the process step the begin step redirects to
    #[must_use]
    pub fn login_process_url(&self) -> String {
        format!("{}/saml/login/process/", self.base_url())
    }

    /// URL of the Single Log Out endpoint
    #[must_use]
    pub fn slo_url(&self) -> String {
        format!("{}/saml/logout/", self.base_url())
    }

    /// URL of the metadata document
    #[must_use]
    pub fn metadata_url(&self) -> String {
        format!("{}/saml/metadata.xml", self.base_url())
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// True iff both certificate and private key are configured
    #[must_use]
    pub fn should_sign_responses(&self) -> bool {
        self.credentials.is_some()
    }

    /// The signing capability, present only when signing is enabled
    #[must_use]
    pub fn signer(&self) -> Option<&SigningCredentials> {
        self.credentials.as_ref()
    }

    /// The digest algorithm, always available
    #[must_use]
    pub fn digester(&self) -> DigestAlgorithm {
        self.config.digest_algorithm
    }

    /// Should responses auto-submit back to the SP
    #[must_use]
    pub fn autosubmit(&self) -> bool {
        self.config.autosubmit
    }

    /// Registered Service Providers, in resolution trial order
    #[must_use]
    pub fn service_providers(&self) -> &[SpRegistration] {
        &self.config.service_providers
    }

    /// Construct a handler per registration, lazily and in configuration
    /// order. A registration naming an unknown handler identifier yields an
    /// error item.
    pub fn sp_handlers(
        &self,
    ) -> impl Iterator<Item = SamlResult<Box<dyn SpHandler>>> + '_ {
        self.service_providers()
            .iter()
            .map(|registration| self.registry.build(registration))
    }

    /// Map a name-id format to a value for `user` via the host
    pub fn user_nameid(&self, user: &IdpUser, format: &str) -> SamlResult<String> {
        self.host.get_user_nameid(user, format)
    }

    /// True if any configured handler accepts `url` as a redirect target.
    /// Only consulted by the non-standard logout flow.
    #[must_use]
    pub fn is_valid_redirect(&self, url: &str) -> bool {
        self.sp_handlers()
            .flatten()
            .any(|handler| handler.is_valid_redirect(url))
    }

    /// Values for the metadata document. The certificate field is empty when
    /// no certificate is configured; everything else is always present.
    pub fn metadata_context(&self) -> SamlResult<MetadataContext> {
        let certificate = match &self.credentials {
            Some(credentials) => credentials.certificate_base64_der()?,
            None => String::new(),
        };

        Ok(MetadataContext {
            entity_id: self.entity_id(),
            certificate,
            sso_url: self.sso_url(),
            slo_url: self.slo_url(),
            org: self.organization(),
            contacts: Vec::new(),
        })
    }

    /// Organizational context for metadata; none by default
    fn organization(&self) -> Option<Organization> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saml::SignatureAlgorithm;

    struct NoopProvider;

    #[async_trait]
    impl IdentityProvider for NoopProvider {
        async fn login_required(&self, _session: &SessionId) -> SamlResult<()> {
            Ok(())
        }

        async fn is_user_logged_in(&self, _session: &SessionId) -> bool {
            true
        }

        async fn logout(&self, _session: &SessionId) -> SamlResult<()> {
            Ok(())
        }

        async fn get_current_user(&self, _session: &SessionId) -> SamlResult<IdpUser> {
            Ok(IdpUser {
                username: "alex".to_string(),
                email: "alex@example.com".to_string(),
            })
        }
    }

    fn context_for(config: IdpConfig) -> IdpContext {
        IdpContext::new(
            Arc::new(config),
            Arc::new(HandlerRegistry::with_defaults()),
            Arc::new(NoopProvider),
        )
        .unwrap()
    }

    fn unsigned_config() -> IdpConfig {
        IdpConfig {
            base_url: "https://idp.example.com/".to_string(),
            autosubmit: true,
            certificate: None,
            private_key: None,
            signature_algorithm: SignatureAlgorithm::default(),
            digest_algorithm: DigestAlgorithm::default(),
            service_providers: vec![],
        }
    }

    #[test]
    fn entity_id_defaults_to_metadata_url() {
        let ctx = context_for(unsigned_config());
        assert_eq!(ctx.entity_id(), "https://idp.example.com/saml/metadata.xml");
        assert_eq!(ctx.sso_url(), "https://idp.example.com/saml/login/");
        assert_eq!(ctx.slo_url(), "https://idp.example.com/saml/logout/");
    }

    #[test]
    fn unsigned_context_has_no_signer_but_a_digester() {
        let ctx = context_for(unsigned_config());
        assert!(!ctx.should_sign_responses());
        assert!(ctx.signer().is_none());
        assert_eq!(ctx.digester(), DigestAlgorithm::Sha1);
    }

    #[test]
    fn metadata_context_without_certificate_renders_empty_field() {
        let ctx = context_for(unsigned_config());
        let metadata = ctx.metadata_context().unwrap();
        assert_eq!(metadata.entity_id, "https://idp.example.com/saml/metadata.xml");
        assert!(metadata.certificate.is_empty());
        assert!(!metadata.sso_url.is_empty());
        assert!(!metadata.slo_url.is_empty());
    }

    #[tokio::test]
    async fn default_nameid_mapping_is_email_only() {
        let provider = NoopProvider;
        let user = IdpUser {
            username: "alex".to_string(),
            email: "alex@example.com".to_string(),
        };

        assert_eq!(
            provider.get_user_nameid(&user, NAMEID_FORMAT_EMAIL).unwrap(),
            "alex@example.com"
        );

        let err = provider
            .get_user_nameid(&user, "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent")
            .unwrap_err();
        assert!(matches!(err, SamlError::UnsupportedAttribute(_)));
    }
}
