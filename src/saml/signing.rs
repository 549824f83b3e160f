//! Signing credentials and algorithm selection
//!
//! Wraps the IdP's certificate/private-key pair together with the chosen
//! signature and digest algorithms. Each Service Provider may independently
//! carry its own certificate; the two sides need not agree on algorithms.

use crate::error::{SamlError, SamlResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::sign::Signer;
use openssl::x509::X509;
use serde::Deserialize;

/// Signature algorithms supported for response signing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureAlgorithm {
    /// RSA with SHA-1
    #[default]
    RsaSha1,
    /// RSA with SHA-256
    RsaSha256,
}

impl SignatureAlgorithm {
    /// XML-DSig algorithm identifier URI
    #[must_use]
    pub fn uri(self) -> &'static str {
        match self {
            SignatureAlgorithm::RsaSha1 => "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            SignatureAlgorithm::RsaSha256 => {
                "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"
            }
        }
    }

    fn message_digest(self) -> MessageDigest {
        match self {
            SignatureAlgorithm::RsaSha1 => MessageDigest::sha1(),
            SignatureAlgorithm::RsaSha256 => MessageDigest::sha256(),
        }
    }
}

/// Digest algorithms supported for reference digests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlgorithm {
    /// SHA-1
    #[default]
    Sha1,
    /// SHA-256
    Sha256,
}

impl DigestAlgorithm {
    /// XML-DSig digest method URI
    #[must_use]
    pub fn uri(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "http://www.w3.org/2000/09/xmldsig#sha1",
            DigestAlgorithm::Sha256 => "http://www.w3.org/2001/04/xmlenc#sha256",
        }
    }

    /// Compute the digest of `data`
    pub fn digest(self, data: &[u8]) -> SamlResult<Vec<u8>> {
        let md = match self {
            DigestAlgorithm::Sha1 => MessageDigest::sha1(),
            DigestAlgorithm::Sha256 => MessageDigest::sha256(),
        };
        openssl::hash::hash(md, data)
            .map(|d| d.to_vec())
            .map_err(|e| SamlError::ResponseGenerationFailed(format!("Digest failed: {e}")))
    }
}

/// The IdP's signing capability: certificate + private key bound to a
/// signature algorithm. Read-only after construction and safe to share
/// across concurrent requests.
#[derive(Debug)]
pub struct SigningCredentials {
    certificate: X509,
    private_key: PKey<Private>,
    signature_algorithm: SignatureAlgorithm,
}

impl SigningCredentials {
    /// Load credentials from PEM-encoded certificate and private key
    pub fn from_pem(
        certificate_pem: &str,
        private_key_pem: &str,
        signature_algorithm: SignatureAlgorithm,
    ) -> SamlResult<Self> {
        let certificate = X509::from_pem(certificate_pem.as_bytes())
            .map_err(|e| SamlError::CredentialError(format!("Invalid certificate PEM: {e}")))?;
        let private_key = PKey::private_key_from_pem(private_key_pem.as_bytes())
            .map_err(|e| SamlError::CredentialError(format!("Invalid private key PEM: {e}")))?;

        Ok(Self {
            certificate,
            private_key,
            signature_algorithm,
        })
    }

    /// The configured signature algorithm
    #[must_use]
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    /// Sign `data` with the private key using the configured algorithm
    pub fn sign(&self, data: &[u8]) -> SamlResult<Vec<u8>> {
        let mut signer =
            Signer::new(self.signature_algorithm.message_digest(), &self.private_key)
                .map_err(|e| SamlError::CredentialError(format!("Signer init failed: {e}")))?;
        signer
            .update(data)
            .and_then(|()| signer.sign_to_vec())
            .map_err(|e| SamlError::ResponseGenerationFailed(format!("Signing failed: {e}")))
    }

    /// The certificate as base64 DER, the form embedded in `<ds:X509Certificate>`
    /// and in metadata key descriptors
    pub fn certificate_base64_der(&self) -> SamlResult<String> {
        let der = self
            .certificate
            .to_der()
            .map_err(|e| SamlError::CredentialError(format!("Certificate DER failed: {e}")))?;
        Ok(STANDARD.encode(der))
    }
}
