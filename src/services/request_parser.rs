//! SAML `AuthnRequest` decoding and parsing

use crate::error::{SamlError, SamlResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::read::DeflateDecoder;
use std::io::Read;

/// Maximum decompressed size for deflate decoding (64 KB) to prevent deflate bomb DoS
const MAX_DECOMPRESSED_SIZE: u64 = 64 * 1024;

/// Maximum encoded size for an inbound `SAMLRequest` value (512 KB)
const MAX_ENCODED_SIZE: usize = 512 * 1024;

/// Maximum length for the `AuthnRequest` ID attribute
const MAX_REQUEST_ID_LENGTH: usize = 256;

/// Maximum length for the Issuer element value
const MAX_ISSUER_LENGTH: usize = 1024;

/// Decoded representation of an inbound `AuthnRequest`
#[derive(Debug, Clone)]
pub struct AuthnRequest {
    /// The `ID` attribute, echoed back as `InResponseTo`
    pub id: String,
    /// The `<Issuer>` content, the requesting SP's entity id
    pub issuer: String,
    /// The `AssertionConsumerServiceURL` attribute
    pub acs_url: String,
    /// The `NameIDPolicy` `Format` attribute, if present
    pub name_id_format: Option<String>,
    /// The `Destination` attribute, if present
    pub destination: Option<String>,
    /// The `ProviderName` attribute, if present
    pub provider_name: Option<String>,
    /// The `IssueInstant` attribute, if present
    pub issue_instant: Option<String>,
}

/// Decodes and parses inbound `SAMLRequest` values
pub struct RequestParser;

impl RequestParser {
    /// Parse an encoded `SAMLRequest` value.
    ///
    /// Accepts both wire forms: base64 + DEFLATE (HTTP-Redirect binding) and
    /// plain base64 (HTTP-POST binding).
    pub fn parse(encoded_request: &str) -> SamlResult<AuthnRequest> {
        let xml = Self::decode(encoded_request)?;
        Self::parse_xml(&xml)
    }

    /// Decode the transport encoding down to the request XML
    fn decode(encoded_request: &str) -> SamlResult<String> {
        if encoded_request.len() > MAX_ENCODED_SIZE {
            return Err(SamlError::InvalidAuthnRequest(format!(
                "Encoded SAMLRequest exceeds maximum size ({} > {} bytes)",
                encoded_request.len(),
                MAX_ENCODED_SIZE
            )));
        }

        let decoded = STANDARD
            .decode(encoded_request.trim())
            .map_err(|e| SamlError::InvalidAuthnRequest(format!("Base64 decode failed: {e}")))?;

        // POST binding carries the XML directly
        if decoded.starts_with(b"<?xml") || decoded.starts_with(b"<") {
            return String::from_utf8(decoded)
                .map_err(|e| SamlError::InvalidAuthnRequest(format!("Invalid UTF-8: {e}")));
        }

        // Redirect binding deflates the XML; inflate with a size cap
        let decoder = DeflateDecoder::new(&decoded[..]);
        let mut xml = String::new();
        decoder
            .take(MAX_DECOMPRESSED_SIZE)
            .read_to_string(&mut xml)
            .map_err(|e| SamlError::InvalidAuthnRequest(format!("Deflate decode failed: {e}")))?;

        if xml.len() as u64 >= MAX_DECOMPRESSED_SIZE {
            return Err(SamlError::InvalidAuthnRequest(
                "Decompressed AuthnRequest exceeds maximum size limit (64 KB)".to_string(),
            ));
        }

        Ok(xml)
    }

    /// Parse `AuthnRequest` XML
    pub fn parse_xml(xml: &str) -> SamlResult<AuthnRequest> {
        use quick_xml::events::Event;
        use quick_xml::Reader;

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut id = None;
        let mut issuer = None;
        let mut acs_url = None;
        let mut name_id_format = None;
        let mut destination = None;
        let mut provider_name = None;
        let mut issue_instant = None;
        let mut in_issuer = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e) | Event::Empty(e)) => {
                    let name = e.local_name();
                    let name_str = std::str::from_utf8(name.as_ref()).unwrap_or("");

                    match name_str {
                        "AuthnRequest" => {
                            for attr in e.attributes().flatten() {
                                let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
                                let value = attr.unescape_value().unwrap_or_default();

                                match key {
                                    "ID" => id = Some(value.to_string()),
                                    "AssertionConsumerServiceURL" => {
                                        acs_url = Some(value.to_string());
                                    }
                                    "Destination" => destination = Some(value.to_string()),
                                    "ProviderName" => provider_name = Some(value.to_string()),
                                    "IssueInstant" => issue_instant = Some(value.to_string()),
                                    _ => {}
                                }
                            }
                        }
                        "Issuer" => {
                            in_issuer = true;
                        }
                        "NameIDPolicy" => {
                            for attr in e.attributes().flatten() {
                                let key = std::str::from_utf8(attr.key.as_ref()).unwrap_or("");
                                if key == "Format" {
                                    name_id_format =
                                        Some(attr.unescape_value().unwrap_or_default().to_string());
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Text(e)) => {
                    if in_issuer {
                        issuer = Some(e.unescape().unwrap_or_default().to_string());
                    }
                }
                Ok(Event::End(e)) => {
                    let local_name = e.local_name();
                    let name = std::str::from_utf8(local_name.as_ref()).unwrap_or("");
                    if name == "Issuer" {
                        in_issuer = false;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(SamlError::InvalidAuthnRequest(format!(
                        "XML parse error: {e}"
                    )));
                }
                _ => {}
            }
        }

        let id = id
            .ok_or_else(|| SamlError::InvalidAuthnRequest("Missing ID attribute".to_string()))?;

        if id.len() > MAX_REQUEST_ID_LENGTH {
            return Err(SamlError::InvalidAuthnRequest(format!(
                "ID attribute exceeds maximum length of {MAX_REQUEST_ID_LENGTH} characters"
            )));
        }

        let issuer = issuer
            .ok_or_else(|| SamlError::InvalidAuthnRequest("Missing Issuer element".to_string()))?;

        if issuer.len() > MAX_ISSUER_LENGTH {
            return Err(SamlError::InvalidAuthnRequest(format!(
                "Issuer exceeds maximum length of {MAX_ISSUER_LENGTH} characters"
            )));
        }

        let acs_url = acs_url.ok_or_else(|| {
            SamlError::InvalidAuthnRequest(
                "Missing AssertionConsumerServiceURL attribute".to_string(),
            )
        })?;

        Ok(AuthnRequest {
            id,
            issuer,
            acs_url,
            name_id_format,
            destination,
            provider_name,
            issue_instant,
        })
    }
}
