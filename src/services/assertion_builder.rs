//! SAML Assertion and Response builder with XML canonicalization

use crate::error::{SamlError, SamlResult};
use crate::saml::{DigestAlgorithm, SigningCredentials};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;
use xml_canonicalization::Canonicalizer;

/// How long an issued assertion stays valid
const ASSERTION_VALIDITY_SECS: i64 = 300;

/// Backdating applied to `NotBefore` to tolerate SP clock skew
const NOT_BEFORE_SKEW_SECS: i64 = 120;

/// The structured outbound answer, assembled by an
/// [`SpHandler`](crate::sp::SpHandler) before rendering.
///
/// `attributes` is an extensible key/value mapping; handler variants add
/// entries by overriding `build_assertion`.
#[derive(Debug, Clone)]
pub struct Assertion {
    /// Name-id value identifying the authenticated user
    pub subject: String,
    /// Name-id format URN for `subject`
    pub name_id_format: String,
    /// Audience restriction, the SP's entity id
    pub audience: String,
    /// Recipient ACS URL
    pub acs_url: String,
    /// The inbound request id, echoed as `InResponseTo`
    pub in_response_to: String,
    /// Extra attribute statements, rendered in key order
    pub attributes: BTreeMap<String, String>,
}

/// A rendered SAML Response
#[derive(Debug, Clone)]
pub struct SamlResponse {
    /// Generated response id
    pub id: String,
    /// The response document
    pub xml: String,
    /// Base64 form of `xml`, ready for the `SAMLResponse` form field
    pub encoded: String,
    /// Whether a signature element was embedded
    pub signed: bool,
}

/// Builds and optionally signs SAML Response documents
pub struct AssertionBuilder<'a> {
    idp_entity_id: &'a str,
    signer: Option<&'a SigningCredentials>,
    digester: DigestAlgorithm,
}

impl<'a> AssertionBuilder<'a> {
    /// Create a builder. `signer` is `None` when the IdP emits unsigned
    /// responses.
    pub fn new(
        idp_entity_id: &'a str,
        signer: Option<&'a SigningCredentials>,
        digester: DigestAlgorithm,
    ) -> Self {
        Self {
            idp_entity_id,
            signer,
            digester,
        }
    }

    /// Render `assertion` into a Response document, signing it when a signer
    /// is configured.
    pub fn build_response(&self, assertion: &Assertion) -> SamlResult<SamlResponse> {
        let response_id = format!("_resp_{}", Uuid::new_v4());
        let assertion_id = format!("_assert_{}", Uuid::new_v4());
        let now = Utc::now();
        let not_before = now - Duration::seconds(NOT_BEFORE_SKEW_SECS);
        let not_on_or_after = now + Duration::seconds(ASSERTION_VALIDITY_SECS);

        let response_xml = self.build_response_xml(
            &response_id,
            &assertion_id,
            assertion,
            now,
            not_before,
            not_on_or_after,
        );

        let (final_response, signed) = match self.signer {
            Some(signer) => (
                self.sign_response(&response_xml, &assertion_id, signer)?,
                true,
            ),
            None => (response_xml, false),
        };

        let encoded = STANDARD.encode(final_response.as_bytes());

        Ok(SamlResponse {
            id: response_id,
            xml: final_response,
            encoded,
            signed,
        })
    }

    fn build_response_xml(
        &self,
        response_id: &str,
        assertion_id: &str,
        assertion: &Assertion,
        issue_instant: DateTime<Utc>,
        not_before: DateTime<Utc>,
        not_on_or_after: DateTime<Utc>,
    ) -> String {
        let issue_instant_str = issue_instant.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let not_before_str = not_before.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let not_on_or_after_str = not_on_or_after.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let session_index = format!("_session_{}", Uuid::new_v4());
        let attributes_xml = build_attributes_xml(&assertion.attributes);

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<samlp:Response xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\"\n");
        xml.push_str("    xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\"\n");
        xml.push_str("    ID=\"");
        xml.push_str(&xml_escape(response_id));
        xml.push_str("\"\n    Version=\"2.0\"\n    IssueInstant=\"");
        xml.push_str(&issue_instant_str);
        xml.push_str("\"\n    Destination=\"");
        xml.push_str(&xml_escape(&assertion.acs_url));
        xml.push_str("\"\n    InResponseTo=\"");
        xml.push_str(&xml_escape(&assertion.in_response_to));
        xml.push_str("\">\n    <saml:Issuer>");
        xml.push_str(&xml_escape(self.idp_entity_id));
        xml.push_str("</saml:Issuer>\n");
        xml.push_str("    <samlp:Status>\n        <samlp:StatusCode Value=\"urn:oasis:names:tc:SAML:2.0:status:Success\"/>\n    </samlp:Status>\n");
        xml.push_str("    <saml:Assertion xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\"\n        ID=\"");
        xml.push_str(&xml_escape(assertion_id));
        xml.push_str("\"\n        Version=\"2.0\"\n        IssueInstant=\"");
        xml.push_str(&issue_instant_str);
        xml.push_str("\">\n        <saml:Issuer>");
        xml.push_str(&xml_escape(self.idp_entity_id));
        xml.push_str("</saml:Issuer>\n        <saml:Subject>\n            <saml:NameID Format=\"");
        xml.push_str(&xml_escape(&assertion.name_id_format));
        xml.push_str("\">");
        xml.push_str(&xml_escape(&assertion.subject));
        xml.push_str("</saml:NameID>\n            <saml:SubjectConfirmation Method=\"urn:oasis:names:tc:SAML:2.0:cm:bearer\">\n                <saml:SubjectConfirmationData\n                    NotOnOrAfter=\"");
        xml.push_str(&not_on_or_after_str);
        xml.push_str("\"\n                    Recipient=\"");
        xml.push_str(&xml_escape(&assertion.acs_url));
        xml.push_str("\"\n                    InResponseTo=\"");
        xml.push_str(&xml_escape(&assertion.in_response_to));
        xml.push_str("\"/>\n            </saml:SubjectConfirmation>\n        </saml:Subject>\n");
        xml.push_str("        <saml:Conditions NotBefore=\"");
        xml.push_str(&not_before_str);
        xml.push_str("\" NotOnOrAfter=\"");
        xml.push_str(&not_on_or_after_str);
        xml.push_str("\">\n            <saml:AudienceRestriction>\n                <saml:Audience>");
        xml.push_str(&xml_escape(&assertion.audience));
        xml.push_str("</saml:Audience>\n            </saml:AudienceRestriction>\n        </saml:Conditions>\n");
        xml.push_str("        <saml:AuthnStatement AuthnInstant=\"");
        xml.push_str(&issue_instant_str);
        xml.push_str("\" SessionIndex=\"");
        xml.push_str(&xml_escape(&session_index));
        xml.push_str("\">\n            <saml:AuthnContext>\n                <saml:AuthnContextClassRef>urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport</saml:AuthnContextClassRef>\n            </saml:AuthnContext>\n        </saml:AuthnStatement>\n");
        xml.push_str(&attributes_xml);
        xml.push_str("\n    </saml:Assertion>\n</samlp:Response>");

        xml
    }

    fn sign_response(
        &self,
        response_xml: &str,
        assertion_id: &str,
        signer: &SigningCredentials,
    ) -> SamlResult<String> {
        let find_pattern = format!("ID=\"{assertion_id}\"");
        let assertion_start = response_xml.find(&find_pattern).ok_or_else(|| {
            SamlError::ResponseGenerationFailed("Cannot find Assertion".to_string())
        })?;

        let after_issuer = response_xml[assertion_start..]
            .find("</saml:Issuer>")
            .map(|pos| assertion_start + pos + "</saml:Issuer>".len())
            .ok_or_else(|| {
                SamlError::ResponseGenerationFailed("Cannot find Issuer".to_string())
            })?;

        let assertion_end = response_xml.find("</saml:Assertion>").ok_or_else(|| {
            SamlError::ResponseGenerationFailed("Cannot find Assertion end".to_string())
        })?;

        // Digest the canonicalized assertion so the SP's verification matches
        let assertion_element_start = response_xml[..assertion_start].rfind('<').unwrap_or(0);
        let assertion_content =
            &response_xml[assertion_element_start..assertion_end + "</saml:Assertion>".len()];
        let canonicalized_assertion = canonicalize_xml(assertion_content)?;

        let digest = self.digester.digest(canonicalized_assertion.as_bytes())?;
        let digest_b64 = STANDARD.encode(digest);

        let mut signed_info = String::new();
        signed_info.push_str("<ds:SignedInfo xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\">");
        signed_info.push_str(
            "<ds:CanonicalizationMethod Algorithm=\"http://www.w3.org/2001/10/xml-exc-c14n#\"/>",
        );
        signed_info.push_str("<ds:SignatureMethod Algorithm=\"");
        signed_info.push_str(signer.signature_algorithm().uri());
        signed_info.push_str("\"/>");
        signed_info.push_str("<ds:Reference URI=\"#");
        signed_info.push_str(assertion_id);
        signed_info.push_str("\">");
        signed_info.push_str("<ds:Transforms>");
        signed_info.push_str(
            "<ds:Transform Algorithm=\"http://www.w3.org/2000/09/xmldsig#enveloped-signature\"/>",
        );
        signed_info
            .push_str("<ds:Transform Algorithm=\"http://www.w3.org/2001/10/xml-exc-c14n#\"/>");
        signed_info.push_str("</ds:Transforms>");
        signed_info.push_str("<ds:DigestMethod Algorithm=\"");
        signed_info.push_str(self.digester.uri());
        signed_info.push_str("\"/>");
        signed_info.push_str("<ds:DigestValue>");
        signed_info.push_str(&digest_b64);
        signed_info.push_str("</ds:DigestValue>");
        signed_info.push_str("</ds:Reference>");
        signed_info.push_str("</ds:SignedInfo>");

        let canonicalized_signed_info = canonicalize_xml(&signed_info)?;
        let signature = signer.sign(canonicalized_signed_info.as_bytes())?;
        let signature_b64 = STANDARD.encode(&signature);
        let certificate_base64 = signer.certificate_base64_der()?;

        let mut signature_xml = String::new();
        signature_xml.push_str("\n        <ds:Signature xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\">\n            ");
        signature_xml.push_str(&signed_info);
        signature_xml.push_str("\n            <ds:SignatureValue>");
        signature_xml.push_str(&signature_b64);
        signature_xml.push_str("</ds:SignatureValue>\n            <ds:KeyInfo>\n                <ds:X509Data>\n                    <ds:X509Certificate>");
        signature_xml.push_str(&certificate_base64);
        signature_xml.push_str("</ds:X509Certificate>\n                </ds:X509Data>\n            </ds:KeyInfo>\n        </ds:Signature>");

        let mut result = String::with_capacity(response_xml.len() + signature_xml.len());
        result.push_str(&response_xml[..after_issuer]);
        result.push_str(&signature_xml);
        result.push_str(&response_xml[after_issuer..]);

        Ok(result)
    }
}

fn build_attributes_xml(attributes: &BTreeMap<String, String>) -> String {
    if attributes.is_empty() {
        return String::new();
    }

    let mut attrs = String::from("        <saml:AttributeStatement>\n");

    for (name, value) in attributes {
        attrs.push_str("            <saml:Attribute Name=\"");
        attrs.push_str(&xml_escape(name));
        attrs.push_str("\">\n");
        attrs.push_str("                <saml:AttributeValue xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:type=\"xs:string\">");
        attrs.push_str(&xml_escape(value));
        attrs.push_str("</saml:AttributeValue>\n");
        attrs.push_str("            </saml:Attribute>\n");
    }

    attrs.push_str("        </saml:AttributeStatement>");
    attrs
}

/// Apply Exclusive XML Canonicalization (C14N) to XML content, as required
/// for signature generation and verification.
fn canonicalize_xml(xml: &str) -> SamlResult<String> {
    let mut output = Vec::new();
    Canonicalizer::read_from_str(xml)
        .write_to_writer(&mut output)
        .canonicalize(false)
        .map_err(|e| {
            SamlError::ResponseGenerationFailed(format!("XML canonicalization failed: {e}"))
        })?;

    String::from_utf8(output).map_err(|e| {
        SamlError::ResponseGenerationFailed(format!("Canonicalized XML is not valid UTF-8: {e}"))
    })
}

/// XML escape special characters
fn xml_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}
