//! IdP metadata document generation

use crate::error::SamlResult;
use crate::saml::NAMEID_FORMAT_EMAIL;

const REDIRECT_BINDING: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect";
const POST_BINDING: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST";

/// Organization details rendered into metadata, when configured
#[derive(Debug, Clone)]
pub struct Organization {
    pub name: String,
    pub display_name: String,
    pub url: String,
}

/// A technical or support contact rendered into metadata
#[derive(Debug, Clone)]
pub struct ContactPerson {
    pub given_name: String,
    pub email: String,
    pub contact_type: String,
}

/// Rendering-agnostic metadata values.
///
/// `certificate` is the base64 DER signing certificate; empty when the IdP
/// has no certificate configured. The document is still complete then, it
/// just carries no key descriptor.
#[derive(Debug, Clone)]
pub struct MetadataContext {
    pub entity_id: String,
    pub certificate: String,
    pub sso_url: String,
    pub slo_url: String,
    pub org: Option<Organization>,
    pub contacts: Vec<ContactPerson>,
}

/// Renders an `EntityDescriptor` with an `IDPSSODescriptor`
pub struct MetadataGenerator {
    context: MetadataContext,
}

impl MetadataGenerator {
    #[must_use]
    pub fn new(context: MetadataContext) -> Self {
        Self { context }
    }

    /// Render the metadata XML document
    pub fn generate(&self) -> SamlResult<String> {
        let ctx = &self.context;

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<md:EntityDescriptor xmlns:md=\"urn:oasis:names:tc:SAML:2.0:metadata\"\n");
        xml.push_str("    xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\"\n");
        xml.push_str("    entityID=\"");
        xml.push_str(&xml_escape(&ctx.entity_id));
        xml.push_str("\">\n");
        xml.push_str("    <md:IDPSSODescriptor WantAuthnRequestsSigned=\"false\" protocolSupportEnumeration=\"urn:oasis:names:tc:SAML:2.0:protocol\">\n");

        if !ctx.certificate.is_empty() {
            xml.push_str("        <md:KeyDescriptor use=\"signing\">\n");
            xml.push_str("            <ds:KeyInfo>\n                <ds:X509Data>\n                    <ds:X509Certificate>");
            xml.push_str(&xml_escape(&ctx.certificate));
            xml.push_str("</ds:X509Certificate>\n                </ds:X509Data>\n            </ds:KeyInfo>\n");
            xml.push_str("        </md:KeyDescriptor>\n");
        }

        xml.push_str("        <md:SingleLogoutService Binding=\"");
        xml.push_str(REDIRECT_BINDING);
        xml.push_str("\" Location=\"");
        xml.push_str(&xml_escape(&ctx.slo_url));
        xml.push_str("\"/>\n");

        xml.push_str("        <md:NameIDFormat>");
        xml.push_str(NAMEID_FORMAT_EMAIL);
        xml.push_str("</md:NameIDFormat>\n");

        for binding in [REDIRECT_BINDING, POST_BINDING] {
            xml.push_str("        <md:SingleSignOnService Binding=\"");
            xml.push_str(binding);
            xml.push_str("\" Location=\"");
            xml.push_str(&xml_escape(&ctx.sso_url));
            xml.push_str("\"/>\n");
        }

        xml.push_str("    </md:IDPSSODescriptor>\n");

        if let Some(org) = &ctx.org {
            xml.push_str("    <md:Organization>\n");
            xml.push_str("        <md:OrganizationName xml:lang=\"en\">");
            xml.push_str(&xml_escape(&org.name));
            xml.push_str("</md:OrganizationName>\n");
            xml.push_str("        <md:OrganizationDisplayName xml:lang=\"en\">");
            xml.push_str(&xml_escape(&org.display_name));
            xml.push_str("</md:OrganizationDisplayName>\n");
            xml.push_str("        <md:OrganizationURL xml:lang=\"en\">");
            xml.push_str(&xml_escape(&org.url));
            xml.push_str("</md:OrganizationURL>\n");
            xml.push_str("    </md:Organization>\n");
        }

        for contact in &ctx.contacts {
            xml.push_str("    <md:ContactPerson contactType=\"");
            xml.push_str(&xml_escape(&contact.contact_type));
            xml.push_str("\">\n");
            xml.push_str("        <md:GivenName>");
            xml.push_str(&xml_escape(&contact.given_name));
            xml.push_str("</md:GivenName>\n");
            xml.push_str("        <md:EmailAddress>");
            xml.push_str(&xml_escape(&contact.email));
            xml.push_str("</md:EmailAddress>\n");
            xml.push_str("    </md:ContactPerson>\n");
        }

        xml.push_str("</md:EntityDescriptor>\n");

        Ok(xml)
    }
}

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
