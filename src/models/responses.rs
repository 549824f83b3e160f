//! Request/response types and boundary-layer HTML rendering

use crate::sp::ResponseContext;
use serde::Deserialize;
use utoipa::IntoParams;

/// Parameters accepted by the login begin step (query or form encoded)
#[derive(Debug, Deserialize, IntoParams)]
pub struct LoginBeginParams {
    #[serde(rename = "SAMLRequest")]
    pub saml_request: Option<String>,
    #[serde(rename = "RelayState")]
    pub relay_state: Option<String>,
}

/// Query parameters accepted by the logout endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct LogoutParams {
    #[serde(rename = "RelayState")]
    pub relay_state: Option<String>,
    pub redirect_to: Option<String>,
}

/// Render the response delivery form.
///
/// With autosubmit the form posts itself on load; otherwise the user
/// confirms with a button.
#[must_use]
pub fn render_response_form(context: &ResponseContext) -> String {
    let relay_input = if context.relay_state.is_empty() {
        String::new()
    } else {
        format!(
            r#"<input type="hidden" name="RelayState" value="{}"/>"#,
            html_escape(&context.relay_state)
        )
    };

    let body_attrs = if context.autosubmit {
        r#" onload="document.forms[0].submit()""#
    } else {
        ""
    };

    let confirm = if context.autosubmit {
        r#"<noscript>
        <p>JavaScript is disabled. Click the button below to continue.</p>
        <input type="submit" value="Continue"/>
    </noscript>"#
            .to_string()
    } else {
        format!(
            r#"<p>Continue to {}.</p>
    <input type="submit" value="Continue"/>"#,
            html_escape(&context.sp_display_name)
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>SAML SSO</title>
</head>
<body{}>
    <form method="POST" action="{}">
        <input type="hidden" name="SAMLResponse" value="{}"/>
        {}
        {}
    </form>
</body>
</html>"#,
        body_attrs,
        html_escape(&context.acs_url),
        html_escape(&context.saml_response),
        relay_input,
        confirm
    )
}

/// Render the generic logged-out page shown when no valid redirect target
/// was supplied
#[must_use]
pub fn render_logged_out_page(idp_entity_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Logged out</title>
</head>
<body>
    <h1>You have been logged out</h1>
    <p>Your session with {} has ended.</p>
</body>
</html>"#,
        html_escape(idp_entity_id)
    )
}

/// HTML escape for XSS prevention
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
