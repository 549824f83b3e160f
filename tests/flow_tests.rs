//! Login, logout, and metadata orchestration tests

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use base64::{engine::general_purpose::STANDARD, Engine};
use saml_idp::config::{SpOptions, SpRegistration};
use saml_idp::handlers::login::{login_begin_inner, login_process_inner};
use saml_idp::handlers::logout::logout_inner;
use saml_idp::handlers::metadata::get_metadata_inner;
use saml_idp::models::{LoginBeginParams, LogoutParams};
use saml_idp::session::{RELAY_STATE_KEY, SAML_REQUEST_KEY};
use saml_idp::{
    HandlerRegistry, IdentityProvider, IdpConfig, IdpState, IdpUser, InMemorySessionStore,
    SamlError, SamlResult, SessionId, SessionStore,
};
use std::collections::HashMap;
use std::sync::Arc;

const USER_KEY: &str = "user";

/// Host-side identity provider: users live in a fixed map, the logged-in
/// username under the `user` session key.
struct ExampleProvider {
    sessions: Arc<dyn SessionStore>,
    users: HashMap<String, IdpUser>,
    login_url: String,
}

impl ExampleProvider {
    fn new(sessions: Arc<dyn SessionStore>) -> Self {
        let mut users = HashMap::new();
        users.insert(
            "alex".to_string(),
            IdpUser {
                username: "alex".to_string(),
                email: "alex@example.com".to_string(),
            },
        );
        Self {
            sessions,
            users,
            login_url: "https://idp.example.com/login".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for ExampleProvider {
    async fn login_required(&self, session: &SessionId) -> SamlResult<()> {
        if self.is_user_logged_in(session).await {
            Ok(())
        } else {
            Err(SamlError::LoginRedirect(self.login_url.clone()))
        }
    }

    async fn is_user_logged_in(&self, session: &SessionId) -> bool {
        match self.sessions.get(session, USER_KEY).await {
            Ok(Some(username)) => self.users.contains_key(&username),
            _ => false,
        }
    }

    async fn logout(&self, session: &SessionId) -> SamlResult<()> {
        self.sessions.remove(session, USER_KEY).await?;
        Ok(())
    }

    async fn get_current_user(&self, session: &SessionId) -> SamlResult<IdpUser> {
        let username = self
            .sessions
            .get(session, USER_KEY)
            .await?
            .ok_or_else(|| SamlError::UserNotAuthorized("no user in session".to_string()))?;
        self.users
            .get(&username)
            .cloned()
            .ok_or_else(|| SamlError::UserNotAuthorized(format!("unknown user {username}")))
    }
}

fn sp_registration() -> SpRegistration {
    SpRegistration {
        handler: "standard".to_string(),
        options: SpOptions {
            display_name: "Example Service Provider".to_string(),
            entity_id: "https://sp.example/metadata.xml".to_string(),
            acs_url: "https://sp.example/acs/".to_string(),
            certificate: None,
        },
    }
}

fn test_state(registry: HandlerRegistry) -> (IdpState, Arc<InMemorySessionStore>) {
    let sessions = Arc::new(InMemorySessionStore::new());
    let config = IdpConfig {
        base_url: "https://idp.example.com".to_string(),
        autosubmit: true,
        certificate: None,
        private_key: None,
        signature_algorithm: Default::default(),
        digest_algorithm: Default::default(),
        service_providers: vec![sp_registration()],
    };
    let host = Arc::new(ExampleProvider::new(sessions.clone()));
    let state = IdpState::new(Arc::new(config), Arc::new(registry), host, sessions.clone());
    (state, sessions)
}

async fn log_in(sessions: &InMemorySessionStore, session: &SessionId) {
    sessions
        .insert(session, USER_KEY, "alex".to_string())
        .await
        .unwrap();
}

fn encoded_request() -> String {
    let xml = r#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
        xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
        ID="_req_7" AssertionConsumerServiceURL="https://sp.example/acs/">
        <saml:Issuer>https://sp.example/metadata.xml</saml:Issuer>
    </samlp:AuthnRequest>"#;
    STANDARD.encode(xml)
}

#[tokio::test]
async fn begin_without_saml_request_writes_nothing() {
    let (state, sessions) = test_state(HandlerRegistry::with_defaults());
    let session = SessionId::new("s-1");

    let err = login_begin_inner(
        &state,
        &session,
        LoginBeginParams {
            saml_request: None,
            relay_state: Some("state".to_string()),
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SamlError::MissingParameter("SAMLRequest")));
    assert!(sessions.get(&session, SAML_REQUEST_KEY).await.unwrap().is_none());
    assert!(sessions.get(&session, RELAY_STATE_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn begin_with_empty_saml_request_writes_nothing() {
    let (state, sessions) = test_state(HandlerRegistry::with_defaults());
    let session = SessionId::new("s-1");

    let err = login_begin_inner(
        &state,
        &session,
        LoginBeginParams {
            saml_request: Some(String::new()),
            relay_state: None,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SamlError::MissingParameter("SAMLRequest")));
    assert!(sessions.get(&session, SAML_REQUEST_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn begin_captures_request_and_redirects_to_process() {
    let (state, sessions) = test_state(HandlerRegistry::with_defaults());
    let session = SessionId::new("s-1");

    let redirect = login_begin_inner(
        &state,
        &session,
        LoginBeginParams {
            saml_request: Some(encoded_request()),
            relay_state: None,
        },
    )
    .await
    .unwrap();

    let response = redirect.into_response();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://idp.example.com/saml/login/process/"
    );

    assert_eq!(
        sessions.get(&session, SAML_REQUEST_KEY).await.unwrap(),
        Some(encoded_request())
    );
    // A missing RelayState parameter is captured as the empty string
    assert_eq!(
        sessions.get(&session, RELAY_STATE_KEY).await.unwrap(),
        Some(String::new())
    );
}

#[tokio::test]
async fn process_requires_authentication() {
    let (state, sessions) = test_state(HandlerRegistry::with_defaults());
    let session = SessionId::new("s-1");
    sessions
        .insert(&session, SAML_REQUEST_KEY, encoded_request())
        .await
        .unwrap();
    sessions
        .insert(&session, RELAY_STATE_KEY, String::new())
        .await
        .unwrap();

    let err = login_process_inner(&state, &session).await.unwrap_err();
    assert!(matches!(err, SamlError::LoginRedirect(_)));
}

#[tokio::test]
async fn process_fails_before_resolution_when_session_state_is_missing() {
    // A handler factory that fails loudly: reaching it means resolution ran
    let mut registry = HandlerRegistry::new();
    registry.register("standard", |_options| {
        Err(SamlError::InternalError(
            "resolution should not have started".to_string(),
        ))
    });

    let (state, sessions) = test_state(registry);
    let session = SessionId::new("s-1");
    log_in(&sessions, &session).await;

    let err = login_process_inner(&state, &session).await.unwrap_err();
    assert!(matches!(err, SamlError::MissingSessionState("SAMLRequest")));

    // Only SAMLRequest present: still no resolution
    sessions
        .insert(&session, SAML_REQUEST_KEY, encoded_request())
        .await
        .unwrap();
    let err = login_process_inner(&state, &session).await.unwrap_err();
    assert!(matches!(err, SamlError::MissingSessionState("RelayState")));
}

#[tokio::test]
async fn process_renders_the_response_form() {
    let (state, sessions) = test_state(HandlerRegistry::with_defaults());
    let session = SessionId::new("s-1");
    log_in(&sessions, &session).await;

    login_begin_inner(
        &state,
        &session,
        LoginBeginParams {
            saml_request: Some(encoded_request()),
            relay_state: Some("/app/after-login".to_string()),
        },
    )
    .await
    .unwrap();

    let html = login_process_inner(&state, &session).await.unwrap().0;

    assert!(html.contains(r#"action="https://sp.example/acs/""#));
    assert!(html.contains("SAMLResponse"));
    assert!(html.contains(r#"name="RelayState" value="/app/after-login""#));
    assert!(html.contains("onload"), "autosubmit form posts itself");
}

#[tokio::test]
async fn process_with_unknown_issuer_is_a_client_error() {
    let (state, sessions) = test_state(HandlerRegistry::with_defaults());
    let session = SessionId::new("s-1");
    log_in(&sessions, &session).await;

    let xml = r#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
        xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
        ID="_req_8" AssertionConsumerServiceURL="https://sp.example/acs/">
        <saml:Issuer>https://intruder.example/metadata.xml</saml:Issuer>
    </samlp:AuthnRequest>"#;

    login_begin_inner(
        &state,
        &session,
        LoginBeginParams {
            saml_request: Some(STANDARD.encode(xml)),
            relay_state: None,
        },
    )
    .await
    .unwrap();

    let err = login_process_inner(&state, &session).await.unwrap_err();
    assert!(matches!(err, SamlError::CannotHandleAssertion(_)));
}

#[tokio::test]
async fn logout_requires_authentication() {
    let (state, _sessions) = test_state(HandlerRegistry::with_defaults());
    let session = SessionId::new("s-1");

    let err = logout_inner(
        &state,
        &session,
        LogoutParams {
            relay_state: None,
            redirect_to: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SamlError::LoginRedirect(_)));
}

#[tokio::test]
async fn logout_redirects_to_a_validated_target() {
    let (state, sessions) = test_state(HandlerRegistry::with_defaults());
    let session = SessionId::new("s-1");
    log_in(&sessions, &session).await;

    let response = logout_inner(
        &state,
        &session,
        LogoutParams {
            relay_state: Some("https://sp.example/acs/".to_string()),
            redirect_to: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://sp.example/acs/"
    );

    // Session terminated
    assert!(sessions.get(&session, USER_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn logout_falls_through_to_the_second_candidate() {
    let (state, sessions) = test_state(HandlerRegistry::with_defaults());
    let session = SessionId::new("s-1");
    log_in(&sessions, &session).await;

    let response = logout_inner(
        &state,
        &session,
        LogoutParams {
            relay_state: Some("https://evil.example/phish".to_string()),
            redirect_to: Some("https://sp.example/acs/".to_string()),
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://sp.example/acs/"
    );
}

#[tokio::test]
async fn logout_renders_its_own_page_when_no_target_is_valid() {
    let (state, sessions) = test_state(HandlerRegistry::with_defaults());
    let session = SessionId::new("s-1");
    log_in(&sessions, &session).await;

    let response = logout_inner(
        &state,
        &session,
        LogoutParams {
            relay_state: Some("https://evil.example/phish".to_string()),
            redirect_to: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // The page carries a complete context of its own
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("logged out"));
    assert!(body.contains("https://idp.example.com/saml/metadata.xml"));
}

#[tokio::test]
async fn metadata_needs_no_authentication_and_no_certificate() {
    let (state, _sessions) = test_state(HandlerRegistry::with_defaults());

    let xml = get_metadata_inner(&state).unwrap();

    assert!(xml.contains("entityID=\"https://idp.example.com/saml/metadata.xml\""));
    assert!(xml.contains("https://idp.example.com/saml/login/"));
    assert!(xml.contains("https://idp.example.com/saml/logout/"));
    assert!(!xml.contains("KeyDescriptor"));
}
