//! Login begin and process steps
//!
//! Begin only captures the inbound `SAMLRequest` and `RelayState` into the
//! session and bounces to the process step; parsing and handler resolution
//! happen there, after the user has authenticated.

use crate::error::{SamlError, SamlResult};
use crate::handlers::IdpState;
use crate::models::{render_response_form, LoginBeginParams};
use crate::session::{SessionId, RELAY_STATE_KEY, SAML_REQUEST_KEY};
use crate::sp::resolve_login;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};

/// Begin step via HTTP-Redirect binding
#[utoipa::path(
    get,
    path = "/saml/login/",
    params(LoginBeginParams),
    responses(
        (status = 303, description = "Request captured, continue to the process step"),
        (status = 400, description = "SAMLRequest parameter missing"),
    ),
    tag = "SAML"
)]
pub async fn login_begin(
    State(state): State<IdpState>,
    Extension(session): Extension<SessionId>,
    Query(params): Query<LoginBeginParams>,
) -> Response {
    match login_begin_inner(&state, &session, params).await {
        Ok(redirect) => redirect.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Begin step via HTTP-POST binding
#[utoipa::path(
    post,
    path = "/saml/login/",
    responses(
        (status = 303, description = "Request captured, continue to the process step"),
        (status = 400, description = "SAMLRequest parameter missing"),
    ),
    tag = "SAML"
)]
pub async fn login_begin_post(
    State(state): State<IdpState>,
    Extension(session): Extension<SessionId>,
    Form(params): Form<LoginBeginParams>,
) -> Response {
    match login_begin_inner(&state, &session, params).await {
        Ok(redirect) => redirect.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Capture the request into the session. No parsing, no resolution; with no
/// `SAMLRequest` value nothing is written at all.
pub async fn login_begin_inner(
    state: &IdpState,
    session: &SessionId,
    params: LoginBeginParams,
) -> SamlResult<Redirect> {
    let saml_request = params
        .saml_request
        .filter(|value| !value.is_empty())
        .ok_or(SamlError::MissingParameter("SAMLRequest"))?;

    let relay_state = params.relay_state.unwrap_or_default();

    state
        .sessions
        .insert(session, SAML_REQUEST_KEY, saml_request)
        .await?;
    state
        .sessions
        .insert(session, RELAY_STATE_KEY, relay_state)
        .await?;

    tracing::debug!(session = %session, "SAML login request captured");

    let ctx = state.context()?;
    Ok(Redirect::to(&ctx.login_process_url()))
}

/// Process step: resolve a handler and deliver the response form
#[utoipa::path(
    get,
    path = "/saml/login/process/",
    responses(
        (status = 200, description = "SAML response form"),
        (status = 303, description = "User not authenticated, redirected to login"),
        (status = 400, description = "Session state missing or no handler matched"),
    ),
    tag = "SAML"
)]
pub async fn login_process(
    State(state): State<IdpState>,
    Extension(session): Extension<SessionId>,
) -> Response {
    match login_process_inner(&state, &session).await {
        Ok(html) => html.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn login_process_inner(
    state: &IdpState,
    session: &SessionId,
) -> SamlResult<Html<String>> {
    let ctx = state.context()?;

    state.host.login_required(session).await?;

    let saml_request = state
        .sessions
        .get(session, SAML_REQUEST_KEY)
        .await?
        .ok_or(SamlError::MissingSessionState("SAMLRequest"))?;
    let relay_state = state
        .sessions
        .get(session, RELAY_STATE_KEY)
        .await?
        .ok_or(SamlError::MissingSessionState("RelayState"))?;

    let user = state.host.get_current_user(session).await?;

    let context = resolve_login(&ctx, &user, &saml_request, &relay_state)?;

    Ok(Html(render_response_form(&context)))
}
