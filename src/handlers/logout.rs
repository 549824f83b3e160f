//! Non-standard logout endpoint
//!
//! Lets an SP log the user out over a plain URL instead of the SAML logout
//! channel (Salesforce and others do this). After terminating the session,
//! redirects to a supplied target only when some configured handler accepts
//! it; otherwise renders the generic logged-out page.

use crate::error::SamlResult;
use crate::handlers::IdpState;
use crate::models::{render_logged_out_page, LogoutParams};
use crate::session::SessionId;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension,
};

#[utoipa::path(
    get,
    path = "/saml/logout/",
    params(LogoutParams),
    responses(
        (status = 200, description = "Logged-out page"),
        (status = 303, description = "Redirected to a validated SP target"),
    ),
    tag = "SAML"
)]
pub async fn logout(
    State(state): State<IdpState>,
    Extension(session): Extension<SessionId>,
    Query(params): Query<LogoutParams>,
) -> Response {
    match logout_inner(&state, &session, params).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

pub async fn logout_inner(
    state: &IdpState,
    session: &SessionId,
    params: LogoutParams,
) -> SamlResult<Response> {
    let ctx = state.context()?;

    state.host.login_required(session).await?;
    state.host.logout(session).await?;

    tracing::info!(session = %session, "user logged out");

    for candidate in [params.relay_state.as_deref(), params.redirect_to.as_deref()] {
        let Some(url) = candidate else { continue };
        if !url.is_empty() && ctx.is_valid_redirect(url) {
            return Ok(Redirect::to(url).into_response());
        }
    }

    Ok(Html(render_logged_out_page(&ctx.entity_id())).into_response())
}
