//! IdP metadata endpoint

use crate::error::SamlResult;
use crate::handlers::IdpState;
use crate::services::MetadataGenerator;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Serve the IdP metadata document. Requires no authentication.
#[utoipa::path(
    get,
    path = "/saml/metadata.xml",
    responses(
        (status = 200, description = "IdP metadata XML"),
        (status = 500, description = "Failed to generate metadata"),
    ),
    tag = "SAML"
)]
pub async fn get_metadata(State(state): State<IdpState>) -> Response {
    match get_metadata_inner(&state) {
        Ok(xml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
            xml,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub fn get_metadata_inner(state: &IdpState) -> SamlResult<String> {
    let ctx = state.context()?;
    let context = ctx.metadata_context()?;
    let xml = MetadataGenerator::new(context).generate()?;

    tracing::debug!("IdP metadata requested");

    Ok(xml)
}
