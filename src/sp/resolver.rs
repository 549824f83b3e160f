//! Trial-and-fallback handler resolution
//!
//! A linear scan over the configured handlers with short-circuit success:
//! the first handler whose full trial (parse, response, context) succeeds
//! wins, and nothing after it runs. A trial failing with a not-mine signal
//! is logged and skipped; any other failure aborts the whole attempt.

use super::{ResponseContext, SpHandler};
use crate::error::{SamlError, SamlResult};
use crate::provider::{IdpContext, IdpUser};

/// Resolve `saml_request` against the configured handlers, in registration
/// order.
///
/// Returns the winning handler's response context, or
/// `CannotHandleAssertion` once every handler has declined.
pub fn resolve_login(
    ctx: &IdpContext,
    user: &IdpUser,
    saml_request: &str,
    relay_state: &str,
) -> SamlResult<ResponseContext> {
    for handler in ctx.sp_handlers() {
        let handler = handler?;

        match try_handler(ctx, user, handler.as_ref(), saml_request, relay_state) {
            Ok(context) => {
                tracing::info!(
                    sp = handler.display_name(),
                    acs_url = %context.acs_url,
                    "login request resolved"
                );
                return Ok(context);
            }
            Err(e) if e.is_not_mine() => {
                tracing::warn!(
                    sp = handler.display_name(),
                    error = %e,
                    "handler could not process login request"
                );
            }
            Err(e) => return Err(e),
        }
    }

    Err(SamlError::CannotHandleAssertion(
        "No Service Provider handlers could handle this SAML request".to_string(),
    ))
}

/// One independent trial: parse, build the response, derive the context.
/// Nothing is shared between trials; a failed trial leaves no state behind.
fn try_handler(
    ctx: &IdpContext,
    user: &IdpUser,
    handler: &dyn SpHandler,
    saml_request: &str,
    relay_state: &str,
) -> SamlResult<ResponseContext> {
    let request = handler.parse_authn_request(saml_request)?;
    let response = handler.make_response(ctx, user, &request)?;
    Ok(handler.get_response_context(ctx, &request, &response, relay_state))
}
