//! Boundary-layer types and rendering helpers

pub mod responses;

pub use responses::{
    render_logged_out_page, render_response_form, LoginBeginParams, LogoutParams,
};
