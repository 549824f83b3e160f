//! SAML-specific utilities

pub mod attributes;
pub mod signing;

pub use attributes::{
    default_nameid_format, NAMEID_FORMAT_EMAIL, NAMEID_FORMAT_PERSISTENT, NAMEID_FORMAT_TRANSIENT,
};
pub use signing::{DigestAlgorithm, SignatureAlgorithm, SigningCredentials};
