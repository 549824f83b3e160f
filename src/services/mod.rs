//! Business logic services for the IdP core

pub mod assertion_builder;
pub mod metadata_generator;
pub mod request_parser;

pub use assertion_builder::{Assertion, AssertionBuilder, SamlResponse};
pub use metadata_generator::{ContactPerson, MetadataContext, MetadataGenerator, Organization};
pub use request_parser::{AuthnRequest, RequestParser};
