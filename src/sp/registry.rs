//! Handler registry
//!
//! Maps stable identifiers to handler factories, populated at startup.
//! Registrations name a factory by identifier instead of loading classes by
//! dotted path at runtime; an identifier with no factory is a configuration
//! error surfaced at handler-construction time.

use super::{SpHandler, StandardSpHandler};
use crate::config::{SpOptions, SpRegistration};
use crate::error::{SamlError, SamlResult};
use std::collections::HashMap;

/// Identifier of the stock handler
pub const STANDARD_HANDLER: &str = "standard";

/// Constructs one handler from registration options
pub type HandlerFactory = Box<dyn Fn(&SpOptions) -> SamlResult<Box<dyn SpHandler>> + Send + Sync>;

/// Identifier → factory mapping for Service Provider handlers
#[derive(Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    /// An empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the stock handler registered under
    /// [`STANDARD_HANDLER`]
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(STANDARD_HANDLER, |options| {
            Ok(Box::new(StandardSpHandler::new(options.clone())))
        });
        registry
    }

    /// Register `factory` under `identifier`, replacing any previous entry
    pub fn register<F>(&mut self, identifier: &str, factory: F)
    where
        F: Fn(&SpOptions) -> SamlResult<Box<dyn SpHandler>> + Send + Sync + 'static,
    {
        self.factories
            .insert(identifier.to_string(), Box::new(factory));
    }

    /// Construct the handler for `registration`
    pub fn build(&self, registration: &SpRegistration) -> SamlResult<Box<dyn SpHandler>> {
        let factory = self
            .factories
            .get(&registration.handler)
            .ok_or_else(|| SamlError::UnknownHandler(registration.handler.clone()))?;
        factory(&registration.options)
    }
}
