//! Stock Service Provider handler

use super::SpHandler;
use crate::config::SpOptions;

/// Handler for SPs that follow the standard flow with no customization.
/// Behavior is driven entirely by the registration options.
pub struct StandardSpHandler {
    options: SpOptions,
}

impl StandardSpHandler {
    #[must_use]
    pub fn new(options: SpOptions) -> Self {
        Self { options }
    }
}

impl SpHandler for StandardSpHandler {
    fn options(&self) -> &SpOptions {
        &self.options
    }
}
