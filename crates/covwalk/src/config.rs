//! Walk Configuration
//!
//! Carried into every traversal; nothing here is process-wide.

use crate::filter::ErrorCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happens when the error filter declares an error fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalAction {
    /// Report the error name on stderr and exit with status 1
    #[default]
    Exit,
    /// Return [`crate::WalkError::Fatal`] from the walk
    Abort,
}

/// Traversal configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Fatal error handling
    pub fatal_action: FatalAction,
    /// Let the database print its own error messages
    pub display_errors: bool,
    /// Callback for non-benign errors when `execute` is given none
    #[serde(skip)]
    pub error_callback: Option<ErrorCallback>,
}

impl WalkConfig {
    /// Create a builder for walk config
    #[must_use]
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder::default()
    }

    /// Default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for WalkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkConfig")
            .field("fatal_action", &self.fatal_action)
            .field("display_errors", &self.display_errors)
            .field("error_callback", &self.error_callback.is_some())
            .finish()
    }
}

/// Builder for walk configuration
#[derive(Default)]
pub struct WalkConfigBuilder {
    fatal_action: FatalAction,
    display_errors: bool,
    error_callback: Option<ErrorCallback>,
}

impl WalkConfigBuilder {
    /// Set the fatal error action
    #[must_use]
    pub fn fatal_action(mut self, action: FatalAction) -> Self {
        self.fatal_action = action;
        self
    }

    /// Let the database print its own errors
    #[must_use]
    pub fn display_errors(mut self, enabled: bool) -> Self {
        self.display_errors = enabled;
        self
    }

    /// Set the walker-level error callback
    #[must_use]
    pub fn error_callback(mut self, callback: ErrorCallback) -> Self {
        self.error_callback = Some(callback);
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> WalkConfig {
        WalkConfig {
            fatal_action: self.fatal_action,
            display_errors: self.display_errors,
            error_callback: self.error_callback,
        }
    }
}

impl fmt::Debug for WalkConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkConfigBuilder")
            .field("fatal_action", &self.fatal_action)
            .field("display_errors", &self.display_errors)
            .field("error_callback", &self.error_callback.is_some())
            .finish()
    }
}
