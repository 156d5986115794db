//! Result and error types for covwalk.

use crate::database::{DatabaseError, EntityKind, ErrorCode};
use thiserror::Error;

/// Result type for covwalk operations
pub type WalkResult<T> = Result<T, WalkError>;

/// Errors that can end a walk or a load
#[derive(Debug, Error)]
pub enum WalkError {
    /// Database error the active filter classified as fatal
    #[error("Error occurred: {}", .0.name())]
    Fatal(DatabaseError),

    /// The design records no test runs to load
    #[error("Design has no tests to load")]
    NoTests,

    /// A locator did not resolve
    #[error("Failed to load {kind:?} from {locator}")]
    LoadFailed {
        /// Entity kind requested
        kind: EntityKind,
        /// Locator that did not resolve
        locator: String,
    },

    /// Unfiltered database error outside a walk
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Fixture could not be parsed or is inconsistent
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WalkError {
    /// Create a load failure
    #[must_use]
    pub fn load_failed(kind: EntityKind, locator: impl Into<String>) -> Self {
        Self::LoadFailed {
            kind,
            locator: locator.into(),
        }
    }

    /// Create a fixture error
    #[must_use]
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture {
            message: message.into(),
        }
    }

    /// Database error code, when this error came from the database
    #[must_use]
    pub fn database_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Fatal(err) | Self::Database(err) => Some(err.code()),
            _ => None,
        }
    }

    /// Whether the walk was stopped by a fatal database error
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}
