//! Database Error Filter
//!
//! Every error the walker receives from the database goes through one
//! [`ErrorFilter`]:
//!
//! - benign codes (see [`crate::ErrorCode::is_benign`]) are absorbed and never reach
//!   a callback,
//! - anything else goes to the active callback, which owns the decision,
//! - with no callback, anything else is fatal.

use crate::database::DatabaseError;
use std::fmt;
use std::rc::Rc;

/// What to do with a database error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Known gap in the database; absorb silently
    Ignore,
    /// A callback dealt with it; keep walking
    Handled,
    /// Stop the walk
    Fatal,
}

/// Caller-supplied error handler
pub type ErrorCallback = Rc<dyn Fn(&DatabaseError) -> ErrorDisposition>;

/// Routes database errors to a disposition
#[derive(Clone, Default)]
pub struct ErrorFilter {
    callback: Option<ErrorCallback>,
}

impl ErrorFilter {
    /// Filter with an optional callback for non-benign errors
    #[must_use]
    pub fn new(callback: Option<ErrorCallback>) -> Self {
        Self { callback }
    }

    /// Pick the callback by priority: explicit, then configured, then none
    #[must_use]
    pub fn select(explicit: Option<ErrorCallback>, configured: Option<ErrorCallback>) -> Self {
        Self::new(explicit.or(configured))
    }

    /// Default classification: benign codes are ignored, the rest are fatal
    ///
    /// Custom callbacks can defer to this after checking their own cases.
    #[must_use]
    pub fn default_disposition(err: &DatabaseError) -> ErrorDisposition {
        if err.code().is_benign() {
            ErrorDisposition::Ignore
        } else {
            ErrorDisposition::Fatal
        }
    }

    /// Classify an error
    #[must_use]
    pub fn resolve(&self, err: &DatabaseError) -> ErrorDisposition {
        if err.code().is_benign() {
            return ErrorDisposition::Ignore;
        }
        match &self.callback {
            Some(callback) => callback(err),
            None => ErrorDisposition::Fatal,
        }
    }

    /// Whether a callback is installed
    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }
}

impl fmt::Debug for ErrorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorFilter")
            .field("has_callback", &self.has_callback())
            .finish()
    }
}
