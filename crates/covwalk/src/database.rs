//! Coverage Database Accessor Contract
//!
//! The database is an external, read-only hierarchical store. Everything the
//! walker knows about it goes through [`CoverageDatabase`]: opaque
//! [`RawHandle`]s in, opaque handles (or property values) out.
//!
//! Backends take `&self` everywhere. Handle tables inside a backend are
//! expected to use interior mutability, matching the single-threaded model.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for a single accessor call
pub type DbResult<T> = Result<T, DatabaseError>;

/// Opaque backend reference to a database entity or cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle(u64);

impl RawHandle {
    /// Wrap a backend id
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the backend id
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Entity kinds that can be loaded by locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Compiled design (locator is the database path)
    Design,
    /// Coverage test data set (locator is the test name)
    Test,
}

/// Relations used to iterate or follow links between entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Child instances (of a design, instance, or variant)
    Instances,
    /// Definitions (of a design), or variants when qualified by a metric
    Definitions,
    /// Contained coverage objects
    Objects,
    /// Metrics supplied by a test
    Metrics,
    /// Test names recorded in a design
    AvailableTests,
    /// Components of a cross
    Components,
    /// Enclosing region
    Parent,
    /// Definition an instance was elaborated from
    Definition,
    /// The same region seen through a metric
    Identity,
}

/// Integer-valued properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntProperty {
    /// Dynamic type tag, see [`crate::ObjectType`]
    Type,
    /// Number of covered coverable units
    Covered,
    /// Number of coverable units
    Coverable,
    /// Hit count
    CovCount,
    /// Coverage status bit set
    CovStatus,
    /// Bit width
    Width,
    /// Weight
    Weight,
    /// Automatically generated flag
    Automatic,
    /// Source line number
    LineNo,
}

/// String-valued properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrProperty {
    /// Local name
    Name,
    /// Hierarchical name
    FullName,
    /// Value name of an automatically generated bin
    ValueName,
    /// Source file name
    FileName,
}

/// Error codes a database can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The property does not exist for this object type
    InvalidProperty,
    /// The accessor is not implemented for this object
    NotImplemented,
    /// The relation is invalid for this combination of handles
    InvalidRelation,
    /// The handle is unknown or already released
    InvalidHandle,
    /// A load or merge failed
    LoadFailed,
    /// Any backend-specific code
    Other(i64),
}

impl ErrorCode {
    /// Stable integer value of the code
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::InvalidProperty => 1,
            Self::NotImplemented => 2,
            Self::InvalidRelation => 3,
            Self::InvalidHandle => 4,
            Self::LoadFailed => 5,
            Self::Other(code) => code,
        }
    }

    /// Map an integer value back to a code
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::InvalidProperty,
            2 => Self::NotImplemented,
            3 => Self::InvalidRelation,
            4 => Self::InvalidHandle,
            5 => Self::LoadFailed,
            other => Self::Other(other),
        }
    }

    /// Known gaps in database property coverage rather than real failures
    #[must_use]
    pub const fn is_benign(self) -> bool {
        matches!(self.code(), 1..=3)
    }
}

/// Error reported by a database accessor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}")]
pub struct DatabaseError {
    code: ErrorCode,
    name: String,
}

impl DatabaseError {
    /// Create an error with an explicit name
    #[must_use]
    pub fn new(code: ErrorCode, name: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::from_code(code.code()),
            name: name.into(),
        }
    }

    /// Property not available on this object type
    #[must_use]
    pub fn invalid_property() -> Self {
        Self::new(ErrorCode::InvalidProperty, "invalid property")
    }

    /// Accessor not implemented
    #[must_use]
    pub fn not_implemented() -> Self {
        Self::new(ErrorCode::NotImplemented, "not implemented")
    }

    /// Relation invalid for this combination
    #[must_use]
    pub fn invalid_relation() -> Self {
        Self::new(ErrorCode::InvalidRelation, "invalid relation")
    }

    /// Unknown or released handle
    #[must_use]
    pub fn invalid_handle(handle: RawHandle) -> Self {
        Self::new(ErrorCode::InvalidHandle, format!("invalid handle {handle}"))
    }

    /// The error code
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable error name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Accessor contract of a hierarchical coverage database
///
/// Cursors returned by `iterate`/`qualified_iterate` and handles returned by
/// `scan`, `related` and `qualified_handle` are scoped: the caller releases
/// each exactly once. `promote` transfers that responsibility to the caller
/// of `promote`, who then releases the returned handle exactly once.
pub trait CoverageDatabase {
    /// Load an entity by locator. `Ok(None)` if the locator is invalid.
    fn load(
        &self,
        kind: EntityKind,
        parent: Option<RawHandle>,
        locator: &str,
    ) -> DbResult<Option<RawHandle>>;

    /// Merge the named test run into `test`. The previous test handle is
    /// superseded by the returned one.
    fn load_merge(&self, test: RawHandle, locator: &str) -> DbResult<Option<RawHandle>>;

    /// Open a cursor over `relation` of `handle`
    fn iterate(&self, handle: RawHandle, relation: Relation) -> DbResult<Option<RawHandle>>;

    /// Open a cursor over `relation` of `handle` as seen through `metric`
    fn qualified_iterate(
        &self,
        handle: RawHandle,
        metric: RawHandle,
        relation: Relation,
    ) -> DbResult<Option<RawHandle>>;

    /// Advance a cursor. `Ok(None)` at the end.
    fn scan(&self, cursor: RawHandle) -> DbResult<Option<RawHandle>>;

    /// Follow `relation` of `handle` as seen through `metric`
    fn qualified_handle(
        &self,
        handle: RawHandle,
        metric: RawHandle,
        relation: Relation,
    ) -> DbResult<Option<RawHandle>>;

    /// Read an integer property, optionally in the context of a region and test
    fn int_property(
        &self,
        handle: RawHandle,
        context: Option<RawHandle>,
        test: Option<RawHandle>,
        property: IntProperty,
    ) -> DbResult<i64>;

    /// Read a string property
    fn str_property(&self, handle: RawHandle, property: StrProperty) -> DbResult<Option<String>>;

    /// Follow a single-valued relation
    fn related(&self, handle: RawHandle, relation: Relation) -> DbResult<Option<RawHandle>>;

    /// Read an annotation by key
    fn annotation(&self, handle: RawHandle, key: &str) -> DbResult<Option<String>>;

    /// Convert a scoped handle into a persistent one
    fn promote(&self, handle: RawHandle) -> DbResult<RawHandle>;

    /// Release a handle or cursor
    fn release(&self, handle: RawHandle) -> DbResult<()>;

    /// Toggle the backend's own error printing
    fn set_display_errors(&self, _enabled: bool) {}
}
