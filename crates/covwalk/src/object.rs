//! Object Type Tags and Traversal Kinds
//!
//! The database reports an open-ended integer type tag per entity. It is
//! validated here, at the boundary: [`ObjectType`] names every tag the
//! database is known to produce, and [`ObjectKind`] collapses those into the
//! closed set the walker branches on.

use crate::database::CoverageDatabase;
use crate::handle::Handle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dynamic type tag of a database entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ObjectType {
    NullHandle,
    Internal,
    Design,
    Iterator,
    Container,
    Metric,
    SourceInstance,
    SourceDefinition,
    Block,
    IntegerValue,
    ScalarValue,
    VectorValue,
    IntervalValue,
    BddValue,
    Cross,
    Sequence,
    Annotation,
    Test,
    TestName,
    Interval,
    ExcludeFile,
    HierFile,
    EditFile,
    Bdd,
    Error,
    Table,
    ValueSet,
    SbnRange,
    TestInfo,
}

impl ObjectType {
    /// Every known tag, in code order
    pub const ALL: [Self; 29] = [
        Self::NullHandle,
        Self::Internal,
        Self::Design,
        Self::Iterator,
        Self::Container,
        Self::Metric,
        Self::SourceInstance,
        Self::SourceDefinition,
        Self::Block,
        Self::IntegerValue,
        Self::ScalarValue,
        Self::VectorValue,
        Self::IntervalValue,
        Self::BddValue,
        Self::Cross,
        Self::Sequence,
        Self::Annotation,
        Self::Test,
        Self::TestName,
        Self::Interval,
        Self::ExcludeFile,
        Self::HierFile,
        Self::EditFile,
        Self::Bdd,
        Self::Error,
        Self::Table,
        Self::ValueSet,
        Self::SbnRange,
        Self::TestInfo,
    ];

    /// Integer code as reported through [`crate::IntProperty::Type`]
    #[must_use]
    pub const fn code(self) -> i64 {
        self as i64
    }

    /// Validate an integer code
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Display name for diagnostics
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::NullHandle => "null handle",
            Self::Internal => "internal",
            Self::Design => "design",
            Self::Iterator => "iterator",
            Self::Container => "container",
            Self::Metric => "metric",
            Self::SourceInstance => "source instance",
            Self::SourceDefinition => "source definition",
            Self::Block => "block",
            Self::IntegerValue => "integer value",
            Self::ScalarValue => "scalar value",
            Self::VectorValue => "vector value",
            Self::IntervalValue => "interval value",
            Self::BddValue => "bdd value",
            Self::Cross => "cross",
            Self::Sequence => "sequence",
            Self::Annotation => "annotation",
            Self::Test => "test",
            Self::TestName => "test name",
            Self::Interval => "interval",
            Self::ExcludeFile => "exclude file",
            Self::HierFile => "hier file",
            Self::EditFile => "edit file",
            Self::Bdd => "bdd",
            Self::Error => "error",
            Self::Table => "table",
            Self::ValueSet => "value set",
            Self::SbnRange => "sbn range",
            Self::TestInfo => "test info",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Display name for an object's type tag
///
/// Either handle missing gives `"null handle"`; a failed or unknown tag gives
/// `"unknown"`.
#[must_use]
pub fn display_type_name<D: CoverageDatabase + ?Sized>(
    object: Option<&Handle<'_, D>>,
    region: Option<&Handle<'_, D>>,
) -> &'static str {
    let (Some(object), Some(_)) = (object, region) else {
        return ObjectType::NullHandle.display_name();
    };
    match object.object_type(region) {
        Ok(Some(ty)) => ty.display_name(),
        _ => "unknown",
    }
}

/// Closed set of object kinds the walker branches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ObjectKind {
    /// Holds further objects
    Container,
    Block,
    Sequence,
    Cross,
    IntegerValue,
    ScalarValue,
    ValueSet,
    /// Anything else, with the raw code when one was readable
    Unrecognized {
        /// Raw type code
        code: Option<i64>,
    },
}

impl ObjectKind {
    /// Resolve a raw type code (or a failed type query) into a kind
    #[must_use]
    pub fn from_code(code: Option<i64>) -> Self {
        match code.and_then(ObjectType::from_code) {
            Some(ty) => Self::from(ty),
            None => Self::Unrecognized { code },
        }
    }

    /// Directly measured without structural descent
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(
            self,
            Self::Block
                | Self::Sequence
                | Self::Cross
                | Self::IntegerValue
                | Self::ScalarValue
                | Self::ValueSet
        )
    }

    /// Holds further objects
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Container)
    }
}

impl From<ObjectType> for ObjectKind {
    fn from(ty: ObjectType) -> Self {
        match ty {
            ObjectType::Container => Self::Container,
            ObjectType::Block => Self::Block,
            ObjectType::Sequence => Self::Sequence,
            ObjectType::Cross => Self::Cross,
            ObjectType::IntegerValue => Self::IntegerValue,
            ObjectType::ScalarValue => Self::ScalarValue,
            ObjectType::ValueSet => Self::ValueSet,
            other => Self::Unrecognized {
                code: Some(other.code()),
            },
        }
    }
}
