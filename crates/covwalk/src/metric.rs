//! Metric Classification
//!
//! Routes each coverage metric to the traversal branch that handles it.

use crate::database::CoverageDatabase;
use crate::handle::Handle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Traversal-relevant category of a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Line coverage; containers of blocks are the coverable unit
    Line,
    /// Deprecated path coverage, always skipped
    Path,
    /// Covergroups, visited from the test
    Testbench,
    /// Assertions, visited from the test
    Assert,
    /// Toggle, condition, branch, FSM and anything else
    Other,
}

impl MetricKind {
    /// Classify a metric by name (case-insensitive)
    #[must_use]
    pub fn classify(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "line" => Self::Line,
            "path" => Self::Path,
            "testbench" | "group" | "covergroup" => Self::Testbench,
            "assert" | "assertion" => Self::Assert,
            _ => Self::Other,
        }
    }

    /// Whether the per-region metric loop handles this kind
    ///
    /// Path is deprecated; testbench and assert metrics are reached through
    /// the test instead of through source regions.
    #[must_use]
    pub const fn is_region_scoped(self) -> bool {
        matches!(self, Self::Line | Self::Other)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Line => "line",
            Self::Path => "path",
            Self::Testbench => "testbench",
            Self::Assert => "assert",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A metric handle together with its classification
pub struct Metric<'db, D: CoverageDatabase + ?Sized> {
    handle: Handle<'db, D>,
    kind: MetricKind,
    name: String,
}

impl<'db, D: CoverageDatabase + ?Sized> Metric<'db, D> {
    /// Classify a metric by the name already read from its handle
    ///
    /// A metric without a readable name (`None`) classifies as
    /// [`MetricKind::Other`] with an empty name.
    #[must_use]
    pub fn named(handle: Handle<'db, D>, name: Option<String>) -> Self {
        let name = name.unwrap_or_default();
        let kind = MetricKind::classify(&name);
        Self { handle, kind, name }
    }

    /// The underlying handle
    #[must_use]
    pub fn handle(&self) -> &Handle<'db, D> {
        &self.handle
    }

    /// The classification
    #[must_use]
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// The metric name as reported by the database
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shorthand for `kind() == MetricKind::Line`
    #[must_use]
    pub fn is_line(&self) -> bool {
        self.kind == MetricKind::Line
    }

    /// Shorthand for `kind() == MetricKind::Assert`
    #[must_use]
    pub fn is_assert(&self) -> bool {
        self.kind == MetricKind::Assert
    }

    /// Shorthand for `kind() == MetricKind::Testbench`
    #[must_use]
    pub fn is_testbench(&self) -> bool {
        self.kind == MetricKind::Testbench
    }
}

impl<D: CoverageDatabase + ?Sized> fmt::Debug for Metric<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish()
    }
}
