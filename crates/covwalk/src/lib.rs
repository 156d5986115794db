//! covwalk: Visitor-Driven Traversal of Coverage Databases
//!
//! Walks a hierarchical, externally owned coverage database and fires a
//! fixed set of [`Visitor`] hooks: the source instance tree, definitions,
//! assertions and covergroups, and every object in their metric-qualified
//! views. Database handles are guards; whatever the walk acquires, it
//! releases, on every exit path.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    COVWALK Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Coverage   │    │ Walker     │    │ Visitor    │            │
//! │   │ Database   │───►│ (passes,   │───►│ hooks      │            │
//! │   │ (trait)    │    │  filter)   │    │            │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use covwalk::{memory::Fixture, RecordingVisitor, WalkConfig, Walker};
//!
//! let db = Fixture::from_path("design.yaml")?.build()?;
//! let mut visitor = RecordingVisitor::new();
//! let walker = Walker::load_merged(db.load_design()?, &mut visitor, WalkConfig::default())?;
//! let summary = walker.execute(&mut visitor, None)?;
//! println!("{} coverable objects", summary.cov_objects);
//! ```

#![warn(missing_docs)]

mod config;
mod database;
mod filter;
mod handle;
pub mod logging;
mod metric;
mod object;
mod recorder;
mod result;
mod visitor;
mod walk;

#[cfg(feature = "memory")]
pub mod memory;

pub use config::{FatalAction, WalkConfig, WalkConfigBuilder};
pub use database::{
    CoverageDatabase, DatabaseError, DbResult, EntityKind, ErrorCode, IntProperty, RawHandle,
    Relation, StrProperty,
};
pub use filter::{ErrorCallback, ErrorDisposition, ErrorFilter};
pub use handle::{Cursor, Handle, Ownership, IS_CROSS_ANNOTATION};
pub use logging::init_tracing;
pub use metric::{Metric, MetricKind};
pub use object::{display_type_name, ObjectKind, ObjectType};
pub use recorder::{RecordingVisitor, SiteLabel, VisitEvent};
pub use result::{WalkError, WalkResult};
pub use visitor::{ObjectSite, Visitor};
pub use walk::{WalkSummary, Walker};
