//! Handle Lifecycle Guards
//!
//! Every reference obtained from the database is wrapped in a guard whose
//! `Drop` releases it, so early returns and `?` never leak. A guard is tagged
//! with its [`Ownership`]:
//!
//! - [`Ownership::Borrowed`]: produced by a cursor scan or a relation lookup,
//!   valid only inside the scope that produced it.
//! - [`Ownership::Owned`]: loaded by locator or promoted with
//!   [`Handle::promote`]; outlives the producing cursor and is released by
//!   whoever holds it.

use crate::database::{
    CoverageDatabase, DbResult, EntityKind, IntProperty, RawHandle, Relation, StrProperty,
};
use crate::object::{display_type_name, ObjectType};
use std::fmt;
use std::mem::ManuallyDrop;

/// Annotation key flagging a testbench point as a cross
pub const IS_CROSS_ANNOTATION: &str = "is_cross";

/// Ownership mode of a handle guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Scoped to the iteration that produced it
    Borrowed,
    /// Promoted or loaded; released by its holder
    Owned,
}

/// Guard over a database handle
pub struct Handle<'db, D: CoverageDatabase + ?Sized> {
    db: &'db D,
    raw: RawHandle,
    ownership: Ownership,
}

impl<'db, D: CoverageDatabase + ?Sized> Handle<'db, D> {
    pub(crate) fn scoped(db: &'db D, raw: RawHandle) -> Self {
        Self {
            db,
            raw,
            ownership: Ownership::Borrowed,
        }
    }

    pub(crate) fn owned(db: &'db D, raw: RawHandle) -> Self {
        Self {
            db,
            raw,
            ownership: Ownership::Owned,
        }
    }

    /// Load an entity by locator
    ///
    /// Returns `Ok(None)` when the database does not know the locator; the
    /// caller must check before walking.
    pub fn load(
        db: &'db D,
        kind: EntityKind,
        parent: Option<&Handle<'_, D>>,
        locator: &str,
    ) -> DbResult<Option<Self>> {
        let raw = db.load(kind, parent.map(Handle::raw), locator)?;
        Ok(raw.map(|raw| Self::owned(db, raw)))
    }

    /// Merge the named test run into this test handle
    ///
    /// Returns `false` and leaves the handle untouched if the run is unknown.
    pub fn merge(&mut self, locator: &str) -> DbResult<bool> {
        match self.db.load_merge(self.raw, locator)? {
            Some(merged) => {
                // the database retired the old id when it produced the merged one
                self.raw = merged;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Convert a scoped handle into a persistent one
    ///
    /// The scoped id is not released: the database hands responsibility for
    /// it to the returned guard. Promoting an already persistent handle is a
    /// caller error and returns the handle unchanged.
    pub fn promote(self) -> DbResult<Self> {
        if self.ownership == Ownership::Owned {
            tracing::warn!(handle = %self.raw, "handle promoted twice");
            return Ok(self);
        }
        let scoped = ManuallyDrop::new(self);
        match scoped.db.promote(scoped.raw) {
            Ok(raw) => Ok(Self::owned(scoped.db, raw)),
            Err(err) => {
                drop(ManuallyDrop::into_inner(scoped));
                Err(err)
            }
        }
    }

    /// Backend id of this handle
    #[must_use]
    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    /// Ownership mode
    #[must_use]
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Whether this handle was loaded or promoted
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.ownership == Ownership::Owned
    }

    /// The database this handle belongs to
    #[must_use]
    pub fn database(&self) -> &'db D {
        self.db
    }

    /// Open a cursor over a relation
    pub fn iterate(&self, relation: Relation) -> DbResult<Option<Cursor<'db, D>>> {
        let cursor = self.db.iterate(self.raw, relation)?;
        Ok(cursor.map(|raw| Cursor::new(self.db, raw)))
    }

    /// Open a cursor over a relation as seen through a metric
    pub fn qualified_iterate(
        &self,
        metric: &Handle<'_, D>,
        relation: Relation,
    ) -> DbResult<Option<Cursor<'db, D>>> {
        let cursor = self.db.qualified_iterate(self.raw, metric.raw, relation)?;
        Ok(cursor.map(|raw| Cursor::new(self.db, raw)))
    }

    /// Follow a relation as seen through a metric
    pub fn qualified_handle(
        &self,
        metric: &Handle<'_, D>,
        relation: Relation,
    ) -> DbResult<Option<Self>> {
        let raw = self.db.qualified_handle(self.raw, metric.raw, relation)?;
        Ok(raw.map(|raw| Self::scoped(self.db, raw)))
    }

    /// Follow a single-valued relation
    pub fn related(&self, relation: Relation) -> DbResult<Option<Self>> {
        let raw = self.db.related(self.raw, relation)?;
        Ok(raw.map(|raw| Self::scoped(self.db, raw)))
    }

    /// Read an integer property in the context of a region and test
    pub fn int_property(
        &self,
        context: Option<&Handle<'_, D>>,
        test: Option<&Handle<'_, D>>,
        property: IntProperty,
    ) -> DbResult<i64> {
        self.db.int_property(
            self.raw,
            context.map(Handle::raw),
            test.map(Handle::raw),
            property,
        )
    }

    /// Read a string property
    pub fn str_property(&self, property: StrProperty) -> DbResult<Option<String>> {
        self.db.str_property(self.raw, property)
    }

    /// Local name
    pub fn name(&self) -> DbResult<Option<String>> {
        self.str_property(StrProperty::Name)
    }

    /// Hierarchical name
    pub fn full_name(&self) -> DbResult<Option<String>> {
        self.str_property(StrProperty::FullName)
    }

    /// Read an annotation
    pub fn annotation(&self, key: &str) -> DbResult<Option<String>> {
        self.db.annotation(self.raw, key)
    }

    /// Whether a testbench point is a cross rather than a plain coverpoint
    pub fn is_cross(&self) -> DbResult<bool> {
        let flag = self.annotation(IS_CROSS_ANNOTATION)?;
        Ok(flag.as_deref().is_some_and(|v| v.starts_with('1')))
    }

    /// Dynamic type tag, `None` if the code is outside the known enumeration
    pub fn object_type(&self, region: Option<&Handle<'_, D>>) -> DbResult<Option<ObjectType>> {
        let code = self.int_property(region, None, IntProperty::Type)?;
        Ok(ObjectType::from_code(code))
    }

    /// Display name of the dynamic type, for diagnostics
    #[must_use]
    pub fn type_name(&self, region: Option<&Handle<'_, D>>) -> &'static str {
        display_type_name(Some(self), region)
    }
}

impl<D: CoverageDatabase + ?Sized> Drop for Handle<'_, D> {
    fn drop(&mut self) {
        if let Err(err) = self.db.release(self.raw) {
            tracing::debug!(handle = %self.raw, error = %err, "release failed");
        }
    }
}

impl<D: CoverageDatabase + ?Sized> fmt::Debug for Handle<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("raw", &self.raw)
            .field("ownership", &self.ownership)
            .finish_non_exhaustive()
    }
}

/// Guard over a database cursor
///
/// Scanning is forward-only and not restartable: once the end or an error is
/// seen, further scans return nothing without touching the database.
pub struct Cursor<'db, D: CoverageDatabase + ?Sized> {
    db: &'db D,
    raw: RawHandle,
    done: bool,
}

impl<'db, D: CoverageDatabase + ?Sized> Cursor<'db, D> {
    fn new(db: &'db D, raw: RawHandle) -> Self {
        Self {
            db,
            raw,
            done: false,
        }
    }

    /// Advance the cursor, returning the next handle or `None` at the end
    pub fn advance(&mut self) -> DbResult<Option<Handle<'db, D>>> {
        if self.done {
            return Ok(None);
        }
        match self.db.scan(self.raw) {
            Ok(Some(raw)) => Ok(Some(Handle::scoped(self.db, raw))),
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(err) => {
                self.done = true;
                Err(err)
            }
        }
    }

    /// Backend id of this cursor
    #[must_use]
    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    /// Whether the end (or an error) has been reached
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.done
    }
}

impl<'db, D: CoverageDatabase + ?Sized> Iterator for Cursor<'db, D> {
    type Item = DbResult<Handle<'db, D>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}

impl<D: CoverageDatabase + ?Sized> Drop for Cursor<'_, D> {
    fn drop(&mut self) {
        if let Err(err) = self.db.release(self.raw) {
            tracing::debug!(cursor = %self.raw, error = %err, "cursor release failed");
        }
    }
}

impl<D: CoverageDatabase + ?Sized> fmt::Debug for Cursor<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("raw", &self.raw)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
