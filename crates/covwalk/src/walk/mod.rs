//! Coverage Database Traversal
//!
//! [`Walker::execute`] drives a [`Visitor`] over a loaded design and test in
//! four passes:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  metric snapshot → instances → definitions → assertions → groups │
//! │                        ↓            ↓                       ↓    │
//! │                     qualified region pass  ←────────────────┘    │
//! │                        ↓                                         │
//! │                     object descent (containers, leaves)          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Instance trees and container nesting are walked with explicit frame
//! stacks, so deep designs never exhaust the native stack. Every frame owns
//! its guards; popping or unwinding a frame releases its handles.

mod assert;
mod objects;
mod source;
mod testbench;

use crate::config::{FatalAction, WalkConfig};
use crate::database::{
    CoverageDatabase, DatabaseError, DbResult, EntityKind, IntProperty, Relation,
};
use crate::filter::{ErrorCallback, ErrorDisposition, ErrorFilter};
use crate::handle::{Cursor, Handle};
use crate::metric::Metric;
use crate::object::ObjectKind;
use crate::result::{WalkError, WalkResult};
use crate::visitor::Visitor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counts gathered during one `execute`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkSummary {
    /// Unqualified instances started
    pub instances: usize,
    /// Unqualified definitions started
    pub definitions: usize,
    /// Qualified instances and variants walked
    pub qualified_regions: usize,
    /// Containers started
    pub containers: usize,
    /// `visit_leaf_object` calls
    pub leaf_objects: usize,
    /// `visit_cov_object` calls
    pub cov_objects: usize,
    /// Objects skipped for an unrecognized type
    pub unrecognized: usize,
    /// Database errors ignored or handled by a callback
    pub errors_absorbed: usize,
}

/// Traversal engine over one design and test
pub struct Walker<'db, D: CoverageDatabase + ?Sized> {
    design: Handle<'db, D>,
    test: Handle<'db, D>,
    config: WalkConfig,
}

impl<'db, D: CoverageDatabase + ?Sized> Walker<'db, D> {
    /// Walker over an already loaded design and test
    #[must_use]
    pub fn new(design: Handle<'db, D>, test: Handle<'db, D>, config: WalkConfig) -> Self {
        Self {
            design,
            test,
            config,
        }
    }

    /// Load every test recorded in the design, merged into one
    ///
    /// `visit_test_name` fires once per test name, in database order. The
    /// first name is loaded as the test and every later one merged into it.
    pub fn load_merged<V>(
        design: Handle<'db, D>,
        visitor: &mut V,
        config: WalkConfig,
    ) -> WalkResult<Self>
    where
        V: Visitor<D> + ?Sized,
    {
        let _span = tracing::debug_span!("load_tests").entered();
        let filter = ErrorFilter::new(config.error_callback.clone());
        let mut ctx = WalkContext::new(visitor, filter, config.fatal_action);

        let mut test: Option<Handle<'db, D>> = None;
        if let Some(mut names) = ctx.check(design.iterate(Relation::AvailableTests))? {
            while let Some(test_name) = ctx.scan(&mut names)? {
                ctx.visitor.visit_test_name(&test_name);
                let Some(name) = ctx.check(test_name.name())? else {
                    tracing::warn!(handle = %test_name.raw(), "test name without a name, skipping");
                    continue;
                };
                if let Some(current) = test.as_mut() {
                    if !ctx.check(current.merge(&name))? {
                        return Err(WalkError::load_failed(EntityKind::Test, name));
                    }
                    tracing::debug!(test = %name, "merged test");
                } else {
                    let loaded = ctx.check(Handle::load(
                        design.database(),
                        EntityKind::Test,
                        Some(&design),
                        &name,
                    ))?;
                    let Some(loaded) = loaded else {
                        return Err(WalkError::load_failed(EntityKind::Test, name));
                    };
                    tracing::debug!(test = %name, "loaded test");
                    test = Some(loaded);
                }
            }
        }

        let test = test.ok_or(WalkError::NoTests)?;
        Ok(Self::new(design, test, config))
    }

    /// The design being walked
    #[must_use]
    pub fn design(&self) -> &Handle<'db, D> {
        &self.design
    }

    /// The test supplying metrics
    #[must_use]
    pub fn test(&self) -> &Handle<'db, D> {
        &self.test
    }

    /// Walk configuration
    #[must_use]
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Replace the walker-level error callback
    pub fn set_error_callback(&mut self, callback: Option<ErrorCallback>) {
        self.config.error_callback = callback;
    }

    /// Run every pass, firing hooks on `visitor`
    ///
    /// `callback` takes priority over the configured callback for this call.
    pub fn execute<V>(
        &self,
        visitor: &mut V,
        callback: Option<ErrorCallback>,
    ) -> WalkResult<WalkSummary>
    where
        V: Visitor<D> + ?Sized,
    {
        let _span = tracing::debug_span!("execute").entered();
        self.design
            .database()
            .set_display_errors(self.config.display_errors);
        let filter = ErrorFilter::select(callback, self.config.error_callback.clone());
        let mut ctx = WalkContext::new(visitor, filter, self.config.fatal_action);

        let metrics = MetricSet::collect(&mut ctx, &self.test)?;
        source::walk_instances(&mut ctx, &self.design, &metrics)?;
        source::walk_definitions(&mut ctx, &self.design, &metrics)?;
        assert::walk_assertions(&mut ctx, &self.test, &metrics)?;
        testbench::walk_covergroups(&mut ctx, &self.test, &metrics)?;

        tracing::debug!(summary = ?ctx.summary, "walk finished");
        Ok(ctx.summary)
    }
}

impl<D: CoverageDatabase + ?Sized> fmt::Debug for Walker<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Walker")
            .field("design", &self.design)
            .field("test", &self.test)
            .field("config", &self.config)
            .finish()
    }
}

/// State threaded through every pass of one walk
pub(crate) struct WalkContext<'v, V: ?Sized> {
    pub(crate) visitor: &'v mut V,
    filter: ErrorFilter,
    fatal_action: FatalAction,
    pub(crate) summary: WalkSummary,
}

impl<'v, V: ?Sized> WalkContext<'v, V> {
    pub(crate) fn new(visitor: &'v mut V, filter: ErrorFilter, fatal_action: FatalAction) -> Self {
        Self {
            visitor,
            filter,
            fatal_action,
            summary: WalkSummary::default(),
        }
    }

    /// Route an accessor error through the filter
    ///
    /// Absorbed errors turn into the empty value: no cursor, end of scan,
    /// no handle, `false`.
    pub(crate) fn check<T: Default>(&mut self, result: DbResult<T>) -> WalkResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => match self.filter.resolve(&err) {
                ErrorDisposition::Ignore => {
                    tracing::trace!(code = err.code().code(), error = %err, "ignored database error");
                    self.summary.errors_absorbed += 1;
                    Ok(T::default())
                }
                ErrorDisposition::Handled => {
                    tracing::debug!(code = err.code().code(), error = %err, "database error handled by callback");
                    self.summary.errors_absorbed += 1;
                    Ok(T::default())
                }
                ErrorDisposition::Fatal => Err(self.fatal(err)),
            },
        }
    }

    fn fatal(&self, err: DatabaseError) -> WalkError {
        tracing::error!(code = err.code().code(), error = %err, "fatal database error");
        match self.fatal_action {
            FatalAction::Exit => {
                eprintln!("Error occurred: {}", err.name());
                std::process::exit(1)
            }
            FatalAction::Abort => WalkError::Fatal(err),
        }
    }

    pub(crate) fn scan<'db, D: CoverageDatabase + ?Sized>(
        &mut self,
        cursor: &mut Cursor<'db, D>,
    ) -> WalkResult<Option<Handle<'db, D>>> {
        self.check(cursor.advance())
    }

    /// Promote a scoped handle; `None` if the promotion error was absorbed
    pub(crate) fn promote<'db, D: CoverageDatabase + ?Sized>(
        &mut self,
        handle: Handle<'db, D>,
    ) -> WalkResult<Option<Handle<'db, D>>> {
        self.check(handle.promote().map(Some))
    }

    pub(crate) fn kind_of<D: CoverageDatabase + ?Sized>(
        &mut self,
        object: &Handle<'_, D>,
        region: &Handle<'_, D>,
    ) -> WalkResult<ObjectKind> {
        let code = self.check(
            object
                .int_property(Some(region), None, IntProperty::Type)
                .map(Some),
        )?;
        Ok(ObjectKind::from_code(code))
    }
}

/// Metrics of the test, read once per walk
pub(crate) struct MetricSet<'db, D: CoverageDatabase + ?Sized> {
    regional: Vec<Metric<'db, D>>,
    assert: Option<Metric<'db, D>>,
    testbench: Option<Metric<'db, D>>,
}

impl<'db, D: CoverageDatabase + ?Sized> MetricSet<'db, D> {
    pub(crate) fn collect<V: ?Sized>(
        ctx: &mut WalkContext<'_, V>,
        test: &Handle<'db, D>,
    ) -> WalkResult<Self> {
        let mut set = Self {
            regional: Vec::new(),
            assert: None,
            testbench: None,
        };
        let Some(mut metrics) = ctx.check(test.iterate(Relation::Metrics))? else {
            return Ok(set);
        };
        while let Some(handle) = ctx.scan(&mut metrics)? {
            let Some(handle) = ctx.promote(handle)? else {
                continue;
            };
            // an unreadable name still walks the metric, as Other
            let name = ctx.check(handle.name())?;
            let metric = Metric::named(handle, name);
            tracing::trace!(metric = metric.name(), kind = %metric.kind(), "metric");
            if metric.kind().is_region_scoped() {
                set.regional.push(metric);
            } else if metric.is_assert() {
                if set.assert.replace(metric).is_some() {
                    tracing::debug!("several assert metrics, using the last one");
                }
            } else if metric.is_testbench() {
                if set.testbench.replace(metric).is_some() {
                    tracing::debug!("several testbench metrics, using the last one");
                }
            } else {
                tracing::debug!(metric = metric.name(), "skipping path metric");
            }
        }
        Ok(set)
    }

    /// Metrics walked per source region
    pub(crate) fn regional(&self) -> &[Metric<'db, D>] {
        &self.regional
    }

    pub(crate) fn assert(&self) -> Option<&Metric<'db, D>> {
        self.assert.as_ref()
    }

    pub(crate) fn testbench(&self) -> Option<&Metric<'db, D>> {
        self.testbench.as_ref()
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests;
