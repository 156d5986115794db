//! Visitor Hooks
//!
//! Implement [`Visitor`] and override only the hooks you need; every hook
//! defaults to a no-op. Hooks receive guards borrowed from the walker, so
//! any property query a hook makes runs while the handle is still live.
//!
//! Ordering guarantees:
//!
//! - `start_instance(I)` fires before, and `finish_instance(I)` after, the
//!   start and finish of every descendant instance. The qualified instances of
//!   `I` are visited between the last child's finish and `finish_instance(I)`.
//! - `start_container(C)` precedes every hook fired for the contents of `C`;
//!   `finish_container(C)` follows all of them.
//! - `visit_leaf_object` never receives a container. `visit_cov_object` may,
//!   when a container is the coverable unit of its metric (line coverage of
//!   basic blocks). Prefer `visit_cov_object` in general.

use crate::database::CoverageDatabase;
use crate::handle::Handle;
use crate::metric::Metric;
use std::fmt;

/// Where an object sits: the qualified region, metric and parent container
pub struct ObjectSite<'a, 'db, D: CoverageDatabase + ?Sized> {
    /// Qualified region being walked; `None` only for assertions in the root scope
    pub region: Option<&'a Handle<'db, D>>,
    /// Metric qualifying the region
    pub metric: &'a Metric<'db, D>,
    /// Enclosing container, or the assertion for assertion success blocks
    pub parent: Option<&'a Handle<'db, D>>,
}

impl<D: CoverageDatabase + ?Sized> Clone for ObjectSite<'_, '_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: CoverageDatabase + ?Sized> Copy for ObjectSite<'_, '_, D> {}

impl<D: CoverageDatabase + ?Sized> fmt::Debug for ObjectSite<'_, '_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSite")
            .field("region", &self.region)
            .field("metric", &self.metric)
            .field("parent", &self.parent)
            .finish()
    }
}

/// Traversal hooks, all no-op by default
#[allow(unused_variables)]
pub trait Visitor<D: CoverageDatabase + ?Sized> {
    /// Unqualified instance entered
    fn start_instance(&mut self, instance: &Handle<'_, D>) {}
    /// Unqualified instance left
    fn finish_instance(&mut self, instance: &Handle<'_, D>) {}

    /// Metric-qualified instance entered
    fn start_qualified_instance(&mut self, instance: &Handle<'_, D>, metric: &Metric<'_, D>) {}
    /// Metric-qualified instance left
    fn finish_qualified_instance(&mut self, instance: &Handle<'_, D>, metric: &Metric<'_, D>) {}

    /// Unqualified definition (module) entered
    fn start_definition(&mut self, definition: &Handle<'_, D>) {}
    /// Unqualified definition left
    fn finish_definition(&mut self, definition: &Handle<'_, D>) {}

    /// Metric-qualified definition (variant) entered
    fn start_variant(&mut self, variant: &Handle<'_, D>, metric: &Metric<'_, D>) {}
    /// Metric-qualified definition left
    fn finish_variant(&mut self, variant: &Handle<'_, D>, metric: &Metric<'_, D>) {}

    /// Reserved metric bracket; the walker does not fire it
    fn start_metric(&mut self, metric: &Metric<'_, D>) {}
    /// Reserved metric bracket; the walker does not fire it
    fn finish_metric(&mut self, metric: &Metric<'_, D>) {}

    /// Once per test name when tests are loaded and merged
    fn visit_test_name(&mut self, test_name: &Handle<'_, D>) {}

    /// Container entered
    fn start_container(&mut self, container: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {}
    /// Container left
    fn finish_container(&mut self, container: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {}

    /// Every leaf object, across all metrics
    fn visit_leaf_object(&mut self, object: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {}

    /// Every coverable unit, across all metrics
    fn visit_cov_object(&mut self, object: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {}
}

impl<D, V> Visitor<D> for &mut V
where
    D: CoverageDatabase + ?Sized,
    V: Visitor<D> + ?Sized,
{
    fn start_instance(&mut self, instance: &Handle<'_, D>) {
        (**self).start_instance(instance);
    }

    fn finish_instance(&mut self, instance: &Handle<'_, D>) {
        (**self).finish_instance(instance);
    }

    fn start_qualified_instance(&mut self, instance: &Handle<'_, D>, metric: &Metric<'_, D>) {
        (**self).start_qualified_instance(instance, metric);
    }

    fn finish_qualified_instance(&mut self, instance: &Handle<'_, D>, metric: &Metric<'_, D>) {
        (**self).finish_qualified_instance(instance, metric);
    }

    fn start_definition(&mut self, definition: &Handle<'_, D>) {
        (**self).start_definition(definition);
    }

    fn finish_definition(&mut self, definition: &Handle<'_, D>) {
        (**self).finish_definition(definition);
    }

    fn start_variant(&mut self, variant: &Handle<'_, D>, metric: &Metric<'_, D>) {
        (**self).start_variant(variant, metric);
    }

    fn finish_variant(&mut self, variant: &Handle<'_, D>, metric: &Metric<'_, D>) {
        (**self).finish_variant(variant, metric);
    }

    fn start_metric(&mut self, metric: &Metric<'_, D>) {
        (**self).start_metric(metric);
    }

    fn finish_metric(&mut self, metric: &Metric<'_, D>) {
        (**self).finish_metric(metric);
    }

    fn visit_test_name(&mut self, test_name: &Handle<'_, D>) {
        (**self).visit_test_name(test_name);
    }

    fn start_container(&mut self, container: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {
        (**self).start_container(container, site);
    }

    fn finish_container(&mut self, container: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {
        (**self).finish_container(container, site);
    }

    fn visit_leaf_object(&mut self, object: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {
        (**self).visit_leaf_object(object, site);
    }

    fn visit_cov_object(&mut self, object: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {
        (**self).visit_cov_object(object, site);
    }
}
