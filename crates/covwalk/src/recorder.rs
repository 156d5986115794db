//! Recording Visitor
//!
//! Captures every hook call as a serializable [`VisitEvent`], naming handles
//! by their database name. Used to assert call sequences in tests and to dump
//! a walk as JSON.

use crate::database::CoverageDatabase;
use crate::handle::Handle;
use crate::metric::Metric;
use crate::visitor::{ObjectSite, Visitor};
use serde::{Deserialize, Serialize};

/// Names of the handles an object hook was given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLabel {
    /// Qualified region name
    pub region: Option<String>,
    /// Metric name
    pub metric: String,
    /// Parent container or assertion name
    pub parent: Option<String>,
}

/// One recorded hook call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "hook", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum VisitEvent {
    StartInstance { name: String },
    FinishInstance { name: String },
    StartQualifiedInstance { name: String, metric: String },
    FinishQualifiedInstance { name: String, metric: String },
    StartDefinition { name: String },
    FinishDefinition { name: String },
    StartVariant { name: String, metric: String },
    FinishVariant { name: String, metric: String },
    StartMetric { metric: String },
    FinishMetric { metric: String },
    TestName { name: String },
    StartContainer { name: String, site: SiteLabel },
    FinishContainer { name: String, site: SiteLabel },
    LeafObject { name: String, site: SiteLabel },
    CovObject { name: String, site: SiteLabel },
}

impl VisitEvent {
    /// Hook name, e.g. `"start_container"`
    #[must_use]
    pub const fn hook(&self) -> &'static str {
        match self {
            Self::StartInstance { .. } => "start_instance",
            Self::FinishInstance { .. } => "finish_instance",
            Self::StartQualifiedInstance { .. } => "start_qualified_instance",
            Self::FinishQualifiedInstance { .. } => "finish_qualified_instance",
            Self::StartDefinition { .. } => "start_definition",
            Self::FinishDefinition { .. } => "finish_definition",
            Self::StartVariant { .. } => "start_variant",
            Self::FinishVariant { .. } => "finish_variant",
            Self::StartMetric { .. } => "start_metric",
            Self::FinishMetric { .. } => "finish_metric",
            Self::TestName { .. } => "test_name",
            Self::StartContainer { .. } => "start_container",
            Self::FinishContainer { .. } => "finish_container",
            Self::LeafObject { .. } => "leaf_object",
            Self::CovObject { .. } => "cov_object",
        }
    }

    /// Name of the handle the hook was given (the metric for metric hooks)
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::StartMetric { metric } | Self::FinishMetric { metric } => metric,
            Self::StartInstance { name }
            | Self::FinishInstance { name }
            | Self::StartQualifiedInstance { name, .. }
            | Self::FinishQualifiedInstance { name, .. }
            | Self::StartDefinition { name }
            | Self::FinishDefinition { name }
            | Self::StartVariant { name, .. }
            | Self::FinishVariant { name, .. }
            | Self::TestName { name }
            | Self::StartContainer { name, .. }
            | Self::FinishContainer { name, .. }
            | Self::LeafObject { name, .. }
            | Self::CovObject { name, .. } => name,
        }
    }

    /// `hook(name)` shorthand used in sequence assertions
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}({})", self.hook(), self.name())
    }
}

/// Visitor that records every hook call
#[derive(Debug, Clone, Default)]
pub struct RecordingVisitor {
    events: Vec<VisitEvent>,
}

impl RecordingVisitor {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, in call order
    #[must_use]
    pub fn events(&self) -> &[VisitEvent] {
        &self.events
    }

    /// Take the recorded events
    #[must_use]
    pub fn into_events(self) -> Vec<VisitEvent> {
        self.events
    }

    /// `hook(name)` labels, in call order
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.events.iter().map(VisitEvent::label).collect()
    }

    /// Number of events for one hook
    #[must_use]
    pub fn count(&self, hook: &str) -> usize {
        self.events.iter().filter(|e| e.hook() == hook).count()
    }

    /// Number of recorded events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Recorded events as a JSON array
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}

fn label<D: CoverageDatabase + ?Sized>(handle: &Handle<'_, D>) -> String {
    match handle.name() {
        Ok(Some(name)) => name,
        _ => handle.raw().to_string(),
    }
}

fn site_label<D: CoverageDatabase + ?Sized>(site: ObjectSite<'_, '_, D>) -> SiteLabel {
    SiteLabel {
        region: site.region.map(label),
        metric: site.metric.name().to_string(),
        parent: site.parent.map(label),
    }
}

impl<D: CoverageDatabase + ?Sized> Visitor<D> for RecordingVisitor {
    fn start_instance(&mut self, instance: &Handle<'_, D>) {
        self.events.push(VisitEvent::StartInstance {
            name: label(instance),
        });
    }

    fn finish_instance(&mut self, instance: &Handle<'_, D>) {
        self.events.push(VisitEvent::FinishInstance {
            name: label(instance),
        });
    }

    fn start_qualified_instance(&mut self, instance: &Handle<'_, D>, metric: &Metric<'_, D>) {
        self.events.push(VisitEvent::StartQualifiedInstance {
            name: label(instance),
            metric: metric.name().to_string(),
        });
    }

    fn finish_qualified_instance(&mut self, instance: &Handle<'_, D>, metric: &Metric<'_, D>) {
        self.events.push(VisitEvent::FinishQualifiedInstance {
            name: label(instance),
            metric: metric.name().to_string(),
        });
    }

    fn start_definition(&mut self, definition: &Handle<'_, D>) {
        self.events.push(VisitEvent::StartDefinition {
            name: label(definition),
        });
    }

    fn finish_definition(&mut self, definition: &Handle<'_, D>) {
        self.events.push(VisitEvent::FinishDefinition {
            name: label(definition),
        });
    }

    fn start_variant(&mut self, variant: &Handle<'_, D>, metric: &Metric<'_, D>) {
        self.events.push(VisitEvent::StartVariant {
            name: label(variant),
            metric: metric.name().to_string(),
        });
    }

    fn finish_variant(&mut self, variant: &Handle<'_, D>, metric: &Metric<'_, D>) {
        self.events.push(VisitEvent::FinishVariant {
            name: label(variant),
            metric: metric.name().to_string(),
        });
    }

    fn start_metric(&mut self, metric: &Metric<'_, D>) {
        self.events.push(VisitEvent::StartMetric {
            metric: metric.name().to_string(),
        });
    }

    fn finish_metric(&mut self, metric: &Metric<'_, D>) {
        self.events.push(VisitEvent::FinishMetric {
            metric: metric.name().to_string(),
        });
    }

    fn visit_test_name(&mut self, test_name: &Handle<'_, D>) {
        self.events.push(VisitEvent::TestName {
            name: label(test_name),
        });
    }

    fn start_container(&mut self, container: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {
        self.events.push(VisitEvent::StartContainer {
            name: label(container),
            site: site_label(site),
        });
    }

    fn finish_container(&mut self, container: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {
        self.events.push(VisitEvent::FinishContainer {
            name: label(container),
            site: site_label(site),
        });
    }

    fn visit_leaf_object(&mut self, object: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {
        self.events.push(VisitEvent::LeafObject {
            name: label(object),
            site: site_label(site),
        });
    }

    fn visit_cov_object(&mut self, object: &Handle<'_, D>, site: ObjectSite<'_, '_, D>) {
        self.events.push(VisitEvent::CovObject {
            name: label(object),
            site: site_label(site),
        });
    }
}
