//! YAML/JSON fixtures for the in-memory database.
//!
//! ```yaml
//! design: top.vdb
//! tests: [smoke, regress]
//! metrics: [line, tgl, assert]
//! instances:
//!   - name: top
//!     coverage:
//!       tgl:
//!         - type: container
//!           name: sig
//!           children:
//!             - { type: block, name: "0->1" }
//! assertions:
//!   - name: a_req_ack
//!     metric: assert
//!     parent: top
//!     blocks: [attempts, allsuccesses]
//! ```

use super::{MemoryDatabase, MemoryDatabaseBuilder, NodeId};
use crate::database::IntProperty;
use crate::object::ObjectType;
use crate::result::{WalkError, WalkResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Whole-design fixture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    /// Locator the design loads from
    pub design: String,
    /// Test run names, loaded then merged in order
    #[serde(default)]
    pub tests: Vec<String>,
    /// Metric names supplied by the test
    #[serde(default)]
    pub metrics: Vec<String>,
    /// Top-level instances
    #[serde(default)]
    pub instances: Vec<InstanceFixture>,
    /// Unqualified definitions
    #[serde(default)]
    pub definitions: Vec<DefinitionFixture>,
    /// Covergroups reached from the test
    #[serde(default)]
    pub covergroups: Vec<CovergroupFixture>,
    /// Assertions reached from the test
    #[serde(default)]
    pub assertions: Vec<AssertionFixture>,
}

/// An instance, its children and its per-metric object trees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceFixture {
    /// Local name
    pub name: String,
    /// Child instances
    #[serde(default)]
    pub children: Vec<InstanceFixture>,
    /// Objects of the qualified view, keyed by metric name
    #[serde(default)]
    pub coverage: BTreeMap<String, Vec<ObjectFixture>>,
}

/// A definition and its variants, keyed by metric name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionFixture {
    /// Module name
    pub name: String,
    /// Variants per metric
    #[serde(default)]
    pub variants: BTreeMap<String, Vec<VariantFixture>>,
}

/// A qualified definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantFixture {
    /// Variant name
    pub name: String,
    /// Objects directly in the variant
    #[serde(default)]
    pub objects: Vec<ObjectFixture>,
    /// Instances of the variant (covergroup instances)
    #[serde(default)]
    pub instances: Vec<VariantInstanceFixture>,
}

/// An instance of a covergroup variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantInstanceFixture {
    /// Instance name
    pub name: String,
    /// Objects of the instance
    #[serde(default)]
    pub objects: Vec<ObjectFixture>,
}

/// A covergroup and its variants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CovergroupFixture {
    /// Covergroup name
    pub name: String,
    /// Testbench metric name
    pub metric: String,
    /// Variants
    #[serde(default)]
    pub variants: Vec<VariantFixture>,
}

/// An assertion and its child blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssertionFixture {
    /// Assertion name
    pub name: String,
    /// Assert metric name
    pub metric: String,
    /// Dotted path of the enclosing instance; absent for the root scope
    #[serde(default)]
    pub parent: Option<String>,
    /// Child block names, in order
    #[serde(default)]
    pub blocks: Vec<String>,
}

/// Object type given by name or by raw code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectTypeSpec {
    /// A known type tag, e.g. `container` or `value_set`
    Known(ObjectType),
    /// Any integer code, including ones outside the known set
    Code(i64),
}

impl ObjectTypeSpec {
    /// Integer code reported by the database
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Known(ty) => ty.code(),
            Self::Code(code) => code,
        }
    }
}

/// A coverage object and its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectFixture {
    /// Type tag
    #[serde(rename = "type")]
    pub ty: ObjectTypeSpec,
    /// Local name
    pub name: String,
    /// Contained objects
    #[serde(default)]
    pub children: Vec<ObjectFixture>,
    /// Annotations, e.g. `is_cross: "1"`
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Integer properties
    #[serde(default)]
    pub properties: HashMap<IntProperty, i64>,
}

impl Fixture {
    /// Parse a YAML fixture
    pub fn from_yaml_str(text: &str) -> WalkResult<Self> {
        serde_yaml_ng::from_str(text).map_err(|e| WalkError::fixture(e.to_string()))
    }

    /// Parse a JSON fixture
    pub fn from_json_str(text: &str) -> WalkResult<Self> {
        serde_json::from_str(text).map_err(|e| WalkError::fixture(e.to_string()))
    }

    /// Read a fixture file, choosing the format by extension
    pub fn from_path(path: impl AsRef<Path>) -> WalkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(WalkError::fixture(format!(
                "unsupported fixture extension: {}",
                path.display()
            ))),
        }
    }

    /// Serialize as YAML
    pub fn to_yaml_string(&self) -> WalkResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| WalkError::fixture(e.to_string()))
    }

    /// Build the database described by this fixture
    pub fn build(&self) -> WalkResult<MemoryDatabase> {
        let mut builder = MemoryDatabase::builder(self.design.clone());
        for test in &self.tests {
            builder.test_name(test);
        }
        let mut metrics = HashMap::new();
        for name in &self.metrics {
            metrics.insert(name.as_str(), builder.metric(name));
        }
        let metric_id = |name: &str| -> WalkResult<NodeId> {
            metrics
                .get(name)
                .copied()
                .ok_or_else(|| WalkError::fixture(format!("unknown metric: {name}")))
        };

        let mut paths: HashMap<String, NodeId> = HashMap::new();
        let mut pending: Vec<(Option<(NodeId, String)>, &InstanceFixture)> = self
            .instances
            .iter()
            .rev()
            .map(|instance| (None, instance))
            .collect();
        while let Some((parent, instance)) = pending.pop() {
            let (node, path) = match parent {
                Some((parent, prefix)) => (
                    builder.instance(Some(parent), &instance.name),
                    format!("{prefix}.{}", instance.name),
                ),
                None => (builder.instance(None, &instance.name), instance.name.clone()),
            };
            for (metric_name, objects) in &instance.coverage {
                let view = builder.qualify(node, metric_id(metric_name)?);
                add_objects(&mut builder, view, objects);
            }
            pending.extend(
                instance
                    .children
                    .iter()
                    .rev()
                    .map(|child| (Some((node, path.clone())), child)),
            );
            paths.insert(path, node);
        }

        for definition in &self.definitions {
            let node = builder.definition(&definition.name);
            for (metric_name, variants) in &definition.variants {
                let metric = metric_id(metric_name)?;
                for variant in variants {
                    add_variant(&mut builder, node, metric, variant);
                }
            }
        }

        for group in &self.covergroups {
            let metric = metric_id(&group.metric)?;
            let node = builder.covergroup(metric, &group.name);
            for variant in &group.variants {
                add_variant(&mut builder, node, metric, variant);
            }
        }

        for assertion in &self.assertions {
            let parent = match &assertion.parent {
                Some(path) => Some(paths.get(path).copied().ok_or_else(|| {
                    WalkError::fixture(format!(
                        "assertion {} names unknown parent {path}",
                        assertion.name
                    ))
                })?),
                None => None,
            };
            let node = builder.assertion(metric_id(&assertion.metric)?, parent, &assertion.name);
            for block in &assertion.blocks {
                builder.object(node, ObjectType::Block, block);
            }
        }

        Ok(builder.build())
    }
}

fn add_variant(
    builder: &mut MemoryDatabaseBuilder,
    definition: NodeId,
    metric: NodeId,
    variant: &VariantFixture,
) {
    let node = builder.variant(definition, metric, &variant.name);
    add_objects(builder, node, &variant.objects);
    for instance in &variant.instances {
        let inst = builder.variant_instance(node, &instance.name);
        add_objects(builder, inst, &instance.objects);
    }
}

fn add_objects(builder: &mut MemoryDatabaseBuilder, parent: NodeId, objects: &[ObjectFixture]) {
    let mut pending: Vec<(NodeId, &ObjectFixture)> =
        objects.iter().rev().map(|object| (parent, object)).collect();
    while let Some((parent, object)) = pending.pop() {
        let node = builder.object_with_code(parent, object.ty.code(), &object.name);
        for (key, value) in &object.annotations {
            builder.annotate(node, key, value);
        }
        for (&property, &value) in &object.properties {
            builder.set_int(node, property, value);
        }
        pending.extend(object.children.iter().rev().map(|child| (node, child)));
    }
}
