//! Programmatic construction of an in-memory database.

use super::{LinkKey, MemoryDatabase, Node, NodeId};
use crate::database::{IntProperty, Relation, StrProperty};
use crate::object::ObjectType;
use std::collections::HashMap;

/// Builder for [`MemoryDatabase`]
///
/// Every method returns the [`NodeId`] of the node it created so later calls
/// can hang objects, children and views off it.
#[derive(Debug)]
pub struct MemoryDatabaseBuilder {
    design_name: String,
    design: NodeId,
    test: NodeId,
    test_names: Vec<String>,
    nodes: Vec<Node>,
    links: HashMap<LinkKey, Vec<NodeId>>,
}

impl MemoryDatabaseBuilder {
    pub(crate) fn new(design_name: impl Into<String>) -> Self {
        let design_name = design_name.into();
        let mut builder = Self {
            design_name: design_name.clone(),
            design: 0,
            test: 0,
            test_names: Vec::new(),
            nodes: Vec::new(),
            links: HashMap::new(),
        };
        builder.design = builder.node(ObjectType::Design.code(), &design_name, None);
        builder.test = builder.node(ObjectType::Test.code(), "test", None);
        builder
    }

    fn node(&mut self, type_code: i64, name: &str, full_name: Option<String>) -> NodeId {
        self.nodes.push(Node {
            type_code,
            name: Some(name.to_string()),
            full_name,
            ints: HashMap::new(),
            strs: HashMap::new(),
            annotations: HashMap::new(),
        });
        self.nodes.len() - 1
    }

    fn link(&mut self, from: NodeId, metric: Option<NodeId>, relation: Relation, to: NodeId) {
        self.links.entry((from, metric, relation)).or_default().push(to);
    }

    fn full_name_of(&self, node: NodeId) -> Option<String> {
        self.nodes
            .get(node)
            .and_then(|node| node.full_name.clone().or_else(|| node.name.clone()))
    }

    /// The design node
    #[must_use]
    pub fn design(&self) -> NodeId {
        self.design
    }

    /// The test node
    #[must_use]
    pub fn test(&self) -> NodeId {
        self.test
    }

    /// Record a test run name; the first one is loaded, later ones merged
    pub fn test_name(&mut self, name: &str) -> NodeId {
        let node = self.node(ObjectType::TestName.code(), name, None);
        self.link(self.design, None, Relation::AvailableTests, node);
        self.test_names.push(name.to_string());
        node
    }

    /// Add a metric to the test
    pub fn metric(&mut self, name: &str) -> NodeId {
        let node = self.node(ObjectType::Metric.code(), name, None);
        self.link(self.test, None, Relation::Metrics, node);
        node
    }

    /// Add an instance under `parent`, or at the top of the design
    pub fn instance(&mut self, parent: Option<NodeId>, name: &str) -> NodeId {
        let full_name = match parent.and_then(|parent| self.full_name_of(parent)) {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.to_string(),
        };
        let node = self.node(ObjectType::SourceInstance.code(), name, Some(full_name));
        let from = parent.unwrap_or(self.design);
        self.link(from, None, Relation::Instances, node);
        self.link(node, None, Relation::Parent, from);
        node
    }

    /// The view of `instance` under `metric`; objects hang off the returned node
    pub fn qualify(&mut self, instance: NodeId, metric: NodeId) -> NodeId {
        if let Some(existing) = self
            .links
            .get(&(instance, Some(metric), Relation::Identity))
            .and_then(|views| views.first())
        {
            return *existing;
        }
        let (name, full_name) = self
            .nodes
            .get(instance)
            .map(|node| (node.name.clone().unwrap_or_default(), node.full_name.clone()))
            .unwrap_or_default();
        let node = self.node(ObjectType::SourceInstance.code(), &name, full_name);
        self.link(instance, Some(metric), Relation::Identity, node);
        self.link(node, None, Relation::Parent, instance);
        node
    }

    /// Add an unqualified definition (source module)
    pub fn definition(&mut self, name: &str) -> NodeId {
        let node = self.node(ObjectType::SourceDefinition.code(), name, None);
        self.link(self.design, None, Relation::Definitions, node);
        node
    }

    /// Add a variant of `definition` under `metric`
    pub fn variant(&mut self, definition: NodeId, metric: NodeId, name: &str) -> NodeId {
        let node = self.node(ObjectType::SourceDefinition.code(), name, None);
        self.link(definition, Some(metric), Relation::Definitions, node);
        self.link(node, None, Relation::Parent, definition);
        node
    }

    /// Add a covergroup definition reached from the test under `metric`
    pub fn covergroup(&mut self, metric: NodeId, name: &str) -> NodeId {
        let node = self.node(ObjectType::SourceDefinition.code(), name, None);
        self.link(self.test, Some(metric), Relation::Definitions, node);
        node
    }

    /// Add an instance of a covergroup variant
    pub fn variant_instance(&mut self, variant: NodeId, name: &str) -> NodeId {
        let full_name = self
            .full_name_of(variant)
            .map_or_else(|| name.to_string(), |prefix| format!("{prefix}.{name}"));
        let node = self.node(ObjectType::SourceInstance.code(), name, Some(full_name));
        self.link(variant, None, Relation::Instances, node);
        self.link(node, None, Relation::Parent, variant);
        node
    }

    /// Add an assertion reached from the test under `metric`
    ///
    /// `parent` is the enclosing region; `None` puts it in the root scope.
    pub fn assertion(&mut self, metric: NodeId, parent: Option<NodeId>, name: &str) -> NodeId {
        let node = self.node(ObjectType::Sequence.code(), name, None);
        self.link(self.test, Some(metric), Relation::Objects, node);
        if let Some(parent) = parent {
            self.link(node, None, Relation::Parent, parent);
        }
        node
    }

    /// Add an object of a known type under a region, container or assertion
    pub fn object(&mut self, parent: NodeId, ty: ObjectType, name: &str) -> NodeId {
        self.object_with_code(parent, ty.code(), name)
    }

    /// Add an object with a raw type code, known or not
    pub fn object_with_code(&mut self, parent: NodeId, type_code: i64, name: &str) -> NodeId {
        let node = self.node(type_code, name, None);
        self.link(parent, None, Relation::Objects, node);
        self.link(node, None, Relation::Parent, parent);
        node
    }

    /// Add a component link from a cross to one of its coverpoints
    pub fn component(&mut self, cross: NodeId, point: NodeId) {
        self.link(cross, None, Relation::Components, point);
    }

    /// Set an annotation
    pub fn annotate(&mut self, node: NodeId, key: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.annotations.insert(key.to_string(), value.to_string());
        }
    }

    /// Set an integer property
    pub fn set_int(&mut self, node: NodeId, property: IntProperty, value: i64) {
        if property == IntProperty::Type {
            if let Some(node) = self.nodes.get_mut(node) {
                node.type_code = value;
            }
            return;
        }
        if let Some(node) = self.nodes.get_mut(node) {
            node.ints.insert(property, value);
        }
    }

    /// Set a string property other than the names
    pub fn set_str(&mut self, node: NodeId, property: StrProperty, value: &str) {
        if let Some(node) = self.nodes.get_mut(node) {
            match property {
                StrProperty::Name => node.name = Some(value.to_string()),
                StrProperty::FullName => node.full_name = Some(value.to_string()),
                other => {
                    node.strs.insert(other, value.to_string());
                }
            }
        }
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> MemoryDatabase {
        MemoryDatabase::from_parts(
            self.design_name,
            self.design,
            self.test,
            self.test_names,
            self.nodes,
            self.links,
        )
    }
}
