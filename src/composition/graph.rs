// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph
//!
//! A compiled composition is an ordered list of [`ResourceNode`]s. Nodes
//! reference each other inside their properties through provider-style
//! reference fields:
//!
//! ```text
//! "vpcIdRef":               { "name": "vectordb-vpc-dev" }
//! "subnetIdRefs":           [{ "name": "..." }, { "name": "..." }]
//! "masterPasswordSecretRef": { "name": "...", "namespace": "...", "key": "password" }
//! ```
//!
//! Each node's `depends_on` set is exactly the set of node ids whose names
//! it references. [`ResourceGraph::from_nodes`] checks that invariant, that
//! every dependency appears earlier in the list, and that a topological
//! order exists, before a graph value can exist at all.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use tracing::debug;

use crate::domain::resource_kind::ResourceKind;
use crate::errors::{CompositionError, CompositionResult};

/// Stable identifier of a node within one graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One resource descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNode {
    id: NodeId,
    kind: ResourceKind,
    name: String,
    properties: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    connection_details: BTreeMap<String, String>,
    depends_on: BTreeSet<NodeId>,
}

impl ResourceNode {
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Provider resource name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider parameters (`forProvider` for managed resources)
    pub fn properties(&self) -> &Value {
        &self.properties
    }

    /// Single property by key
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Connection data the resource publishes once applied
    pub fn connection_details(&self) -> &BTreeMap<String, String> {
        &self.connection_details
    }

    pub fn depends_on(&self) -> &BTreeSet<NodeId> {
        &self.depends_on
    }

    /// Names referenced through `*Ref` / `*Refs` fields, in sorted order
    pub fn referenced_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        collect_references(&self.properties, &mut names);
        names
    }
}

fn collect_references(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key.ends_with("Ref") {
                    if let Some(name) = child.get("name").and_then(Value::as_str) {
                        names.insert(name.to_string());
                    }
                } else if key.ends_with("Refs") {
                    if let Some(items) = child.as_array() {
                        names.extend(
                            items
                                .iter()
                                .filter_map(|item| item.get("name").and_then(Value::as_str))
                                .map(str::to_string),
                        );
                    }
                }
                collect_references(child, names);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, names);
            }
        }
        _ => {}
    }
}

/// Ordered, validated set of resource nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphDocument")]
pub struct ResourceGraph {
    nodes: Vec<ResourceNode>,
}

#[derive(Deserialize)]
struct GraphDocument {
    nodes: Vec<ResourceNode>,
}

impl TryFrom<GraphDocument> for ResourceGraph {
    type Error = CompositionError;

    fn try_from(doc: GraphDocument) -> Result<Self, Self::Error> {
        Self::from_nodes(doc.nodes)
    }
}

impl ResourceGraph {
    /// Validate and wrap an ordered node list
    ///
    /// # Errors
    /// [`CompositionError::IncompleteGraph`] when ids or names repeat, a
    /// reference points outside the graph, `depends_on` disagrees with the
    /// references, a dependency appears later than its dependent, or the
    /// dependencies contain a cycle.
    pub fn from_nodes(nodes: Vec<ResourceNode>) -> CompositionResult<Self> {
        let mut position: HashMap<&NodeId, usize> = HashMap::with_capacity(nodes.len());
        let mut ids_by_name: HashMap<&str, &NodeId> = HashMap::with_capacity(nodes.len());

        for (index, node) in nodes.iter().enumerate() {
            if position.insert(&node.id, index).is_some() {
                return Err(CompositionError::incomplete(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
            if ids_by_name.insert(&node.name, &node.id).is_some() {
                return Err(CompositionError::incomplete(format!(
                    "duplicate resource name {}",
                    node.name
                )));
            }
        }

        for (index, node) in nodes.iter().enumerate() {
            let mut referenced = BTreeSet::new();
            for name in node.referenced_names() {
                let id = ids_by_name.get(name.as_str()).ok_or_else(|| {
                    CompositionError::incomplete(format!(
                        "{} references unknown resource {name}",
                        node.id
                    ))
                })?;
                referenced.insert((*id).clone());
            }

            if referenced != node.depends_on {
                return Err(CompositionError::incomplete(format!(
                    "{} depends_on {:?} does not match its references {:?}",
                    node.id, node.depends_on, referenced
                )));
            }

            for dep in &node.depends_on {
                if position[dep] >= index {
                    return Err(CompositionError::incomplete(format!(
                        "{} appears before its dependency {dep}",
                        node.id
                    )));
                }
            }
        }

        let graph = Self { nodes };
        graph.topological_order()?;
        Ok(graph)
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Nodes of one kind, in graph order
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    pub fn first_of_kind(&self, kind: ResourceKind) -> Option<&ResourceNode> {
        self.of_kind(kind).next()
    }

    /// Kahn topological sort over `depends_on`
    ///
    /// Ties are broken by graph position, so for a valid graph the result
    /// equals the emitted order.
    pub fn topological_order(&self) -> CompositionResult<Vec<NodeId>> {
        let index: HashMap<&NodeId, usize> =
            self.nodes.iter().enumerate().map(|(i, n)| (&n.id, i)).collect();

        let mut in_degree = vec![0usize; self.nodes.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];

        for (i, node) in self.nodes.iter().enumerate() {
            for dep in &node.depends_on {
                let d = *index.get(dep).ok_or_else(|| {
                    CompositionError::incomplete(format!("{} depends on missing {dep}", node.id))
                })?;
                in_degree[i] += 1;
                dependents[d].push(i);
            }
        }

        let mut ready: VecDeque<usize> = (0..self.nodes.len())
            .filter(|i| in_degree[*i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(i) = ready.pop_front() {
            order.push(self.nodes[i].id.clone());
            for &next in &dependents[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    let at = ready.partition_point(|&r| r < next);
                    ready.insert(at, next);
                }
            }
        }

        if order.len() != self.nodes.len() {
            return Err(CompositionError::incomplete("dependency cycle detected"));
        }
        Ok(order)
    }
}

/// Incremental node list used by the builder
///
/// Dependencies are derived from the references in each node's properties;
/// a reference must name a node added earlier.
#[derive(Debug, Default)]
pub struct GraphAssembler {
    nodes: Vec<ResourceNode>,
    ids_by_name: HashMap<String, NodeId>,
}

impl GraphAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node without connection details
    pub fn add(
        &mut self,
        id: impl Into<String>,
        kind: ResourceKind,
        name: impl Into<String>,
        properties: Value,
    ) -> CompositionResult<()> {
        self.add_with_details(id, kind, name, properties, BTreeMap::new())
    }

    /// Append a node that publishes connection details
    pub fn add_with_details(
        &mut self,
        id: impl Into<String>,
        kind: ResourceKind,
        name: impl Into<String>,
        properties: Value,
        connection_details: BTreeMap<String, String>,
    ) -> CompositionResult<()> {
        let mut node = ResourceNode {
            id: NodeId::new(id),
            kind,
            name: name.into(),
            properties,
            connection_details,
            depends_on: BTreeSet::new(),
        };

        for referenced in node.referenced_names() {
            let dep = self.ids_by_name.get(&referenced).ok_or_else(|| {
                CompositionError::incomplete(format!(
                    "{} references {referenced} before it was added",
                    node.id
                ))
            })?;
            node.depends_on.insert(dep.clone());
        }

        debug!(
            id = %node.id,
            kind = %node.kind,
            name = %node.name,
            dependencies = node.depends_on.len(),
            "Added resource node"
        );

        self.ids_by_name.insert(node.name.clone(), node.id.clone());
        self.nodes.push(node);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a node with this resource name was already added
    pub fn contains_name(&self, name: &str) -> bool {
        self.ids_by_name.contains_key(name)
    }

    /// Validate and produce the graph
    pub fn finish(self) -> CompositionResult<ResourceGraph> {
        ResourceGraph::from_nodes(self.nodes)
    }
}
