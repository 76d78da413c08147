//! Harness diagram model.
//!
//! Every collection defaults to empty and every optional field to `None`, so
//! the rules can walk the model without re-checking presence. Instances are
//! produced by [`crate::parser::diagram::DiagramParser`].

use serde::{Deserialize, Serialize};

/// Node type tag for cable grouping nodes.
pub const BUNDLE_NODE: &str = "bundleNode";
/// Node type tag for placeholder termini.
pub const GHOST_NODE: &str = "ghostNode";
/// Edge type tag for sub-wires living inside a cable.
pub const BUNDLED_EDGE: &str = "bundledEdge";

pub const PROP_REFERENCE_NAME: &str = "reference_name";
pub const PROP_PART_NAME: &str = "part_name";
pub const PROP_LENGTH: &str = "length";
pub const PROP_INSULATION: &str = "insulation";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Any ordinary component (connector, battery, board...)
    Component,
    Bundle,
    Ghost,
}

impl NodeKind {
    pub fn from_type_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(BUNDLE_NODE) => NodeKind::Bundle,
            Some(GHOST_NODE) => NodeKind::Ghost,
            _ => NodeKind::Component,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub node_type: Option<String>,
    pub kind: NodeKind,
    pub display_properties: Vec<DisplayProperty>,
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub pins: Vec<Pin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub id: Option<String>,
    pub function: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Wire,
    Bundled,
}

impl EdgeKind {
    pub fn from_type_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(BUNDLED_EDGE) => EdgeKind::Bundled,
            _ => EdgeKind::Wire,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub edge_type: Option<String>,
    pub kind: EdgeKind,
    pub source: Option<String>,
    pub target: Option<String>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    /// Owning cable edge, for bundled sub-wires.
    pub parent_id: Option<String>,
    pub display_properties: Vec<DisplayProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayProperty {
    pub key: String,
    pub value: Option<String>,
}

impl DisplayProperty {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// First property with `key` that carries a value.
///
/// Entries whose value is `null` are skipped so a later duplicate key can
/// still match.
pub fn find_property<'a>(properties: &'a [DisplayProperty], key: &str) -> Option<&'a str> {
    properties
        .iter()
        .filter(|p| p.key == key)
        .find_map(|p| p.value.as_deref())
}

/// True when the property is absent or only whitespace.
pub fn is_blank_property(properties: &[DisplayProperty], key: &str) -> bool {
    find_property(properties, key).map_or(true, |v| v.trim().is_empty())
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: None,
            kind: NodeKind::Component,
            display_properties: Vec::new(),
            ports: Vec::new(),
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        find_property(&self.display_properties, key)
    }

    /// Ordinary component, i.e. neither a cable bundle nor a ghost.
    pub fn is_component(&self) -> bool {
        self.kind == NodeKind::Component
    }

    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.ports.iter().flat_map(|port| port.pins.iter())
    }
}

impl Edge {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            edge_type: None,
            kind: EdgeKind::Wire,
            source: None,
            target: None,
            source_handle: None,
            target_handle: None,
            parent_id: None,
            display_properties: Vec::new(),
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        find_property(&self.display_properties, key)
    }

    pub fn is_bundled(&self) -> bool {
        self.kind == EdgeKind::Bundled
    }

    /// Node ids at both ends that are present.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.source.as_deref().into_iter().chain(self.target.as_deref())
    }

    /// Pin handles at both ends that are present.
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.source_handle
            .as_deref()
            .into_iter()
            .chain(self.target_handle.as_deref())
    }
}

impl Diagram {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// First node carrying `id`.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// First edge carrying `id`.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Nodes that count as components for completeness checks.
    pub fn components(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_component())
    }

    /// Ordinary (non-bundled) wires.
    pub fn wires(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| !e.is_bundled())
    }

    /// Sub-wires belonging to a cable.
    pub fn bundled_wires(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.is_bundled())
    }
}
