//! Reference-name resolution shared by every rule and the test planner.

use std::collections::HashMap;

use crate::parser::schema::{Diagram, DisplayProperty, find_property, PROP_REFERENCE_NAME};

/// Maps node and edge ids to their display reference name.
///
/// Nodes take precedence over edges, and the first item carrying an id
/// decides: if that item has no usable `reference_name` the raw id is the
/// name, even when a later item with the same id has one.
pub struct NameResolver {
    names: HashMap<String, Option<String>>,
}

impl NameResolver {
    pub fn new(diagram: &Diagram) -> Self {
        let mut names = HashMap::new();
        for node in &diagram.nodes {
            names
                .entry(node.id.clone())
                .or_insert_with(|| reference_name(&node.display_properties));
        }
        for edge in &diagram.edges {
            names
                .entry(edge.id.clone())
                .or_insert_with(|| reference_name(&edge.display_properties));
        }
        Self { names }
    }

    /// Reference name for `id`, falling back to the id itself.
    pub fn resolve(&self, id: &str) -> String {
        self.names
            .get(id)
            .and_then(|name| name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

fn reference_name(properties: &[DisplayProperty]) -> Option<String> {
    find_property(properties, PROP_REFERENCE_NAME)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
