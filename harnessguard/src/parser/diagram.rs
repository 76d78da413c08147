//! Diagram JSON reader
//!
//! Diagrams come from an editor export and are treated as untrusted: any
//! field may be missing or carry the wrong JSON type. The reader walks the
//! `serde_json::Value` tree by hand and resolves every optional field once,
//! so a wrongly-typed collection becomes empty and a wrongly-typed scalar
//! becomes `None`. Only the text layer (reading the file, JSON syntax) can
//! fail.
//!
//! Expected shape (all fields optional):
//!
//! ```text
//! { "nodes": [ { "id", "type", "data": { "display_properties": [ {"key","value"} ],
//!                                        "ports": [ { "pins": [ {"id","function"} ] } ] } } ],
//!   "edges": [ { "id", "type", "source", "target", "sourceHandle", "targetHandle",
//!                "data": { "parent_id", "display_properties": [...] } } ] }
//! ```

use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::parser::schema::*;

#[derive(Debug, Error)]
pub enum DiagramParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct DiagramParser;

impl DiagramParser {
    /// Read and parse a diagram file.
    pub fn parse_file(path: &Path) -> Result<Diagram, DiagramParseError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    /// Parse diagram JSON text.
    pub fn parse_str(content: &str) -> Result<Diagram, DiagramParseError> {
        let value: Value = serde_json::from_str(content)?;
        Ok(Self::parse_value(&value))
    }

    /// Build a diagram from an already parsed JSON value. Never fails.
    pub fn parse_value(value: &Value) -> Diagram {
        Diagram {
            nodes: array_field(value, "nodes")
                .iter()
                .map(parse_node)
                .collect(),
            edges: array_field(value, "edges")
                .iter()
                .map(parse_edge)
                .collect(),
        }
    }
}

fn parse_node(value: &Value) -> Node {
    let node_type = scalar_field(value, "type");
    let data = value.get("data");

    Node {
        id: scalar_field(value, "id").unwrap_or_default(),
        kind: NodeKind::from_type_tag(node_type.as_deref()),
        node_type,
        display_properties: data.map(parse_display_properties).unwrap_or_default(),
        ports: data
            .map(|d| array_field(d, "ports").iter().map(parse_port).collect())
            .unwrap_or_default(),
    }
}

fn parse_port(value: &Value) -> Port {
    Port {
        pins: array_field(value, "pins")
            .iter()
            .map(|pin| Pin {
                id: scalar_field(pin, "id"),
                function: scalar_field(pin, "function"),
            })
            .collect(),
    }
}

fn parse_edge(value: &Value) -> Edge {
    let edge_type = scalar_field(value, "type");
    let data = value.get("data");

    Edge {
        id: scalar_field(value, "id").unwrap_or_default(),
        kind: EdgeKind::from_type_tag(edge_type.as_deref()),
        edge_type,
        source: reference_field(value, "source"),
        target: reference_field(value, "target"),
        source_handle: reference_field(value, "sourceHandle"),
        target_handle: reference_field(value, "targetHandle"),
        parent_id: data.and_then(|d| reference_field(d, "parent_id")),
        display_properties: data.map(parse_display_properties).unwrap_or_default(),
    }
}

fn parse_display_properties(data: &Value) -> Vec<DisplayProperty> {
    array_field(data, "display_properties")
        .iter()
        .filter_map(|entry| {
            let key = scalar_field(entry, "key")?;
            Some(DisplayProperty {
                key,
                value: scalar_field(entry, "value"),
            })
        })
        .collect()
}

/// Array at `key`, or an empty slice when absent or not an array.
fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    match value.get(key) {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Null) | None => &[],
        Some(other) => {
            tracing::warn!(
                "diagram field `{}` is a {} instead of an array; treating as empty",
                key,
                json_type_name(other)
            );
            &[]
        }
    }
}

/// Scalar at `key` as text. Strings are kept verbatim, numbers and booleans
/// use their JSON spelling, anything else is absent.
fn scalar_field(value: &Value, key: &str) -> Option<String> {
    value.as_object().and_then(|obj| scalar(obj, key))
}

/// Like [`scalar_field`], but an empty id counts as no reference at all.
fn reference_field(value: &Value, key: &str) -> Option<String> {
    scalar_field(value, key).filter(|id| !id.is_empty())
}

fn scalar(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
