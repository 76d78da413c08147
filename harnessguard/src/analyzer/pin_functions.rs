//! Pin Function Index
//!
//! Lookup from pin id to the electrical role declared on that pin. Built
//! fresh for every analysis run from the node port declarations.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::schema::{Diagram, Edge};

/// Canonical pin roles the connection rules know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinRole {
    Pwr,
    Gnd,
    TxPlus,
    TxMinus,
    RxPlus,
    RxMinus,
}

impl PinRole {
    /// Parse an upper-cased function label. Anything non-canonical is `None`.
    pub fn from_function(function: &str) -> Option<Self> {
        match function {
            "PWR" => Some(PinRole::Pwr),
            "GND" => Some(PinRole::Gnd),
            "TX+" => Some(PinRole::TxPlus),
            "TX-" => Some(PinRole::TxMinus),
            "RX+" => Some(PinRole::RxPlus),
            "RX-" => Some(PinRole::RxMinus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PinRole::Pwr => "PWR",
            PinRole::Gnd => "GND",
            PinRole::TxPlus => "TX+",
            PinRole::TxMinus => "TX-",
            PinRole::RxPlus => "RX+",
            PinRole::RxMinus => "RX-",
        }
    }

    pub fn is_serial(&self) -> bool {
        matches!(
            self,
            PinRole::TxPlus | PinRole::TxMinus | PinRole::RxPlus | PinRole::RxMinus
        )
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pin id -> upper-cased function label.
#[derive(Debug, Clone, Default)]
pub struct PinFunctionIndex {
    functions: HashMap<String, String>,
}

impl PinFunctionIndex {
    /// Index every pin that has both an id and a function. A pin id seen
    /// twice keeps the function of its last occurrence.
    pub fn new(diagram: &Diagram) -> Self {
        let functions = diagram
            .nodes
            .iter()
            .flat_map(|node| node.pins())
            .filter_map(|pin| {
                let id = pin.id.as_deref().filter(|id| !id.is_empty())?;
                let function = pin.function.as_deref().filter(|f| !f.is_empty())?;
                Some((id.to_string(), function.to_uppercase()))
            })
            .collect();
        Self { functions }
    }

    /// Declared function of a pin, upper-cased.
    pub fn function(&self, pin_id: &str) -> Option<&str> {
        self.functions.get(pin_id).map(String::as_str)
    }

    /// Functions at (source, target) of an edge, only when both ends resolve.
    pub fn edge_functions(&self, edge: &Edge) -> Option<(&str, &str)> {
        let source = self.function(edge.source_handle.as_deref()?)?;
        let target = self.function(edge.target_handle.as_deref()?)?;
        Some((source, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::diagram::DiagramParser;
    use serde_json::json;

    fn diagram() -> Diagram {
        DiagramParser::parse_value(&json!({
            "nodes": [
                {"id": "N1", "data": {"ports": [
                    {"pins": [{"id": "P1", "function": "pwr"}, {"id": "P2", "function": "Tx+"}]},
                    {"pins": [{"id": "P3"}, {"function": "GND"}, {"id": "P4", "function": ""}]}
                ]}},
                {"id": "N2", "data": {"ports": [{"pins": [{"id": "P5", "function": "sig"}]}]}}
            ]
        }))
    }

    #[test]
    fn test_index_uppercases_functions() {
        let index = PinFunctionIndex::new(&diagram());
        assert_eq!(index.function("P1"), Some("PWR"));
        assert_eq!(index.function("P2"), Some("TX+"));
        assert_eq!(index.function("P5"), Some("SIG"));
        assert_eq!(index.function("P3"), None);
        assert_eq!(index.function("P4"), None);
    }

    #[test]
    fn test_roles() {
        let index = PinFunctionIndex::new(&diagram());
        let role = |pin: &str| index.function(pin).and_then(PinRole::from_function);
        assert_eq!(role("P1"), Some(PinRole::Pwr));
        assert_eq!(role("P2"), Some(PinRole::TxPlus));
        assert_eq!(role("P5"), None);
        assert!(PinRole::RxMinus.is_serial());
        assert!(!PinRole::Gnd.is_serial());
        assert_eq!(PinRole::TxMinus.to_string(), "TX-");
    }

    #[test]
    fn test_duplicate_pin_id_last_write_wins() {
        let diagram = DiagramParser::parse_value(&json!({
            "nodes": [
                {"id": "A", "data": {"ports": [{"pins": [{"id": "P1", "function": "PWR"}]}]}},
                {"id": "B", "data": {"ports": [{"pins": [{"id": "P1", "function": "GND"}]}]}}
            ]
        }));
        assert_eq!(PinFunctionIndex::new(&diagram).function("P1"), Some("GND"));
    }

    #[test]
    fn test_edge_functions_requires_both_ends() {
        let index = PinFunctionIndex::new(&diagram());
        let mut edge = Edge::new("E1");
        edge.source_handle = Some("P1".into());
        assert_eq!(index.edge_functions(&edge), None);
        edge.target_handle = Some("P3".into());
        assert_eq!(index.edge_functions(&edge), None);
        edge.target_handle = Some("P2".into());
        assert_eq!(index.edge_functions(&edge), Some(("PWR", "TX+")));
    }

    #[test]
    fn test_empty_diagram() {
        let index = PinFunctionIndex::new(&Diagram::default());
        assert_eq!(index.function("P1"), None);
        assert_eq!(index.edge_functions(&Edge::new("E1")), None);
    }
}
