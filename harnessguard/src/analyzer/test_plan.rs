//! Hardware test plan generation
//!
//! Suggests bench tests for every ordinary wire. The power and signal
//! checks are chosen by plain substring search over all display property
//! values, not by pin roles: a wire labelled "PWR/GND pair" gets a power
//! test even when its pins are unassigned, and a wire between a PWR and a GND
//! pin with no such label does not.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzer::names::NameResolver;
use crate::parser::schema::{Diagram, Edge, PROP_INSULATION, PROP_LENGTH};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TestCategory {
    Continuity,
    Power,
    Signal,
    Mechanical,
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestCategory::Continuity => f.write_str("continuity"),
            TestCategory::Power => f.write_str("power"),
            TestCategory::Signal => f.write_str("signal"),
            TestCategory::Mechanical => f.write_str("mechanical"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestInstruction {
    /// Edge id the test applies to.
    pub id: String,
    pub category: TestCategory,
    pub instruction: String,
}

const UNKNOWN_COLOR: &str = "unknown color";

pub struct TestPlanGenerator;

impl TestPlanGenerator {
    /// Test steps for every non-bundled wire, in edge order. Per wire the
    /// order is continuity, mechanical, power, signal.
    pub fn generate(diagram: &Diagram) -> Vec<TestInstruction> {
        let names = NameResolver::new(diagram);
        let instructions: Vec<TestInstruction> = diagram
            .wires()
            .flat_map(|edge| Self::for_wire(edge, &names))
            .collect();
        tracing::debug!(
            "generated {} test instruction(s) for {} wire(s)",
            instructions.len(),
            diagram.wires().count()
        );
        instructions
    }

    fn for_wire(edge: &Edge, names: &NameResolver) -> Vec<TestInstruction> {
        let name = names.resolve(&edge.id);
        let color = edge
            .property(PROP_INSULATION)
            .filter(|c| !c.trim().is_empty())
            .map(str::to_uppercase)
            .unwrap_or_else(|| UNKNOWN_COLOR.to_string());

        let step = |category, instruction| TestInstruction {
            id: edge.id.clone(),
            category,
            instruction,
        };

        let mut steps = vec![step(
            TestCategory::Continuity,
            format!(
                "Continuity: measure resistance end to end on wire {} ({}); expect < 1 Ω",
                name, color
            ),
        )];

        // Any length value counts, blank included; the missing-length rule
        // is the one that flags blanks.
        if let Some(length) = edge.property(PROP_LENGTH) {
            steps.push(step(
                TestCategory::Mechanical,
                format!("Mechanical: verify wire {} ({}) is cut to length {}", name, color, length.trim()),
            ));
        }

        let values: Vec<String> = edge
            .display_properties
            .iter()
            .filter_map(|p| p.value.as_deref())
            .map(str::to_uppercase)
            .collect();
        let any_contains = |needle: &str| values.iter().any(|v| v.contains(needle));

        if any_contains("PWR") && any_contains("GND") {
            steps.push(step(
                TestCategory::Power,
                format!(
                    "Power: apply supply and verify voltage between PWR and GND on wire {} matches the rated value",
                    name
                ),
            ));
        }

        let signal = if any_contains("TX") {
            Some("TX")
        } else if any_contains("RX") {
            Some("RX")
        } else {
            None
        };
        if let Some(signal) = signal {
            steps.push(step(
                TestCategory::Signal,
                format!(
                    "Signal: probe {} on wire {} with an oscilloscope and confirm clean edges",
                    signal, name
                ),
            ));
        }

        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::diagram::DiagramParser;
    use serde_json::json;

    fn plan(value: serde_json::Value) -> Vec<TestInstruction> {
        TestPlanGenerator::generate(&DiagramParser::parse_value(&value))
    }

    fn categories(steps: &[TestInstruction]) -> Vec<TestCategory> {
        steps.iter().map(|s| s.category).collect()
    }

    #[test]
    fn test_continuity_always_emitted() {
        let steps = plan(json!({"edges": [{"id": "E1"}]}));
        assert_eq!(categories(&steps), vec![TestCategory::Continuity]);
        assert_eq!(steps[0].id, "E1");
        assert_eq!(
            steps[0].instruction,
            "Continuity: measure resistance end to end on wire E1 (unknown color); expect < 1 Ω"
        );
    }

    #[test]
    fn test_insulation_color_uppercased() {
        let steps = plan(json!({"edges": [{"id": "E1", "data": {"display_properties": [
            {"key": "reference_name", "value": "W1"},
            {"key": "insulation", "value": "red"}
        ]}}]}));
        assert!(steps[0].instruction.contains("wire W1 (RED)"));
    }

    #[test]
    fn test_mechanical_when_length_present() {
        let steps = plan(json!({"edges": [
            {"id": "E1", "data": {"display_properties": [{"key": "length", "value": "12"}]}},
            {"id": "E2", "data": {"display_properties": [{"key": "length", "value": " "}]}}
        ]}));
        assert_eq!(
            categories(&steps),
            vec![
                TestCategory::Continuity,
                TestCategory::Mechanical,
                TestCategory::Continuity,
                TestCategory::Mechanical
            ]
        );
        assert!(steps[1].instruction.ends_with("cut to length 12"));
        assert_eq!(steps[3].id, "E2");
    }

    #[test]
    fn test_null_length_is_absent() {
        let steps = plan(json!({"edges": [{"id": "E1", "data": {"display_properties": [
            {"key": "length", "value": null}
        ]}}]}));
        assert_eq!(categories(&steps), vec![TestCategory::Continuity]);
    }

    #[test]
    fn test_power_needs_both_labels() {
        let steps = plan(json!({"edges": [
            {"id": "E1", "data": {"display_properties": [
                {"key": "from", "value": "pwr_in"},
                {"key": "to", "value": "Gnd"}
            ]}},
            {"id": "E2", "data": {"display_properties": [{"key": "from", "value": "PWR"}]}}
        ]}));
        assert_eq!(
            categories(&steps),
            vec![TestCategory::Continuity, TestCategory::Power, TestCategory::Continuity]
        );
    }

    #[test]
    fn test_signal_prefers_tx() {
        let steps = plan(json!({"edges": [
            {"id": "E1", "data": {"display_properties": [
                {"key": "a", "value": "rx-"},
                {"key": "b", "value": "tx+"}
            ]}},
            {"id": "E2", "data": {"display_properties": [{"key": "a", "value": "RX1"}]}}
        ]}));
        assert_eq!(steps[1].category, TestCategory::Signal);
        assert!(steps[1].instruction.contains("probe TX on wire E1"));
        assert!(steps[3].instruction.contains("probe RX on wire E2"));
    }

    #[test]
    fn test_keys_are_not_searched() {
        let steps = plan(json!({"edges": [{"id": "E1", "data": {"display_properties": [
            {"key": "TX", "value": "none"}
        ]}}]}));
        assert_eq!(categories(&steps), vec![TestCategory::Continuity]);
    }

    #[test]
    fn test_bundled_wires_skipped() {
        let steps = plan(json!({"edges": [{"id": "S1", "type": "bundledEdge"}]}));
        assert!(steps.is_empty());
    }

    #[test]
    fn test_all_categories_in_order() {
        let steps = plan(json!({"edges": [{"id": "E1", "data": {"display_properties": [
            {"key": "length", "value": "300mm"},
            {"key": "label", "value": "PWR GND TX"}
        ]}}]}));
        assert_eq!(
            categories(&steps),
            vec![
                TestCategory::Continuity,
                TestCategory::Mechanical,
                TestCategory::Power,
                TestCategory::Signal
            ]
        );
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_value(TestCategory::Mechanical).unwrap();
        assert_eq!(json, json!("mechanical"));
    }
}
