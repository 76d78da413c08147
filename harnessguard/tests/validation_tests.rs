//! Tests for the rule catalog over generated and fixture diagrams

use harnessguard::prelude::*;
use harnessguard::{parse_diagram, RulesEngine, TestPlanGenerator};
use serde_json::{json, Value};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn analyze(value: &Value) -> Vec<Finding> {
    let (findings, _) = harnessguard::check(value);
    findings
}

fn component(id: &str) -> Value {
    json!({
        "id": id,
        "data": {"display_properties": [
            {"key": "reference_name", "value": format!("REF-{}", id)},
            {"key": "part_name", "value": "PN"}
        ]}
    })
}

#[test]
fn test_determinism() {
    let diagram = parse_diagram(&fixture_path("faulty_harness.json")).expect("Should parse");
    let engine = RulesEngine::with_default_rules();
    let first = engine.analyze(&diagram);
    let second = engine.analyze(&diagram);
    assert_eq!(first, second);
    assert_eq!(
        TestPlanGenerator::generate(&diagram),
        TestPlanGenerator::generate(&diagram)
    );
}

#[test]
fn test_every_open_ended_wire_is_floating_once() {
    let edges: Vec<Value> = (0..6)
        .map(|i| match i % 3 {
            0 => json!({"id": format!("E{}", i), "source": "N1"}),
            1 => json!({"id": format!("E{}", i), "target": "N1"}),
            _ => json!({"id": format!("E{}", i)}),
        })
        .collect();
    let findings = analyze(&json!({"nodes": [component("N1")], "edges": edges}));

    for i in 0..6 {
        let id = format!("E{}", i);
        let count = findings
            .iter()
            .filter(|f| f.rule_id == "floating_wire" && f.id.as_deref() == Some(id.as_str()))
            .count();
        assert_eq!(count, 1, "wire {} should be flagged exactly once", id);
    }
}

#[test]
fn test_ghost_terminated_wire_is_floating() {
    let findings = analyze(&json!({
        "nodes": [component("N1"), {"id": "G", "type": "ghostNode"}],
        "edges": [{"id": "E1", "source": "G", "target": "N1"}]
    }));
    let floating: Vec<_> = findings
        .iter()
        .filter(|f| f.rule_id == "floating_wire")
        .collect();
    assert_eq!(floating.len(), 1);
    assert_eq!(floating[0].severity, Severity::Error);
}

#[test]
fn test_every_unwired_component_is_orphan_once() {
    let findings = analyze(&json!({
        "nodes": [
            component("N1"), component("N2"), component("N3"), component("N4"),
            {"id": "B", "type": "bundleNode"}, {"id": "G", "type": "ghostNode"}
        ],
        "edges": [{"id": "E1", "source": "N1", "target": "N2"}]
    }));
    let orphans: Vec<_> = findings
        .iter()
        .filter(|f| f.rule_id == "orphan_component")
        .filter_map(|f| f.id.as_deref())
        .collect();
    assert_eq!(orphans, vec!["N3", "N4"]);
}

#[test]
fn test_one_duplicate_finding_per_name() {
    let mut nodes: Vec<Value> = Vec::new();
    for i in 0..4 {
        nodes.push(json!({
            "id": format!("N{}", i),
            "data": {"display_properties": [
                {"key": "reference_name", "value": "J9"},
                {"key": "part_name", "value": "PN"}
            ]}
        }));
    }
    let findings = analyze(&json!({"nodes": nodes}));
    let duplicates: Vec<_> = findings
        .iter()
        .filter(|f| f.rule_id == "duplicate_reference")
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].id.as_deref(), Some("N0, N1, N2, N3"));
}

#[test]
fn test_one_finding_per_shared_pin() {
    let findings = analyze(&json!({
        "nodes": [component("N1"), component("N2")],
        "edges": [
            {"id": "E1", "source": "N1", "target": "N2", "sourceHandle": "P1", "targetHandle": "Q1"},
            {"id": "E2", "source": "N1", "target": "N2", "sourceHandle": "P1", "targetHandle": "Q2"},
            {"id": "E3", "source": "N1", "target": "N2", "sourceHandle": "P1", "targetHandle": "Q3"}
        ]
    }));
    let shared: Vec<_> = findings
        .iter()
        .filter(|f| f.rule_id == "multiple_wires_per_pin")
        .collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].id.as_deref(), Some("P1"));
    assert!(shared[0].message.contains("E1, E2, E3"));
}

#[test]
fn test_unresolved_roles_are_not_violations() {
    let findings = analyze(&json!({
        "nodes": [
            {"id": "N1", "data": {
                "display_properties": [{"key": "part_name", "value": "PN"}],
                "ports": [{"pins": [{"id": "P1", "function": "PWR"}]}]
            }},
            {"id": "N2", "data": {
                "display_properties": [{"key": "part_name", "value": "PN"}],
                "ports": [{"pins": [{"id": "P2"}]}]
            }}
        ],
        "edges": [
            {"id": "E1", "source": "N1", "target": "N2", "sourceHandle": "P1", "targetHandle": "P2",
             "data": {"display_properties": [{"key": "length", "value": "1"}]}},
            {"id": "E2", "source": "N1", "target": "N2", "sourceHandle": "P1",
             "data": {"display_properties": [{"key": "length", "value": "1"}]}}
        ]
    }));
    assert!(findings
        .iter()
        .all(|f| f.rule_id != "invalid_power_connection" && f.rule_id != "invalid_serial_connection"));
}

#[test]
fn test_malformed_fields_do_not_fail() {
    let findings = analyze(&json!({
        "nodes": [
            {"id": 7, "data": {"display_properties": "oops", "ports": [{"pins": null}]}},
            "not a node",
            {"data": null}
        ],
        "edges": [{"id": "E1", "source": 7, "target": {"nested": true}}, 42]
    }));
    assert!(findings.iter().any(|f| f.rule_id == "floating_wire"));
}

#[test]
fn test_findings_carry_rule_ids_for_filtering() {
    let result = HarnessGuardCore::validate_diagram(
        &fixture_path("faulty_harness.json"),
        &ValidationOptions::default(),
    )
    .expect("Should parse");

    for finding in &result.findings {
        assert!(!finding.message.is_empty(), "Finding should have message");
        assert!(!finding.rule_id.is_empty(), "Finding should have rule_id");
        if let Some(ref suggestion) = finding.suggestion {
            assert!(!suggestion.is_empty(), "Suggestion should not be empty");
        }
    }

    let options = ValidationOptions {
        rules: vec!["invalid_power_connection".to_string()],
        ..ValidationOptions::default()
    };
    let selected = HarnessGuardCore::validate_diagram(&fixture_path("faulty_harness.json"), &options)
        .expect("Should parse");
    let expected: Vec<_> = result.findings_for("invalid_power_connection").cloned().collect();
    assert_eq!(selected.findings, expected);
}
