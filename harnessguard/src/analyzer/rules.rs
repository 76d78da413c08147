use crate::analyzer::names::NameResolver;
use crate::analyzer::pin_functions::{PinFunctionIndex, PinRole};
use crate::core::HarnessGuardError;
use crate::parser::schema::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
            Severity::Info => f.write_str("info"),
        }
    }
}

/// One validation result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    /// Subject node/edge/pin id, or several ids joined with ", ".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Catalog id of the rule that produced this finding.
    pub rule_id: String,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Per-run lookups shared by the rules. Built fresh for every analysis.
pub struct RuleContext {
    pub pin_functions: PinFunctionIndex,
    pub names: NameResolver,
    node_kinds: HashMap<String, NodeKind>,
}

impl RuleContext {
    pub fn new(diagram: &Diagram) -> Self {
        let mut node_kinds = HashMap::new();
        for node in &diagram.nodes {
            node_kinds.entry(node.id.clone()).or_insert(node.kind);
        }
        Self {
            pin_functions: PinFunctionIndex::new(diagram),
            names: NameResolver::new(diagram),
            node_kinds,
        }
    }

    pub fn node_kind(&self, id: &str) -> Option<NodeKind> {
        self.node_kinds.get(id).copied()
    }

    pub fn is_ghost(&self, id: &str) -> bool {
        self.node_kind(id) == Some(NodeKind::Ghost)
    }

    /// A wire is floating when either end is missing or lands on a ghost node.
    pub fn is_floating(&self, edge: &Edge) -> bool {
        match (edge.source.as_deref(), edge.target.as_deref()) {
            (Some(source), Some(target)) => self.is_ghost(source) || self.is_ghost(target),
            _ => true,
        }
    }

    pub fn touches_ghost(&self, edge: &Edge) -> bool {
        edge.endpoints().any(|id| self.is_ghost(id))
    }
}

pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn severity(&self) -> Severity;
    fn check(&self, diagram: &Diagram, context: &RuleContext) -> Vec<Finding>;

    fn finding(&self, subject: Option<String>, message: String, suggestion: &str) -> Finding
    where
        Self: Sized,
    {
        Finding {
            id: subject,
            rule_id: self.id().to_string(),
            severity: self.severity(),
            message,
            suggestion: Some(suggestion.to_string()),
        }
    }
}

/// The full catalog, in reporting order.
pub fn default_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(FloatingWireRule),
        Arc::new(FloatingBundledWireRule),
        Arc::new(OrphanComponentRule),
        Arc::new(DuplicateReferenceRule),
        Arc::new(MultipleWiresPerPinRule),
        Arc::new(InvalidPowerConnectionRule),
        Arc::new(InvalidSerialConnectionRule),
        Arc::new(MissingPartNameRule),
        Arc::new(MissingLengthRule),
    ]
}

pub struct RulesEngine {
    rules: Vec<Arc<dyn Rule>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
        }
    }

    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        for rule in default_rules() {
            engine.add_rule(rule);
        }
        engine
    }

    /// Catalog rules restricted to `ids`, still in catalog order.
    pub fn with_rules<S: AsRef<str>>(ids: &[S]) -> Result<Self, HarnessGuardError> {
        let catalog = default_rules();
        for id in ids {
            let id = id.as_ref();
            if !catalog.iter().any(|rule| rule.id() == id) {
                return Err(HarnessGuardError::UnknownRule(id.to_string()));
            }
        }
        let mut engine = Self::new();
        for rule in catalog {
            if ids.iter().any(|id| id.as_ref() == rule.id()) {
                engine.add_rule(rule);
            }
        }
        Ok(engine)
    }

    pub fn add_rule(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Drop every rule for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.rules.retain(|rule| keep(rule.id()));
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn analyze(&self, diagram: &Diagram) -> Vec<Finding> {
        let context = RuleContext::new(diagram);
        let mut findings = Vec::new();
        for rule in &self.rules {
            let found = rule.check(diagram, &context);
            tracing::debug!("rule {} produced {} finding(s)", rule.id(), found.len());
            findings.extend(found);
        }
        findings
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

/// Returns true when a catalog rule carries this id.
pub fn is_known_rule(id: &str) -> bool {
    default_rules().iter().any(|rule| rule.id() == id)
}

// Connection tables

/// PWR straight onto ground or a data line, listed in both directions.
const ILLEGAL_POWER_PAIRS: [(PinRole, PinRole); 10] = [
    (PinRole::Pwr, PinRole::Gnd),
    (PinRole::Gnd, PinRole::Pwr),
    (PinRole::Pwr, PinRole::TxPlus),
    (PinRole::TxPlus, PinRole::Pwr),
    (PinRole::Pwr, PinRole::TxMinus),
    (PinRole::TxMinus, PinRole::Pwr),
    (PinRole::Pwr, PinRole::RxPlus),
    (PinRole::RxPlus, PinRole::Pwr),
    (PinRole::Pwr, PinRole::RxMinus),
    (PinRole::RxMinus, PinRole::Pwr),
];

const VALID_SERIAL_PAIRS: [(PinRole, PinRole); 4] = [
    (PinRole::TxPlus, PinRole::RxPlus),
    (PinRole::RxPlus, PinRole::TxPlus),
    (PinRole::TxMinus, PinRole::RxMinus),
    (PinRole::RxMinus, PinRole::TxMinus),
];

/// Canonical roles at both ends, only when both pins resolve to one.
fn edge_roles(edge: &Edge, context: &RuleContext) -> Option<(PinRole, PinRole)> {
    let (source, target) = context.pin_functions.edge_functions(edge)?;
    Some((PinRole::from_function(source)?, PinRole::from_function(target)?))
}

// Rule implementations

pub struct FloatingWireRule;

impl Rule for FloatingWireRule {
    fn id(&self) -> &str {
        "floating_wire"
    }

    fn name(&self) -> &str {
        "Floating Wire Check"
    }

    fn description(&self) -> &str {
        "Wires must connect two real components at both ends"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, diagram: &Diagram, context: &RuleContext) -> Vec<Finding> {
        diagram
            .wires()
            .filter(|edge| context.is_floating(edge))
            .map(|edge| {
                self.finding(
                    Some(edge.id.clone()),
                    format!(
                        "Floating wire: {} is not connected at both ends",
                        context.names.resolve(&edge.id)
                    ),
                    "Connect both ends of the wire to component pins",
                )
            })
            .collect()
    }
}

pub struct FloatingBundledWireRule;

impl Rule for FloatingBundledWireRule {
    fn id(&self) -> &str {
        "floating_bundled_wire"
    }

    fn name(&self) -> &str {
        "Floating Cable Wire Check"
    }

    fn description(&self) -> &str {
        "Wires inside a cable must connect at both ends"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, diagram: &Diagram, context: &RuleContext) -> Vec<Finding> {
        diagram
            .bundled_wires()
            .filter(|edge| context.is_floating(edge))
            .map(|edge| {
                let cable = edge
                    .parent_id
                    .as_deref()
                    .map(|parent| context.names.resolve(parent))
                    .unwrap_or_else(|| "unknown cable".to_string());
                self.finding(
                    Some(edge.id.clone()),
                    format!(
                        "Floating wire: {} in cable {} is not connected at both ends",
                        context.names.resolve(&edge.id),
                        cable
                    ),
                    "Terminate the cable wire on a component pin or remove it from the cable",
                )
            })
            .collect()
    }
}

pub struct OrphanComponentRule;

impl Rule for OrphanComponentRule {
    fn id(&self) -> &str {
        "orphan_component"
    }

    fn name(&self) -> &str {
        "Orphan Component Check"
    }

    fn description(&self) -> &str {
        "Every component must be attached to at least one wire"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, diagram: &Diagram, context: &RuleContext) -> Vec<Finding> {
        let connected: HashSet<&str> = diagram.wires().flat_map(Edge::endpoints).collect();

        diagram
            .components()
            .filter(|node| !connected.contains(node.id.as_str()))
            .map(|node| {
                self.finding(
                    Some(node.id.clone()),
                    format!(
                        "Orphan component: {} is not connected to any wire",
                        context.names.resolve(&node.id)
                    ),
                    "Wire the component into the harness or delete it",
                )
            })
            .collect()
    }
}

pub struct DuplicateReferenceRule;

impl Rule for DuplicateReferenceRule {
    fn id(&self) -> &str {
        "duplicate_reference"
    }

    fn name(&self) -> &str {
        "Duplicate Reference Name Check"
    }

    fn description(&self) -> &str {
        "Component reference names must be unique"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, diagram: &Diagram, context: &RuleContext) -> Vec<Finding> {
        // (name, ids) in order of first appearance
        let mut groups: Vec<(String, Vec<&str>)> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for node in diagram.components() {
            let name = context.names.resolve(&node.id);
            let slot = *by_name.entry(name.clone()).or_insert_with(|| {
                groups.push((name, Vec::new()));
                groups.len() - 1
            });
            let ids = &mut groups[slot].1;
            if !ids.contains(&node.id.as_str()) {
                ids.push(&node.id);
            }
        }

        groups
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(name, ids)| {
                let joined = ids.join(", ");
                self.finding(
                    Some(joined.clone()),
                    format!(
                        "Duplicate reference name: {} is used by {} components ({})",
                        name,
                        ids.len(),
                        joined
                    ),
                    "Give each component a unique reference name",
                )
            })
            .collect()
    }
}

pub struct MultipleWiresPerPinRule;

impl Rule for MultipleWiresPerPinRule {
    fn id(&self) -> &str {
        "multiple_wires_per_pin"
    }

    fn name(&self) -> &str {
        "Multiple Wires Per Pin Check"
    }

    fn description(&self) -> &str {
        "A pin accepts a single wire"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, diagram: &Diagram, context: &RuleContext) -> Vec<Finding> {
        // (pin, wire ends landing on it, distinct edge ids in first-seen order)
        let mut pins: Vec<(&str, usize, Vec<&str>)> = Vec::new();
        let mut by_pin: HashMap<&str, usize> = HashMap::new();

        for edge in diagram.wires().filter(|edge| !context.touches_ghost(edge)) {
            for handle in edge.handles() {
                let slot = *by_pin.entry(handle).or_insert_with(|| {
                    pins.push((handle, 0, Vec::new()));
                    pins.len() - 1
                });
                let (_, ends, edges) = &mut pins[slot];
                *ends += 1;
                // both handles of one edge are visited back to back
                if edges.last() != Some(&edge.id.as_str()) {
                    edges.push(edge.id.as_str());
                }
            }
        }

        pins.into_iter()
            .filter(|(_, ends, _)| *ends > 1)
            .map(|(pin, _, edges)| {
                let wires: Vec<String> =
                    edges.iter().map(|id| context.names.resolve(id)).collect();
                self.finding(
                    Some(pin.to_string()),
                    format!(
                        "Multiple wires on pin {}: {}",
                        pin,
                        wires.join(", ")
                    ),
                    "Use a splice or a separate pin for each wire",
                )
            })
            .collect()
    }
}

pub struct InvalidPowerConnectionRule;

impl Rule for InvalidPowerConnectionRule {
    fn id(&self) -> &str {
        "invalid_power_connection"
    }

    fn name(&self) -> &str {
        "Invalid Power Connection Check"
    }

    fn description(&self) -> &str {
        "PWR must not be wired to GND or to a serial data line"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, diagram: &Diagram, context: &RuleContext) -> Vec<Finding> {
        let mut findings = Vec::new();

        for edge in diagram.wires() {
            let Some(pair) = edge_roles(edge, context) else {
                continue;
            };
            if ILLEGAL_POWER_PAIRS.contains(&pair) {
                findings.push(self.finding(
                    Some(edge.id.clone()),
                    format!(
                        "Invalid power connection: wire {} connects {} to {}",
                        context.names.resolve(&edge.id),
                        pair.0,
                        pair.1
                    ),
                    "Check the pinout; power must go to a matching supply input",
                ));
            }
        }

        findings
    }
}

pub struct InvalidSerialConnectionRule;

impl Rule for InvalidSerialConnectionRule {
    fn id(&self) -> &str {
        "invalid_serial_connection"
    }

    fn name(&self) -> &str {
        "Invalid Serial Connection Check"
    }

    fn description(&self) -> &str {
        "Serial pairs must cross over: TX+ to RX+ and TX- to RX-"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, diagram: &Diagram, context: &RuleContext) -> Vec<Finding> {
        let mut findings = Vec::new();

        // Bundled sub-wires carry signals too, so every edge is checked here.
        for edge in &diagram.edges {
            let Some(pair) = edge_roles(edge, context) else {
                continue;
            };
            if !(pair.0.is_serial() && pair.1.is_serial()) {
                continue;
            }
            if !VALID_SERIAL_PAIRS.contains(&pair) {
                findings.push(self.finding(
                    Some(edge.id.clone()),
                    format!(
                        "Invalid serial connection: wire {} connects {} to {}",
                        context.names.resolve(&edge.id),
                        pair.0,
                        pair.1
                    ),
                    "Wire TX+ to RX+ and TX- to RX-",
                ));
            }
        }

        findings
    }
}

pub struct MissingPartNameRule;

impl Rule for MissingPartNameRule {
    fn id(&self) -> &str {
        "missing_part_name"
    }

    fn name(&self) -> &str {
        "Missing Part Name Check"
    }

    fn description(&self) -> &str {
        "Components need a part name for the bill of materials"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, diagram: &Diagram, context: &RuleContext) -> Vec<Finding> {
        diagram
            .components()
            .filter(|node| is_blank_property(&node.display_properties, PROP_PART_NAME))
            .map(|node| {
                self.finding(
                    Some(node.id.clone()),
                    format!(
                        "Missing part name: component {} has no part name",
                        context.names.resolve(&node.id)
                    ),
                    "Set the part_name property to the manufacturer part number",
                )
            })
            .collect()
    }
}

pub struct MissingLengthRule;

impl Rule for MissingLengthRule {
    fn id(&self) -> &str {
        "missing_length"
    }

    fn name(&self) -> &str {
        "Missing Wire Length Check"
    }

    fn description(&self) -> &str {
        "Wires need a cut length"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, diagram: &Diagram, context: &RuleContext) -> Vec<Finding> {
        diagram
            .wires()
            .filter(|edge| is_blank_property(&edge.display_properties, PROP_LENGTH))
            .map(|edge| {
                self.finding(
                    Some(edge.id.clone()),
                    format!(
                        "Missing length: wire {} has no length",
                        context.names.resolve(&edge.id)
                    ),
                    "Set the length property so the wire can be cut",
                )
            })
            .collect()
    }
}
