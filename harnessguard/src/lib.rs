//! HarnessGuard - electrical rule checks for wiring harness diagrams
//!
//! This library inspects a harness diagram (components, wires, cables and
//! pins exported by a diagram editor as JSON) and reports design defects such
//! as floating wires, orphan components, duplicate reference names and
//! illegal pin pairings. It also derives a suggested bench test plan for
//! every wire.
//!
//! # Quick Start
//!
//! ```no_run
//! use harnessguard::{HarnessGuardCore, ValidationOptions};
//! use std::path::Path;
//!
//! let options = ValidationOptions::default();
//! let result = HarnessGuardCore::validate_diagram(
//!     Path::new("harness.json"),
//!     &options,
//! ).unwrap();
//!
//! for finding in &result.findings {
//!     println!("{}: {}", finding.severity, finding.message);
//! }
//! ```
//!
//! # Features
//!
//! - **Connectivity**: floating wires (plain and inside cables), orphan components
//! - **Naming**: duplicate reference names, missing part names
//! - **Pin roles**: multiple wires per pin, PWR shorts, crossed serial pairs
//! - **Test plans**: continuity, mechanical, power and signal checks per wire
//! - **Rule sets**: per-team JSON files to disable rules or change severities

pub mod analyzer;
pub mod config;
pub mod core;
pub mod parser;

// Re-export main types
pub use core::{
    discover_diagram_files, HarnessGuardCore, HarnessGuardError, ValidationOptions,
    ValidationResult, ValidationStats,
};
pub use analyzer::rules::{Finding, Rule, RuleContext, RulesEngine, Severity};
pub use analyzer::test_plan::{TestCategory, TestInstruction, TestPlanGenerator};
pub use config::{generate_sample_rules, RuleSet};
pub use parser::diagram::DiagramParser;
pub use parser::schema::Diagram;

/// Parse a diagram file (convenience wrapper).
pub fn parse_diagram(path: &std::path::Path) -> Result<Diagram, HarnessGuardError> {
    Ok(DiagramParser::parse_file(path)?)
}

/// Run the full rule catalog and test planner over a JSON value.
///
/// This is the bare engine entry point: no rule set, every rule enabled.
pub fn check(value: &serde_json::Value) -> (Vec<Finding>, Vec<TestInstruction>) {
    let diagram = DiagramParser::parse_value(value);
    let findings = RulesEngine::with_default_rules().analyze(&diagram);
    let instructions = TestPlanGenerator::generate(&diagram);
    (findings, instructions)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Finding, HarnessGuardCore, HarnessGuardError, Severity, TestCategory, TestInstruction,
        ValidationOptions, ValidationResult, ValidationStats,
    };
}
