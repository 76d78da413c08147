//! Example: using RulesEngine and the parser directly (without HarnessGuardCore),
//! running only the pin-role checks.
//! Run with: cargo run --example custom_rules [path/to/diagram.json]

use harnessguard::{parse_diagram, RulesEngine, Severity};
use std::path::Path;

fn main() -> Result<(), harnessguard::HarnessGuardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/faulty_harness.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example custom_rules [path/to/diagram.json]");
        std::process::exit(1);
    }

    let diagram = parse_diagram(path)?;
    let engine = RulesEngine::with_rules(&[
        "multiple_wires_per_pin",
        "invalid_power_connection",
        "invalid_serial_connection",
    ])?;
    let findings = engine.analyze(&diagram);

    println!("Pin checks found {} findings for {}", findings.len(), path.display());
    for finding in &findings {
        println!("  [{}] {}", finding.severity, finding.message);
        if let Some(ref id) = finding.id {
            println!("    Subject: {}", id);
        }
    }

    let errors = findings.iter().filter(|f| f.severity == Severity::Error).count();
    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
