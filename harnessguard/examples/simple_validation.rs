//! Simple validation example: validate a harness diagram and print results.

use harnessguard::prelude::*;
use std::path::Path;

fn main() -> Result<(), HarnessGuardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/faulty_harness.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_validation [path/to/diagram.json]");
        std::process::exit(1);
    }

    let result = HarnessGuardCore::validate_diagram(path, &ValidationOptions::default())?;

    println!("Validation results for: {}", result.display_name());
    println!("Total findings: {}", result.total_findings());
    println!();

    if result.has_errors() {
        println!("ERRORS:");
        for finding in result.findings.iter().filter(|f| f.severity == Severity::Error) {
            println!("  - {}", finding.message);
            if let Some(ref id) = finding.id {
                println!("    Subject: {}", id);
            }
        }
    }

    println!("\nSuggested tests:");
    for step in &result.instructions {
        println!("  [{}] {}", step.category, step.instruction);
    }

    if result.has_errors() {
        println!("\nValidation failed.");
        std::process::exit(1);
    }

    println!("\nValidation passed (no errors).");
    Ok(())
}
