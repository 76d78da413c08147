//! Core validation logic shared by the CLI and library callers.
//! No terminal or presentation dependencies.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::analyzer::rules::{Finding, RulesEngine, Severity};
use crate::analyzer::test_plan::{TestInstruction, TestPlanGenerator};
use crate::config::{RuleSet, RULE_SET_FILE_NAME};
use crate::parser::diagram::{DiagramParseError, DiagramParser};
use crate::parser::schema::Diagram;

#[derive(Debug, thiserror::Error)]
pub enum HarnessGuardError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Unknown rule: {0}")]
    UnknownRule(String),
}

impl From<DiagramParseError> for HarnessGuardError {
    fn from(e: DiagramParseError) -> Self {
        match e {
            DiagramParseError::Io(io) => HarnessGuardError::Io(io),
            DiagramParseError::Json(json) => HarnessGuardError::Parse(json.to_string()),
        }
    }
}

/// Options for validation runs.
#[derive(Clone, Debug)]
pub struct ValidationOptions {
    /// Rule ids to run; empty runs every enabled rule.
    pub rules: Vec<String>,
    pub generate_tests: bool,
    pub rule_set: Option<RuleSet>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            rules: vec![],
            generate_tests: true,
            rule_set: None,
        }
    }
}

impl ValidationOptions {
    fn engine(&self) -> Result<RulesEngine, HarnessGuardError> {
        let mut engine = if self.rules.is_empty() {
            RulesEngine::with_default_rules()
        } else {
            RulesEngine::with_rules(&self.rules)?
        };
        if let Some(rule_set) = &self.rule_set {
            rule_set.configure(&mut engine);
        }
        Ok(engine)
    }

    fn tests_enabled(&self) -> bool {
        self.generate_tests
            && self
                .rule_set
                .as_ref()
                .map_or(true, |rule_set| rule_set.settings.generate_tests)
    }
}

/// Findings and test plan for one diagram.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Source file, when the diagram came from disk.
    pub file: Option<PathBuf>,
    pub run_id: Uuid,
    pub checked_at: DateTime<Utc>,
    pub findings: Vec<Finding>,
    pub instructions: Vec<TestInstruction>,
    pub stats: ValidationStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub instructions: usize,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }

    /// Any finding at `severity` or more severe.
    pub fn has_at_least(&self, severity: Severity) -> bool {
        self.findings.iter().any(|f| f.severity <= severity)
    }

    pub fn total_findings(&self) -> usize {
        self.stats.errors + self.stats.warnings + self.stats.info
    }

    /// Findings produced by one catalog rule.
    pub fn findings_for<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.rule_id == rule_id)
    }

    /// Name to show for the result: the file path, or `<input>`.
    pub fn display_name(&self) -> String {
        self.file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<input>".to_string())
    }
}

fn summarize(findings: &[Finding], instructions: &[TestInstruction]) -> ValidationStats {
    let mut stats = ValidationStats {
        instructions: instructions.len(),
        ..ValidationStats::default()
    };
    for finding in findings {
        match finding.severity {
            Severity::Error => stats.errors += 1,
            Severity::Warning => stats.warnings += 1,
            Severity::Info => stats.info += 1,
        }
    }
    stats
}

/// Recursively discover diagram JSON files in a directory.
///
/// Rule-set files (`harnessguard.json`) are skipped.
pub fn discover_diagram_files(dir: &Path) -> Result<Vec<PathBuf>, HarnessGuardError> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, depth: usize) -> Result<(), HarnessGuardError> {
    if depth > 20 {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with('.') || name == "node_modules" || name == "target" || name == "build" {
                continue;
            }
            walk_dir(&path, files, depth + 1)?;
        } else if path.is_file() {
            let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
            let is_rule_set =
                path.file_name().and_then(|n| n.to_str()) == Some(RULE_SET_FILE_NAME);
            if is_json && !is_rule_set {
                files.push(path);
            }
        }
    }
    Ok(())
}

/// Core validation API.
pub struct HarnessGuardCore;

impl HarnessGuardCore {
    /// Run the configured rules and test planner over a parsed diagram.
    pub fn validate(
        diagram: &Diagram,
        options: &ValidationOptions,
    ) -> Result<ValidationResult, HarnessGuardError> {
        let engine = options.engine()?;
        let mut findings = engine.analyze(diagram);
        if let Some(rule_set) = &options.rule_set {
            rule_set.apply_severities(&mut findings);
        }

        let instructions = if options.tests_enabled() {
            TestPlanGenerator::generate(diagram)
        } else {
            Vec::new()
        };

        let stats = summarize(&findings, &instructions);
        Ok(ValidationResult {
            file: None,
            run_id: Uuid::new_v4(),
            checked_at: Utc::now(),
            findings,
            instructions,
            stats,
        })
    }

    /// Validate a diagram handed over as an already parsed JSON value.
    pub fn validate_value(
        value: &Value,
        options: &ValidationOptions,
    ) -> Result<ValidationResult, HarnessGuardError> {
        Self::validate(&DiagramParser::parse_value(value), options)
    }

    /// Validate a single diagram file.
    pub fn validate_diagram(
        path: &Path,
        options: &ValidationOptions,
    ) -> Result<ValidationResult, HarnessGuardError> {
        let diagram = DiagramParser::parse_file(path).map_err(|e| match e {
            DiagramParseError::Json(json) => {
                HarnessGuardError::Parse(format!("{}: {}", path.display(), json))
            }
            other => other.into(),
        })?;
        let mut result = Self::validate(&diagram, options)?;
        result.file = Some(path.to_path_buf());
        tracing::info!(
            "Validated {}: {} error(s), {} warning(s), {} test step(s)",
            path.display(),
            result.stats.errors,
            result.stats.warnings,
            result.stats.instructions
        );
        Ok(result)
    }

    /// Validate every diagram file under a directory.
    ///
    /// Files that are not valid JSON (editor configs with comments, partial
    /// saves) are skipped with a warning; the other files are still checked.
    pub fn validate_project(
        dir: &Path,
        options: &ValidationOptions,
    ) -> Result<Vec<ValidationResult>, HarnessGuardError> {
        let files = discover_diagram_files(dir)?;
        tracing::info!("Found {} diagram file(s) in {}", files.len(), dir.display());
        let mut results = Vec::with_capacity(files.len());
        for path in &files {
            match Self::validate_diagram(path, options) {
                Ok(result) => results.push(result),
                Err(HarnessGuardError::Parse(msg)) => {
                    tracing::warn!("Skipping {}: {}", path.display(), msg);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }
}
