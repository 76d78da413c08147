//! Rule-set configuration
//!
//! Teams can keep a `harnessguard.json` next to their diagrams to switch
//! catalog rules off, raise or lower their severity, and turn the test plan
//! off. Rules not mentioned in the file run with their defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::analyzer::rules::{default_rules, is_known_rule, Finding, RulesEngine, Severity};
use crate::core::HarnessGuardError;

/// Conventional file name for a rule set stored next to diagrams.
pub const RULE_SET_FILE_NAME: &str = "harnessguard.json";

/// Per-rule settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleOverride {
    /// Catalog rule id (e.g. `missing_length`)
    pub id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Replaces the rule's built-in severity when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSettings {
    #[serde(default = "default_true")]
    pub generate_tests: bool,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            generate_tests: true,
        }
    }
}

/// A named collection of rule overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSet {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleOverride>,
    #[serde(default)]
    pub settings: RuleSettings,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl RuleSet {
    /// Load and validate a rule set from a JSON file.
    pub fn load_file(path: &Path) -> Result<Self, HarnessGuardError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessGuardError::Config(format!(
                "Failed to read rules file {}: {}",
                path.display(),
                e
            ))
        })?;
        let rule_set = Self::load_str(&content)?;
        tracing::info!(
            "Loaded rule set '{}' ({} override(s)) from {}",
            rule_set.name,
            rule_set.rules.len(),
            path.display()
        );
        Ok(rule_set)
    }

    /// Parse and validate a rule set from JSON text.
    pub fn load_str(json: &str) -> Result<Self, HarnessGuardError> {
        let rule_set: RuleSet = serde_json::from_str(json)
            .map_err(|e| HarnessGuardError::Config(format!("Failed to parse rules JSON: {}", e)))?;
        rule_set.validate()?;
        Ok(rule_set)
    }

    /// Every override must name a catalog rule, at most once.
    pub fn validate(&self) -> Result<(), HarnessGuardError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !is_known_rule(&rule.id) {
                return Err(HarnessGuardError::Config(format!(
                    "Unknown rule id '{}' in rule set '{}'",
                    rule.id, self.name
                )));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(HarnessGuardError::Config(format!(
                    "Rule '{}' is listed more than once in rule set '{}'",
                    rule.id, self.name
                )));
            }
        }
        Ok(())
    }

    fn find(&self, id: &str) -> Option<&RuleOverride> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.find(id).map_or(true, |r| r.enabled)
    }

    /// Remove disabled rules from an engine.
    pub fn configure(&self, engine: &mut RulesEngine) {
        engine.retain(|id| self.is_enabled(id));
    }

    /// Rewrite finding severities according to the overrides.
    pub fn apply_severities(&self, findings: &mut [Finding]) {
        for finding in findings {
            if let Some(severity) = self.find(&finding.rule_id).and_then(|r| r.severity) {
                finding.severity = severity;
            }
        }
    }
}

/// A rule set listing every catalog rule with its defaults, used as a
/// starting template.
pub fn generate_sample_rules() -> RuleSet {
    RuleSet {
        name: "Default harness rules".to_string(),
        version: default_version(),
        description: Some("Electrical rule checks for wiring harness diagrams".to_string()),
        rules: default_rules()
            .iter()
            .map(|rule| RuleOverride {
                id: rule.id().to_string(),
                enabled: true,
                severity: Some(rule.severity()),
            })
            .collect(),
        settings: RuleSettings::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rules_serialization() {
        let rules = generate_sample_rules();
        let json = serde_json::to_string_pretty(&rules).unwrap();

        let parsed = RuleSet::load_str(&json).unwrap();
        assert_eq!(parsed.name, "Default harness rules");
        assert_eq!(parsed.rules.len(), 9);
        assert_eq!(parsed.rules[0].id, "floating_wire");
        assert!(parsed.settings.generate_tests);
    }

    #[test]
    fn test_minimal_rule_set_defaults() {
        let rule_set = RuleSet::load_str(r#"{"name": "minimal"}"#).unwrap();
        assert_eq!(rule_set.version, "1.0.0");
        assert!(rule_set.rules.is_empty());
        assert!(rule_set.settings.generate_tests);
        assert!(rule_set.is_enabled("orphan_component"));
    }

    #[test]
    fn test_override_parsing() {
        let rule_set = RuleSet::load_str(
            r#"{
                "name": "team",
                "rules": [
                    {"id": "missing_length", "enabled": false},
                    {"id": "missing_part_name", "severity": "error"}
                ],
                "settings": {"generate_tests": false}
            }"#,
        )
        .unwrap();
        assert!(!rule_set.is_enabled("missing_length"));
        assert!(rule_set.is_enabled("missing_part_name"));
        assert_eq!(rule_set.rules[1].severity, Some(Severity::Error));
        assert!(!rule_set.settings.generate_tests);
    }

    #[test]
    fn test_unknown_rule_rejected() {
        let err = RuleSet::load_str(r#"{"name": "x", "rules": [{"id": "esd_protection"}]}"#)
            .unwrap_err();
        assert!(matches!(err, HarnessGuardError::Config(ref msg) if msg.contains("esd_protection")));
    }

    #[test]
    fn test_duplicate_override_rejected() {
        let err = RuleSet::load_str(
            r#"{"name": "x", "rules": [{"id": "missing_length"}, {"id": "missing_length"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, HarnessGuardError::Config(_)));
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            RuleSet::load_str("{"),
            Err(HarnessGuardError::Config(_))
        ));
    }

    #[test]
    fn test_configure_and_apply_severities() {
        let rule_set = RuleSet::load_str(
            r#"{"name": "x", "rules": [
                {"id": "floating_wire", "enabled": false},
                {"id": "missing_length", "severity": "info"}
            ]}"#,
        )
        .unwrap();

        let mut engine = RulesEngine::with_default_rules();
        rule_set.configure(&mut engine);
        assert_eq!(engine.rules().len(), 8);
        assert!(engine.rules().iter().all(|r| r.id() != "floating_wire"));

        let mut findings = vec![Finding {
            id: Some("E1".to_string()),
            rule_id: "missing_length".to_string(),
            severity: Severity::Warning,
            message: "Missing length: wire E1 has no length".to_string(),
            suggestion: None,
        }];
        rule_set.apply_severities(&mut findings);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RULE_SET_FILE_NAME);
        std::fs::write(&path, r#"{"name": "from disk"}"#).unwrap();
        assert_eq!(RuleSet::load_file(&path).unwrap().name, "from disk");

        let missing = RuleSet::load_file(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(HarnessGuardError::Config(_))));
    }
}
