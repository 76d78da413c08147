//! HarnessGuard CLI - wiring harness diagram validation from the command line.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use harnessguard::analyzer::rules::default_rules;
use harnessguard::config::RULE_SET_FILE_NAME;
use harnessguard::{
    generate_sample_rules, Finding, HarnessGuardCore, RuleSet, Severity, ValidationOptions,
    ValidationResult,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "harnessguard")]
#[command(about = "Electrical rule checks for wiring harness diagrams", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a single diagram file
    Check {
        /// Path to a diagram .json file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Validate all diagram files in a directory
    Project {
        /// Path to project directory
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// List available validation rules
    Rules {
        /// Show detailed rule descriptions
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a rule-set file listing every rule with its defaults
    Init {
        /// Where to write the rule set
        #[arg(value_name = "PATH", default_value = RULE_SET_FILE_NAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Exit with error code if findings exist at this severity or higher
    #[arg(long, value_enum)]
    fail_on: Option<FailOnSeverity>,

    /// Only run these rules (comma separated rule ids)
    #[arg(long, value_delimiter = ',')]
    rules: Vec<String>,

    /// Rule-set file (JSON) to disable rules or override severities
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip the suggested hardware test plan
    #[arg(long)]
    no_tests: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions format
    Github,
    /// GitLab CI format
    Gitlab,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
    Info,
}

impl FailOnSeverity {
    fn threshold(&self) -> Severity {
        match self {
            FailOnSeverity::Error => Severity::Error,
            FailOnSeverity::Warning => Severity::Warning,
            FailOnSeverity::Info => Severity::Info,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Check { file, run } => handle_check(&file, &run),
        Commands::Project { dir, run } => handle_project(&dir, &run),
        Commands::Rules { verbose } => {
            handle_rules(verbose);
            Ok(0)
        }
        Commands::Init { path, force } => handle_init(&path, force),
    }
}

fn build_options(run: &RunArgs) -> Result<ValidationOptions> {
    let rule_set = match &run.config {
        Some(path) => Some(
            RuleSet::load_file(path)
                .with_context(|| format!("loading rule set {}", path.display()))?,
        ),
        None => None,
    };
    if !run.rules.is_empty() {
        tracing::debug!("rule selection: {}", run.rules.join(", "));
    }
    Ok(ValidationOptions {
        rules: run.rules.clone(),
        generate_tests: !run.no_tests,
        rule_set,
    })
}

fn handle_check(file: &Path, run: &RunArgs) -> Result<i32> {
    if file.extension().and_then(|s| s.to_str()) != Some("json") {
        bail!("File must be a .json diagram");
    }
    let options = build_options(run)?;
    let result = HarnessGuardCore::validate_diagram(file, &options)
        .with_context(|| format!("validating {}", file.display()))?;
    let results = [result];
    output_results(&results, &run.format)?;
    Ok(exit_code_for(&results, run.fail_on.as_ref()))
}

fn handle_project(dir: &Path, run: &RunArgs) -> Result<i32> {
    let options = build_options(run)?;
    let results = HarnessGuardCore::validate_project(dir, &options)
        .with_context(|| format!("validating project {}", dir.display()))?;
    output_results(&results, &run.format)?;
    Ok(exit_code_for(&results, run.fail_on.as_ref()))
}

fn exit_code_for(results: &[ValidationResult], fail_on: Option<&FailOnSeverity>) -> i32 {
    match fail_on {
        Some(severity) if results.iter().any(|r| r.has_at_least(severity.threshold())) => 1,
        _ => 0,
    }
}

fn output_results(results: &[ValidationResult], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => output_human(results),
        OutputFormat::Json => output_json(results)?,
        OutputFormat::Github => output_github(results),
        OutputFormat::Gitlab => output_gitlab(results)?,
    }
    Ok(())
}

fn print_findings(title: &str, findings: &[&Finding]) {
    if findings.is_empty() {
        return;
    }
    println!("\n  {}:", title);
    for finding in findings {
        println!("    - {}", finding.message);
        if let Some(ref id) = finding.id {
            println!("      Subject: {}", id);
        }
    }
}

fn output_human(results: &[ValidationResult]) {
    for result in results {
        println!("\nFile: {}", result.display_name());
        println!("{}", "─".repeat(60));

        if result.total_findings() == 0 {
            println!("  No issues found");
        } else {
            let by_severity = |severity: Severity| {
                result
                    .findings
                    .iter()
                    .filter(|f| f.severity == severity)
                    .collect::<Vec<_>>()
            };
            print_findings("ERRORS", &by_severity(Severity::Error));
            print_findings("WARNINGS", &by_severity(Severity::Warning));
            print_findings("INFO", &by_severity(Severity::Info));
        }

        if !result.instructions.is_empty() {
            println!("\n  Suggested tests:");
            for step in &result.instructions {
                println!("    [{}] {}", step.category, step.instruction);
            }
        }

        println!("\n  Summary:");
        println!("    Errors:   {}", result.stats.errors);
        println!("    Warnings: {}", result.stats.warnings);
        println!("    Info:     {}", result.stats.info);
        println!("    Tests:    {}", result.stats.instructions);
    }
}

fn output_json(results: &[ValidationResult]) -> Result<()> {
    let output = serde_json::json!({
        "results": results,
        "summary": {
            "total_files": results.len(),
            "total_findings": results.iter().map(|r| r.total_findings()).sum::<usize>(),
            "errors": results.iter().map(|r| r.stats.errors).sum::<usize>(),
            "warnings": results.iter().map(|r| r.stats.warnings).sum::<usize>(),
        }
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn severity_to_github(finding: &Finding) -> &'static str {
    match finding.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "notice",
    }
}

fn output_github(results: &[ValidationResult]) {
    for result in results {
        for finding in &result.findings {
            println!(
                "::{} file={},title={}::{}",
                severity_to_github(finding),
                result.display_name(),
                finding.rule_id,
                finding.message.replace('\n', " ")
            );
        }
    }
}

fn severity_to_gitlab(finding: &Finding) -> &'static str {
    match finding.severity {
        Severity::Error => "critical",
        Severity::Warning => "major",
        Severity::Info => "info",
    }
}

fn output_gitlab(results: &[ValidationResult]) -> Result<()> {
    let mut reports = Vec::new();
    for result in results {
        for finding in &result.findings {
            reports.push(serde_json::json!({
                "description": finding.message,
                "check_name": finding.rule_id,
                "severity": severity_to_gitlab(finding),
                "location": {
                    "path": result.display_name(),
                }
            }));
        }
    }
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

fn handle_rules(verbose: bool) {
    println!("Available validation rules:\n");

    for rule in default_rules() {
        println!("  {}", rule.id());
        println!("    {} ({})", rule.name(), rule.severity());
        if verbose {
            println!("    {}", rule.description());
        }
        println!();
    }
}

fn handle_init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let json = serde_json::to_string_pretty(&generate_sample_rules())?;
    std::fs::write(path, json + "\n").with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote rule set to {}", path.display());
    Ok(0)
}
