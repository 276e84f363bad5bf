//! Output formatting for scan results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI
//!   integration
//!
//! Reporting renders the ordered finding sequence unchanged; no format
//! re-sorts or filters.

use colored::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::finding::Finding;
use crate::rules::{Registry, Severity};
use crate::scan::{ScanResult, SkippedFile};
use crate::suppress::{DirectiveScope, SuppressedFinding};

// =============================================================================
// JSON format
// =============================================================================

/// Top-level JSON report structure.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub passed: bool,
    pub files_scanned: usize,
    pub files_skipped: Vec<SkippedFile>,
    pub rules_fired: Vec<String>,
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<SuppressedFinding>,
    pub suppressed_count: usize,
}

/// Render the JSON report to a string.
pub fn render_json(path: &str, result: &ScanResult, passed: bool) -> anyhow::Result<String> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        passed,
        files_scanned: result.scanned,
        files_skipped: result.skipped.clone(),
        rules_fired: result.rules_fired(),
        findings: result.findings.clone(),
        suppressed: result.suppressed.clone(),
        suppressed_count: result.suppressed.len(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write results in JSON format.
pub fn write_json(path: &str, result: &ScanResult, passed: bool) -> anyhow::Result<()> {
    println!("{}", render_json(path, result, passed)?);
    Ok(())
}

// =============================================================================
// SARIF format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "ppopt";
const INFO_URI: &str = "https://github.com/ppopt/ppopt";

#[derive(Serialize, Deserialize)]
struct SarifReport {
    version: String,
    #[serde(rename = "$schema")]
    schema: String,
    runs: Vec<SarifRun>,
}

#[derive(Serialize, Deserialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize, Deserialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize, Deserialize)]
struct SarifDriver {
    name: String,
    version: String,
    #[serde(rename = "informationUri")]
    information_uri: String,
    rules: Vec<SarifRule>,
}

#[derive(Serialize, Deserialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "fullDescription")]
    full_description: SarifMessage,
    help: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_config: SarifRuleConfig,
}

#[derive(Serialize, Deserialize)]
struct SarifRuleConfig {
    level: String,
}

#[derive(Serialize, Deserialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize, Deserialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize, Deserialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifact,
    region: SarifRegion,
}

#[derive(Serialize, Deserialize)]
struct SarifArtifact {
    uri: String,
}

#[derive(Serialize, Deserialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
    #[serde(rename = "startColumn")]
    start_column: usize,
    #[serde(rename = "endLine", skip_serializing_if = "Option::is_none")]
    end_line: Option<usize>,
    #[serde(rename = "endColumn", skip_serializing_if = "Option::is_none")]
    end_column: Option<usize>,
}

fn severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Warn => "warning",
        Severity::Error => "error",
    }
}

fn make_relative_path(file_path: &str, base_path: &Path) -> String {
    if base_path.to_string_lossy().is_empty() {
        return file_path.to_string();
    }

    let file = Path::new(file_path);
    if file == base_path {
        return file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string());
    }

    file.strip_prefix(base_path)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file_path.to_string())
}

/// Render the SARIF report to a string. Rule metadata comes straight
/// from the registry so the explanation (including stated limitations
/// like the raw-values type ambiguity) is never hidden from consumers.
pub fn render_sarif(
    base_path: &Path,
    result: &ScanResult,
    registry: &Registry,
) -> anyhow::Result<String> {
    let rules: Vec<SarifRule> = result
        .rules_fired()
        .iter()
        .filter_map(|id| registry.get(id).ok())
        .map(|rule| SarifRule {
            id: rule.id.to_string(),
            name: rule.name.to_string(),
            short_description: SarifMessage {
                text: rule.message.to_string(),
            },
            full_description: SarifMessage {
                text: rule.explanation.to_string(),
            },
            help: SarifMessage {
                text: rule.suggested_fix.to_string(),
            },
            default_config: SarifRuleConfig {
                level: severity_to_level(rule.severity).to_string(),
            },
        })
        .collect();

    let results: Vec<SarifResult> = result
        .findings
        .iter()
        .map(|f| SarifResult {
            rule_id: f.rule_id.clone(),
            level: severity_to_level(f.severity).to_string(),
            message: SarifMessage {
                text: f.message.clone(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifact {
                        uri: make_relative_path(&f.file, base_path),
                    },
                    region: SarifRegion {
                        start_line: f.line,
                        // SARIF columns are 1-based.
                        start_column: f.column + 1,
                        end_line: f.end_line,
                        end_column: f.end_column.map(|c| c + 1),
                    },
                },
            }],
        })
        .collect();

    let report = SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    information_uri: INFO_URI.to_string(),
                    rules,
                },
            },
            results,
        }],
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write results in SARIF format.
pub fn write_sarif(
    base_path: &Path,
    result: &ScanResult,
    registry: &Registry,
) -> anyhow::Result<()> {
    println!("{}", render_sarif(base_path, result, registry)?);
    Ok(())
}

// =============================================================================
// Pretty format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(path: &str, result: &ScanResult, passed: bool, show_suppressed: bool) {
    println!();
    print!("  ");
    print!("{}", "ppopt".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", path);
    println!(
        "  {}{} analyzed, {} skipped",
        "Files:    ".dimmed(),
        result.scanned,
        result.skipped.len()
    );
    println!();

    if !result.findings.is_empty() {
        write_findings(&result.findings);
        println!();
    }

    if !result.skipped.is_empty() {
        write_skipped(&result.skipped);
        println!();
    }

    if !result.suppressed.is_empty() {
        write_suppressed_summary(&result.suppressed, show_suppressed);
        println!();
    }

    write_final_status(result, passed);
    println!();
}

fn write_findings(findings: &[Finding]) {
    println!("  {} ({}):", "Findings".bold(), findings.len());
    println!();

    for f in findings {
        write_severity_tag(f.severity);
        print!(" {}", f.rule_id.dimmed());
        print!("  {}", f.file.blue());
        print!("{}", format!(":{}:{}", f.line, f.column).dimmed());
        println!("  {}", format!("[{}]", f.confidence).dimmed());

        println!("           {}", f.message);
        if let Some(snippet) = &f.snippet {
            println!("           {}", snippet.trim_start().dimmed());
        }
        println!();
    }
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::Error => print!("    {}", "ERROR".red()),
        Severity::Warn => print!("    {}", "WARN ".yellow()),
    }
}

fn write_skipped(skipped: &[SkippedFile]) {
    println!("  {} ({}):", "Skipped".bold(), skipped.len());
    for s in skipped {
        println!("    {}  {}", s.file.blue(), s.reason.dimmed());
    }
}

fn write_suppressed_summary(suppressed: &[SuppressedFinding], show_details: bool) {
    println!("  {} ({}):", "Suppressed".dimmed(), suppressed.len());

    if !show_details {
        println!("    {}", "(use --show-suppressed to see details)".dimmed());
        return;
    }

    for sf in suppressed {
        let f = &sf.finding;
        print!("    {}", f.rule_id.dimmed());
        print!("  {}", f.file.blue());
        match sf.directive.scope {
            DirectiveScope::File => print!("{}", ":* (file)".dimmed()),
            DirectiveScope::Line(_) => print!("{}", format!(":{}", f.line).dimmed()),
        }
        println!();
    }
}

fn write_final_status(result: &ScanResult, passed: bool) {
    let counts = format!(
        "{} finding{}",
        result.findings.len(),
        if result.findings.len() == 1 { "" } else { "s" }
    );
    print!("  {}  ", counts.dimmed());
    if passed {
        println!("{}", "PASSED".green());
    } else {
        println!("{}", "FAILED".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{registry, Confidence};

    fn sample_result() -> ScanResult {
        ScanResult {
            findings: vec![Finding {
                rule_id: "PPO004".to_string(),
                file: "src/etl.py".to_string(),
                line: 12,
                column: 0,
                end_line: Some(12),
                end_column: Some(20),
                message: "Assignment through chained indexing may silently write to a copy"
                    .to_string(),
                severity: Severity::Error,
                confidence: Confidence::High,
                snippet: Some("df[mask]['y'] = 1".to_string()),
            }],
            suppressed: vec![],
            skipped: vec![SkippedFile {
                file: "src/broken.py".to_string(),
                reason: "not analyzable: source contains syntax errors".to_string(),
            }],
            scanned: 3,
        }
    }

    #[test]
    fn test_json_report_round_trips() {
        let result = sample_result();
        let json = render_json("src", &result, false).unwrap();
        let parsed: JsonReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.files_scanned, 3);
        assert!(!parsed.passed);
        assert_eq!(parsed.findings.len(), 1);
        assert_eq!(parsed.findings[0].rule_id, "PPO004");
        assert_eq!(parsed.files_skipped.len(), 1);
        assert_eq!(parsed.rules_fired, vec!["PPO004"]);
    }

    #[test]
    fn test_sarif_structure() {
        let result = sample_result();
        let sarif = render_sarif(Path::new("src"), &result, registry()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&sarif).unwrap();
        assert_eq!(value["version"], "2.1.0");
        let run = &value["runs"][0];
        assert_eq!(run["tool"]["driver"]["name"], "ppopt");
        assert_eq!(run["results"][0]["ruleId"], "PPO004");
        assert_eq!(run["results"][0]["level"], "error");
        let region = &run["results"][0]["locations"][0]["physicalLocation"]["region"];
        assert_eq!(region["startLine"], 12);
        assert_eq!(region["startColumn"], 1);
        let uri = &run["results"][0]["locations"][0]["physicalLocation"]["artifactLocation"]["uri"];
        assert_eq!(uri, "etl.py");
    }

    #[test]
    fn test_sarif_rule_metadata_from_registry() {
        let result = sample_result();
        let sarif = render_sarif(Path::new(""), &result, registry()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&sarif).unwrap();
        let rules = &value["runs"][0]["tool"]["driver"]["rules"];
        assert_eq!(rules[0]["id"], "PPO004");
        assert_eq!(rules[0]["defaultConfiguration"]["level"], "error");
        assert!(rules[0]["fullDescription"]["text"]
            .as_str()
            .unwrap()
            .contains("copy"));
    }
}
