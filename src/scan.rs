//! Scan orchestration: distributes per-file analysis across workers and
//! merges results deterministically.
//!
//! Per-file analysis is stateless with respect to other files, so files
//! are fanned out over the rayon pool. Output order never depends on
//! completion order: findings are re-sorted in the merge stage, which is
//! what makes sequential and parallel scans byte-identical.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::analyze::{analyze_file, Dispatch};
use crate::finding::{finalize, Finding};
use crate::parser;
use crate::profile::Profile;
use crate::rules::{Registry, Severity};
use crate::suppress::{self, SuppressedFinding};

/// A file that could not be analyzed, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// The merged result of one scan.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Final findings: deduplicated, sorted by (file, line, column, rule).
    pub findings: Vec<Finding>,
    /// Findings dropped by inline directives, kept for reporting.
    pub suppressed: Vec<SuppressedFinding>,
    /// Files that were not analyzable.
    pub skipped: Vec<SkippedFile>,
    /// Number of files analyzed (excluded files are not counted).
    pub scanned: usize,
}

impl ScanResult {
    /// Distinct rule ids that fired, sorted.
    pub fn rules_fired(&self) -> Vec<String> {
        let set: BTreeSet<String> = self.findings.iter().map(|f| f.rule_id.clone()).collect();
        set.into_iter().collect()
    }

    /// Whether any finding is at or above the given severity.
    pub fn has_findings_at(&self, severity: Severity) -> bool {
        self.findings.iter().any(|f| f.severity >= severity)
    }
}

enum FileOutcome {
    Analyzed {
        findings: Vec<Finding>,
        suppressed: Vec<SuppressedFinding>,
    },
    Skipped(SkippedFile),
}

/// Analyze one file end to end: read, parse, visit, apply directives.
/// All-or-nothing: a file that fails partway contributes a skip entry
/// and no findings.
fn scan_one(path: &Path, registry: &Registry, profile: &Profile, dispatch: &Dispatch) -> FileOutcome {
    let file = path.to_string_lossy().to_string();

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            return FileOutcome::Skipped(SkippedFile {
                file,
                reason: format!("unreadable: {}", e),
            })
        }
    };

    let tree = match parser::parse(source.as_bytes()) {
        Ok(t) => t,
        Err(e) => {
            return FileOutcome::Skipped(SkippedFile {
                file,
                reason: format!("not analyzable: {}", e),
            })
        }
    };

    let raw = analyze_file(&file, &source, &tree, registry, profile, dispatch);
    let directives = suppress::parse_directives(&source);
    let (findings, suppressed) = suppress::filter_suppressed(raw, &directives);

    FileOutcome::Analyzed {
        findings,
        suppressed,
    }
}

/// Scan a set of files under a profile.
///
/// The registry and profile are read-only for the scan's duration and
/// shared across workers without synchronization.
pub fn scan_files(
    files: &[PathBuf],
    registry: &Registry,
    profile: &Profile,
) -> anyhow::Result<ScanResult> {
    let dispatch = Dispatch::new(registry)?;

    let candidates: Vec<&PathBuf> = files
        .iter()
        .filter(|path| !profile.is_excluded(path))
        .collect();

    let outcomes: Vec<FileOutcome> = candidates
        .par_iter()
        .map(|path| scan_one(path, registry, profile, &dispatch))
        .collect();

    let mut result = ScanResult::default();
    let mut raw_findings = Vec::new();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Analyzed {
                findings,
                suppressed,
            } => {
                result.scanned += 1;
                raw_findings.extend(findings);
                result.suppressed.extend(suppressed);
            }
            FileOutcome::Skipped(skip) => result.skipped.push(skip),
        }
    }

    result.findings = finalize(raw_findings);
    result.suppressed.sort_by(|a, b| {
        (
            &a.finding.file,
            a.finding.line,
            a.finding.column,
            &a.finding.rule_id,
        )
            .cmp(&(
                &b.finding.file,
                b.finding.line,
                b.finding.column,
                &b.finding.rule_id,
            ))
    });
    result.skipped.sort_by(|a, b| a.file.cmp(&b.file));

    Ok(result)
}
