//! ppopt - pandas anti-pattern analyzer.
//!
//! ppopt statically analyzes Python source for known pandas performance
//! and correctness anti-patterns: row-wise iteration, row-wise apply,
//! DataFrame growth inside loops, chained-indexing writes, and raw
//! `.values` extraction. Nothing is ever executed; results are
//! deterministic and suitable for CI gating.
//!
//! # Architecture
//!
//! - `rules`: the frozen rule registry with per-rule metadata
//! - `parser`: tree-sitter parsing of analyzed Python files
//! - `analyze`: scope tracking, pattern matchers, and the tree visitor
//! - `suppress`: inline `# ppopt: disable` directive handling
//! - `finding`: the finding model and deterministic aggregation
//! - `profile`: resolved scan configuration (rules, confidence floor,
//!   path excludes, fail threshold)
//! - `scan`: parallel per-file orchestration with deterministic merge
//! - `report`: output formatting (pretty, JSON, SARIF)

pub mod analyze;
pub mod cli;
pub mod finding;
pub mod parser;
pub mod profile;
pub mod report;
pub mod rules;
pub mod scan;
pub mod suppress;

pub use analyze::{analyze_file, Dispatch, ScopeKind, ScopeStack};
pub use finding::Finding;
pub use profile::{Profile, ProfileFile, ProfileOverrides};
pub use rules::{registry, Confidence, Registry, Rule, RuleError, Severity};
pub use scan::{scan_files, ScanResult, SkippedFile};
pub use suppress::{Directive, DirectiveScope, SuppressedFinding};
