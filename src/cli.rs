//! Command-line interface for ppopt.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::profile::{Profile, ProfileFile, ProfileOverrides};
use crate::report;
use crate::rules::{registry, Confidence, Severity};
use crate::scan;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default profile file names to search for.
const DEFAULT_PROFILE_NAMES: &[&str] = &["ppopt.yaml", ".ppopt.yaml"];

/// Static analyzer that flags pandas performance and correctness
/// anti-patterns.
///
/// ppopt inspects Python source without executing it and reports known
/// slow or unsafe idioms: row iteration, row-wise apply, frame growth
/// inside loops, chained-indexing writes, raw `.values` extraction.
#[derive(Parser)]
#[command(name = "ppopt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a file or directory and report findings
    #[command(visible_alias = "lint")]
    Check(CheckArgs),
    /// Show the full metadata for one rule
    Explain(ExplainArgs),
    /// List all registered rules
    Rules,
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Path to analyze (file or directory)
    pub path: PathBuf,

    /// Path to a profile YAML file (default: auto-discover ppopt.yaml)
    #[arg(short, long)]
    pub profile: Option<PathBuf>,

    /// Output format: pretty, json, or sarif
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Comma-separated rule ids to enable (default: all)
    #[arg(long, value_delimiter = ',')]
    pub select: Option<Vec<String>>,

    /// Comma-separated rule ids to disable
    #[arg(long, value_delimiter = ',')]
    pub disable: Vec<String>,

    /// Drop findings below this confidence: low, medium, or high
    #[arg(long)]
    pub min_confidence: Option<Confidence>,

    /// Glob patterns for paths to exclude (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Fail (exit 1) when findings at or above this severity exist
    #[arg(long)]
    pub fail_on: Option<Severity>,

    /// Show suppressed findings in output
    #[arg(long)]
    pub show_suppressed: bool,
}

/// Arguments for the explain command.
#[derive(Parser)]
pub struct ExplainArgs {
    /// Rule id, e.g. PPO001
    pub rule_id: String,
}

/// Discover a profile file in the current directory.
fn discover_profile() -> Option<PathBuf> {
    DEFAULT_PROFILE_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// Collect Python files to analyze under a root.
fn collect_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            // Depth 0 is the scan root itself; only prune below it.
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories
            if e.file_type().is_dir() && name.starts_with('.') {
                return false;
            }
            // Skip environments and build output
            if e.file_type().is_dir()
                && (name == "venv"
                    || name == "node_modules"
                    || name == "__pycache__"
                    || name == "build"
                    || name == "dist"
                    || name == "site-packages")
            {
                return false;
            }
            true
        })
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("py") {
                files.push(path.to_path_buf());
            }
        }
    }

    // Stable input order; the merge stage re-sorts findings anyway, but
    // skipped-file accounting should not depend on directory iteration.
    files.sort();
    Ok(files)
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" && args.format != "sarif" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'sarif'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    // An explicitly named profile must load; a discovered one is optional.
    let profile_file = match &args.profile {
        Some(path) => Some(ProfileFile::load(path)?),
        None => match discover_profile() {
            Some(path) => Some(ProfileFile::load(&path)?),
            None => None,
        },
    };

    let overrides = ProfileOverrides {
        select: args.select.clone(),
        disable: args.disable.clone(),
        min_confidence: args.min_confidence,
        exclude: args.exclude.clone(),
        fail_on: args.fail_on,
    };

    // Configuration errors are fatal before any scanning begins.
    let profile = match Profile::resolve(registry(), profile_file.as_ref(), &overrides) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: invalid configuration: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let metadata = match std::fs::metadata(&args.path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let files = if metadata.is_dir() {
        collect_files(&args.path)?
    } else {
        vec![args.path.clone()]
    };

    if files.is_empty() {
        eprintln!("Warning: no Python files to analyze");
        return Ok(EXIT_SUCCESS);
    }

    let result = scan::scan_files(&files, registry(), &profile)?;
    let passed = !result.has_findings_at(profile.fail_on);

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, &result, passed)?,
        "sarif" => report::write_sarif(&args.path, &result, registry())?,
        _ => report::write_pretty(&path_str, &result, passed, args.show_suppressed),
    }

    if passed {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the explain command.
pub fn run_explain(args: &ExplainArgs) -> anyhow::Result<i32> {
    let rule = match registry().get(&args.rule_id) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run 'ppopt rules' to list known rule ids");
            return Ok(EXIT_ERROR);
        }
    };

    println!();
    println!("  {} {}", rule.id.cyan().bold(), rule.name.bold());
    println!("  severity:   {}", rule.severity);
    println!("  confidence: {}", rule.confidence);
    println!();
    println!("  {}", rule.message);
    println!();
    println!("  {}", "Why".bold());
    println!("  {}", rule.explanation);
    println!();
    println!("  {}", "Fix".bold());
    println!("  {}", rule.suggested_fix);
    println!();

    Ok(EXIT_SUCCESS)
}

/// Run the rules command.
pub fn run_rules() -> anyhow::Result<i32> {
    println!("Registered rules:");
    println!();
    for rule in registry().all() {
        println!(
            "  {}  {:<24} {:<8} {}",
            rule.id,
            rule.name,
            rule.severity.to_string(),
            rule.message
        );
    }
    println!();
    println!("Usage:");
    println!("  ppopt explain <rule_id>");
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_files_finds_python_only() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(temp.path().join("b.txt"), "nope\n").unwrap();
        fs::create_dir(temp.path().join("__pycache__")).unwrap();
        fs::write(temp.path().join("__pycache__").join("c.py"), "x = 1\n").unwrap();

        let files = collect_files(temp.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.py"));
    }

    #[test]
    fn test_collect_files_sorted() {
        let temp = TempDir::new().unwrap();
        for name in ["z.py", "a.py", "m.py"] {
            fs::write(temp.path().join(name), "x = 1\n").unwrap();
        }
        let files = collect_files(temp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.py", "m.py", "z.py"]);
    }
}
