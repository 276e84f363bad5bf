//! Inline suppression of findings via comments.
//!
//! The directive syntax is interop-sensitive; other tooling parses it
//! too, so it is matched exactly:
//!
//! - `# ppopt: disable` — suppress all rules
//! - `# ppopt: disable=PPO001,PPO003` — suppress the listed rules
//!
//! A directive on the first non-blank line of a file (a comment before
//! any code) is file-scoped; any other occurrence is scoped to the line
//! it appears on. Directive parsing is plain text scanning, independent
//! of the syntax tree: the two passes are joined only by file/line
//! coordinates.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::finding::Finding;

/// Where a directive applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "scope", content = "line")]
pub enum DirectiveScope {
    /// The entire file.
    File,
    /// Exactly this 1-based line.
    Line(usize),
}

/// One parsed suppression directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    pub scope: DirectiveScope,
    /// Empty means "all rules".
    pub rule_ids: Vec<String>,
}

/// A finding that was dropped by a directive, kept for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressedFinding {
    pub finding: Finding,
    pub directive: Directive,
}

lazy_static::lazy_static! {
    static ref DIRECTIVE_PATTERN: Regex =
        Regex::new(r"#\s*ppopt:\s*disable(?:\s*=\s*([A-Za-z0-9_]+(?:\s*,\s*[A-Za-z0-9_]+)*))?")
            .unwrap();
}

/// Parse all suppression directives from one file's source text.
pub fn parse_directives(source: &str) -> Vec<Directive> {
    let first_non_blank = source
        .lines()
        .position(|line| !line.trim().is_empty());

    let mut directives = Vec::new();
    for (idx, line) in source.lines().enumerate() {
        let Some(caps) = DIRECTIVE_PATTERN.captures(line) else {
            continue;
        };
        let rule_ids: Vec<String> = caps
            .get(1)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        // File scope requires the directive to sit on the first non-blank
        // line and that line to be a comment, i.e. before any code.
        let scope = if first_non_blank == Some(idx) && line.trim_start().starts_with('#') {
            DirectiveScope::File
        } else {
            DirectiveScope::Line(idx + 1)
        };

        directives.push(Directive { scope, rule_ids });
    }
    directives
}

/// Whether a directive suppresses a finding. Line scopes match the exact
/// reported line only; there is no fuzzy adjacency.
pub fn matches(finding: &Finding, directive: &Directive) -> bool {
    if !directive.rule_ids.is_empty() && !directive.rule_ids.iter().any(|id| *id == finding.rule_id)
    {
        return false;
    }
    match directive.scope {
        DirectiveScope::File => true,
        DirectiveScope::Line(line) => finding.line == line,
    }
}

/// Split one file's findings into kept and suppressed.
pub fn filter_suppressed(
    findings: Vec<Finding>,
    directives: &[Directive],
) -> (Vec<Finding>, Vec<SuppressedFinding>) {
    let mut kept = Vec::new();
    let mut suppressed = Vec::new();

    for finding in findings {
        match directives.iter().find(|d| matches(&finding, d)) {
            Some(directive) => suppressed.push(SuppressedFinding {
                finding,
                directive: directive.clone(),
            }),
            None => kept.push(finding),
        }
    }

    (kept, suppressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Confidence, Severity};

    fn finding(rule_id: &str, line: usize) -> Finding {
        Finding {
            rule_id: rule_id.to_string(),
            file: "test.py".to_string(),
            line,
            column: 0,
            end_line: None,
            end_column: None,
            message: String::new(),
            severity: Severity::Warn,
            confidence: Confidence::High,
            snippet: None,
        }
    }

    #[test]
    fn test_parse_line_directive_with_ids() {
        let source = "x = 1\nresult = pd.concat([result, p])  # ppopt: disable=PPO003\n";
        let directives = parse_directives(source);
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].scope, DirectiveScope::Line(2));
        assert_eq!(directives[0].rule_ids, vec!["PPO003"]);
    }

    #[test]
    fn test_parse_bare_directive_suppresses_all() {
        let source = "x = 1\ny = do_thing()  # ppopt: disable\n";
        let directives = parse_directives(source);
        assert_eq!(directives.len(), 1);
        assert!(directives[0].rule_ids.is_empty());
    }

    #[test]
    fn test_first_non_blank_comment_is_file_scoped() {
        let source = "\n\n# ppopt: disable=PPO001,PPO002\nimport pandas as pd\n";
        let directives = parse_directives(source);
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].scope, DirectiveScope::File);
        assert_eq!(directives[0].rule_ids, vec!["PPO001", "PPO002"]);
    }

    #[test]
    fn test_directive_after_code_is_line_scoped() {
        let source = "import pandas as pd\n# ppopt: disable\n";
        let directives = parse_directives(source);
        assert_eq!(directives[0].scope, DirectiveScope::Line(2));
    }

    #[test]
    fn test_trailing_directive_on_first_code_line_is_line_scoped() {
        // The first non-blank line is code, not a comment, so this is not
        // a file-level opt-out.
        let source = "x = df['c'].values  # ppopt: disable\n";
        let directives = parse_directives(source);
        assert_eq!(directives[0].scope, DirectiveScope::Line(1));
    }

    #[test]
    fn test_file_scope_empty_list_suppresses_everything() {
        let directive = Directive {
            scope: DirectiveScope::File,
            rule_ids: vec![],
        };
        assert!(matches(&finding("PPO001", 5), &directive));
        assert!(matches(&finding("PPO004", 80), &directive));
    }

    #[test]
    fn test_line_scope_exact_rule_and_line() {
        let directive = Directive {
            scope: DirectiveScope::Line(5),
            rule_ids: vec!["PPO003".to_string()],
        };
        assert!(matches(&finding("PPO003", 5), &directive));
        assert!(!matches(&finding("PPO003", 6), &directive));
        assert!(!matches(&finding("PPO001", 5), &directive));
    }

    #[test]
    fn test_filter_splits_kept_and_suppressed() {
        let directives = vec![Directive {
            scope: DirectiveScope::Line(2),
            rule_ids: vec!["PPO001".to_string()],
        }];
        let (kept, suppressed) = filter_suppressed(
            vec![finding("PPO001", 2), finding("PPO002", 2), finding("PPO001", 3)],
            &directives,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(suppressed.len(), 1);
        assert_eq!(suppressed[0].finding.line, 2);
        assert_eq!(suppressed[0].finding.rule_id, "PPO001");
    }
}
