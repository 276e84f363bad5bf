//! The finding model and the per-scan aggregation rules.

use serde::{Deserialize, Serialize};

use crate::rules::{Confidence, Severity};

/// One reported occurrence of a rule match at a source location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub file: String,
    /// 1-based line of the matched expression.
    pub line: usize,
    /// 0-based column of the matched expression.
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
    pub message: String,
    pub severity: Severity,
    pub confidence: Confidence,
    /// The source line the finding points at, for human-readable output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Finding {
    /// Deduplication identity. No two findings in a final result share
    /// this tuple.
    pub fn identity(&self) -> (&str, &str, usize, usize) {
        (&self.rule_id, &self.file, self.line, self.column)
    }

    /// Deterministic output ordering: by location first, then rule id.
    fn sort_key(&self) -> (&str, usize, usize, &str) {
        (&self.file, self.line, self.column, &self.rule_id)
    }
}

/// Deduplicate (earliest discovery wins) and sort into the final,
/// scheduler-independent order.
pub fn finalize(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<Finding> = Vec::with_capacity(findings.len());
    for finding in findings {
        let key = (
            finding.rule_id.clone(),
            finding.file.clone(),
            finding.line,
            finding.column,
        );
        if seen.insert(key) {
            unique.push(finding);
        }
    }
    unique.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(rule_id: &str, file: &str, line: usize, column: usize) -> Finding {
        Finding {
            rule_id: rule_id.to_string(),
            file: file.to_string(),
            line,
            column,
            end_line: None,
            end_column: None,
            message: String::new(),
            severity: Severity::Warn,
            confidence: Confidence::High,
            snippet: None,
        }
    }

    #[test]
    fn test_finalize_deduplicates_earliest_wins() {
        let mut first = finding("PPO001", "a.py", 3, 4);
        first.message = "first".to_string();
        let mut second = finding("PPO001", "a.py", 3, 4);
        second.message = "second".to_string();
        let result = finalize(vec![first, second]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].message, "first");
    }

    #[test]
    fn test_finalize_sorts_by_location_then_rule() {
        let result = finalize(vec![
            finding("PPO003", "b.py", 1, 0),
            finding("PPO001", "a.py", 9, 0),
            finding("PPO002", "a.py", 2, 8),
            finding("PPO001", "a.py", 2, 8),
        ]);
        let keys: Vec<_> = result
            .iter()
            .map(|f| (f.file.clone(), f.line, f.column, f.rule_id.clone()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(result[0].rule_id, "PPO001");
        assert_eq!(result[0].line, 2);
    }

    #[test]
    fn test_finalize_order_independent_of_input_order() {
        let a = vec![
            finding("PPO001", "a.py", 1, 0),
            finding("PPO002", "a.py", 5, 2),
            finding("PPO004", "z.py", 3, 1),
        ];
        let mut b = a.clone();
        b.reverse();
        let fa = finalize(a);
        let fb = finalize(b);
        let ka: Vec<_> = fa.iter().map(|f| format!("{:?}", f.identity())).collect();
        let kb: Vec<_> = fb.iter().map(|f| format!("{:?}", f.identity())).collect();
        assert_eq!(ka, kb);
    }
}
