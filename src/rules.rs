//! Rule catalog: metadata for every detectable anti-pattern.
//!
//! Rules are registered once at process start into a frozen [`Registry`].
//! All downstream consumers (the analyzer dispatch table, the `explain`
//! and `rules` subcommands, SARIF rule metadata) read from the same
//! registry, so listings are deterministic in registration order.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while building or querying the rule registry.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("duplicate rule id: {0}")]
    Duplicate(String),
    #[error("unknown rule id: {0}")]
    Unknown(String),
}

/// Severity of a finding. `Warn` marks performance problems, `Error`
/// marks correctness problems (silent-failure risk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warn => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// How certain the analyzer is that a match is a true positive.
/// Used for filtering via the profile's confidence floor, never for
/// severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            _ => Err(format!("unknown confidence: {}", s)),
        }
    }
}

/// Immutable metadata for one detectable pattern.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Stable short code, e.g. "PPO001". Interop-sensitive: suppression
    /// directives and CI configs reference these.
    pub id: &'static str,
    pub name: &'static str,
    pub severity: Severity,
    /// Base confidence; matchers may lower it for ambiguous shapes.
    pub confidence: Confidence,
    pub message: &'static str,
    pub suggested_fix: &'static str,
    pub explanation: &'static str,
}

/// Write-once catalog of rules, keyed by id, ordered by registration.
#[derive(Debug, Default)]
pub struct Registry {
    rules: Vec<Rule>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. Duplicate ids are a fatal configuration error.
    pub fn register(&mut self, rule: Rule) -> Result<(), RuleError> {
        if self.index.contains_key(rule.id) {
            return Err(RuleError::Duplicate(rule.id.to_string()));
        }
        self.index.insert(rule.id, self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    /// Look up a rule by id.
    pub fn get(&self, id: &str) -> Result<&Rule, RuleError> {
        self.index
            .get(id)
            .map(|&i| &self.rules[i])
            .ok_or_else(|| RuleError::Unknown(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All registered rules in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The built-in pandas rule set.
fn builtin() -> Registry {
    let mut registry = Registry::new();
    let rules = [
        Rule {
            id: "PPO001",
            name: "row-wise-iteration",
            severity: Severity::Warn,
            confidence: Confidence::High,
            message: "Iterating rows with iterrows()/itertuples() is slow",
            suggested_fix: "Use vectorized column operations, or itertuples() only when row access is unavoidable",
            explanation: "Row iteration materializes a Python object per row and defeats \
                pandas' vectorized execution. Column-wise operations are typically \
                orders of magnitude faster.",
        },
        Rule {
            id: "PPO002",
            name: "row-wise-apply",
            severity: Severity::Warn,
            confidence: Confidence::High,
            message: "Row-wise apply(axis=1) runs a Python function per row",
            suggested_fix: "Replace with vectorized expressions or numpy.select for conditional logic",
            explanation: "apply with the row axis calls back into Python once per row. \
                Vectorized equivalents operate on whole columns at native speed.",
        },
        Rule {
            id: "PPO003",
            name: "concat-in-loop",
            severity: Severity::Warn,
            confidence: Confidence::High,
            message: "Growing a DataFrame with concat/append inside a loop is O(n^2)",
            suggested_fix: "Collect pieces in a list and concatenate once after the loop",
            explanation: "Each concat copies the entire accumulated frame plus the new \
                piece, so building a frame row-by-row costs quadratic time and \
                constant reallocation. Batch construction is linear.",
        },
        Rule {
            id: "PPO004",
            name: "chained-indexing-write",
            severity: Severity::Error,
            confidence: Confidence::High,
            message: "Assignment through chained indexing may silently write to a copy",
            suggested_fix: "Use a single .loc[row_selector, column_selector] = value assignment",
            explanation: "A double-subscript target first materializes an intermediate \
                object; whether the write reaches the original frame depends on \
                internal copy semantics. The assignment can be lost without any \
                error being raised.",
        },
        Rule {
            id: "PPO005",
            name: "raw-values-access",
            severity: Severity::Warn,
            confidence: Confidence::Medium,
            message: ".values on a column selection returns an untyped array",
            suggested_fix: "Prefer .to_numpy() (or .array) for explicit, typed extraction",
            explanation: "The .values property has inconsistent return types across \
                extension dtypes. This check cannot see types, so the same attribute \
                on a non-pandas object may be flagged; confidence is reported as \
                medium for that reason.",
        },
    ];
    for rule in rules {
        // Ids are compile-time constants, so a duplicate here is a defect
        // in the catalog itself.
        registry
            .register(rule)
            .unwrap_or_else(|e| panic!("builtin rule catalog: {}", e));
    }
    registry
}

/// Process-wide frozen registry. Safe to share across scan workers:
/// it is never mutated after first access.
static REGISTRY: Lazy<Registry> = Lazy::new(builtin);

/// The global rule registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rules_registered() {
        let registry = registry();
        assert_eq!(registry.len(), 5);
        for id in ["PPO001", "PPO002", "PPO003", "PPO004", "PPO005"] {
            assert!(registry.contains(id), "expected {}", id);
        }
    }

    #[test]
    fn test_registration_order_stable() {
        let ids: Vec<&str> = registry().all().map(|r| r.id).collect();
        assert_eq!(ids, vec!["PPO001", "PPO002", "PPO003", "PPO004", "PPO005"]);
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let mut registry = Registry::new();
        let rule = Rule {
            id: "PPO900",
            name: "test",
            severity: Severity::Warn,
            confidence: Confidence::Low,
            message: "",
            suggested_fix: "",
            explanation: "",
        };
        registry.register(rule.clone()).unwrap();
        let err = registry.register(rule).unwrap_err();
        assert!(matches!(err, RuleError::Duplicate(id) if id == "PPO900"));
    }

    #[test]
    fn test_unknown_rule() {
        let err = registry().get("PPO999").unwrap_err();
        assert!(matches!(err, RuleError::Unknown(_)));
    }

    #[test]
    fn test_chained_indexing_is_error_severity() {
        let rule = registry().get("PPO004").unwrap();
        assert_eq!(rule.severity, Severity::Error);
        // The only correctness rule; everything else is a performance warning.
        for other in registry().all().filter(|r| r.id != "PPO004") {
            assert_eq!(other.severity, Severity::Warn);
        }
    }

    #[test]
    fn test_severity_confidence_parsing() {
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!("ERROR".parse::<Severity>().unwrap(), Severity::Error);
        assert!("fatal".parse::<Severity>().is_err());
        assert_eq!("high".parse::<Confidence>().unwrap(), Confidence::High);
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
    }
}
