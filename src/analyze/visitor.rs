//! Single-pass tree traversal that drives the matchers.
//!
//! The analyzer walks one file's tree exactly once. Scope frames are
//! pushed before a node's children are visited and popped after, so a
//! matcher invoked anywhere below a loop sees that loop on the stack.
//! Matches for disabled rules or below the confidence floor are dropped
//! before a `Finding` is ever allocated.

use std::collections::HashMap;
use tree_sitter::{Node, Tree};

use super::matchers::{MatcherBinding, NodeKind, BINDINGS};
use super::scope::{ScopeKind, ScopeStack};
use crate::finding::Finding;
use crate::profile::Profile;
use crate::rules::{Registry, RuleError};

/// Node-kind to candidate-matcher mapping, built once per scan from the
/// registry plus the matcher bindings, never re-derived per node.
pub struct Dispatch {
    by_kind: HashMap<NodeKind, Vec<&'static MatcherBinding>>,
}

impl Dispatch {
    /// Build the dispatch table. A binding naming an unregistered rule id
    /// is a configuration error.
    pub fn new(registry: &Registry) -> Result<Dispatch, RuleError> {
        let mut by_kind: HashMap<NodeKind, Vec<&'static MatcherBinding>> = HashMap::new();
        for binding in BINDINGS {
            if !registry.contains(binding.rule_id) {
                return Err(RuleError::Unknown(binding.rule_id.to_string()));
            }
            by_kind.entry(binding.kind).or_default().push(binding);
        }
        Ok(Dispatch { by_kind })
    }

    fn candidates(&self, kind: NodeKind) -> &[&'static MatcherBinding] {
        self.by_kind.get(&kind).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// One in-progress traversal of one file. Never shared across files; the
/// scope stack and finding accumulator are discarded when the traversal
/// finishes.
struct Analyzer<'s> {
    file: &'s str,
    source: &'s str,
    registry: &'s Registry,
    profile: &'s Profile,
    dispatch: &'s Dispatch,
    scopes: ScopeStack,
    findings: Vec<Finding>,
}

/// Analyze one parsed file, returning raw findings in discovery order.
/// Discovery order is not the final order; the aggregator sorts later.
pub fn analyze_file(
    file: &str,
    source: &str,
    tree: &Tree,
    registry: &Registry,
    profile: &Profile,
    dispatch: &Dispatch,
) -> Vec<Finding> {
    let mut analyzer = Analyzer {
        file,
        source,
        registry,
        profile,
        dispatch,
        scopes: ScopeStack::new(),
        findings: Vec::new(),
    };
    analyzer.walk(tree.root_node());
    assert_eq!(
        analyzer.scopes.depth(),
        0,
        "scope stack not empty after traversal of {}",
        file
    );
    analyzer.findings
}

impl<'s> Analyzer<'s> {
    fn walk(&mut self, node: Node) {
        let scope = ScopeKind::of_node(node.kind());
        if let Some(kind) = scope {
            self.scopes.enter(kind);
        }

        if let Some(kind) = NodeKind::of(node.kind()) {
            for binding in self.dispatch.candidates(kind) {
                if !self.profile.rule_enabled(binding.rule_id) {
                    continue;
                }
                if let Some(m) = (binding.matcher)(node, self.source.as_bytes(), &self.scopes) {
                    if m.confidence >= self.profile.confidence_floor {
                        self.record(binding.rule_id, m);
                    }
                }
            }
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child);
        }

        if let Some(kind) = scope {
            self.scopes.exit(kind);
        }
    }

    fn record(&mut self, rule_id: &str, m: super::matchers::PatternMatch) {
        // Dispatch construction already validated every bound rule id.
        let rule = self
            .registry
            .get(rule_id)
            .unwrap_or_else(|e| panic!("dispatch referenced unvalidated rule: {}", e));
        let snippet = self
            .source
            .lines()
            .nth(m.line - 1)
            .map(|l| l.trim_end().to_string());
        self.findings.push(Finding {
            rule_id: rule.id.to_string(),
            file: self.file.to_string(),
            line: m.line,
            column: m.column,
            end_line: Some(m.end_line),
            end_column: Some(m.end_column),
            message: rule.message.to_string(),
            severity: rule.severity,
            confidence: m.confidence,
            snippet,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use crate::profile::{Profile, ProfileOverrides};
    use crate::rules::{registry, Confidence, Severity};

    fn analyze(source: &str, profile: &Profile) -> Vec<Finding> {
        let tree = parser::parse(source.as_bytes()).expect("fixture should parse");
        let dispatch = Dispatch::new(registry()).unwrap();
        analyze_file("test.py", source, &tree, registry(), profile, &dispatch)
    }

    #[test]
    fn test_iterrows_in_for_yields_one_finding() {
        let source = "for i, row in df.iterrows():\n    total += row['x']\n";
        let profile = Profile::default_for(registry());
        let findings = analyze(source, &profile);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.rule_id, "PPO001");
        assert_eq!(f.line, 1);
        assert_eq!(f.column, 14);
        assert_eq!(f.severity, Severity::Warn);
        assert_eq!(f.confidence, Confidence::High);
        assert_eq!(f.snippet.as_deref(), Some("for i, row in df.iterrows():"));
    }

    #[test]
    fn test_concat_fires_inside_loop_only() {
        let in_loop = "for piece in pieces:\n    result = pd.concat([result, piece])\n";
        let outside = "result = pd.concat([result, piece])\n";
        let profile = Profile::default_for(registry());
        assert_eq!(analyze(in_loop, &profile).len(), 1);
        assert_eq!(analyze(in_loop, &profile)[0].rule_id, "PPO003");
        assert!(analyze(outside, &profile).is_empty());
    }

    #[test]
    fn test_nested_scopes_balanced() {
        let source = "\
def build(frames):
    out = []
    for f in frames:
        if f is not None:
            while len(out) < 10:
                out = [x for x in out]
    return out
";
        let profile = Profile::default_for(registry());
        // The assertion inside analyze_file checks stack balance.
        assert!(analyze(source, &profile).is_empty());
    }

    #[test]
    fn test_disabled_rule_never_recorded() {
        let source = "for i, row in df.iterrows():\n    pass\n";
        let overrides = ProfileOverrides {
            disable: vec!["PPO001".to_string()],
            ..Default::default()
        };
        let profile = Profile::resolve(registry(), None, &overrides).unwrap();
        assert!(analyze(source, &profile).is_empty());
    }

    #[test]
    fn test_confidence_floor_drops_medium_matches() {
        let source = "out = df.apply(func, axis=which)\narr = df['col'].values\n";
        let all = Profile::default_for(registry());
        assert_eq!(analyze(source, &all).len(), 2);

        let overrides = ProfileOverrides {
            min_confidence: Some(Confidence::High),
            ..Default::default()
        };
        let high_only = Profile::resolve(registry(), None, &overrides).unwrap();
        assert!(analyze(source, &high_only).is_empty());
    }

    #[test]
    fn test_chained_write_reported_as_error() {
        let source = "df[df['x'] > 0]['y'] = 1\n";
        let profile = Profile::default_for(registry());
        let findings = analyze(source, &profile);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "PPO004");
        assert_eq!(findings[0].severity, Severity::Error);
    }
}
