//! One predicate per rule: pure functions from a syntax node plus the
//! current scope stack to an optional match.
//!
//! Matchers never mutate the tree or the scope stack and never error.
//! Any shape they cannot introspect (non-literal arguments, unexpected
//! node structure) resolves to no-match: false negatives are preferred
//! over false positives.

use tree_sitter::Node;

use super::scope::{ScopeKind, ScopeStack};
use crate::rules::Confidence;

/// A positive match with its resolved confidence and precise location.
#[derive(Debug, Clone, Copy)]
pub struct PatternMatch {
    pub confidence: Confidence,
    /// 1-based line of the matched expression.
    pub line: usize,
    /// 0-based column of the matched expression.
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl PatternMatch {
    fn at(node: Node, confidence: Confidence) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        PatternMatch {
            confidence,
            line: start.row + 1,
            column: start.column,
            end_line: end.row + 1,
            end_column: end.column,
        }
    }
}

/// Matcher signature: `(node, source, scopes) -> Option<PatternMatch>`.
pub type MatcherFn = fn(Node, &[u8], &ScopeStack) -> Option<PatternMatch>;

/// The closed set of node kinds any matcher is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Call,
    Attribute,
    Assignment,
}

impl NodeKind {
    /// Map a tree-sitter Python grammar kind to a matchable kind.
    pub fn of(kind: &str) -> Option<NodeKind> {
        match kind {
            "call" => Some(NodeKind::Call),
            "attribute" => Some(NodeKind::Attribute),
            "assignment" => Some(NodeKind::Assignment),
            _ => None,
        }
    }
}

/// Binds one rule id to the node kind it inspects and its matcher.
pub struct MatcherBinding {
    pub rule_id: &'static str,
    pub kind: NodeKind,
    pub matcher: MatcherFn,
}

/// All matcher bindings. The analyzer's dispatch table is built from this
/// list once per scan, cross-checked against the rule registry.
pub static BINDINGS: &[MatcherBinding] = &[
    MatcherBinding {
        rule_id: "PPO001",
        kind: NodeKind::Call,
        matcher: match_rowwise_iteration,
    },
    MatcherBinding {
        rule_id: "PPO002",
        kind: NodeKind::Call,
        matcher: match_rowwise_apply,
    },
    MatcherBinding {
        rule_id: "PPO003",
        kind: NodeKind::Assignment,
        matcher: match_concat_in_loop,
    },
    MatcherBinding {
        rule_id: "PPO004",
        kind: NodeKind::Assignment,
        matcher: match_chained_indexing_write,
    },
    MatcherBinding {
        rule_id: "PPO005",
        kind: NodeKind::Attribute,
        matcher: match_raw_values_access,
    },
];

fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// For a `call` node, the method name if its function is an attribute
/// access (`obj.method(...)`).
fn method_name<'a>(call: Node, source: &'a [u8]) -> Option<&'a str> {
    let func = call.child_by_field_name("function")?;
    if func.kind() != "attribute" {
        return None;
    }
    let attr = func.child_by_field_name("attribute")?;
    Some(node_text(attr, source))
}

/// Strip the quote characters from a Python string literal's text.
fn string_literal_value(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'')
}

/// PPO001: `.iterrows()` / `.itertuples()` as the iterated expression of
/// a `for` statement. The anti-pattern is the call itself, so confidence
/// is high regardless of surrounding code.
fn match_rowwise_iteration(node: Node, source: &[u8], _scopes: &ScopeStack) -> Option<PatternMatch> {
    let name = method_name(node, source)?;
    if name != "iterrows" && name != "itertuples" {
        return None;
    }
    let parent = node.parent()?;
    if parent.kind() != "for_statement" {
        return None;
    }
    // Must be the iterated expression, not some call inside the body.
    let iterated = parent.child_by_field_name("right")?;
    if iterated.id() != node.id() {
        return None;
    }
    Some(PatternMatch::at(node, Confidence::High))
}

/// PPO002: `.apply(...)` with an axis argument selecting row-wise
/// application (`axis=1` or `axis="columns"`). A literal selector is a
/// high-confidence match; a non-literal selector cannot be confirmed
/// statically and drops to medium. Column-wise axis values never match.
fn match_rowwise_apply(node: Node, source: &[u8], _scopes: &ScopeStack) -> Option<PatternMatch> {
    if method_name(node, source)? != "apply" {
        return None;
    }
    let args = node.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let axis = args
        .named_children(&mut cursor)
        .find(|child| {
            child.kind() == "keyword_argument"
                && child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source) == "axis")
                    .unwrap_or(false)
        })?
        .child_by_field_name("value")?;

    let confidence = match axis.kind() {
        "integer" => match node_text(axis, source) {
            "1" => Confidence::High,
            _ => return None,
        },
        "string" => match string_literal_value(node_text(axis, source)) {
            "columns" => Confidence::High,
            _ => return None,
        },
        // A variable or expression: the value cannot be confirmed.
        _ => Confidence::Medium,
    };
    Some(PatternMatch::at(node, confidence))
}

/// PPO003: `x = pd.concat([..., x, ...])` or `x = x.append(...)` inside a
/// loop. The assignment target must reappear among the combine call's
/// inputs; without that correlation the call is loop-invariant frame
/// construction and does not fire. A comprehension frame nested inside
/// the loop is a sequence-building expression, not frame growth, and is
/// excluded.
fn match_concat_in_loop(node: Node, source: &[u8], scopes: &ScopeStack) -> Option<PatternMatch> {
    if scopes.innermost_of(&[ScopeKind::Loop, ScopeKind::Comprehension]) != Some(ScopeKind::Loop) {
        return None;
    }
    let target = node.child_by_field_name("left")?;
    if target.kind() != "identifier" {
        return None;
    }
    let target_name = node_text(target, source);
    let value = node.child_by_field_name("right")?;
    if value.kind() != "call" {
        return None;
    }

    match method_name(value, source)? {
        "concat" => {
            if !concat_inputs_contain(value, source, target_name) {
                return None;
            }
            Some(PatternMatch::at(value, Confidence::High))
        }
        "append" => {
            let receiver = value
                .child_by_field_name("function")?
                .child_by_field_name("object")?;
            if receiver.kind() != "identifier" || node_text(receiver, source) != target_name {
                return None;
            }
            Some(PatternMatch::at(value, Confidence::High))
        }
        _ => None,
    }
}

/// Whether the first positional argument of a concat call mentions the
/// assignment target as a direct element (`pd.concat([target, piece])`).
fn concat_inputs_contain(call: Node, source: &[u8], target: &str) -> bool {
    let Some(args) = call.child_by_field_name("arguments") else {
        return false;
    };
    let mut cursor = args.walk();
    let Some(first) = args
        .named_children(&mut cursor)
        .find(|c| c.kind() != "keyword_argument")
    else {
        return false;
    };
    match first.kind() {
        "list" | "tuple" => {
            let mut elems = first.walk();
            let found = first
                .named_children(&mut elems)
                .any(|e| e.kind() == "identifier" && node_text(e, source) == target);
            found
        }
        "identifier" => node_text(first, source) == target,
        _ => false,
    }
}

/// PPO004: a subscript assignment whose target's base is itself a
/// subscript (`df[mask]["col"] = value`). A correctness rule: whether the
/// write reaches the original frame is undefined, so its rule carries
/// error severity.
fn match_chained_indexing_write(
    node: Node,
    _source: &[u8],
    _scopes: &ScopeStack,
) -> Option<PatternMatch> {
    let target = node.child_by_field_name("left")?;
    if target.kind() != "subscript" {
        return None;
    }
    let base = target.child_by_field_name("value")?;
    if base.kind() != "subscript" {
        return None;
    }
    Some(PatternMatch::at(target, Confidence::High))
}

/// PPO005: the `.values` property (not a method call) on a column
/// selection (`df["col"].values`). The same attribute name exists on
/// non-pandas objects and types are invisible here, so confidence stays
/// at medium.
fn match_raw_values_access(node: Node, source: &[u8], _scopes: &ScopeStack) -> Option<PatternMatch> {
    let attr = node.child_by_field_name("attribute")?;
    if node_text(attr, source) != "values" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    if object.kind() != "subscript" {
        return None;
    }
    // `.values()` would be a method call on some other object, not the
    // property access this rule is about.
    if let Some(parent) = node.parent() {
        if parent.kind() == "call" {
            if let Some(func) = parent.child_by_field_name("function") {
                if func.id() == node.id() {
                    return None;
                }
            }
        }
    }
    Some(PatternMatch::at(node, Confidence::Medium))
}
