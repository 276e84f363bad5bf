//! The rule-matching engine: scope tracking, pattern matchers, and the
//! tree visitor that ties them together.

mod matchers;
mod scope;
mod visitor;

pub use matchers::{MatcherBinding, NodeKind, PatternMatch, BINDINGS};
pub use scope::{ScopeKind, ScopeStack};
pub use visitor::{analyze_file, Dispatch};
