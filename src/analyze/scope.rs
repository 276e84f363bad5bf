//! Lexical/control scope tracking during tree traversal.
//!
//! The stack mirrors the enclosing syntax constructs of the node
//! currently being visited. Matchers query it to answer questions like
//! "is this call inside a loop body".

/// One enclosing syntax construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Loop,
    Conditional,
    Function,
    Comprehension,
}

impl ScopeKind {
    /// Map a tree-sitter Python node kind to the scope it opens, if any.
    pub fn of_node(kind: &str) -> Option<ScopeKind> {
        match kind {
            "for_statement" | "while_statement" => Some(ScopeKind::Loop),
            "if_statement" | "conditional_expression" => Some(ScopeKind::Conditional),
            "function_definition" | "lambda" => Some(ScopeKind::Function),
            "list_comprehension" | "set_comprehension" | "dictionary_comprehension"
            | "generator_expression" => Some(ScopeKind::Comprehension),
            _ => None,
        }
    }
}

/// Ordered stack of enclosing scope frames for one in-progress traversal.
///
/// Owned exclusively by one analyzer pass over one file; never shared.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeKind>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame on entering a scope-opening construct.
    pub fn enter(&mut self, kind: ScopeKind) {
        self.frames.push(kind);
    }

    /// Pop the frame pushed for `kind`. Underflow or a kind mismatch is an
    /// invariant violation in the traversal itself, not a user input
    /// problem, so it fails loudly.
    pub fn exit(&mut self, kind: ScopeKind) {
        let popped = self
            .frames
            .pop()
            .unwrap_or_else(|| panic!("scope stack underflow while exiting {:?}", kind));
        assert_eq!(
            popped, kind,
            "scope stack mismatch: exited {:?} but top was {:?}",
            kind, popped
        );
    }

    /// Whether any frame of `kind` is on the stack.
    pub fn contains(&self, kind: ScopeKind) -> bool {
        self.frames.iter().rev().any(|&f| f == kind)
    }

    /// Scanning from the top, the first frame whose kind is in `kinds`.
    pub fn innermost_of(&self, kinds: &[ScopeKind]) -> Option<ScopeKind> {
        self.frames
            .iter()
            .rev()
            .find(|f| kinds.contains(f))
            .copied()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_exit_balanced() {
        let mut stack = ScopeStack::new();
        stack.enter(ScopeKind::Function);
        stack.enter(ScopeKind::Loop);
        assert!(stack.contains(ScopeKind::Loop));
        assert!(stack.contains(ScopeKind::Function));
        stack.exit(ScopeKind::Loop);
        assert!(!stack.contains(ScopeKind::Loop));
        stack.exit(ScopeKind::Function);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_innermost_of_scans_from_top() {
        let mut stack = ScopeStack::new();
        stack.enter(ScopeKind::Loop);
        stack.enter(ScopeKind::Comprehension);
        assert_eq!(
            stack.innermost_of(&[ScopeKind::Loop, ScopeKind::Comprehension]),
            Some(ScopeKind::Comprehension)
        );
        stack.exit(ScopeKind::Comprehension);
        assert_eq!(
            stack.innermost_of(&[ScopeKind::Loop, ScopeKind::Comprehension]),
            Some(ScopeKind::Loop)
        );
        assert_eq!(stack.innermost_of(&[ScopeKind::Function]), None);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn test_exit_empty_panics() {
        let mut stack = ScopeStack::new();
        stack.exit(ScopeKind::Loop);
    }

    #[test]
    #[should_panic(expected = "mismatch")]
    fn test_exit_wrong_kind_panics() {
        let mut stack = ScopeStack::new();
        stack.enter(ScopeKind::Loop);
        stack.exit(ScopeKind::Conditional);
    }

    #[test]
    fn test_node_kind_mapping() {
        assert_eq!(ScopeKind::of_node("for_statement"), Some(ScopeKind::Loop));
        assert_eq!(ScopeKind::of_node("while_statement"), Some(ScopeKind::Loop));
        assert_eq!(
            ScopeKind::of_node("if_statement"),
            Some(ScopeKind::Conditional)
        );
        assert_eq!(
            ScopeKind::of_node("lambda"),
            Some(ScopeKind::Function)
        );
        assert_eq!(
            ScopeKind::of_node("list_comprehension"),
            Some(ScopeKind::Comprehension)
        );
        assert_eq!(ScopeKind::of_node("call"), None);
    }
}
