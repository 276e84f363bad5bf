//! Tree-sitter parsing for analyzed Python sources.
//!
//! The analyzer assumes a well-formed tree; a file that does not parse
//! cleanly is "not analyzable" and is reported as skipped by the scan,
//! never a crash.

use tree_sitter::{Parser as TsParser, Tree};

/// Parse Python source into a syntax tree.
///
/// Fails if the parser yields no tree or the tree contains syntax errors.
pub fn parse(source: &[u8]) -> anyhow::Result<Tree> {
    let mut parser = TsParser::new();
    parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow::anyhow!("parser produced no tree"))?;
    if tree.root_node().has_error() {
        anyhow::bail!("source contains syntax errors");
    }
    Ok(tree)
}
