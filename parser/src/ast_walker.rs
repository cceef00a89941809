//! Position index over parsed documents
//!
//! Keeps the latest parse of every open document and answers "which token /
//! node is under this position" queries for editor features.

use log::debug;
use source_map::{binary_search_position, Position, Range};
use std::collections::HashMap;

use crate::ast::{Ast, NodeId};
use crate::tjs_parser::ParseOutput;
use crate::token::Token;

#[derive(Debug, Clone)]
pub struct WalkerEntry {
    pub tokens: Vec<Token>,
    pub ast: Ast,
    pub root: NodeId,
    pub owners: Vec<Option<NodeId>>,
}

impl From<ParseOutput> for WalkerEntry {
    fn from(output: ParseOutput) -> Self {
        Self {
            tokens: output.tokens,
            ast: output.ast,
            root: output.root,
            owners: output.token_owners,
        }
    }
}

#[derive(Debug, Default)]
pub struct AstWalker {
    entries: HashMap<String, WalkerEntry>,
}

impl AstWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored parse of `name`
    pub fn update_entry(&mut self, name: impl Into<String>, output: ParseOutput) {
        let name = name.into();
        debug!("ast walker: updating '{}' ({} tokens)", name, output.tokens.len());
        self.entries.insert(name, WalkerEntry::from(output));
    }

    pub fn remove_entry(&mut self, name: &str) -> Option<WalkerEntry> {
        self.entries.remove(name)
    }

    pub fn entry(&self, name: &str) -> Option<&WalkerEntry> {
        self.entries.get(name)
    }

    /// Index and token under `pos`
    pub fn query_token(&self, name: &str, pos: Position) -> Option<(usize, &Token)> {
        let entry = self.entries.get(name)?;
        let index = binary_search_position(entry.tokens.len(), |i| entry.tokens[i].range, pos)?;
        Some((index, &entry.tokens[index]))
    }

    /// Owner of the token followed by its ancestors, innermost first
    pub fn walk_ast(&self, name: &str, token_index: usize) -> Vec<NodeId> {
        let Some(entry) = self.entries.get(name) else {
            return Vec::new();
        };
        let Some(owner) = entry.owners.get(token_index).copied().flatten() else {
            return Vec::new();
        };
        std::iter::once(owner).chain(entry.ast.ancestors(owner)).collect()
    }

    /// Innermost node whose range contains `pos`
    pub fn node_at(&self, name: &str, pos: Position) -> Option<NodeId> {
        let entry = self.entries.get(name)?;
        entry.ast.node_at(entry.root, pos)
    }

    /// Whether `pos` lies in one of the sorted disabled `ranges`
    pub fn is_inactive(ranges: &[Range], pos: Position) -> bool {
        binary_search_position(ranges.len(), |i| ranges[i], pos).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, NodeKind, StatKind};
    use crate::tjs_parser::parse_chunk;

    fn walker(source: &str) -> AstWalker {
        let mut walker = AstWalker::new();
        walker.update_entry("a.tjs", parse_chunk("a.tjs", source));
        walker
    }

    #[test]
    fn test_query_token() {
        let walker = walker("var x = foo(1);");
        let (index, token) = walker.query_token("a.tjs", Position::new(0, 9)).unwrap();
        assert_eq!(index, 3);
        assert_eq!(token.text, "foo");
        assert!(walker.query_token("a.tjs", Position::new(0, 3)).is_none());
        assert!(walker.query_token("b.tjs", Position::new(0, 0)).is_none());
    }

    #[test]
    fn test_walk_ast_reaches_root() {
        let walker = walker("if (a) { b = c + 1; }");
        let (index, _) = walker.query_token("a.tjs", Position::new(0, 13)).unwrap();
        let entry = walker.entry("a.tjs").unwrap();
        let names: Vec<_> = walker
            .walk_ast("a.tjs", index)
            .into_iter()
            .map(|id| entry.ast.node(id).kind.name())
            .collect();
        assert_eq!(
            names,
            vec!["Identifier", "Binary", "Assign", "ExprStat", "Block", "If", "Block"]
        );
        assert!(walker.walk_ast("a.tjs", 999).is_empty());
    }

    #[test]
    fn test_node_at() {
        let walker = walker("a = 1;\nfunction f() { return b; }");
        let entry = walker.entry("a.tjs").unwrap();
        let id = walker.node_at("a.tjs", Position::new(1, 22)).unwrap();
        assert!(matches!(
            entry.ast.node(id).kind,
            NodeKind::Expr(ExprKind::Identifier { ref name }) if name == "b"
        ));
        let id = walker.node_at("a.tjs", Position::new(1, 14)).unwrap();
        assert!(matches!(
            entry.ast.node(id).kind,
            NodeKind::Stat(StatKind::Block { is_global: false, .. })
        ));
    }

    #[test]
    fn test_is_inactive() {
        let ranges = [
            Range::new(Position::new(1, 0), Position::new(3, 0)),
            Range::new(Position::new(5, 4), Position::new(5, 9)),
        ];
        assert!(AstWalker::is_inactive(&ranges, Position::new(2, 7)));
        assert!(AstWalker::is_inactive(&ranges, Position::new(5, 4)));
        assert!(!AstWalker::is_inactive(&ranges, Position::new(5, 9)));
        assert!(!AstWalker::is_inactive(&ranges, Position::new(0, 0)));
        assert!(!AstWalker::is_inactive(&[], Position::new(0, 0)));
    }
}
