//! Recursive-descent TJS parser
//!
//! The parser pulls tokens from a [`TokenStream`] and builds an [`Ast`]
//! bottom-up: a node is allocated once its last token has been consumed, so
//! its range runs from its first token to the last consumed one.
//!
//! Errors never abort the parse. Statement functions resynchronize at a
//! statement boundary and mark their node incomplete; expression functions
//! leave the cursor where the failure happened and let the enclosing
//! statement recover. Grammar productions live in `tjs_parser_expr`,
//! `tjs_parser_stat` and `tjs_parser_decls`.

use diagnostics::tjs::TjsDiagnostics;
use diagnostics::{Diagnostic, Diagnostics};
use log::{debug, trace};
use source_map::{Position, Range};
use std::collections::HashSet;

use crate::ast::{Ast, ExprKind, NodeId, NodeKind, StatKind};
use crate::lexer::{Lexer, LexerMode, TokenStream};
use crate::token::{Token, TokenKind};

/// Statement boundaries
pub(crate) const STAT_END: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::LeftBrace,
    TokenKind::RightBrace,
];

/// Recovery inside `( ... )` heads
pub(crate) const RPAREN_EXPECTED: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::LeftBrace,
    TokenKind::RightBrace,
    TokenKind::RightParen,
];

/// Recovery between the clauses of a `for` head
pub(crate) const FOR_EXPR: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::LeftBrace,
    TokenKind::RightBrace,
    TokenKind::RightParen,
];

/// Recovery inside parameter and declaration lists
pub(crate) const PARAM: &[TokenKind] = &[
    TokenKind::Comma,
    TokenKind::RightParen,
    TokenKind::Semicolon,
    TokenKind::LeftBrace,
    TokenKind::RightBrace,
];

/// Deepest statement and expression nesting the parser descends into
pub(crate) const MAX_NESTING: usize = 200;

/// Result of parsing one chunk
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub ast: Ast,
    /// Global block holding the top-level statements
    pub root: NodeId,
    pub diagnostics: Diagnostics,
    /// Every consumed token in source order, `Eof` excluded
    pub tokens: Vec<Token>,
    /// Innermost node that consumed each token
    pub token_owners: Vec<Option<NodeId>>,
}

/// Parse an already preprocessed chunk
pub fn parse_chunk(chunk_name: &str, chunk: &str) -> ParseOutput {
    Parser::new(Lexer::new(chunk_name, chunk)).parse()
}

pub struct Parser<L: TokenStream> {
    lexer: L,
    pub(crate) ast: Ast,
    diagnostics: Diagnostics,
    pub(crate) tokens: Vec<Token>,
    token_owners: Vec<Option<NodeId>>,
    /// Start positions that already carry a diagnostic
    reported_at: HashSet<Position>,
    depth: usize,
    too_deep: bool,
}

impl<L: TokenStream> Parser<L> {
    pub fn new(lexer: L) -> Self {
        Self {
            lexer,
            ast: Ast::new(),
            diagnostics: Diagnostics::new(),
            tokens: Vec::new(),
            token_owners: Vec::new(),
            reported_at: HashSet::new(),
            depth: 0,
            too_deep: false,
        }
    }

    /// Parse the whole stream into a global block
    pub fn parse(mut self) -> ParseOutput {
        debug!("{}: parse start", self.lexer.chunk_name());
        let mut stats = Vec::new();
        let mut completed = true;
        loop {
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::RightBrace => {
                    let index = self.bump();
                    self.report(TjsDiagnostics::unexpected_token(self.tokens[index].range, "}"));
                    completed = false;
                }
                _ => {
                    let stat = self.statement();
                    completed &= self.ast.is_completed(stat);
                    stats.push(stat);
                }
            }
        }

        let root = self.finish_stat(
            0,
            StatKind::Block {
                stats,
                is_global: true,
            },
            completed,
        );

        debug!(
            "{}: parse done, {} tokens, {} nodes, {} diagnostics",
            self.lexer.chunk_name(),
            self.tokens.len(),
            self.ast.len(),
            self.diagnostics.len()
        );
        ParseOutput {
            ast: self.ast,
            root,
            diagnostics: self.diagnostics,
            tokens: self.tokens,
            token_owners: self.token_owners,
        }
    }

    // Token access

    pub(crate) fn peek(&mut self) -> TokenKind {
        self.lexer.look_ahead_kind(LexerMode::Normal)
    }

    pub(crate) fn peek_in(&mut self, mode: LexerMode) -> TokenKind {
        self.lexer.look_ahead_kind(mode)
    }

    pub(crate) fn peek_range(&mut self) -> Range {
        self.lexer.look_ahead_range(LexerMode::Normal)
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    /// Index the next consumed token will get
    pub(crate) fn mark(&self) -> usize {
        self.tokens.len()
    }

    /// Consume one normal-mode token and return its index
    pub(crate) fn bump(&mut self) -> usize {
        self.advance_in(LexerMode::Normal)
    }

    pub(crate) fn advance_in(&mut self, mode: LexerMode) -> usize {
        let token = self.lexer.next_token(mode);
        if token.kind == TokenKind::Unexpected {
            if let Some(cause) = &token.diagnostic {
                self.report_lexical(TjsDiagnostics::lexical(token.range, cause));
            }
        }
        self.push_token(token)
    }

    /// Consume a token without reporting its lexical problem
    pub(crate) fn bump_quiet(&mut self) -> usize {
        let token = self.lexer.next_token(LexerMode::Normal);
        self.push_token(token)
    }

    fn push_token(&mut self, token: Token) -> usize {
        self.tokens.push(token);
        self.token_owners.push(None);
        self.tokens.len() - 1
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<usize> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    /// Consume `kind` or report it as expected
    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind).is_some() {
            return true;
        }
        let range = self.peek_range();
        self.report(TjsDiagnostics::expected_token(range, kind.describe()));
        false
    }

    pub(crate) fn token_text(&self, index: usize) -> &str {
        &self.tokens[index].text
    }

    /// Consume tokens until a stop kind at brace depth zero. An unmatched
    /// `}` and end of file always stop.
    pub(crate) fn skip_until(&mut self, stops: &[TokenKind]) {
        let from = self.mark();
        let mut depth = 0usize;
        loop {
            let kind = self.peek();
            match kind {
                TokenKind::Eof => break,
                TokenKind::RightBrace if depth == 0 => break,
                TokenKind::RightBrace => depth -= 1,
                _ if depth == 0 && stops.contains(&kind) => break,
                TokenKind::LeftBrace => depth += 1,
                _ => {}
            }
            self.bump();
        }
        if self.mark() > from {
            let resume = self.peek_range().start;
            trace!(
                "{}: recovery skipped {} tokens, resuming at {}",
                self.lexer.chunk_name(),
                self.mark() - from,
                resume
            );
        }
    }

    /// Consume a `{ ... }` group through its matching `}` without building
    /// nodes; the tokens go to whichever node finishes around them
    pub(crate) fn skip_braced(&mut self) {
        if self.eat(TokenKind::LeftBrace).is_none() {
            return;
        }
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                TokenKind::Eof => return,
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => depth -= 1,
                _ => {}
            }
            self.bump();
        }
    }

    /// Run one nesting level of the grammar, or give up once the nesting
    /// limit is reached. The limit is reported once per chunk.
    pub(crate) fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.depth >= MAX_NESTING {
            if !self.too_deep {
                self.too_deep = true;
                let range = self.peek_range();
                debug!("{}: nesting limit reached at {}", self.lexer.chunk_name(), range.start);
                self.report(TjsDiagnostics::nesting_too_deep(range));
            }
            return None;
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // Diagnostics

    /// Record a syntax error. Only the first one at a position is kept;
    /// later ones there are knock-on effects of the same problem.
    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        if self.reported_at.insert(diagnostic.range.start) {
            self.diagnostics.push(diagnostic);
        }
    }

    /// Record the problem an unexpected token carries; it stands beside any
    /// syntax error at the same place
    fn report_lexical(&mut self, diagnostic: Diagnostic) {
        let repeated = self.diagnostics.iter().last().is_some_and(|last| {
            last.range == diagnostic.range && last.message == diagnostic.message
        });
        if !repeated {
            self.reported_at.insert(diagnostic.range.start);
            self.diagnostics.push(diagnostic);
        }
    }

    // Node construction

    /// Allocate a node spanning the tokens consumed since `start`
    pub(crate) fn finish(&mut self, start: usize, kind: NodeKind, completed: bool) -> NodeId {
        let end = self.tokens.len();
        let range = if start < end {
            Range::new(self.tokens[start].range.start, self.tokens[end - 1].range.end)
        } else {
            Range::empty(self.peek_range().start)
        };
        let id = self.ast.alloc(kind, range, start..end, completed);
        for owner in &mut self.token_owners[start..end] {
            owner.get_or_insert(id);
        }
        id
    }

    pub(crate) fn finish_expr(&mut self, start: usize, kind: ExprKind, completed: bool) -> NodeId {
        self.finish(start, NodeKind::Expr(kind), completed)
    }

    pub(crate) fn finish_stat(&mut self, start: usize, kind: StatKind, completed: bool) -> NodeId {
        self.finish(start, NodeKind::Stat(kind), completed)
    }

    /// Present and complete
    pub(crate) fn complete(&self, id: Option<NodeId>) -> bool {
        id.is_some_and(|id| self.ast.is_completed(id))
    }

    /// Absent, or present and complete
    pub(crate) fn complete_if_present(&self, id: Option<NodeId>) -> bool {
        id.is_none_or(|id| self.ast.is_completed(id))
    }

    pub(crate) fn all_complete(&self, ids: &[NodeId]) -> bool {
        ids.iter().all(|id| self.ast.is_completed(*id))
    }

    /// `name` as an identifier expression, or a diagnostic
    pub(crate) fn identifier(&mut self) -> Option<NodeId> {
        if !self.at(TokenKind::Identifier) {
            let range = self.peek_range();
            self.report(TjsDiagnostics::expected_token(range, TokenKind::Identifier.describe()));
            return None;
        }
        let start = self.bump();
        let name = self.token_text(start).to_string();
        Some(self.finish_expr(start, ExprKind::Identifier { name }, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_until_respects_braces() {
        let mut parser = Parser::new(Lexer::new("test", "a { b; c } ; d"));
        parser.skip_until(STAT_END);
        assert_eq!(parser.peek(), TokenKind::LeftBrace);

        let mut parser = Parser::new(Lexer::new("test", "a ( { b; } ) ; d"));
        parser.skip_until(&[TokenKind::Semicolon]);
        assert_eq!(parser.peek(), TokenKind::Semicolon);
        assert_eq!(parser.mark(), 7);

        let mut parser = Parser::new(Lexer::new("test", "a b } c"));
        parser.skip_until(&[TokenKind::Semicolon]);
        assert_eq!(parser.peek(), TokenKind::RightBrace);
    }

    #[test]
    fn test_first_diagnostic_at_a_position_wins() {
        let mut parser = Parser::new(Lexer::new("test", "x y"));
        assert!(!parser.expect(TokenKind::Semicolon));
        assert!(!parser.expect(TokenKind::Semicolon));
        assert!(!parser.expect(TokenKind::Colon));
        assert_eq!(parser.diagnostics.len(), 1);

        parser.bump();
        assert!(!parser.expect(TokenKind::Colon));
        assert_eq!(parser.diagnostics.len(), 2);
    }

    #[test]
    fn test_skip_braced_consumes_the_group() {
        let mut parser = Parser::new(Lexer::new("test", "{ a { b; } c } d"));
        parser.skip_braced();
        assert_eq!(parser.mark(), 8);
        assert_eq!(parser.peek(), TokenKind::Identifier);

        let mut parser = Parser::new(Lexer::new("test", "{ a {"));
        parser.skip_braced();
        assert_eq!(parser.peek(), TokenKind::Eof);
    }

    #[test]
    fn test_nesting_limit_reports_once() {
        let mut parser = Parser::new(Lexer::new("test", "x"));
        parser.depth = MAX_NESTING;
        assert_eq!(parser.nested(|p| Some(p.bump())), None);
        assert_eq!(parser.nested(|p| Some(p.bump())), None);
        assert_eq!(parser.mark(), 0);
        assert_eq!(parser.diagnostics.len(), 1);
        assert_eq!(parser.depth, MAX_NESTING);
    }

    #[test]
    fn test_token_owners_cover_everything() {
        let output = parse_chunk("test", "var a = 1; } b;");
        assert_eq!(output.tokens.len(), output.token_owners.len());
        assert!(output.token_owners.iter().all(Option::is_some));
        assert_eq!(output.diagnostics.len(), 1);
        assert!(!output.ast.is_completed(output.root));
    }
}
