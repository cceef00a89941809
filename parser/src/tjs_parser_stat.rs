//! Statement grammar
//!
//! Every statement function returns with the stream at or past a statement
//! boundary, and each call consumes at least one token unless it stands at
//! `}` or end of file.

use diagnostics::tjs::TjsDiagnostics;

use crate::ast::{NodeId, StatKind};
use crate::lexer::TokenStream;
use crate::tjs_parser::{Parser, FOR_EXPR, RPAREN_EXPECTED, STAT_END};
use crate::token::TokenKind;

impl<L: TokenStream> Parser<L> {
    pub(crate) fn statement(&mut self) -> NodeId {
        match self.nested(|parser| Some(parser.dispatch_statement())) {
            Some(stat) => stat,
            None => self.too_deep_statement(),
        }
    }

    fn dispatch_statement(&mut self) -> NodeId {
        match self.peek() {
            TokenKind::LeftBrace => self.block_stat(),
            TokenKind::Semicolon => {
                let start = self.bump();
                self.finish_stat(start, StatKind::Empty, true)
            }
            TokenKind::If => self.if_stat(),
            TokenKind::While => self.while_stat(),
            TokenKind::Do => self.do_stat(),
            TokenKind::For => self.for_stat(),
            TokenKind::With => self.with_stat(),
            TokenKind::Switch => self.switch_stat(),
            TokenKind::Try => self.try_stat(),
            TokenKind::Throw => self.throw_stat(),
            TokenKind::Return => self.return_stat(),
            TokenKind::Break => self.jump_stat(StatKind::Break),
            TokenKind::Continue => self.jump_stat(StatKind::Continue),
            TokenKind::Function => self.function_stat(),
            TokenKind::Property => self.property_stat(),
            TokenKind::Class => self.class_stat(),
            TokenKind::Var | TokenKind::Const => self.var_stat(),
            _ => self.expr_stat(),
        }
    }

    /// Past the nesting limit the rest of the statement is skipped whole,
    /// braces included
    fn too_deep_statement(&mut self) -> NodeId {
        let start = self.mark();
        self.skip_until(&[TokenKind::Semicolon]);
        self.eat(TokenKind::Semicolon);
        self.finish_stat(start, StatKind::Expr { expr: None }, false)
    }

    /// `{ stats }`
    pub(crate) fn block_stat(&mut self) -> NodeId {
        let start = self.mark();
        let opened = self.expect(TokenKind::LeftBrace);
        let mut stats = Vec::new();
        while !matches!(self.peek(), TokenKind::RightBrace | TokenKind::Eof) {
            stats.push(self.statement());
        }
        let closed = self.expect(TokenKind::RightBrace);
        let completed = opened && closed && self.all_complete(&stats);
        self.finish_stat(
            start,
            StatKind::Block {
                stats,
                is_global: false,
            },
            completed,
        )
    }

    /// Consume the terminating `;`, recovering to the next boundary if absent
    pub(crate) fn end_statement(&mut self) -> bool {
        if self.eat(TokenKind::Semicolon).is_some() {
            return true;
        }
        let range = self.peek_range();
        self.report(TjsDiagnostics::expected_token(range, ";"));
        self.skip_until(STAT_END);
        self.eat(TokenKind::Semicolon);
        false
    }

    /// `( expression )` heads of `if`, `while`, `with` and `switch`
    fn paren_head(&mut self) -> (Option<NodeId>, bool) {
        let opened = self.expect(TokenKind::LeftParen);
        let pred = self.expression();
        let mut ok = opened && self.complete(pred);
        if self.eat(TokenKind::RightParen).is_none() {
            if pred.is_some() {
                let range = self.peek_range();
                self.report(TjsDiagnostics::expected_token(range, ")"));
            }
            self.skip_until(RPAREN_EXPECTED);
            self.eat(TokenKind::RightParen);
            ok = false;
        }
        (pred, ok)
    }

    fn expr_stat(&mut self) -> NodeId {
        let start = self.mark();
        let expr = self.expression();
        let completed = match expr {
            Some(expr) => {
                let terminated = self.end_statement();
                terminated && self.ast.is_completed(expr)
            }
            None => {
                self.skip_until(STAT_END);
                self.eat(TokenKind::Semicolon);
                false
            }
        };
        if self.mark() == start && !matches!(self.peek(), TokenKind::Eof | TokenKind::RightBrace) {
            self.bump();
        }
        self.finish_stat(start, StatKind::Expr { expr }, completed)
    }

    /// `if (pred) stat else stat`
    fn if_stat(&mut self) -> NodeId {
        let start = self.bump();
        let (pred, head_ok) = self.paren_head();
        let true_stat = self.statement();
        let false_stat = match self.eat(TokenKind::Else) {
            Some(_) => Some(self.statement()),
            None => None,
        };
        let completed = head_ok
            && self.ast.is_completed(true_stat)
            && self.complete_if_present(false_stat);
        self.finish_stat(
            start,
            StatKind::If {
                pred,
                true_stat: Some(true_stat),
                false_stat,
            },
            completed,
        )
    }

    /// `while (pred) body`
    fn while_stat(&mut self) -> NodeId {
        let start = self.bump();
        let (pred, head_ok) = self.paren_head();
        let body = self.statement();
        let completed = head_ok && self.ast.is_completed(body);
        self.finish_stat(
            start,
            StatKind::While {
                pred,
                body: Some(body),
            },
            completed,
        )
    }

    /// `do body while (pred);`
    fn do_stat(&mut self) -> NodeId {
        let start = self.bump();
        let body = self.statement();
        let mut pred = None;
        let mut completed = self.ast.is_completed(body);
        if self.expect(TokenKind::While) {
            let (head, head_ok) = self.paren_head();
            pred = head;
            let terminated = self.end_statement();
            completed &= head_ok && terminated;
        } else {
            self.skip_until(STAT_END);
            self.eat(TokenKind::Semicolon);
            completed = false;
        }
        self.finish_stat(
            start,
            StatKind::Do {
                body: Some(body),
                pred,
            },
            completed,
        )
    }

    /// `for (init; pred; step) body`
    fn for_stat(&mut self) -> NodeId {
        let start = self.bump();
        let mut completed = self.expect(TokenKind::LeftParen);

        let init = match self.peek() {
            TokenKind::Semicolon => None,
            TokenKind::Var | TokenKind::Const => Some(self.var_decl(false)),
            _ => self.expression(),
        };
        let init_ok = self.for_clause_end(TokenKind::Semicolon) && self.complete_if_present(init);
        completed &= init_ok;
        if !init_ok && self.at(TokenKind::Eof) {
            return self.finish_stat(
                start,
                StatKind::For {
                    init,
                    pred: None,
                    step: None,
                    body: None,
                },
                false,
            );
        }

        let pred = if self.at(TokenKind::Semicolon) {
            None
        } else {
            self.expression()
        };
        completed &= self.for_clause_end(TokenKind::Semicolon) && self.complete_if_present(pred);

        let step = if self.at(TokenKind::RightParen) {
            None
        } else {
            self.expression()
        };
        completed &= self.for_clause_end(TokenKind::RightParen) && self.complete_if_present(step);

        let body = self.statement();
        completed &= self.ast.is_completed(body);
        self.finish_stat(
            start,
            StatKind::For {
                init,
                pred,
                step,
                body: Some(body),
            },
            completed,
        )
    }

    fn for_clause_end(&mut self, terminator: TokenKind) -> bool {
        if self.eat(terminator).is_some() {
            return true;
        }
        let range = self.peek_range();
        self.report(TjsDiagnostics::expected_token(range, terminator.describe()));
        self.skip_until(FOR_EXPR);
        self.eat(terminator);
        false
    }

    /// `with (expr) body`
    fn with_stat(&mut self) -> NodeId {
        let start = self.bump();
        let (expr, head_ok) = self.paren_head();
        let body = self.statement();
        let completed = head_ok && self.ast.is_completed(body);
        self.finish_stat(
            start,
            StatKind::With {
                expr,
                body: Some(body),
            },
            completed,
        )
    }

    /// `switch (expr) { case a: ... default: ... }`
    fn switch_stat(&mut self) -> NodeId {
        let start = self.bump();
        let (expr, head_ok) = self.paren_head();
        let mut cases = Vec::new();
        let mut completed = head_ok;
        if self.expect(TokenKind::LeftBrace) {
            loop {
                match self.peek() {
                    TokenKind::RightBrace | TokenKind::Eof => break,
                    TokenKind::Case | TokenKind::Default => cases.push(self.case_clause()),
                    _ => {
                        let range = self.peek_range();
                        self.report(TjsDiagnostics::expected_token(range, "case"));
                        cases.push(self.statement());
                        completed = false;
                    }
                }
            }
            completed &= self.expect(TokenKind::RightBrace);
        } else {
            completed = false;
        }
        completed &= self.all_complete(&cases);
        self.finish_stat(start, StatKind::Switch { expr, cases }, completed)
    }

    fn case_clause(&mut self) -> NodeId {
        let start = self.bump();
        let is_default = self.tokens[start].kind == TokenKind::Default;
        let pred = if is_default { None } else { self.expression() };
        let colon = self.expect(TokenKind::Colon);
        let mut completed = colon && (is_default || self.complete(pred));
        let mut stats = Vec::new();
        while !matches!(
            self.peek(),
            TokenKind::Case | TokenKind::Default | TokenKind::RightBrace | TokenKind::Eof
        ) {
            stats.push(self.statement());
        }
        completed &= self.all_complete(&stats);
        self.finish_stat(
            start,
            StatKind::Case {
                pred,
                is_default,
                stats,
            },
            completed,
        )
    }

    /// `try { } catch (e) { }`; the catch parameter is optional
    fn try_stat(&mut self) -> NodeId {
        let start = self.bump();
        let try_block = self.function_body();
        let mut completed = self.complete(try_block);
        let mut catch_param = None;
        let mut catch_block = None;
        if self.expect(TokenKind::Catch) {
            if self.eat(TokenKind::LeftParen).is_some() {
                if !self.at(TokenKind::RightParen) {
                    catch_param = self.identifier();
                    completed &= catch_param.is_some();
                }
                if !self.expect(TokenKind::RightParen) {
                    self.skip_until(RPAREN_EXPECTED);
                    self.eat(TokenKind::RightParen);
                    completed = false;
                }
            }
            catch_block = self.function_body();
            completed &= self.complete(catch_block);
        } else {
            completed = false;
        }
        self.finish_stat(
            start,
            StatKind::Try {
                try_block,
                catch_param,
                catch_block,
            },
            completed,
        )
    }

    fn throw_stat(&mut self) -> NodeId {
        let start = self.bump();
        let expr = self.expression();
        let completed = match expr {
            Some(expr) => {
                let terminated = self.end_statement();
                terminated && self.ast.is_completed(expr)
            }
            None => {
                self.skip_until(STAT_END);
                self.eat(TokenKind::Semicolon);
                false
            }
        };
        self.finish_stat(start, StatKind::Throw { expr }, completed)
    }

    fn return_stat(&mut self) -> NodeId {
        let start = self.bump();
        let expr = if self.at(TokenKind::Semicolon) {
            None
        } else {
            self.expression()
        };
        let terminated = self.end_statement();
        let completed = terminated && self.complete_if_present(expr);
        self.finish_stat(start, StatKind::Return { expr }, completed)
    }

    /// `break;` and `continue;`
    fn jump_stat(&mut self, kind: StatKind) -> NodeId {
        let start = self.bump();
        let completed = self.end_statement();
        self.finish_stat(start, kind, completed)
    }
}
