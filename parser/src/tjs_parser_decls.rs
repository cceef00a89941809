//! Declarations: functions, properties, classes and variables

use diagnostics::tjs::TjsDiagnostics;

use crate::ast::{ExprKind, NodeId, ParamType, StatKind};
use crate::lexer::TokenStream;
use crate::tjs_parser::{Parser, PARAM, STAT_END};
use crate::token::TokenKind;

impl<L: TokenStream> Parser<L> {
    /// `function name(params) { body }`; the name and the parameter list
    /// are both optional
    pub(crate) fn function_stat(&mut self) -> NodeId {
        let start = self.bump();
        let name = if self.at(TokenKind::Identifier) {
            self.identifier()
        } else {
            None
        };
        let (params, params_ok) = if self.at(TokenKind::LeftParen) {
            self.function_params()
        } else {
            (Vec::new(), true)
        };
        let body = self.function_body();
        let completed = params_ok && self.complete(body);
        self.finish_stat(start, StatKind::Function { name, params, body }, completed)
    }

    /// A `{ ... }` body, or a diagnostic when the brace is missing
    pub(crate) fn function_body(&mut self) -> Option<NodeId> {
        if self.at(TokenKind::LeftBrace) {
            return Some(self.block_stat());
        }
        let range = self.peek_range();
        self.report(TjsDiagnostics::expected_token(range, "{"));
        self.skip_until(STAT_END);
        if self.at(TokenKind::LeftBrace) {
            return Some(self.block_stat());
        }
        self.eat(TokenKind::Semicolon);
        None
    }

    /// `( a, b = 1, rest* )`; the cursor stands on `(`
    pub(crate) fn function_params(&mut self) -> (Vec<NodeId>, bool) {
        self.bump();
        let mut params = Vec::new();
        let mut completed = true;
        if self.eat(TokenKind::RightParen).is_some() {
            return (params, completed);
        }
        loop {
            let param = self.function_param();
            completed &= self.ast.is_completed(param);
            params.push(param);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        if !self.expect(TokenKind::RightParen) {
            self.skip_until(&[TokenKind::RightParen, TokenKind::LeftBrace, TokenKind::Semicolon]);
            self.eat(TokenKind::RightParen);
            completed = false;
        }

        // one report per list, at the first variadic that is not last
        if let Some((_, leading)) = params.split_last() {
            let misplaced = leading
                .iter()
                .find(|id| self.param_type(**id).is_some_and(ParamType::is_variadic));
            if let Some(id) = misplaced {
                let range = self.ast.node(*id).range;
                self.report(TjsDiagnostics::variadic_not_last(range));
            }
        }
        (params, completed)
    }

    fn param_type(&self, id: NodeId) -> Option<ParamType> {
        match self.ast.node(id).as_expr() {
            Some(ExprKind::FunctionParameter { param_type, .. }) => Some(*param_type),
            _ => None,
        }
    }

    /// `name`, `name = init`, `name*`, `*` or `...`
    fn function_param(&mut self) -> NodeId {
        let start = self.mark();
        let mut completed = true;
        let (mut param_type, name) = match self.peek() {
            TokenKind::Star | TokenKind::Ellipsis => {
                self.bump();
                (ParamType::UnnamedArgs, None)
            }
            TokenKind::Identifier => {
                let index = self.bump();
                let name = self.token_text(index).to_string();
                if self.eat(TokenKind::Star).is_some() {
                    (ParamType::NamedArgs, Some(name))
                } else {
                    (ParamType::Normal, Some(name))
                }
            }
            _ => {
                let range = self.peek_range();
                self.report(TjsDiagnostics::expected_token(
                    range,
                    TokenKind::Identifier.describe(),
                ));
                self.skip_until(PARAM);
                completed = false;
                (ParamType::Normal, None)
            }
        };

        let mut init = None;
        if completed {
            if let Some(assign) = self.eat(TokenKind::Assign) {
                init = self.assignment_expr();
                completed &= self.complete(init);
                if param_type.is_variadic() {
                    let mut range = self.tokens[assign].range;
                    if let Some(init) = init {
                        range = range.merge(self.ast.node(init).range);
                    }
                    self.report(TjsDiagnostics::variadic_with_default(range));
                } else {
                    param_type = ParamType::WithInitializer;
                }
            }
        }
        self.finish_expr(
            start,
            ExprKind::FunctionParameter {
                param_type,
                name,
                init,
            },
            completed,
        )
    }

    /// `property name { getter() { } setter(value) { } }`
    pub(crate) fn property_stat(&mut self) -> NodeId {
        let start = self.bump();
        let name = self.identifier();
        let mut completed = name.is_some();
        let mut getter = None;
        let mut setter = None;

        if self.expect(TokenKind::LeftBrace) {
            loop {
                let before = self.mark();
                match self.peek() {
                    TokenKind::RightBrace | TokenKind::Eof => break,
                    TokenKind::Getter => {
                        let node = self.property_getter();
                        completed &= self.ast.is_completed(node);
                        getter = Some(node);
                    }
                    TokenKind::Setter => {
                        let node = self.property_setter();
                        completed &= self.ast.is_completed(node);
                        setter = Some(node);
                    }
                    TokenKind::Semicolon => {
                        self.bump();
                    }
                    _ => {
                        let range = self.peek_range();
                        let found = self.peek().describe();
                        self.report(TjsDiagnostics::unexpected_token(range, found));
                        self.skip_until(STAT_END);
                        self.skip_braced();
                        completed = false;
                    }
                }
                if self.mark() == before && !matches!(self.peek(), TokenKind::RightBrace | TokenKind::Eof) {
                    self.bump();
                }
            }
            completed &= self.expect(TokenKind::RightBrace);
        } else {
            self.skip_until(STAT_END);
            completed = false;
        }
        self.finish_stat(
            start,
            StatKind::Property {
                name,
                getter,
                setter,
            },
            completed,
        )
    }

    /// `getter { }` or `getter() { }`
    fn property_getter(&mut self) -> NodeId {
        let start = self.bump();
        let mut completed = true;
        if self.eat(TokenKind::LeftParen).is_some() {
            completed &= self.expect(TokenKind::RightParen);
        }
        let body = self.function_body();
        completed &= self.complete(body);
        self.finish_stat(start, StatKind::PropertyGetter { body }, completed)
    }

    /// `setter(value) { }`
    fn property_setter(&mut self) -> NodeId {
        let start = self.bump();
        let mut param = None;
        let mut completed = self.expect(TokenKind::LeftParen);
        if completed {
            let node = self.function_param();
            completed &= self.ast.is_completed(node);
            param = Some(node);
            if !self.expect(TokenKind::RightParen) {
                self.skip_until(PARAM);
                self.eat(TokenKind::RightParen);
                completed = false;
            }
        }
        let body = self.function_body();
        completed &= self.complete(body);
        self.finish_stat(start, StatKind::PropertySetter { param, body }, completed)
    }

    /// `class Name extends A, B { members }`
    pub(crate) fn class_stat(&mut self) -> NodeId {
        let start = self.bump();
        let name = self.identifier();
        let mut completed = name.is_some();

        let mut extends = Vec::new();
        if self.eat(TokenKind::Extends).is_some() {
            loop {
                match self.assignment_expr() {
                    Some(base) => extends.push(base),
                    None => {
                        completed = false;
                        break;
                    }
                }
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            completed &= self.all_complete(&extends);
        }

        let mut members = Vec::new();
        if self.at(TokenKind::LeftBrace) {
            self.bump();
            loop {
                let before = self.mark();
                match self.peek() {
                    TokenKind::RightBrace | TokenKind::Eof => break,
                    TokenKind::Var | TokenKind::Const => members.push(self.var_stat()),
                    TokenKind::Function => members.push(self.function_stat()),
                    TokenKind::Property => members.push(self.property_stat()),
                    TokenKind::Class => members.push(self.class_stat()),
                    TokenKind::Semicolon => {
                        let index = self.bump();
                        members.push(self.finish_stat(index, StatKind::Empty, true));
                    }
                    _ => {
                        let range = self.peek_range();
                        let found = self.peek().describe();
                        self.report(TjsDiagnostics::unexpected_token(range, found));
                        self.skip_until(STAT_END);
                        self.skip_braced();
                        self.eat(TokenKind::Semicolon);
                        completed = false;
                    }
                }
                if self.mark() == before && !matches!(self.peek(), TokenKind::RightBrace | TokenKind::Eof) {
                    self.bump();
                }
            }
            completed &= self.expect(TokenKind::RightBrace);
        } else {
            let range = self.peek_range();
            self.report(TjsDiagnostics::expected_token(range, "{"));
            self.skip_until(STAT_END);
            self.eat(TokenKind::Semicolon);
            completed = false;
        }
        completed &= self.all_complete(&members);
        self.finish_stat(
            start,
            StatKind::Class {
                name,
                extends,
                members,
            },
            completed,
        )
    }

    /// `var a = 1, b;`
    pub(crate) fn var_stat(&mut self) -> NodeId {
        self.var_decl(true)
    }

    /// `var`/`const` declaration list; `terminated` consumes the `;`
    pub(crate) fn var_decl(&mut self, terminated: bool) -> NodeId {
        let start = self.bump();
        let is_const = self.tokens[start].kind == TokenKind::Const;
        let mut entries = Vec::new();
        let mut completed = true;
        loop {
            let entry_start = self.mark();
            let name = self.identifier();
            let mut entry_ok = name.is_some();
            let mut initializer = None;
            if entry_ok {
                if self.eat(TokenKind::Assign).is_some() {
                    initializer = self.assignment_expr();
                    entry_ok &= self.complete(initializer);
                }
            } else {
                self.skip_until(PARAM);
            }
            let entry = self.finish_stat(entry_start, StatKind::VarEntry { name, initializer }, entry_ok);
            completed &= entry_ok;
            entries.push(entry);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        if terminated {
            completed &= self.end_statement();
        }
        self.finish_stat(start, StatKind::Var { entries, is_const }, completed)
    }
}
