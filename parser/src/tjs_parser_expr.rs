//! Expression grammar
//!
//! One function per precedence level, outermost first. Every function
//! returns `None` when no expression starts at the cursor (after reporting
//! it) and never skips tokens to recover.

use diagnostics::tjs::TjsDiagnostics;

use crate::analysis_type::LiteralValue;
use crate::ast::{AssignOp, BinaryOp, ContextKind, ExprKind, NodeId, ParEntryType, UnaryOp};
use crate::lexer::{LexerMode, TokenStream};
use crate::number::parse_number;
use crate::tjs_parser::Parser;
use crate::token::TokenKind;

type Level<L> = fn(&mut Parser<L>) -> Option<NodeId>;

impl<L: TokenStream> Parser<L> {
    /// Parse an expression: `a, b if c`
    pub(crate) fn expression(&mut self) -> Option<NodeId> {
        self.nested(Self::post_if_expr)
    }

    fn post_if_expr(&mut self) -> Option<NodeId> {
        let start = self.mark();
        let expr = self.comma_expr()?;
        if self.eat(TokenKind::If).is_none() {
            return Some(expr);
        }
        let pred = self.comma_expr();
        let completed = self.ast.is_completed(expr) && self.complete(pred);
        Some(self.finish_expr(start, ExprKind::PostIf { expr, pred }, completed))
    }

    fn comma_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(Self::assignment_expr, &[TokenKind::Comma])
    }

    /// Parse assignment expression: `a = b`, `a += b`, `a <-> b`, right associative
    pub(crate) fn assignment_expr(&mut self) -> Option<NodeId> {
        self.nested(Self::assignment_level)
    }

    fn assignment_level(&mut self) -> Option<NodeId> {
        let start = self.mark();
        let target = self.conditional_expr()?;
        let Some(op) = AssignOp::from_token(self.peek()) else {
            return Some(target);
        };
        self.bump();
        let value = self.assignment_expr();
        let completed = self.ast.is_completed(target) && self.complete(value);
        Some(self.finish_expr(start, ExprKind::Assign { op, target, value }, completed))
    }

    /// Parse ternary expression: `cond ? a : b`
    fn conditional_expr(&mut self) -> Option<NodeId> {
        let start = self.mark();
        let pred = self.instanceof_expr()?;
        if self.eat(TokenKind::Question).is_none() {
            return Some(pred);
        }
        let true_branch = self.assignment_expr();
        let mut completed = self.ast.is_completed(pred) && self.complete(true_branch);
        let mut false_branch = None;
        if true_branch.is_some() {
            if self.expect(TokenKind::Colon) {
                false_branch = self.assignment_expr();
            }
            completed &= self.complete(false_branch);
        }
        Some(self.finish_expr(
            start,
            ExprKind::Conditional {
                pred,
                true_branch,
                false_branch,
            },
            completed,
        ))
    }

    fn instanceof_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(
            Self::logical_or_expr,
            &[TokenKind::Instanceof, TokenKind::Incontextof],
        )
    }

    fn logical_or_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(Self::logical_and_expr, &[TokenKind::OrOr])
    }

    fn logical_and_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(Self::bitwise_or_expr, &[TokenKind::AndAnd])
    }

    fn bitwise_or_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(Self::bitwise_xor_expr, &[TokenKind::Pipe])
    }

    fn bitwise_xor_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(Self::bitwise_and_expr, &[TokenKind::Caret])
    }

    fn bitwise_and_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(Self::equality_expr, &[TokenKind::Amp])
    }

    fn equality_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(
            Self::relational_expr,
            &[
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::EqEqEq,
                TokenKind::NotEqEq,
            ],
        )
    }

    fn relational_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(
            Self::shift_expr,
            &[
                TokenKind::Less,
                TokenKind::LessEq,
                TokenKind::Greater,
                TokenKind::GreaterEq,
            ],
        )
    }

    fn shift_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(
            Self::additive_expr,
            &[TokenKind::Shl, TokenKind::Shr, TokenKind::Ushr],
        )
    }

    fn additive_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(Self::multiplicative_expr, &[TokenKind::Plus, TokenKind::Minus])
    }

    fn multiplicative_expr(&mut self) -> Option<NodeId> {
        self.binary_expr(
            Self::unary_expr,
            &[
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Backslash,
                TokenKind::Percent,
            ],
        )
    }

    /// Generic left-associative binary level
    fn binary_expr(&mut self, operand: Level<L>, ops: &[TokenKind]) -> Option<NodeId> {
        let start = self.mark();
        let mut lhs = operand(self)?;
        loop {
            let kind = self.peek();
            let Some(op) = BinaryOp::from_token(kind).filter(|_| ops.contains(&kind)) else {
                break;
            };
            self.bump();
            let rhs = operand(self);
            let completed = self.ast.is_completed(lhs) && self.complete(rhs);
            lhs = self.finish_expr(start, ExprKind::Binary { op, lhs, rhs }, completed);
            if rhs.is_none() {
                break;
            }
        }
        Some(lhs)
    }

    fn unary_expr(&mut self) -> Option<NodeId> {
        let Some(op) = UnaryOp::prefix_from_token(self.peek()) else {
            return self.postfix_expr();
        };
        let start = self.bump();
        let operand = self.nested(Self::unary_expr);
        let completed = self.complete(operand);
        Some(self.finish_expr(
            start,
            ExprKind::Unary {
                op,
                operand,
                is_prefix: true,
            },
            completed,
        ))
    }

    /// Calls, indexing, member access and postfix `++`/`--`
    fn postfix_expr(&mut self) -> Option<NodeId> {
        let start = self.mark();
        let mut expr = self.primary_expr()?;
        loop {
            let base_complete = self.ast.is_completed(expr);
            let (kind, completed) = match self.peek() {
                TokenKind::LeftParen => {
                    self.bump();
                    let args = self.par_list(TokenKind::RightParen, false);
                    let closed = self.expect(TokenKind::RightParen);
                    let completed = closed && self.ast.is_completed(args);
                    (
                        ExprKind::Call {
                            callee: expr,
                            args: Some(args),
                        },
                        completed,
                    )
                }
                TokenKind::LeftBracket => {
                    self.bump();
                    let index = self.expression();
                    let closed = index.is_some() && self.expect(TokenKind::RightBracket);
                    (
                        ExprKind::Index {
                            target: expr,
                            index,
                        },
                        closed && self.complete(index),
                    )
                }
                TokenKind::Dot => {
                    self.bump();
                    let name = self.member_name();
                    let completed = name.is_some();
                    (
                        ExprKind::Member {
                            target: Some(expr),
                            name,
                        },
                        completed,
                    )
                }
                kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                    self.bump();
                    let op = if kind == TokenKind::PlusPlus {
                        UnaryOp::Inc
                    } else {
                        UnaryOp::Dec
                    };
                    (
                        ExprKind::Unary {
                            op,
                            operand: Some(expr),
                            is_prefix: false,
                        },
                        true,
                    )
                }
                _ => break,
            };
            expr = self.finish_expr(start, kind, base_complete && completed);
            if !completed {
                break;
            }
        }
        Some(expr)
    }

    /// Name after `.`; keywords are valid member names
    fn member_name(&mut self) -> Option<String> {
        let kind = self.peek();
        if kind == TokenKind::Identifier || kind.is_keyword() {
            let index = self.bump();
            return Some(self.token_text(index).to_string());
        }
        let range = self.peek_range();
        self.report(TjsDiagnostics::expected_token(range, TokenKind::Identifier.describe()));
        None
    }

    fn primary_expr(&mut self) -> Option<NodeId> {
        let start = self.mark();
        let (kind, completed) = match self.peek() {
            TokenKind::Identifier => {
                let index = self.bump();
                let name = self.token_text(index).to_string();
                (ExprKind::Identifier { name }, true)
            }
            TokenKind::Number => {
                let index = self.bump();
                let value = match parse_number(self.token_text(index)) {
                    Some(number) if number.is_integer() => LiteralValue::Integer(number.to_i64()),
                    Some(number) => LiteralValue::Real(number.value()),
                    None => LiteralValue::Integer(0),
                };
                (ExprKind::Literal { value }, true)
            }
            TokenKind::StringLiteral => {
                let index = self.bump();
                let value = LiteralValue::String(unescape_literal(self.token_text(index)));
                (ExprKind::Literal { value }, true)
            }
            TokenKind::Regex => {
                let index = self.bump();
                let value = LiteralValue::Regex(self.token_text(index).to_string());
                (ExprKind::Literal { value }, true)
            }
            kind @ (TokenKind::True | TokenKind::False) => {
                self.bump();
                let value = LiteralValue::Integer(i64::from(kind == TokenKind::True));
                (ExprKind::Literal { value }, true)
            }
            TokenKind::Void => {
                self.bump();
                (ExprKind::Literal { value: LiteralValue::Void }, true)
            }
            TokenKind::Null => {
                self.bump();
                (ExprKind::Literal { value: LiteralValue::Null }, true)
            }
            kind @ (TokenKind::This | TokenKind::Super | TokenKind::Global) => {
                self.bump();
                let kind = match kind {
                    TokenKind::This => ContextKind::This,
                    TokenKind::Super => ContextKind::Super,
                    _ => ContextKind::Global,
                };
                (ExprKind::Context { kind }, true)
            }
            TokenKind::LeftParen => {
                self.bump();
                let inner = self.expression();
                let closed = inner.is_some() && self.expect(TokenKind::RightParen);
                (ExprKind::Paren { inner }, closed && self.complete(inner))
            }
            TokenKind::LeftBracket => {
                self.bump();
                let entries = self.par_list(TokenKind::RightBracket, false);
                let closed = self.expect(TokenKind::RightBracket);
                let completed = closed && self.ast.is_completed(entries);
                (
                    ExprKind::Array {
                        entries: Some(entries),
                    },
                    completed,
                )
            }
            TokenKind::DictOpen => {
                self.bump();
                let entries = self.par_list(TokenKind::RightBracket, true);
                let closed = self.expect(TokenKind::RightBracket);
                let completed = closed && self.ast.is_completed(entries);
                (
                    ExprKind::Dict {
                        entries: Some(entries),
                    },
                    completed,
                )
            }
            TokenKind::OctetOpen => self.octet_literal(),
            TokenKind::Dot => {
                self.bump();
                let name = self.member_name();
                let completed = name.is_some();
                (ExprKind::Member { target: None, name }, completed)
            }
            TokenKind::Function => {
                self.bump();
                let (params, params_ok) = if self.at(TokenKind::LeftParen) {
                    self.function_params()
                } else {
                    (Vec::new(), true)
                };
                let body = self.function_body();
                let completed = params_ok && self.complete(body);
                (ExprKind::FunctionExpr { params, body }, completed)
            }
            TokenKind::At => self.interpolated_string(),
            TokenKind::Unexpected => {
                // the token already carries its own lexical diagnostic
                return None;
            }
            _ => {
                let range = self.peek_range();
                self.report(TjsDiagnostics::expression_expected(range));
                return None;
            }
        };
        Some(self.finish_expr(start, kind, completed))
    }

    /// Comma separated entries up to (not including) `close`
    pub(crate) fn par_list(&mut self, close: TokenKind, allow_arrow: bool) -> NodeId {
        let start = self.mark();
        let mut entries = Vec::new();
        if self.at(close) {
            return self.finish_expr(start, ExprKind::ParList { entries }, true);
        }
        loop {
            let entry = self.par_entry(close, allow_arrow);
            entries.push(entry);
            let separated = self.eat(TokenKind::Comma).is_some()
                || (allow_arrow && self.eat(TokenKind::FatArrow).is_some());
            if !separated {
                break;
            }
        }
        let completed = self.all_complete(&entries);
        self.finish_expr(start, ExprKind::ParList { entries }, completed)
    }

    fn par_entry(&mut self, close: TokenKind, allow_arrow: bool) -> NodeId {
        let start = self.mark();
        let next = self.peek();
        let ends_entry = |kind: TokenKind| {
            kind == close || kind == TokenKind::Comma || (allow_arrow && kind == TokenKind::FatArrow)
        };

        let (entry_type, expr, completed) = if ends_entry(next) {
            (ParEntryType::Empty, None, true)
        } else if next == TokenKind::Ellipsis {
            self.bump();
            (ParEntryType::CallerArgs, None, true)
        } else if next == TokenKind::Star {
            self.bump();
            let following = self.peek();
            if ends_entry(following) {
                (ParEntryType::UnnamedArgs, None, true)
            } else {
                // `*expr`: property call through the object
                let operand = self.unary_expr();
                let completed = self.complete(operand);
                let unary = self.finish_expr(
                    start,
                    ExprKind::Unary {
                        op: UnaryOp::CallObject,
                        operand,
                        is_prefix: true,
                    },
                    completed,
                );
                (ParEntryType::Normal, Some(unary), completed)
            }
        } else {
            let expr = self.assignment_expr();
            (ParEntryType::Normal, expr, self.complete(expr))
        };
        self.finish_expr(start, ExprKind::ParEntry { entry_type, expr }, completed)
    }

    /// `<% 0a ff %>`
    fn octet_literal(&mut self) -> (ExprKind, bool) {
        let open = self.bump();
        let mut digits = String::new();
        loop {
            match self.peek() {
                TokenKind::OctetClose => break,
                TokenKind::Eof | TokenKind::Semicolon | TokenKind::RightBrace => {
                    let range = self.peek_range();
                    self.report(TjsDiagnostics::expected_token(range, "%>"));
                    return (ExprKind::Literal { value: LiteralValue::Octet(Vec::new()) }, false);
                }
                _ => {
                    // hex pairs like `0a` do not lex as numbers
                    let index = self.bump_quiet();
                    digits.push_str(self.token_text(index));
                    digits.push(' ');
                }
            }
        }
        self.bump();
        match decode_octet(&digits) {
            Some(bytes) => (ExprKind::Literal { value: LiteralValue::Octet(bytes) }, true),
            None => {
                let range = self.tokens[open].range.merge(self.tokens[self.mark() - 1].range);
                self.report(TjsDiagnostics::lexical(range, "malformed octet literal"));
                (ExprKind::Literal { value: LiteralValue::Octet(Vec::new()) }, false)
            }
        }
    }

    /// `@"text ${expr} &expr; text"`
    fn interpolated_string(&mut self) -> (ExprKind, bool) {
        self.bump();
        let mode = if self.peek_in(LexerMode::InterpolatedDouble) == TokenKind::QuoteDouble {
            LexerMode::InterpolatedDouble
        } else if self.peek_in(LexerMode::InterpolatedSingle) == TokenKind::QuoteSingle {
            LexerMode::InterpolatedSingle
        } else {
            let range = self.peek_range();
            self.report(TjsDiagnostics::expected_token(range, "\""));
            return (ExprKind::InterpolatedString { parts: Vec::new() }, false);
        };
        let quote = self.peek_in(mode);
        self.advance_in(mode);

        let mut parts = Vec::new();
        let mut completed = true;
        loop {
            match self.peek_in(mode) {
                kind if kind == quote => {
                    self.advance_in(mode);
                    break;
                }
                TokenKind::StringFragment => {
                    let index = self.advance_in(mode);
                    let value = LiteralValue::String(unescape(self.token_text(index), true));
                    parts.push(self.finish_expr(index, ExprKind::Literal { value }, true));
                }
                open @ (TokenKind::InterpDollarOpen | TokenKind::InterpAmpOpen) => {
                    self.advance_in(mode);
                    let close = if open == TokenKind::InterpDollarOpen {
                        TokenKind::RightBrace
                    } else {
                        TokenKind::Semicolon
                    };
                    let inner = self.expression();
                    let closed = inner.is_some() && self.expect(close);
                    completed &= closed && self.complete(inner);
                    parts.extend(inner);
                    if !completed {
                        break;
                    }
                }
                TokenKind::Eof => {
                    let range = self.peek_range();
                    self.report(TjsDiagnostics::expected_token(range, quote.describe()));
                    completed = false;
                    break;
                }
                _ => {
                    // bad escape or a line break; the token reports itself
                    let index = self.advance_in(mode);
                    completed = false;
                    if self.token_text(index).ends_with(['\r', '\n']) {
                        break;
                    }
                }
            }
        }
        (ExprKind::InterpolatedString { parts }, completed)
    }
}

/// Decode the body of a quoted literal, quotes included
pub fn unescape_literal(text: &str) -> String {
    let mut chars = text.chars();
    chars.next();
    chars.next_back();
    unescape(chars.as_str(), false)
}

/// Resolve backslash escapes; `interpolated` also accepts `\&` and `\$`
pub fn unescape(body: &str, interpolated: bool) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0B}'),
            'x' | 'X' => {
                let mut code = 0u32;
                let mut digits = 0;
                while digits < 4 {
                    let Some(digit) = chars.peek().and_then(|d| d.to_digit(16)) else {
                        break;
                    };
                    code = code * 16 + digit;
                    chars.next();
                    digits += 1;
                }
                out.extend(char::from_u32(code));
            }
            '&' | '$' if interpolated => out.push(escaped),
            other => out.push(other),
        }
    }
    out
}

fn decode_octet(text: &str) -> Option<Vec<u8>> {
    let mut bytes = Vec::new();
    for chunk in text.split(|c: char| c.is_whitespace() || c == ',') {
        if chunk.is_empty() {
            continue;
        }
        if chunk.len() % 2 != 0 || !chunk.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        for pair in chunk.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(pair).ok()?;
            bytes.push(u8::from_str_radix(pair, 16).ok()?);
        }
    }
    Some(bytes)
}
