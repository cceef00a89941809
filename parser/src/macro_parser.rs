//! Macro expression evaluator for `@set(...)` / `@if(...)` directives
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! E      := '(' exp0 ')'
//! exp0   := exp1 (',' exp1)?
//! exp1   := IDENT '=' exp2 | exp2
//! exp2   := exp3  ('||' exp3)*
//! exp3   := exp4  ('&&' exp4)*
//! exp4   := exp5  ('|' exp5)*
//! exp5   := exp6  ('^' exp6)*
//! exp6   := exp7  ('&' exp7)*
//! exp7   := exp8  (('==' | '!=') exp8)?
//! exp8   := exp9  (('<' | '>' | '<=' | '>=') exp9)?
//! exp9   := exp10 (('+' | '-') exp10)*
//! exp10  := exp11 (('%' | '/' | '*') exp11)*
//! exp11  := ('!' | '+' | '-') exp12 | exp12
//! exp12  := '(' exp0 ')' | NUMBER | IDENT
//! ```
//!
//! Values are `i64`. Assignments write to the [`DefineList`] while parsing.

use diagnostics::{tjs::TjsDiagnostics, Diagnostic};
use log::trace;

use crate::cursor::CursorState;
use crate::define_list::DefineList;
use crate::lexer::{Lexer, LexerCheckpoint, LexerMode, TokenStream};
use crate::number::parse_number;
use crate::token::{Token, TokenKind};

type MacroResult<T> = Result<T, Diagnostic>;

const MODE: LexerMode = LexerMode::Normal;

/// Deepest `( ... )` nesting a macro expression may use
const MAX_PAREN_DEPTH: usize = 200;

/// Result of one production
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroExpr {
    Number(i64),
    Variable(String),
}

impl MacroExpr {
    pub fn eval(&self, defines: &DefineList) -> i64 {
        match self {
            MacroExpr::Number(value) => *value,
            MacroExpr::Variable(name) => defines.get(name),
        }
    }
}

/// What the preprocessor needs after a directive: the value (or the single
/// diagnostic) and where to resume scanning.
#[derive(Debug, Clone)]
pub struct MacroOutcome {
    pub result: Result<i64, Diagnostic>,
    pub end: CursorState,
}

pub struct MacroParser<'a, 'd> {
    lexer: Lexer<'a>,
    start: LexerCheckpoint,
    defines: &'d mut DefineList,
    depth: usize,
}

impl<'a, 'd> MacroParser<'a, 'd> {
    /// `start` must point at the directive's `(` in `chunk`
    pub fn new(
        chunk_name: &str,
        chunk: &'a str,
        start: CursorState,
        defines: &'d mut DefineList,
    ) -> Self {
        let lexer = Lexer::starting_at(chunk_name, chunk, start);
        let start = lexer.checkpoint();
        Self {
            lexer,
            start,
            defines,
            depth: 0,
        }
    }

    pub fn parse(mut self) -> MacroOutcome {
        let result = self.parse_directive();
        if let Err(diagnostic) = &result {
            trace!("macro expression failed: {}", diagnostic.message);
            self.resync();
        }
        MacroOutcome {
            result,
            end: self.lexer.state(),
        }
    }

    /// Skip to the balanced `)` of the directive. Stops early before
    /// tokens that cannot belong to a macro expression.
    fn resync(&mut self) {
        self.lexer.restore(self.start.clone());
        let mut depth = 0usize;
        loop {
            match self.lexer.look_ahead_kind(MODE) {
                TokenKind::Eof
                | TokenKind::Semicolon
                | TokenKind::LeftBrace
                | TokenKind::RightBrace
                | TokenKind::At => return,
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    if depth <= 1 {
                        self.lexer.next_token(MODE);
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.lexer.next_token(MODE);
        }
    }

    fn peek(&mut self) -> TokenKind {
        self.lexer.look_ahead_kind(MODE)
    }

    fn advance(&mut self) -> Token {
        self.lexer.next_token(MODE)
    }

    fn error_at(token: &Token, message: &str) -> Diagnostic {
        let message = match &token.diagnostic {
            Some(cause) => format!("{} {}", message, cause),
            None => message.to_string(),
        };
        TjsDiagnostics::macro_error(token.range, message)
    }

    fn expect_rparen(&mut self) -> MacroResult<()> {
        if self.peek() == TokenKind::RightParen {
            self.advance();
            Ok(())
        } else {
            let token = self.advance();
            Err(Self::error_at(&token, "')' expected."))
        }
    }

    fn parse_directive(&mut self) -> MacroResult<i64> {
        if self.peek() != TokenKind::LeftParen {
            let token = self.advance();
            return Err(Self::error_at(&token, "'(' expected."));
        }
        self.advance();
        let value = self.parse_exp0()?.eval(self.defines);
        self.expect_rparen()?;
        Ok(value)
    }

    fn parse_exp0(&mut self) -> MacroResult<MacroExpr> {
        let first = self.parse_exp1()?;
        if self.peek() == TokenKind::Comma {
            self.advance();
            return self.parse_exp1();
        }
        Ok(first)
    }

    fn parse_exp1(&mut self) -> MacroResult<MacroExpr> {
        if is_name(self.peek()) {
            let checkpoint = self.lexer.checkpoint();
            let name = self.advance().text;
            if self.peek() == TokenKind::Assign {
                self.advance();
                let value = self.parse_exp2()?.eval(self.defines);
                self.defines.set(name.clone(), value);
                return Ok(MacroExpr::Variable(name));
            }
            self.lexer.restore(checkpoint);
        }
        self.parse_exp2()
    }

    fn parse_exp2(&mut self) -> MacroResult<MacroExpr> {
        self.binary(Self::parse_exp3, &[TokenKind::OrOr], true)
    }

    fn parse_exp3(&mut self) -> MacroResult<MacroExpr> {
        self.binary(Self::parse_exp4, &[TokenKind::AndAnd], true)
    }

    fn parse_exp4(&mut self) -> MacroResult<MacroExpr> {
        self.binary(Self::parse_exp5, &[TokenKind::Pipe], true)
    }

    fn parse_exp5(&mut self) -> MacroResult<MacroExpr> {
        self.binary(Self::parse_exp6, &[TokenKind::Caret], true)
    }

    fn parse_exp6(&mut self) -> MacroResult<MacroExpr> {
        self.binary(Self::parse_exp7, &[TokenKind::Amp], true)
    }

    fn parse_exp7(&mut self) -> MacroResult<MacroExpr> {
        self.binary(Self::parse_exp8, &[TokenKind::EqEq, TokenKind::NotEq], false)
    }

    fn parse_exp8(&mut self) -> MacroResult<MacroExpr> {
        self.binary(
            Self::parse_exp9,
            &[
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::LessEq,
                TokenKind::GreaterEq,
            ],
            false,
        )
    }

    fn parse_exp9(&mut self) -> MacroResult<MacroExpr> {
        self.binary(Self::parse_exp10, &[TokenKind::Plus, TokenKind::Minus], true)
    }

    fn parse_exp10(&mut self) -> MacroResult<MacroExpr> {
        self.binary(
            Self::parse_exp11,
            &[TokenKind::Percent, TokenKind::Slash, TokenKind::Star],
            true,
        )
    }

    /// One binary level. `repeat` makes it a left-associative chain,
    /// otherwise at most one operator is taken.
    fn binary(
        &mut self,
        operand: fn(&mut Self) -> MacroResult<MacroExpr>,
        ops: &[TokenKind],
        repeat: bool,
    ) -> MacroResult<MacroExpr> {
        let mut lhs = operand(self)?;
        while ops.contains(&self.peek()) {
            let op = self.advance();
            let rhs = operand(self)?;
            let a = lhs.eval(self.defines);
            let b = rhs.eval(self.defines);
            let value = apply(op.kind, a, b)
                .ok_or_else(|| TjsDiagnostics::macro_error(op.range, "division by zero"))?;
            lhs = MacroExpr::Number(value);
            if !repeat {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_exp11(&mut self) -> MacroResult<MacroExpr> {
        let op = self.peek();
        if matches!(op, TokenKind::Bang | TokenKind::Plus | TokenKind::Minus) {
            self.advance();
            let value = self.parse_exp12()?.eval(self.defines);
            let result = match op {
                TokenKind::Bang => i64::from(value == 0),
                TokenKind::Minus => value.wrapping_neg(),
                _ => value,
            };
            return Ok(MacroExpr::Number(result));
        }
        self.parse_exp12()
    }

    fn parse_exp12(&mut self) -> MacroResult<MacroExpr> {
        match self.peek() {
            TokenKind::LeftParen => {
                let token = self.advance();
                if self.depth >= MAX_PAREN_DEPTH {
                    return Err(TjsDiagnostics::nesting_too_deep(token.range));
                }
                self.depth += 1;
                let inner = self.parse_exp0();
                self.depth -= 1;
                let inner = inner?;
                self.expect_rparen()?;
                Ok(inner)
            }
            TokenKind::Number => {
                let token = self.advance();
                parse_number(&token.text)
                    .map(|literal| MacroExpr::Number(literal.to_i64()))
                    .ok_or_else(|| Self::error_at(&token, "number or identifier expected."))
            }
            kind if is_name(kind) => Ok(MacroExpr::Variable(self.advance().text)),
            _ => {
                let token = self.advance();
                Err(Self::error_at(&token, "number or identifier expected."))
            }
        }
    }
}

/// Macro names may shadow keywords
fn is_name(kind: TokenKind) -> bool {
    kind == TokenKind::Identifier || kind.is_keyword()
}

fn apply(op: TokenKind, a: i64, b: i64) -> Option<i64> {
    let value = match op {
        TokenKind::OrOr => {
            if a != 0 {
                a
            } else {
                b
            }
        }
        TokenKind::AndAnd => {
            if a == 0 {
                a
            } else {
                b
            }
        }
        TokenKind::Pipe => a | b,
        TokenKind::Caret => a ^ b,
        TokenKind::Amp => a & b,
        TokenKind::EqEq => i64::from(a == b),
        TokenKind::NotEq => i64::from(a != b),
        TokenKind::Less => i64::from(a < b),
        TokenKind::Greater => i64::from(a > b),
        TokenKind::LessEq => i64::from(a <= b),
        TokenKind::GreaterEq => i64::from(a >= b),
        TokenKind::Plus => a.wrapping_add(b),
        TokenKind::Minus => a.wrapping_sub(b),
        TokenKind::Star => a.wrapping_mul(b),
        TokenKind::Slash if b != 0 => a.wrapping_div(b),
        TokenKind::Percent if b != 0 => a.wrapping_rem(b),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_with(source: &str, defines: &mut DefineList) -> MacroOutcome {
        MacroParser::new("test", source, CursorState::default(), defines).parse()
    }

    fn eval(source: &str) -> Result<i64, String> {
        let mut defines = DefineList::new();
        eval_with(source, &mut defines).result.map_err(|d| d.message)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("(1+1)"), Ok(2));
        assert_eq!(eval("(1+(2-3)*4)"), Ok(-3));
        assert_eq!(eval("(7 % 4 * 2)"), Ok(6));
        assert_eq!(eval("(10 - 2 - 3)"), Ok(5));
        assert_eq!(eval("(-(2))"), Ok(-2));
    }

    #[test]
    fn test_logic_and_bits() {
        assert_eq!(eval("(0 || 5)"), Ok(5));
        assert_eq!(eval("(3 && 4)"), Ok(4));
        assert_eq!(eval("(0 && 4)"), Ok(0));
        assert_eq!(eval("(6 & 3)"), Ok(2));
        assert_eq!(eval("(6 | 3)"), Ok(7));
        assert_eq!(eval("(6 ^ 3)"), Ok(5));
        assert_eq!(eval("(!0)"), Ok(1));
        assert_eq!(eval("(1 < 2 == 1)"), Ok(1));
        assert_eq!(eval("(0x10 >= 16)"), Ok(1));
    }

    #[test]
    fn test_assignment_updates_defines() {
        let mut defines = DefineList::new();
        assert_eq!(eval_with("(a=3)", &mut defines).result, Ok(3));
        assert_eq!(defines.get("a"), 3);

        let mut defines = DefineList::new();
        assert_eq!(eval_with("(b=1+(a=2-3)*4)", &mut defines).result, Ok(-3));
        assert_eq!(defines.get("a"), -1);
        assert_eq!(defines.get("b"), -3);
    }

    #[test]
    fn test_identifier_in_expression() {
        let mut defines: DefineList = [("DEBUG", 2)].into_iter().collect();
        assert_eq!(eval_with("(DEBUG + 1)", &mut defines).result, Ok(3));
        assert_eq!(eval_with("(UNDEFINED)", &mut defines).result, Ok(0));
    }

    #[test]
    fn test_comma_returns_right_operand() {
        let mut defines = DefineList::new();
        assert_eq!(eval_with("(x = 4, x + 1)", &mut defines).result, Ok(5));
        assert_eq!(defines.get("x"), 4);
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval("(1 / 0)"), Err("division by zero".to_string()));
        assert_eq!(eval("(1 +)"), Err("number or identifier expected.".to_string()));
        assert_eq!(eval("(1 2)"), Err("')' expected.".to_string()));
    }

    #[test]
    fn test_deep_parens_fail_and_resync() {
        let depth = 10_000;
        let source = format!("({}1{}) rest", "(".repeat(depth), ")".repeat(depth));
        let mut defines = DefineList::new();
        let outcome = eval_with(&source, &mut defines);
        assert_eq!(outcome.result.map_err(|d| d.message), Err("nesting too deep".to_string()));
        assert_eq!(&source[outcome.end.offset..], " rest");

        let source = format!("({}1{})", "(".repeat(50), ")".repeat(50));
        assert_eq!(eval(&source), Ok(1));
    }

    #[test]
    fn test_resync_to_balanced_paren() {
        let source = "((1 +) foo) rest";
        let mut defines = DefineList::new();
        let outcome = eval_with(source, &mut defines);
        assert!(outcome.result.is_err());
        assert_eq!(&source[outcome.end.offset..], " rest");
    }

    #[test]
    fn test_resync_stops_before_statement_tokens() {
        let source = "(1 + ; var x";
        let mut defines = DefineList::new();
        let outcome = eval_with(source, &mut defines);
        assert!(outcome.result.is_err());
        assert_eq!(&source[outcome.end.offset..], " ; var x");
    }

    #[test]
    fn test_end_after_closing_paren() {
        let source = "@if(1)\nx";
        let start = CursorState {
            offset: 3,
            position: source_map::Position::new(0, 3),
        };
        let mut defines = DefineList::new();
        let outcome = MacroParser::new("test", source, start, &mut defines).parse();
        assert_eq!(outcome.result, Ok(1));
        assert_eq!(outcome.end.offset, 6);
        assert_eq!(outcome.end.position, source_map::Position::new(0, 6));
    }
}
