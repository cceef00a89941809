//! Mode-sensitive tokenizer
//!
//! The lexer is pull-based: the parser asks for the next token in a given
//! [`LexerMode`]. Normal mode skips whitespace and comments; the two
//! interpolated modes scan the inside of `@"..."` / `@'...'` strings, where
//! whitespace is significant and `${` / `&` open embedded expressions.
//!
//! Malformed input never stops scanning. It comes back as a
//! [`TokenKind::Unexpected`] token whose `diagnostic` explains the problem.

use log::trace;
use source_map::{Position, Range, Span};

use crate::cursor::{Cursor, CursorState};
use crate::number::parse_number;
use crate::token::{keyword, Token, TokenKind, PUNCTUATORS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexerMode {
    Normal,
    InterpolatedDouble,
    InterpolatedSingle,
}

impl LexerMode {
    fn quote(self) -> Option<char> {
        match self {
            LexerMode::Normal => None,
            LexerMode::InterpolatedDouble => Some('"'),
            LexerMode::InterpolatedSingle => Some('\''),
        }
    }
}

/// The token-producing contract the parsers depend on
pub trait TokenStream {
    fn chunk_name(&self) -> &str;

    /// Position of the next unconsumed character
    fn current_position(&self) -> Position;

    /// Consume and return the next token scanned in `mode`
    fn next_token(&mut self, mode: LexerMode) -> Token;

    /// Peek at the next token scanned in `mode` without consuming it
    fn look_ahead(&mut self, mode: LexerMode) -> &Token;

    fn look_ahead_kind(&mut self, mode: LexerMode) -> TokenKind {
        self.look_ahead(mode).kind
    }

    fn look_ahead_range(&mut self, mode: LexerMode) -> Range {
        self.look_ahead(mode).range
    }

    /// Consume the next token only if it has the given kind
    fn next_token_of_kind(&mut self, mode: LexerMode, kind: TokenKind) -> Option<Token> {
        if self.look_ahead_kind(mode) == kind {
            Some(self.next_token(mode))
        } else {
            None
        }
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || u32::from(c) > 0xFF
}

pub(crate) fn is_ident_part(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

#[derive(Debug, Clone)]
struct Lookahead {
    mode: LexerMode,
    token: Token,
    /// Cursor state just after the token
    resume: CursorState,
}

/// Saved lexer state for speculative scanning
#[derive(Debug, Clone)]
pub struct LexerCheckpoint {
    state: CursorState,
    lookahead: Option<Lookahead>,
    previous: Option<TokenKind>,
}

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    chunk_name: String,
    cursor: Cursor<'a>,
    lookahead: Option<Lookahead>,
    /// Kind of the last consumed token, drives the regex heuristic
    previous: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    pub fn new(chunk_name: impl Into<String>, text: &'a str) -> Self {
        Self::starting_at(chunk_name, text, CursorState::default())
    }

    /// Lex `text` starting from a known offset and position
    pub fn starting_at(chunk_name: impl Into<String>, text: &'a str, state: CursorState) -> Self {
        Self {
            chunk_name: chunk_name.into(),
            cursor: Cursor::at(text, state),
            lookahead: None,
            previous: None,
        }
    }

    /// Cursor state of the next unconsumed character
    pub fn state(&self) -> CursorState {
        self.cursor.state()
    }

    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }

    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            state: self.cursor.state(),
            lookahead: self.lookahead.clone(),
            previous: self.previous,
        }
    }

    pub fn restore(&mut self, checkpoint: LexerCheckpoint) {
        self.cursor.reset(checkpoint.state);
        self.lookahead = checkpoint.lookahead;
        self.previous = checkpoint.previous;
    }

    /// Consume tokens until one of `kinds` (not consumed) or end of file
    pub fn skip_until(&mut self, mode: LexerMode, kinds: &[TokenKind]) {
        loop {
            let kind = self.look_ahead_kind(mode);
            if kind == TokenKind::Eof || kinds.contains(&kind) {
                return;
            }
            self.next_token(mode);
        }
    }

    fn fill_lookahead(&mut self, mode: LexerMode) -> &Lookahead {
        let cached = self.lookahead.take().filter(|la| la.mode == mode);
        let lookahead = match cached {
            Some(la) => la,
            None => {
                let saved = self.cursor.state();
                let token = self.scan(mode);
                let resume = self.cursor.state();
                self.cursor.reset(saved);
                Lookahead { mode, token, resume }
            }
        };
        self.lookahead.insert(lookahead)
    }

    fn scan(&mut self, mode: LexerMode) -> Token {
        let token = match mode.quote() {
            None => self.scan_normal(),
            Some(quote) => self.scan_interpolated(mode, quote),
        };
        if token.kind == TokenKind::Unexpected {
            trace!(
                "{}: unexpected token {:?} at {}",
                self.chunk_name,
                token.text,
                token.range
            );
        }
        token
    }

    fn make(&self, kind: TokenKind, start: CursorState, diagnostic: Option<String>) -> Token {
        Token {
            kind,
            range: Range::new(start.position, self.cursor.position()),
            span: Span::new(start.offset, self.cursor.offset()),
            text: self.cursor.slice_from(start.offset).to_string(),
            diagnostic,
        }
    }

    /// Skip whitespace and comments. An unterminated block comment comes
    /// back as an unexpected token.
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            match self.cursor.peek() {
                Some(c) if c.is_whitespace() => {
                    self.cursor.bump();
                }
                Some('/') if self.cursor.starts_with("//") => self.cursor.bump_to_line_end(),
                Some('/') if self.cursor.starts_with("/*") => {
                    let start = self.cursor.state();
                    self.cursor.bump_n(2);
                    loop {
                        if self.cursor.starts_with("*/") {
                            self.cursor.bump_n(2);
                            break;
                        }
                        if self.cursor.bump().is_none() {
                            return Some(self.make(
                                TokenKind::Unexpected,
                                start,
                                Some("unterminated comment".to_string()),
                            ));
                        }
                    }
                }
                _ => return None,
            }
        }
    }

    fn scan_normal(&mut self) -> Token {
        if let Some(token) = self.skip_trivia() {
            return token;
        }
        let start = self.cursor.state();
        let Some(c) = self.cursor.peek() else {
            return self.make(TokenKind::Eof, start, None);
        };

        if is_ident_start(c) {
            self.cursor.bump_while(is_ident_part);
            let kind = keyword(self.cursor.slice_from(start.offset)).unwrap_or(TokenKind::Identifier);
            return self.make(kind, start, None);
        }

        let starts_number = c.is_ascii_digit()
            || (c == '.' && self.cursor.peek_nth(1).is_some_and(|n| n.is_ascii_digit()));
        if starts_number {
            return self.scan_number(start);
        }

        if c == '"' || c == '\'' {
            return self.scan_string(start, c);
        }

        if c == '/' && !self.previous.is_some_and(TokenKind::ends_operand) {
            if let Some(token) = self.scan_regex(start) {
                return token;
            }
        }

        if let Some((spelling, kind)) = PUNCTUATORS
            .iter()
            .find(|(spelling, _)| self.cursor.starts_with(spelling))
        {
            self.cursor.bump_n(spelling.chars().count());
            return self.make(*kind, start, None);
        }

        self.cursor.bump();
        self.cursor.bump_while(|c| !c.is_whitespace());
        self.make(
            TokenKind::Unexpected,
            start,
            Some(format!("unexpected character '{}'", c)),
        )
    }

    /// Capture the maximal numeric span, then classify it
    fn scan_number(&mut self, start: CursorState) -> Token {
        let rest = self.cursor.rest();
        let prefixed = ["0x", "0X", "0b", "0B"].iter().any(|p| rest.starts_with(p));
        let hex = rest.starts_with("0x") || rest.starts_with("0X");

        if self.cursor.peek() == Some('.') {
            self.cursor.bump();
        }
        loop {
            match self.cursor.peek() {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => {
                    self.cursor.bump();
                    let exponent = matches!(c, 'p' | 'P') || (!prefixed && matches!(c, 'e' | 'E'));
                    let signed_digit = matches!(self.cursor.peek(), Some('+' | '-'))
                        && self.cursor.peek_nth(1).is_some_and(|d| d.is_ascii_digit());
                    if exponent && signed_digit {
                        self.cursor.bump();
                    }
                }
                Some('.') => {
                    let next_is_digit = self.cursor.peek_nth(1).is_some_and(|d| {
                        if hex {
                            d.is_ascii_hexdigit()
                        } else {
                            d.is_ascii_digit()
                        }
                    });
                    if !next_is_digit {
                        break;
                    }
                    self.cursor.bump();
                }
                _ => break,
            }
        }

        let text = self.cursor.slice_from(start.offset);
        if parse_number(text).is_some() {
            self.make(TokenKind::Number, start, None)
        } else {
            let message = format!("malformed number literal '{}'", text);
            self.make(TokenKind::Unexpected, start, Some(message))
        }
    }

    /// Consume one escape sequence after the backslash. Returns a problem
    /// description for unsupported escapes.
    fn scan_escape(&mut self, interpolated: bool) -> Option<String> {
        match self.cursor.peek() {
            Some('a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '"' | '\'' | '\\') => {
                self.cursor.bump();
                None
            }
            Some('&' | '$') if interpolated => {
                self.cursor.bump();
                None
            }
            Some(x @ ('x' | 'X')) => {
                self.cursor.bump();
                let mut digits = 0;
                while digits < 4 && self.cursor.peek().is_some_and(|d| d.is_ascii_hexdigit()) {
                    self.cursor.bump();
                    digits += 1;
                }
                (digits == 0).then(|| format!("'\\{}' escape needs hex digits", x))
            }
            Some(c) if c != '\r' && c != '\n' => {
                self.cursor.bump();
                Some(format!("unsupported escape sequence '\\{}'", c))
            }
            _ => None,
        }
    }

    fn scan_string(&mut self, start: CursorState, quote: char) -> Token {
        self.cursor.bump();
        let mut problem = None;
        loop {
            match self.cursor.peek() {
                None | Some('\r' | '\n') => {
                    return self.make(
                        TokenKind::Unexpected,
                        start,
                        Some("unterminated string literal".to_string()),
                    );
                }
                Some(c) if c == quote => {
                    self.cursor.bump();
                    break;
                }
                Some('\\') => {
                    self.cursor.bump();
                    if let Some(found) = self.scan_escape(false) {
                        problem.get_or_insert(found);
                    }
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
        match problem {
            Some(message) => self.make(TokenKind::Unexpected, start, Some(message)),
            None => self.make(TokenKind::StringLiteral, start, None),
        }
    }

    /// `/body/flags` on a single line, or nothing
    fn scan_regex(&mut self, start: CursorState) -> Option<Token> {
        self.cursor.bump();
        let mut body = 0usize;
        loop {
            match self.cursor.peek() {
                None | Some('\r' | '\n') => break,
                Some('/') => {
                    self.cursor.bump();
                    if body == 0 {
                        break;
                    }
                    self.cursor.bump_while(|c| c.is_ascii_lowercase());
                    return Some(self.make(TokenKind::Regex, start, None));
                }
                Some('\\') => {
                    self.cursor.bump();
                    if self.cursor.at_line_break() || self.cursor.is_eof() {
                        break;
                    }
                    self.cursor.bump();
                    body += 1;
                }
                Some(_) => {
                    self.cursor.bump();
                    body += 1;
                }
            }
        }
        self.cursor.reset(start);
        None
    }

    fn scan_interpolated(&mut self, mode: LexerMode, quote: char) -> Token {
        let start = self.cursor.state();
        let Some(c) = self.cursor.peek() else {
            return self.make(TokenKind::Eof, start, None);
        };

        if c == quote {
            self.cursor.bump();
            let kind = match mode {
                LexerMode::InterpolatedSingle => TokenKind::QuoteSingle,
                _ => TokenKind::QuoteDouble,
            };
            return self.make(kind, start, None);
        }
        match c {
            '\r' | '\n' => {
                self.cursor.bump();
                return self.make(
                    TokenKind::Unexpected,
                    start,
                    Some("unterminated interpolated string".to_string()),
                );
            }
            '$' if self.cursor.starts_with("${") => {
                self.cursor.bump_n(2);
                return self.make(TokenKind::InterpDollarOpen, start, None);
            }
            '&' => {
                self.cursor.bump();
                return self.make(TokenKind::InterpAmpOpen, start, None);
            }
            _ => {}
        }

        let mut problem = None;
        loop {
            match self.cursor.peek() {
                None | Some('\r' | '\n' | '&') => break,
                Some(c) if c == quote => break,
                Some('$') if self.cursor.starts_with("${") => break,
                Some('\\') => {
                    self.cursor.bump();
                    if let Some(found) = self.scan_escape(true) {
                        problem.get_or_insert(found);
                    }
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
        match problem {
            Some(message) => self.make(TokenKind::Unexpected, start, Some(message)),
            None => self.make(TokenKind::StringFragment, start, None),
        }
    }
}

impl TokenStream for Lexer<'_> {
    fn chunk_name(&self) -> &str {
        &self.chunk_name
    }

    fn current_position(&self) -> Position {
        self.cursor.position()
    }

    fn next_token(&mut self, mode: LexerMode) -> Token {
        let token = match self.lookahead.take() {
            Some(la) if la.mode == mode => {
                self.cursor.reset(la.resume);
                la.token
            }
            _ => self.scan(mode),
        };
        self.previous = Some(token.kind);
        token
    }

    fn look_ahead(&mut self, mode: LexerMode) -> &Token {
        &self.fill_lookahead(mode).token
    }
}
