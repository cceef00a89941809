//! Character cursor shared by the preprocessor and the lexer
//!
//! Both scanners walk the same text with the same line-break rules, so the
//! positions they report always agree. `\r\n`, `\n\r`, `\r` and `\n` each
//! count as one line break and are consumed as a single step.

use source_map::Position;

/// Byte offset plus editor position; cheap to copy for checkpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorState {
    pub offset: usize,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    text: &'a str,
    state: CursorState,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::at(text, CursorState::default())
    }

    /// Start scanning from an arbitrary point, e.g. a macro directive's `(`
    pub fn at(text: &'a str, state: CursorState) -> Self {
        Self { text, state }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn reset(&mut self, state: CursorState) {
        self.state = state;
    }

    pub fn offset(&self) -> usize {
        self.state.offset
    }

    pub fn position(&self) -> Position {
        self.state.position
    }

    pub fn rest(&self) -> &'a str {
        self.text.get(self.state.offset..).unwrap_or("")
    }

    pub fn is_eof(&self) -> bool {
        self.state.offset >= self.text.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn starts_with(&self, pattern: &str) -> bool {
        self.rest().starts_with(pattern)
    }

    pub fn at_line_break(&self) -> bool {
        matches!(self.peek(), Some('\r' | '\n'))
    }

    pub fn slice_from(&self, start: usize) -> &'a str {
        self.text.get(start..self.state.offset).unwrap_or("")
    }

    /// Consume one character, or one whole line break. Returns the consumed text.
    pub fn bump(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let c = rest.chars().next()?;
        let len = match c {
            '\r' if rest[1..].starts_with('\n') => 2,
            '\n' if rest[1..].starts_with('\r') => 2,
            _ => c.len_utf8(),
        };
        self.state.offset += len;
        if c == '\r' || c == '\n' {
            self.state.position.line += 1;
            self.state.position.character = 0;
        } else {
            self.state.position.character += 1;
        }
        Some(&rest[..len])
    }

    pub fn bump_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    /// Consume `n` characters; only used for tokens without line breaks
    pub fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            if self.bump().is_none() {
                break;
            }
        }
    }

    /// Consume up to, but not including, the next line break
    pub fn bump_to_line_end(&mut self) {
        self.bump_while(|c| c != '\r' && c != '\n');
    }
}
