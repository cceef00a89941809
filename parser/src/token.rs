//! Token kinds and the keyword table

use serde::Serialize;
use source_map::{Range, Span};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Eof,
    /// Malformed input; the token's `diagnostic` holds the cause
    Unexpected,

    // Literals and names
    Identifier,
    Number,
    StringLiteral,
    Regex,

    // Interpolated-string mode
    QuoteDouble,
    QuoteSingle,
    StringFragment,
    /// `${`
    InterpDollarOpen,
    /// `&`
    InterpAmpOpen,

    // Separators
    Semicolon,
    Comma,
    Dot,
    Ellipsis,
    Colon,
    Question,
    At,
    FatArrow,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    /// `%[`
    DictOpen,
    /// `<%`
    OctetOpen,
    /// `%>`
    OctetClose,

    // Assignment
    Assign,
    Swap,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    BackslashAssign,
    PercentAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    AndAssign,
    OrAssign,
    ShlAssign,
    ShrAssign,
    UshrAssign,

    // Operators
    OrOr,
    AndAnd,
    Pipe,
    Caret,
    Amp,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Shl,
    Shr,
    Ushr,
    Plus,
    Minus,
    Star,
    Slash,
    Backslash,
    Percent,
    Bang,
    Tilde,
    PlusPlus,
    MinusMinus,
    Hash,
    Dollar,

    // Keywords
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Default,
    Delete,
    Do,
    Else,
    Extends,
    False,
    For,
    Function,
    Getter,
    Global,
    If,
    Incontextof,
    Instanceof,
    Int,
    Invalidate,
    Isvalid,
    New,
    Null,
    Property,
    Real,
    Return,
    Setter,
    String,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
}

/// Reserved spellings, looked up when an identifier has been scanned
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("break", TokenKind::Break),
    ("case", TokenKind::Case),
    ("catch", TokenKind::Catch),
    ("class", TokenKind::Class),
    ("const", TokenKind::Const),
    ("continue", TokenKind::Continue),
    ("default", TokenKind::Default),
    ("delete", TokenKind::Delete),
    ("do", TokenKind::Do),
    ("else", TokenKind::Else),
    ("extends", TokenKind::Extends),
    ("false", TokenKind::False),
    ("for", TokenKind::For),
    ("function", TokenKind::Function),
    ("getter", TokenKind::Getter),
    ("global", TokenKind::Global),
    ("if", TokenKind::If),
    ("incontextof", TokenKind::Incontextof),
    ("instanceof", TokenKind::Instanceof),
    ("int", TokenKind::Int),
    ("invalidate", TokenKind::Invalidate),
    ("isvalid", TokenKind::Isvalid),
    ("new", TokenKind::New),
    ("null", TokenKind::Null),
    ("property", TokenKind::Property),
    ("real", TokenKind::Real),
    ("return", TokenKind::Return),
    ("setter", TokenKind::Setter),
    ("string", TokenKind::String),
    ("super", TokenKind::Super),
    ("switch", TokenKind::Switch),
    ("this", TokenKind::This),
    ("throw", TokenKind::Throw),
    ("true", TokenKind::True),
    ("try", TokenKind::Try),
    ("typeof", TokenKind::Typeof),
    ("var", TokenKind::Var),
    ("void", TokenKind::Void),
    ("while", TokenKind::While),
    ("with", TokenKind::With),
];

pub fn keyword(ident: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(spelling, _)| *spelling == ident)
        .map(|(_, kind)| *kind)
}

/// Operators and separators, longest spelling first so a prefix scan
/// finds the longest match.
pub(crate) const PUNCTUATORS: &[(&str, TokenKind)] = &[
    (">>>=", TokenKind::UshrAssign),
    ("===", TokenKind::EqEqEq),
    ("!==", TokenKind::NotEqEq),
    ("<->", TokenKind::Swap),
    ("...", TokenKind::Ellipsis),
    (">>>", TokenKind::Ushr),
    ("<<=", TokenKind::ShlAssign),
    (">>=", TokenKind::ShrAssign),
    ("&&=", TokenKind::AndAssign),
    ("||=", TokenKind::OrAssign),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    ("<=", TokenKind::LessEq),
    (">=", TokenKind::GreaterEq),
    ("<<", TokenKind::Shl),
    (">>", TokenKind::Shr),
    ("&&", TokenKind::AndAnd),
    ("||", TokenKind::OrOr),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("+=", TokenKind::PlusAssign),
    ("-=", TokenKind::MinusAssign),
    ("*=", TokenKind::StarAssign),
    ("/=", TokenKind::SlashAssign),
    ("\\=", TokenKind::BackslashAssign),
    ("%=", TokenKind::PercentAssign),
    ("&=", TokenKind::AmpAssign),
    ("|=", TokenKind::PipeAssign),
    ("^=", TokenKind::CaretAssign),
    ("=>", TokenKind::FatArrow),
    ("%[", TokenKind::DictOpen),
    ("<%", TokenKind::OctetOpen),
    ("%>", TokenKind::OctetClose),
    ("=", TokenKind::Assign),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("\\", TokenKind::Backslash),
    ("%", TokenKind::Percent),
    ("!", TokenKind::Bang),
    ("~", TokenKind::Tilde),
    ("#", TokenKind::Hash),
    ("$", TokenKind::Dollar),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    (".", TokenKind::Dot),
    (":", TokenKind::Colon),
    ("?", TokenKind::Question),
    ("@", TokenKind::At),
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    ("[", TokenKind::LeftBracket),
    ("]", TokenKind::RightBracket),
    ("{", TokenKind::LeftBrace),
    ("}", TokenKind::RightBrace),
];

impl TokenKind {
    /// Source spelling for fixed tokens, a descriptive name otherwise
    pub fn describe(self) -> &'static str {
        if let Some((spelling, _)) = PUNCTUATORS.iter().find(|(_, kind)| *kind == self) {
            return *spelling;
        }
        if let Some((spelling, _)) = KEYWORDS.iter().find(|(_, kind)| *kind == self) {
            return *spelling;
        }
        match self {
            TokenKind::Eof => "end of file",
            TokenKind::Unexpected => "unexpected input",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::StringLiteral => "string",
            TokenKind::Regex => "regular expression",
            TokenKind::QuoteDouble => "\"",
            TokenKind::QuoteSingle => "'",
            TokenKind::StringFragment => "string fragment",
            TokenKind::InterpDollarOpen => "${",
            TokenKind::InterpAmpOpen => "&",
            _ => "token",
        }
    }

    pub fn is_keyword(self) -> bool {
        KEYWORDS.iter().any(|(_, kind)| *kind == self)
    }

    /// Tokens after which a `/` is a division rather than a regex
    pub fn ends_operand(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::Number
                | TokenKind::StringLiteral
                | TokenKind::Regex
                | TokenKind::QuoteDouble
                | TokenKind::QuoteSingle
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::OctetClose
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::Global
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Void
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A scanned token. `text` is exactly the source slice under `span`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range,
    pub span: Span,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(keyword("while"), Some(TokenKind::While));
        assert_eq!(keyword("incontextof"), Some(TokenKind::Incontextof));
        assert_eq!(keyword("While"), None);
        assert_eq!(keyword("foo"), None);
    }

    #[test]
    fn test_punctuators_longest_first() {
        for (i, (spelling, _)) in PUNCTUATORS.iter().enumerate() {
            for (longer, _) in &PUNCTUATORS[i + 1..] {
                assert!(
                    !(longer.starts_with(spelling) && longer.len() > spelling.len()),
                    "'{}' shadows '{}'",
                    spelling,
                    longer
                );
            }
        }
    }

    #[test]
    fn test_describe() {
        assert_eq!(TokenKind::Semicolon.describe(), ";");
        assert_eq!(TokenKind::Class.describe(), "class");
        assert_eq!(TokenKind::Eof.to_string(), "end of file");
    }
}
