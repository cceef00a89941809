//! TJS-specific diagnostic builders
//!
//! Helper functions for the diagnostics the preprocessor and parser report,
//! each with a stable code.

use crate::{Diagnostic, DiagnosticBuilder, Range};

/// Provides common TJS diagnostic builders
pub struct TjsDiagnostics;

impl TjsDiagnostics {
    /// A specific token was required, e.g. `')' expected`
    pub fn expected_token(range: Range, expected: &str) -> Diagnostic {
        DiagnosticBuilder::error(format!("'{}' expected", expected), range)
            .code("E0001")
            .build()
    }

    /// A token that cannot appear here
    pub fn unexpected_token(range: Range, found: &str) -> Diagnostic {
        DiagnosticBuilder::error(format!("unexpected token '{}'", found), range)
            .code("E0002")
            .build()
    }

    pub fn expression_expected(range: Range) -> Diagnostic {
        DiagnosticBuilder::error("expression expected", range)
            .code("E0003")
            .build()
    }

    /// Lexical error carried by an unexpected token
    pub fn lexical(range: Range, message: &str) -> Diagnostic {
        DiagnosticBuilder::error(message.to_string(), range)
            .code("E0004")
            .build()
    }

    /// Nesting beyond what the recursive-descent parsers accept
    pub fn nesting_too_deep(range: Range) -> Diagnostic {
        DiagnosticBuilder::error("nesting too deep", range)
            .code("E0005")
            .build()
    }

    /// Syntax or evaluation error inside a macro expression
    pub fn macro_error(range: Range, message: impl Into<String>) -> Diagnostic {
        DiagnosticBuilder::error(message, range).code("E0010").build()
    }

    pub fn unmatched_endif(range: Range) -> Diagnostic {
        DiagnosticBuilder::error("unmatched 'endif'.", range)
            .code("E0011")
            .help("remove this '@endif' or add a matching '@if(...)'")
            .build()
    }

    pub fn endif_expected(range: Range, opened_at: Option<Range>) -> Diagnostic {
        let mut builder = DiagnosticBuilder::error("'endif' expected", range).code("E0012");
        if let Some(opened) = opened_at {
            builder = builder.secondary_label(opened, "'@if' opened here");
        }
        builder.build()
    }

    pub fn unsupported_macro(range: Range, name: &str) -> Diagnostic {
        DiagnosticBuilder::error(format!("unsupported macro: '{}'", name), range)
            .code("E0013")
            .note("supported directives are '@set', '@if' and '@endif'")
            .build()
    }

    /// `@set`/`@if` without parameters
    pub fn directive_needs_parameters(range: Range, name: &str) -> Diagnostic {
        DiagnosticBuilder::error(format!("'{}' should have parameters.", name), range)
            .code("E0014")
            .build()
    }

    /// `@endif(...)`
    pub fn directive_takes_no_parameters(range: Range, name: &str) -> Diagnostic {
        DiagnosticBuilder::error(format!("'{}' should not have parameters.", name), range)
            .code("E0014")
            .build()
    }

    pub fn variadic_not_last(range: Range) -> Diagnostic {
        DiagnosticBuilder::error("variadic parameter should be the last parameter", range)
            .code("E0020")
            .build()
    }

    pub fn variadic_with_default(range: Range) -> Diagnostic {
        DiagnosticBuilder::error("variadic parameter cannot have a default value", range)
            .code("E0021")
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    #[test]
    fn test_codes_are_stable() {
        let range = Range::new(Position::new(0, 0), Position::new(0, 1));
        assert_eq!(TjsDiagnostics::expected_token(range, ";").message, "';' expected");
        assert_eq!(TjsDiagnostics::expected_token(range, ";").code.as_deref(), Some("E0001"));
        assert_eq!(TjsDiagnostics::unmatched_endif(range).code.as_deref(), Some("E0011"));
        assert_eq!(TjsDiagnostics::nesting_too_deep(range).code.as_deref(), Some("E0005"));
        assert_eq!(
            TjsDiagnostics::unsupported_macro(range, "foo").message,
            "unsupported macro: 'foo'"
        );
    }

    #[test]
    fn test_endif_expected_points_at_opening_if() {
        let here = Range::new(Position::new(3, 0), Position::new(3, 0));
        let opened = Range::new(Position::new(0, 0), Position::new(0, 6));
        let diagnostic = TjsDiagnostics::endif_expected(here, Some(opened));
        assert_eq!(diagnostic.labels.len(), 1);
        assert_eq!(diagnostic.labels[0].range, opened);
    }
}
