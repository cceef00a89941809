//! Diagnostics library for TJS analysis
//!
//! Diagnostics are plain values addressed by editor ranges:
//! - Multiple severity levels (Error, Warning, Info, Hint), defaulting to Error
//! - Optional stable codes, labels, notes and help lines
//! - Source snippets with underlines when rendered through [`ErrorFormatter`]
//! - Serializable, so tooling can ship them as JSON

use serde::{Deserialize, Serialize};
use std::fmt;

pub use source_map::{FileId, Position, Range, SourceFile, SourceMap};

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    #[default]
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Info => write!(f, "info"),
            DiagnosticSeverity::Hint => write!(f, "hint"),
        }
    }
}

/// Style for diagnostic labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelStyle {
    Primary,
    Secondary,
}

/// A label that points to a range of code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub range: Range,
    pub message: String,
    pub style: LabelStyle,
}

impl Label {
    pub fn primary(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    pub fn secondary(range: Range, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

/// A diagnostic message anchored at a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: Range,
    pub message: String,
    #[serde(default)]
    pub severity: DiagnosticSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Plain error diagnostic
    pub fn new(range: Range, message: impl Into<String>) -> Self {
        DiagnosticBuilder::error(message, range).build()
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = &self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, " at {}: {}", self.range.start, self.message)
    }
}

/// Collection of diagnostics
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(other);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(DiagnosticSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(DiagnosticSeverity::Warning)
    }

    fn with_severity(&self, severity: DiagnosticSeverity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity == severity)
    }

    /// Sort by position, keeping insertion order for ties
    pub fn sort_by_position(&mut self) {
        self.diagnostics
            .sort_by(|a, b| a.range.start.cmp(&b.range.start));
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

/// Builder for creating diagnostics
pub struct DiagnosticBuilder {
    severity: DiagnosticSeverity,
    code: Option<String>,
    message: String,
    range: Range,
    labels: Vec<Label>,
    notes: Vec<String>,
    help: Vec<String>,
}

impl DiagnosticBuilder {
    fn with_severity(severity: DiagnosticSeverity, message: impl Into<String>, range: Range) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            range,
            labels: vec![],
            notes: vec![],
            help: vec![],
        }
    }

    pub fn error(message: impl Into<String>, range: Range) -> Self {
        Self::with_severity(DiagnosticSeverity::Error, message, range)
    }

    pub fn warning(message: impl Into<String>, range: Range) -> Self {
        Self::with_severity(DiagnosticSeverity::Warning, message, range)
    }

    pub fn info(message: impl Into<String>, range: Range) -> Self {
        Self::with_severity(DiagnosticSeverity::Info, message, range)
    }

    pub fn hint(message: impl Into<String>, range: Range) -> Self {
        Self::with_severity(DiagnosticSeverity::Hint, message, range)
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn label(mut self, range: Range, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(range, message));
        self
    }

    pub fn secondary_label(mut self, range: Range, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(range, message));
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn help(mut self, help_msg: impl Into<String>) -> Self {
        self.help.push(help_msg.into());
        self
    }

    pub fn build(self) -> Diagnostic {
        Diagnostic {
            range: self.range,
            message: self.message,
            severity: self.severity,
            code: self.code,
            labels: self.labels,
            notes: self.notes,
            help: self.help,
        }
    }
}

/// Formatter for displaying diagnostics against a document
pub struct ErrorFormatter {
    use_colors: bool,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self { use_colors: false }
    }

    pub fn with_colors() -> Self {
        Self { use_colors: true }
    }

    pub fn format_diagnostics(&self, diagnostics: &Diagnostics, file: &SourceFile) -> String {
        let mut output = String::new();
        for (i, diagnostic) in diagnostics.iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            output.push_str(&self.format_diagnostic(diagnostic, file));
        }
        output
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic, file: &SourceFile) -> String {
        let mut output = String::new();

        let color = match diagnostic.severity {
            DiagnosticSeverity::Error => "\x1b[31m",
            DiagnosticSeverity::Warning => "\x1b[33m",
            DiagnosticSeverity::Info => "\x1b[36m",
            DiagnosticSeverity::Hint => "\x1b[32m",
        };
        let mut header = diagnostic.severity.to_string();
        if let Some(code) = &diagnostic.code {
            header.push_str(&format!("[{}]", code));
        }
        output.push_str(&self.paint(color, &header));
        output.push_str(": ");
        output.push_str(&self.paint("\x1b[1;97m", &diagnostic.message));
        output.push('\n');

        let start = diagnostic.range.start;
        let end = diagnostic.range.end;
        output.push_str(&format!(
            "  {} {}:{}\n",
            self.paint("\x1b[96m", "-->"),
            file.name,
            start
        ));

        // Source snippet, one-based line numbers in the gutter
        let line_label = (start.line + 1).to_string();
        let gutter = " ".repeat(line_label.len());
        let bar = self.paint("\x1b[96m", "|");
        output.push_str(&format!("{} {}\n", gutter, bar));

        if let Some(line) = file.get_line(start.line) {
            output.push_str(&format!(
                "{} {} {}\n",
                self.paint("\x1b[96m", &line_label),
                bar,
                line
            ));

            let line_chars = line.chars().count();
            let underline_len = if start.line == end.line {
                end.character.saturating_sub(start.character)
            } else {
                line_chars.saturating_sub(start.character)
            };
            let padding = " ".repeat(start.character.min(line_chars));
            let underline = self.paint(color, &"^".repeat(underline_len.max(1)));
            output.push_str(&format!("{} {} {}{}", gutter, bar, padding, underline));

            if let Some(label) = diagnostic
                .labels
                .iter()
                .find(|l| l.style == LabelStyle::Primary)
            {
                output.push(' ');
                output.push_str(&self.paint("\x1b[1;4;31m", &label.message));
            }
            output.push('\n');
        }

        for label in diagnostic
            .labels
            .iter()
            .filter(|l| l.style == LabelStyle::Secondary)
        {
            output.push_str(&format!(
                "  {} {}:{}: {}\n",
                self.paint("\x1b[96m", "-->"),
                file.name,
                label.range.start,
                label.message
            ));
        }

        for help_msg in &diagnostic.help {
            output.push_str(&format!(
                "     {}: {}\n",
                self.paint("\x1b[32m", "help"),
                self.paint("\x1b[33m", help_msg)
            ));
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("{}: {}\n", self.paint("\x1b[34m", "note"), note));
        }

        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

// TJS-specific diagnostics
pub mod tjs;

#[cfg(test)]
mod tests {
    use super::*;

    fn range(line: usize, start: usize, end: usize) -> Range {
        Range::new(Position::new(line, start), Position::new(line, end))
    }

    #[test]
    fn test_diagnostic_builder() {
        let diagnostic = DiagnosticBuilder::error("test error", range(0, 4, 5))
            .code("E0001")
            .label(range(0, 4, 5), "here")
            .help("try this")
            .note("additional info")
            .build();

        assert_eq!(diagnostic.severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostic.code, Some("E0001".to_string()));
        assert_eq!(diagnostic.message, "test error");
        assert_eq!(diagnostic.labels.len(), 1);
        assert_eq!(diagnostic.help.len(), 1);
        assert_eq!(diagnostic.notes.len(), 1);
    }

    #[test]
    fn test_default_severity_is_error() {
        let diagnostic = Diagnostic::new(range(0, 0, 1), "oops");
        assert!(diagnostic.is_error());

        let mut all = Diagnostics::new();
        all.push(diagnostic);
        all.push(DiagnosticBuilder::warning("careful", range(1, 0, 1)).build());
        assert!(all.has_errors());
        assert_eq!(all.errors().count(), 1);
        assert_eq!(all.warnings().count(), 1);
    }

    #[test]
    fn test_formatter_plain_output() {
        let file = SourceFile::new("a.tjs".to_string(), "var x = ;\n".to_string());
        let diagnostic = DiagnosticBuilder::error("expression expected", range(0, 8, 9))
            .code("E0003")
            .build();
        let text = ErrorFormatter::new().format_diagnostic(&diagnostic, &file);

        assert!(text.starts_with("error[E0003]: expression expected"), "Output was: {}", text);
        assert!(text.contains("--> a.tjs:1:9"), "Output was: {}", text);
        assert!(text.contains("1 | var x = ;"), "Output was: {}", text);
        assert!(text.contains("        ^"), "Output was: {}", text);
    }

    #[test]
    fn test_serializes_lowercase_severity() {
        let diagnostic = Diagnostic::new(range(2, 1, 3), "bad");
        let json = serde_json::to_string(&diagnostic).unwrap();
        assert!(json.contains("\"severity\":\"error\""), "JSON was: {}", json);
        assert!(!json.contains("labels"), "JSON was: {}", json);
    }
}
