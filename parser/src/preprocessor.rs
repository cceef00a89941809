//! TJS macro preprocessor
//!
//! Handles the `@set(...)`, `@if(...)` and `@endif` directives before lexing.
//!
//! The output chunk has exactly the same characters-per-line layout as the
//! input: directives and disabled code are replaced by spaces, line breaks
//! are kept. Every position the lexer reports on the output is therefore a
//! valid position in the original document.
//!
//! Besides the chunk, the preprocessor reports the disabled ranges (the
//! bodies of `@if` blocks whose condition was zero) so editors can dim them.

use diagnostics::{tjs::TjsDiagnostics, Diagnostic};
use log::{debug, trace};
use source_map::Range;

use crate::cursor::Cursor;
use crate::define_list::DefineList;
use crate::lexer::{is_ident_part, is_ident_start};
use crate::macro_parser::MacroParser;

/// Configuration for a preprocessing run
#[derive(Debug, Clone, Default)]
pub struct PreprocessorConfig {
    /// Defines visible before the first directive
    pub defines: DefineList,
}

/// Everything a preprocessing run produces
#[derive(Debug, Clone)]
pub struct PreprocessorOutput {
    /// Transformed text, same length and line layout as the input
    pub chunk: String,
    /// Define table after all active directives ran
    pub defines: DefineList,
    /// Ranges of code excluded by `@if`, ordered and non-overlapping
    pub disabled_ranges: Vec<Range>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
struct IfFrame {
    taken: bool,
    /// Set only on the frame that switched the text off
    disabled_start: Option<source_map::Position>,
    directive: Range,
}

/// Preprocess TJS source text
///
/// # Example
/// ```
/// use parser::preprocessor::{preprocess, PreprocessorConfig};
///
/// let output = preprocess("test.tjs", "@if(0) a(); @endif b();", &PreprocessorConfig::default());
/// assert!(!output.chunk.contains("a()"));
/// assert!(output.chunk.ends_with(" b();"));
/// assert_eq!(output.disabled_ranges.len(), 1);
/// ```
pub fn preprocess(chunk_name: &str, source: &str, config: &PreprocessorConfig) -> PreprocessorOutput {
    Preprocessor::new(chunk_name, source, config.defines.clone()).run()
}

pub struct Preprocessor<'a> {
    chunk_name: String,
    cursor: Cursor<'a>,
    output: String,
    defines: DefineList,
    if_stack: Vec<IfFrame>,
    disabled_ranges: Vec<Range>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(chunk_name: impl Into<String>, chunk: &'a str, defines: DefineList) -> Self {
        Self {
            chunk_name: chunk_name.into(),
            cursor: Cursor::new(chunk),
            output: String::with_capacity(chunk.len()),
            defines,
            if_stack: vec![],
            disabled_ranges: vec![],
            diagnostics: vec![],
        }
    }

    pub fn run(mut self) -> PreprocessorOutput {
        debug!("preprocessing {}", self.chunk_name);

        while let Some(c) = self.cursor.peek() {
            match c {
                '@' => match self.cursor.peek_nth(1) {
                    Some('"' | '\'') => self.copy_to_line_end(),
                    Some(next) if is_ident_start(next) => self.directive(),
                    _ => self.copy_one(),
                },
                '"' | '\'' => self.string(c),
                '/' if self.cursor.starts_with("//") => self.copy_to_line_end(),
                '/' if self.cursor.starts_with("/*") => self.block_comment(),
                _ => self.copy_one(),
            }
        }

        self.finish_at_eof();
        debug!(
            "preprocessed {}: {} disabled ranges, {} diagnostics",
            self.chunk_name,
            self.disabled_ranges.len(),
            self.diagnostics.len()
        );

        PreprocessorOutput {
            chunk: self.output,
            defines: self.defines,
            disabled_ranges: self.disabled_ranges,
            diagnostics: self.diagnostics,
        }
    }

    fn active(&self) -> bool {
        self.if_stack.iter().all(|frame| frame.taken)
    }

    fn take_one(&mut self, blank: bool) {
        let Some(piece) = self.cursor.bump() else {
            return;
        };
        if blank {
            self.output.extend(
                piece
                    .chars()
                    .map(|c| if c == '\r' || c == '\n' { c } else { ' ' }),
            );
        } else {
            self.output.push_str(piece);
        }
    }

    fn take_until(&mut self, end: usize, blank: bool) {
        while !self.cursor.is_eof() && self.cursor.offset() < end {
            self.take_one(blank);
        }
    }

    fn copy_one(&mut self) {
        let blank = !self.active();
        self.take_one(blank);
    }

    /// Copy up to, not including, the next line break
    fn copy_to_line_end(&mut self) {
        let blank = !self.active();
        while !self.cursor.is_eof() && !self.cursor.at_line_break() {
            self.take_one(blank);
        }
    }

    fn block_comment(&mut self) {
        let blank = !self.active();
        let start = self.cursor.offset();
        let end = self.cursor.rest()[2..]
            .find("*/")
            .map_or(self.cursor.text().len(), |at| start + 2 + at + 2);
        self.take_until(end, blank);
    }

    /// A quoted string on one line; directives inside are not recognized
    fn string(&mut self, quote: char) {
        let rest = self.cursor.rest();
        let mut chars = rest.char_indices().skip(1);
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '\r' | '\n' => break,
                '\\' => match chars.next() {
                    Some((_, '\r' | '\n')) | None => break,
                    Some(_) => {}
                },
                c if c == quote => {
                    end = Some(self.cursor.offset() + i + c.len_utf8());
                    break;
                }
                _ => {}
            }
        }
        match end {
            Some(end) => {
                let blank = !self.active();
                self.take_until(end, blank);
            }
            None => self.copy_to_line_end(),
        }
    }

    fn directive(&mut self) {
        let start = self.cursor.state();
        let was_active = self.active();

        let rest = self.cursor.rest();
        let name_len = rest[1..]
            .char_indices()
            .find(|(_, c)| !is_ident_part(*c))
            .map_or(rest.len() - 1, |(i, _)| i);
        let name = rest[1..1 + name_len].to_string();
        let spaces = rest[1 + name_len..]
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .count();
        self.take_until(start.offset + 1 + name_len + spaces, true);

        if self.cursor.peek() == Some('(') {
            // Directives in disabled code must not leak assignments
            let mut isolated = None;
            let defines = if was_active {
                &mut self.defines
            } else {
                isolated.insert(self.defines.clone())
            };
            let outcome = MacroParser::new(
                &self.chunk_name,
                self.cursor.text(),
                self.cursor.state(),
                defines,
            )
            .parse();
            self.take_until(outcome.end.offset, true);

            let range = Range::new(start.position, self.cursor.position());
            trace!("directive @{} at {} -> {:?}", name, range, outcome.result.as_ref().map_err(|d| &d.message));
            match outcome.result {
                Ok(value) => self.apply_with_value(&name, value, range),
                Err(diagnostic) => {
                    self.diagnostics.push(diagnostic);
                    match name.as_str() {
                        "if" => self.push_if(true, range),
                        "endif" => self.pop_if(range),
                        _ => {}
                    }
                }
            }
        } else {
            let range = Range::new(start.position, self.cursor.position());
            trace!("directive @{} at {} without parameters", name, range);
            match name.as_str() {
                "set" | "if" => {
                    self.diagnostics
                        .push(TjsDiagnostics::directive_needs_parameters(range, &name));
                    if name == "if" {
                        self.push_if(true, range);
                    }
                }
                "endif" => self.pop_if(range),
                _ => self
                    .diagnostics
                    .push(TjsDiagnostics::unsupported_macro(range, &name)),
            }
        }
    }

    fn apply_with_value(&mut self, name: &str, value: i64, range: Range) {
        match name {
            "set" => {}
            "if" => self.push_if(value != 0, range),
            "endif" => {
                self.diagnostics
                    .push(TjsDiagnostics::directive_takes_no_parameters(range, name));
                self.pop_if(range);
            }
            _ => self
                .diagnostics
                .push(TjsDiagnostics::unsupported_macro(range, name)),
        }
    }

    fn push_if(&mut self, taken: bool, directive: Range) {
        let disabled_start = (self.active() && !taken).then_some(directive.end);
        self.if_stack.push(IfFrame {
            taken,
            disabled_start,
            directive,
        });
    }

    fn pop_if(&mut self, directive: Range) {
        match self.if_stack.pop() {
            Some(frame) => {
                if let Some(start) = frame.disabled_start {
                    self.disabled_ranges.push(Range::new(start, directive.start));
                }
            }
            None => self
                .diagnostics
                .push(TjsDiagnostics::unmatched_endif(directive)),
        }
    }

    fn finish_at_eof(&mut self) {
        let eof = self.cursor.position();
        if let Some(innermost) = self.if_stack.last() {
            self.diagnostics.push(TjsDiagnostics::endif_expected(
                Range::empty(eof),
                Some(innermost.directive),
            ));
        }
        if let Some(start) = self
            .if_stack
            .iter()
            .find_map(|frame| frame.disabled_start)
        {
            self.disabled_ranges.push(Range::new(start, eof));
        }
        self.if_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source_map::Position;

    fn run(source: &str) -> PreprocessorOutput {
        preprocess("test.tjs", source, &PreprocessorConfig::default())
    }

    fn messages(output: &PreprocessorOutput) -> Vec<String> {
        output.diagnostics.iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn test_if_false_blanks_body() {
        let result = run("@if(0) X @endif");
        assert_eq!(result.chunk, " ".repeat(15));
        assert_eq!(
            result.disabled_ranges,
            vec![Range::new(Position::new(0, 6), Position::new(0, 9))]
        );
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_if_true_keeps_body() {
        let result = run("@if(1) X @endif");
        assert_eq!(result.chunk, "       X       ");
        assert!(result.disabled_ranges.is_empty());
    }

    #[test]
    fn test_set_feeds_later_if() {
        let result = run("@set(DEBUG=1)\n@if(DEBUG)\nlog();\n@endif\n");
        assert!(result.chunk.contains("log();"), "Result was: {}", result.chunk);
        assert_eq!(result.defines.get("DEBUG"), 1);
    }

    #[test]
    fn test_length_and_newlines_preserved() {
        let source = "a\r\n@if(0)\r\nb = \"é\";\n\r@endif c\rd";
        let result = run(source);
        assert_eq!(result.chunk.chars().count(), source.chars().count());
        let breaks = |s: &str| -> Vec<usize> {
            s.chars()
                .enumerate()
                .filter(|(_, c)| *c == '\r' || *c == '\n')
                .map(|(i, _)| i)
                .collect()
        };
        assert_eq!(breaks(&result.chunk), breaks(source));
        assert!(!result.chunk.contains('b'), "Result was: {:?}", result.chunk);
        assert!(result.chunk.ends_with("c\rd"), "Result was: {:?}", result.chunk);
    }

    #[test]
    fn test_nested_disabled_regions_do_not_overlap() {
        let result = run("@if(0)\n@if(1)\nx\n@endif\n@endif\ny");
        assert_eq!(result.disabled_ranges.len(), 1);
        assert_eq!(
            result.disabled_ranges[0],
            Range::new(Position::new(0, 6), Position::new(4, 0))
        );
        assert!(result.chunk.ends_with('y'));
        assert!(!result.chunk.contains('x'));
    }

    #[test]
    fn test_disabled_directives_have_no_side_effects() {
        let result = run("@if(0)\n@set(A=5)\n@endif\n@if(A)\nz\n@endif");
        assert_eq!(result.defines.get("A"), 0);
        assert!(!result.chunk.contains('z'));
    }

    #[test]
    fn test_directives_inside_strings_and_comments_ignored() {
        let result = run("s = \"@if(0)\"; // @if(0)\n/* @if(0) */ t = '@set(x=1)';");
        assert!(result.diagnostics.is_empty(), "{:?}", messages(&result));
        assert!(result.disabled_ranges.is_empty());
        assert_eq!(result.chunk, "s = \"@if(0)\"; // @if(0)\n/* @if(0) */ t = '@set(x=1)';");
    }

    #[test]
    fn test_interpolated_string_line_is_verbatim() {
        let result = run("x = @\"${a} @if(0)\";\ny");
        assert_eq!(result.chunk, "x = @\"${a} @if(0)\";\ny");
    }

    #[test]
    fn test_unmatched_endif() {
        let result = run("a @endif b");
        assert_eq!(messages(&result), vec!["unmatched 'endif'."]);
        assert_eq!(result.chunk, "a        b");
    }

    #[test]
    fn test_missing_endif_closes_region_at_eof() {
        let result = run("@if(0)\nabc");
        assert_eq!(messages(&result), vec!["'endif' expected"]);
        assert_eq!(
            result.disabled_ranges,
            vec![Range::new(Position::new(0, 6), Position::new(1, 3))]
        );
    }

    #[test]
    fn test_directive_parameter_rules() {
        let result = run("@set\n@if\n@endif(1)\n@foo(1)\n@bar");
        assert_eq!(
            messages(&result),
            vec![
                "'set' should have parameters.",
                "'if' should have parameters.",
                "'endif' should not have parameters.",
                "unsupported macro: 'foo'",
                "unsupported macro: 'bar'",
            ]
        );
        assert!(result.disabled_ranges.is_empty());
    }

    #[test]
    fn test_failed_if_still_matches_endif() {
        let result = run("@if(1 +)\nkeep\n@endif");
        assert_eq!(messages(&result), vec!["number or identifier expected."]);
        assert!(result.chunk.contains("keep"));
    }

    #[test]
    fn test_external_defines() {
        let config = PreprocessorConfig {
            defines: [("KIRIKIRIZ", 1)].into_iter().collect(),
        };
        let result = preprocess("t", "@if(!KIRIKIRIZ)old();@endif", &config);
        assert!(!result.chunk.contains("old"));
    }
}
