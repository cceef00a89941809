//! Source mapping utilities for document analysis
//!
//! This library provides document tracking and position mapping for the
//! analysis pipeline. Positions are editor-style: zero-based lines and
//! zero-based character columns counted in `char`s. Byte offsets are kept
//! separately in [`Span`] so that token text can be sliced straight out of
//! the document.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A zero-based line/character position in a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// A half-open range `[start, end)` of positions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width range at `pos`
    pub fn empty(pos: Position) -> Self {
        Self { start: pos, end: pos }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Smallest range covering both
    pub fn merge(self, other: Range) -> Range {
        Range::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Orders the range relative to a position: `Greater` when the range lies
    /// entirely after `pos`, `Less` when it ends at or before `pos`, `Equal`
    /// when it contains `pos`.
    pub fn compare_position(&self, pos: Position) -> Ordering {
        if self.start > pos {
            Ordering::Greater
        } else if self.end <= pos {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Binary search over `len` ordered, non-overlapping ranges.
///
/// `range_at(i)` yields the i-th range. Returns the index of the range
/// containing `pos`, if any.
pub fn binary_search_position<F>(len: usize, range_at: F, pos: Position) -> Option<usize>
where
    F: Fn(usize) -> Range,
{
    let mut lo = 0usize;
    let mut hi = len;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match range_at(mid).compare_position(pos) {
            Ordering::Equal => return Some(mid),
            Ordering::Greater => hi = mid,
            Ordering::Less => lo = mid + 1,
        }
    }
    None
}

/// Byte-offset span into a document's text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Unique identifier for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(usize);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

/// A document's text with precomputed line starts
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
    pub line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: String, content: String) -> Self {
        let line_starts = compute_line_starts(&content);
        Self {
            name,
            content,
            line_starts,
        }
    }

    /// Text of a zero-based line without its line break
    pub fn get_line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.content.len());
        Some(self.content[start..end].trim_end_matches(['\n', '\r']))
    }
}

/// Documents known to one analysis session
#[derive(Debug, Clone)]
pub struct SourceMap {
    files: HashMap<FileId, SourceFile>,
    names: HashMap<String, FileId>,
    next_id: usize,
}

impl SourceMap {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            names: HashMap::new(),
            next_id: 0,
        }
    }

    /// Add a document, replacing any previous one with the same name
    pub fn add_file(&mut self, name: String, content: String) -> FileId {
        if let Some(&existing) = self.names.get(&name) {
            self.files.insert(existing, SourceFile::new(name, content));
            return existing;
        }
        let file_id = FileId(self.next_id);
        self.next_id += 1;
        self.names.insert(name.clone(), file_id);
        self.files.insert(file_id, SourceFile::new(name, content));
        file_id
    }

    pub fn get_file(&self, file_id: FileId) -> Option<&SourceFile> {
        self.files.get(&file_id)
    }

    /// Get a zero-based line from a file
    pub fn get_line(&self, file_id: FileId, line: usize) -> Option<&str> {
        self.get_file(file_id)?.get_line(line)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Default for SourceMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute line start offsets. `\r\n`, `\n\r`, `\r` and `\n` each end one line.
fn compute_line_starts(source: &str) -> Vec<usize> {
    let bytes = source.as_bytes();
    let mut line_starts = vec![0];
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' | b'\n' => {
                let pair = if bytes[i] == b'\r' { b'\n' } else { b'\r' };
                i += if bytes.get(i + 1) == Some(&pair) { 2 } else { 1 };
                line_starts.push(i);
            }
            _ => i += 1,
        }
    }
    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, character: usize) -> Position {
        Position::new(line, character)
    }

    #[test]
    fn test_source_map_basic() {
        let mut source_map = SourceMap::new();
        let file_id = source_map.add_file("test.tjs".to_string(), "line 1\nline 2\r\nline 3".to_string());

        assert_eq!(source_map.get_line(file_id, 0), Some("line 1"));
        assert_eq!(source_map.get_line(file_id, 1), Some("line 2"));
        assert_eq!(source_map.get_line(file_id, 2), Some("line 3"));
        assert_eq!(source_map.get_line(file_id, 3), None);
    }

    #[test]
    fn test_mixed_line_breaks() {
        let file = SourceFile::new("a.tjs".to_string(), "a\r\nb\n\rc\rd".to_string());
        assert_eq!(file.get_line(2), Some("c"));
        assert_eq!(file.get_line(3), Some("d"));
        assert_eq!(file.get_line(4), None);
    }

    #[test]
    fn test_range_compare_and_contains() {
        let range = Range::new(pos(1, 2), pos(1, 5));
        assert!(range.contains(pos(1, 2)));
        assert!(!range.contains(pos(1, 5)));
        assert_eq!(range.compare_position(pos(0, 9)), Ordering::Greater);
        assert_eq!(range.compare_position(pos(1, 5)), Ordering::Less);
        assert_eq!(range.compare_position(pos(1, 3)), Ordering::Equal);
    }

    #[test]
    fn test_binary_search_position() {
        let ranges = [
            Range::new(pos(0, 0), pos(0, 3)),
            Range::new(pos(0, 4), pos(0, 6)),
            Range::new(pos(2, 0), pos(2, 1)),
        ];
        let find = |p| binary_search_position(ranges.len(), |i| ranges[i], p);
        assert_eq!(find(pos(0, 1)), Some(0));
        assert_eq!(find(pos(0, 5)), Some(1));
        assert_eq!(find(pos(2, 0)), Some(2));
        assert_eq!(find(pos(0, 3)), None);
        assert_eq!(find(pos(5, 0)), None);
        assert_eq!(binary_search_position(0, |i| ranges[i], pos(0, 0)), None);
    }

    #[test]
    fn test_span_merge() {
        let merged = Span::new(0, 4).merge(Span::new(2, 7));
        assert_eq!(merged, Span::new(0, 7));
        assert_eq!(merged.len(), 7);
    }

    #[test]
    fn test_multiple_files() {
        let mut source_map = SourceMap::new();
        let file1 = source_map.add_file("file1.tjs".to_string(), "content1".to_string());
        let file2 = source_map.add_file("file2.tjs".to_string(), "content2".to_string());

        assert_eq!(source_map.len(), 2);
        assert_eq!(source_map.get_file(file1).unwrap().name, "file1.tjs");
        assert_ne!(file1, file2);

        let again = source_map.add_file("file1.tjs".to_string(), "changed".to_string());
        assert_eq!(again, file1);
        assert_eq!(source_map.get_line(file1, 0), Some("changed"));
    }
}
