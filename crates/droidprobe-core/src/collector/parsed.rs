//! Result type shared by every record parser.
//!
//! Parsers are total: they never fail on a bad line. A line that does not
//! match its grammar becomes a [`SkippedLine`] and parsing moves on. Only a
//! source with nothing usable in it yields `record: None`.

use serde::Serialize;

/// A line a parser could not use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number within the parsed text.
    pub line_no: usize,
    pub content: String,
    pub reason: &'static str,
}

impl SkippedLine {
    pub fn new(line_no: usize, content: &str, reason: &'static str) -> Self {
        Self {
            line_no,
            content: content.to_string(),
            reason,
        }
    }
}

/// Output of a record parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub record: Option<T>,
    pub skipped: Vec<SkippedLine>,
}

impl<T> Parsed<T> {
    pub fn new(record: Option<T>, skipped: Vec<SkippedLine>) -> Self {
        Self { record, skipped }
    }

    /// True when the source produced a record.
    pub fn is_usable(&self) -> bool {
        self.record.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        Parsed {
            record: self.record.map(f),
            skipped: self.skipped,
        }
    }
}
