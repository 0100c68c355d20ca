//! Pull-based record tokenizer
//!
//! Both trace formats are whitespace-delimited text, one record per line.
//! [`Records`] pulls one line at a time and hands its fields to a
//! [`Record`] parser. The first line that does not parse ends the stream:
//! it and everything after it are discarded without error. Blank lines are
//! skipped.

use std::io::{BufRead, Lines};
use std::marker::PhantomData;

use tracing::warn;

/// A record parsed from the whitespace-separated fields of one line.
pub(crate) trait Record: Sized {
    /// Parse `fields`, returning `None` if they do not have the expected
    /// shape.
    fn from_fields(fields: &[&str]) -> Option<Self>;

    /// Parse a full line.
    fn from_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        Self::from_fields(&fields)
    }
}

/// The `<tag> <start time>` first line of every trace log.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Header {
    pub(crate) tag: String,
    /// Wall-clock time the log was started, in seconds.
    pub(crate) start_time: f64,
}

impl Record for Header {
    fn from_fields(fields: &[&str]) -> Option<Self> {
        match fields {
            [tag, start_time] => Some(Self {
                tag: (*tag).to_string(),
                start_time: parse_time(start_time)?,
            }),
            _ => None,
        }
    }
}

/// Parse a non-negative integer count.
pub(crate) fn parse_count(field: &str) -> Option<u64> {
    field.parse().ok()
}

/// Parse a time in seconds. Infinities and NaN are not times.
pub(crate) fn parse_time(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|t| t.is_finite())
}

#[derive(Debug)]
pub(crate) struct Records<R, T> {
    lines: Lines<R>,
    line_number: u64,
    exhausted: bool,
    truncated_at: Option<u64>,
    _record: PhantomData<T>,
}

impl<R: BufRead, T: Record> Records<R, T> {
    /// Pull records from `lines`, the first of which is line
    /// `first_line_number` of its log.
    pub(crate) fn new(lines: Lines<R>, first_line_number: u64) -> Self {
        Self {
            lines,
            line_number: first_line_number.saturating_sub(1),
            exhausted: false,
            truncated_at: None,
            _record: PhantomData,
        }
    }

    /// Pull the next record, or `None` once the input is exhausted or a line
    /// failed to parse.
    pub(crate) fn try_next_record(&mut self) -> Option<T> {
        if self.exhausted {
            return None;
        }
        loop {
            let line = match self.lines.next() {
                None => {
                    self.exhausted = true;
                    return None;
                }
                Some(Err(err)) => {
                    warn!(
                        "Read failed after line {line}, ignoring the rest of the log: {err}",
                        line = self.line_number
                    );
                    self.exhausted = true;
                    self.truncated_at = Some(self.line_number + 1);
                    return None;
                }
                Some(Ok(line)) => line,
            };
            self.line_number += 1;

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if let Some(record) = T::from_fields(&fields) {
                return Some(record);
            }

            warn!(
                "Malformed record at line {line_number}, ignoring the rest of the log: {line:?}",
                line_number = self.line_number
            );
            self.exhausted = true;
            self.truncated_at = Some(self.line_number);
            return None;
        }
    }

    /// The line at which reading stopped early, if it did.
    pub(crate) fn truncated_at(&self) -> Option<u64> {
        self.truncated_at
    }
}

impl<R: BufRead, T: Record> Iterator for Records<R, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next_record()
    }
}
