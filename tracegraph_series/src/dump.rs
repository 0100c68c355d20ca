//! JSONL dump of a session
//!
//! This format writes one JSON object per line, each line a single point of
//! a cumulative or rate series. Traces are written table-in, table-out,
//! client, with the counts of a trace ahead of its rates.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::sample::Origin;
use crate::session::{SessionResult, Trace};

/// JSONL dump errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// IO errors during write operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// The kind of series a [`Point`] belongs to.
pub enum PointKind {
    /// A cumulative count.
    Count,
    /// A derived rate.
    Rate,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
/// The structure of a dump line.
pub struct Point {
    /// The counter this point belongs to.
    pub origin: Origin,
    /// Whether this point is a count or a rate.
    pub kind: PointKind,
    /// Elapsed time on the table log's clock, in seconds.
    pub time: f64,
    /// The count or rate at `time`.
    pub value: f64,
}

/// JSONL dump writer
#[derive(Debug)]
pub struct Format<W: Write> {
    writer: W,
}

impl<W: Write> Format<W> {
    /// Create a new instance of `Format`
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single point to the output
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn write_point(&mut self, point: &Point) -> Result<(), Error> {
        let payload = serde_json::to_string(point)?;
        self.writer.write_all(payload.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write every point of `trace`, returning the number of points written
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn write_trace(&mut self, trace: &Trace) -> Result<usize, Error> {
        let origin = trace.counts.origin();
        for sample in trace.counts.samples() {
            self.write_point(&Point {
                origin,
                kind: PointKind::Count,
                time: sample.time,
                value: sample.count as f64,
            })?;
        }
        for point in trace.rates.points() {
            self.write_point(&Point {
                origin,
                kind: PointKind::Rate,
                time: point.time,
                value: point.rate,
            })?;
        }
        Ok(trace.counts.len() + trace.rates.len())
    }

    /// Write every trace of `session` and flush, returning the number of
    /// points written
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing or flushing fails
    pub fn write_session(&mut self, session: &SessionResult) -> Result<usize, Error> {
        let mut written = 0;
        for trace in session.traces() {
            written += self.write_trace(trace)?;
        }
        self.flush()?;
        Ok(written)
    }

    /// Flush any buffered data to disk
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails
    pub fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}
