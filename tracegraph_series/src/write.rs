//! Trace log writers
//!
//! The writing side of the formats read by [`crate::reader`]. Both logs open
//! with `START <wall-clock seconds>` and record elapsed times with six
//! decimals.

use std::io::{self, Write};

/// Tag written on the first line of every trace log.
pub const START_TAG: &str = "START";

fn write_header<W: Write>(writer: &mut W, start_time: f64) -> io::Result<()> {
    writeln!(writer, "{START_TAG} {start_time:.6}")
}

/// Writer of a table log
#[derive(Debug)]
pub struct TableTraceWriter<W: Write> {
    writer: W,
}

impl<W: Write> TableTraceWriter<W> {
    /// Create a new `TableTraceWriter`, writing the header immediately
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn new(mut writer: W, start_time: f64) -> io::Result<Self> {
        write_header(&mut writer, start_time)?;
        Ok(Self { writer })
    }

    /// Record that `count` messages had entered the table `elapsed` seconds
    /// after the start.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn inbound(&mut self, count: u64, elapsed: f64) -> io::Result<()> {
        writeln!(self.writer, "IN {count} {elapsed:.6}")
    }

    /// Record that `count` messages had left the table `elapsed` seconds
    /// after the start.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn outbound(&mut self, count: u64, elapsed: f64) -> io::Result<()> {
        writeln!(self.writer, "OUT {count} {elapsed:.6}")
    }

    /// Flush any buffered data
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Recover the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Writer of a client log
#[derive(Debug)]
pub struct ClientTraceWriter<W: Write> {
    writer: W,
}

impl<W: Write> ClientTraceWriter<W> {
    /// Create a new `ClientTraceWriter`, writing the header immediately
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn new(mut writer: W, start_time: f64) -> io::Result<Self> {
        write_header(&mut writer, start_time)?;
        Ok(Self { writer })
    }

    /// Record that the client had seen `count` messages `elapsed` seconds
    /// after the start.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn observed(&mut self, count: u64, elapsed: f64) -> io::Result<()> {
        writeln!(self.writer, "{count} {elapsed:.6}")
    }

    /// Flush any buffered data
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Recover the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}
