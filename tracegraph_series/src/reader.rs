//! Trace log readers
//!
//! The table log is written by the server for one traced table:
//!
//! ```text
//! START 1262304000.000000
//! IN 0 0.000000
//! IN 120 0.250000
//! OUT 0 0.300000
//! ```
//!
//! The client log is written by the load generating client:
//!
//! ```text
//! START 1262304002.000000
//! 0 0.000000
//! 100 0.120000
//! ```
//!
//! Times on data lines are seconds elapsed since the start time of their
//! own log. A line that does not parse ends the log, everything after it is
//! ignored. This keeps a log whose writer died mid-line usable, at the price
//! of silently truncating a log corrupted in the middle.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::record::{Header, Record, Records, parse_count, parse_time};
use crate::sample::{Origin, Sample, Series, TraceBounds};

/// Errors produced while reading a trace log
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The log could not be opened or read.
    #[error("Trace log {path:?} could not be read: {source}")]
    NotFound {
        /// Log path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
    /// The first line of the log is not a `<tag> <start time>` pair.
    #[error("Trace log {path:?} has a malformed header: {line:?}")]
    MalformedHeader {
        /// Log path
        path: PathBuf,
        /// The offending first line, empty when the log is empty
        line: String,
    },
}

/// The tag of a table log data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Tag {
    In,
    Out,
    Other,
}

/// A `<tag> <count> <elapsed time>` table log line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TableRecord {
    tag: Tag,
    sample: Sample,
}

impl Record for TableRecord {
    fn from_fields(fields: &[&str]) -> Option<Self> {
        match fields {
            [tag, count, time] => {
                let tag = match *tag {
                    "IN" => Tag::In,
                    "OUT" => Tag::Out,
                    _ => Tag::Other,
                };
                Some(Self {
                    tag,
                    sample: Sample::new(parse_time(time)?, parse_count(count)?),
                })
            }
            _ => None,
        }
    }
}

/// A `<count> <elapsed time>` client log line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ClientRecord(Sample);

impl Record for ClientRecord {
    fn from_fields(fields: &[&str]) -> Option<Self> {
        match fields {
            [count, time] => Some(Self(Sample::new(parse_time(time)?, parse_count(count)?))),
            _ => None,
        }
    }
}

/// The contents of a table log.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLog {
    /// Messages written into the table.
    pub inbound: Series,
    /// Messages flushed out of the table.
    pub outbound: Series,
    /// Wall-clock start of the log, in seconds.
    pub start_time: f64,
    /// Maxima across every `IN` and `OUT` line.
    pub bounds: TraceBounds,
}

/// The contents of a client log.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientLog {
    /// Messages observed by the client, on the client's own clock.
    pub series: Series,
    /// Wall-clock start of the log, in seconds.
    pub start_time: f64,
}

fn open(path: &Path) -> Result<BufReader<File>, Error> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| Error::NotFound {
            path: path.to_path_buf(),
            source,
        })
}

fn read_header<R: BufRead>(reader: &mut R, path: &Path) -> Result<Header, Error> {
    let mut raw = Vec::new();
    reader
        .read_until(b'\n', &mut raw)
        .map_err(|source| Error::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
    // The tag is never interpreted, only the start time has to be text.
    let line = String::from_utf8_lossy(&raw);
    let line = line.trim_end_matches(['\n', '\r']);
    let header = Header::from_line(line).ok_or_else(|| Error::MalformedHeader {
        path: path.to_path_buf(),
        line: line.to_string(),
    })?;
    debug!(
        "Trace log {path:?} tagged {tag} starts at {start}",
        tag = header.tag,
        start = header.start_time
    );
    Ok(header)
}

/// Read the table log at `path`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the log cannot be opened and
/// [`Error::MalformedHeader`] if its first line is not a tag and start time.
pub fn read_table_log<P: AsRef<Path>>(path: P) -> Result<TableLog, Error> {
    let path = path.as_ref();
    TableLog::from_reader(open(path)?, path)
}

/// Read the client log at `path`.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the log cannot be opened and
/// [`Error::MalformedHeader`] if its first line is not a tag and start time.
pub fn read_client_log<P: AsRef<Path>>(path: P) -> Result<ClientLog, Error> {
    let path = path.as_ref();
    ClientLog::from_reader(open(path)?, path)
}

impl TableLog {
    /// Read a table log from `reader`. `path` is only used to report errors.
    ///
    /// # Errors
    ///
    /// See [`read_table_log`].
    pub fn from_reader<R: BufRead>(mut reader: R, path: &Path) -> Result<Self, Error> {
        let header = read_header(&mut reader, path)?;
        let lines = reader.lines();

        let mut inbound = Series::new(Origin::TableIn);
        let mut outbound = Series::new(Origin::TableOut);
        let mut bounds = TraceBounds::default();
        let mut ignored = 0_u64;

        let mut records: Records<R, TableRecord> = Records::new(lines, 2);
        while let Some(TableRecord { tag, sample }) = records.try_next_record() {
            match tag {
                Tag::In => {
                    bounds.observe(sample);
                    inbound.push(sample);
                }
                Tag::Out => {
                    bounds.observe(sample);
                    outbound.push(sample);
                }
                Tag::Other => ignored += 1,
            }
        }

        info!(
            "Read table log {path:?}: {inbound} inbound, {outbound} outbound, {ignored} ignored",
            inbound = inbound.len(),
            outbound = outbound.len(),
        );
        if let Some(line) = records.truncated_at() {
            debug!("Table log {path:?} truncated at line {line}");
        }

        Ok(Self {
            inbound,
            outbound,
            start_time: header.start_time,
            bounds,
        })
    }
}

impl ClientLog {
    /// Read a client log from `reader`. `path` is only used to report errors.
    ///
    /// # Errors
    ///
    /// See [`read_client_log`].
    pub fn from_reader<R: BufRead>(mut reader: R, path: &Path) -> Result<Self, Error> {
        let header = read_header(&mut reader, path)?;
        let lines = reader.lines();

        let mut series = Series::new(Origin::Client);
        let mut records: Records<R, ClientRecord> = Records::new(lines, 2);
        while let Some(ClientRecord(sample)) = records.try_next_record() {
            series.push(sample);
        }

        info!(
            "Read client log {path:?}: {samples} samples",
            samples = series.len()
        );
        if let Some(line) = records.truncated_at() {
            debug!("Client log {path:?} truncated at line {line}");
        }

        Ok(Self {
            series,
            start_time: header.start_time,
        })
    }
}
