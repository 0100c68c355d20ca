//! One pass from trace logs to drawable series
//!
//! A session reads the table and client logs, moves the client onto the
//! table's clock and derives a rate series for each of the three counters.
//! Reading errors are returned as-is, there is no partial session.

use std::path::Path;

use tracing::info;

use crate::align::align;
use crate::rate::{RateConfig, derive};
use crate::reader::{self, ClientLog, TableLog, read_client_log, read_table_log};
use crate::sample::{Origin, RateSeries, Series, TraceBounds};

/// Table log read when no path is given.
pub const DEFAULT_TABLE_LOG: &str = "reply_hdr.trace";

/// Client log read when no path is given.
pub const DEFAULT_CLIENT_LOG: &str = "timing.dat";

/// A series paired with the rate derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// Cumulative counts, on the table log's clock.
    pub counts: Series,
    /// The rate derived from `counts`.
    pub rates: RateSeries,
}

impl Trace {
    fn new(counts: Series, config: &RateConfig) -> Self {
        let rates = derive(&counts, config);
        Self { counts, rates }
    }
}

/// Everything a chart needs from one pair of trace logs.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    /// Messages written into the table.
    pub table_in: Trace,
    /// Messages flushed out of the table.
    pub table_out: Trace,
    /// Messages observed by the client, aligned onto the table's clock.
    pub client: Trace,
    /// Maxima of the table log.
    pub bounds: TraceBounds,
    /// Wall-clock start of the table log, the origin of every time here.
    pub table_start: f64,
    /// Wall-clock start of the client log.
    pub client_start: f64,
}

impl SessionResult {
    /// Assemble a session from logs that have already been read.
    #[must_use]
    pub fn assemble(table: TableLog, client: ClientLog, config: &RateConfig) -> Self {
        let aligned = align(&client.series, client.start_time, table.start_time);
        info!(
            "Client clock is {offset:.6}s ahead of the table clock",
            offset = client.start_time - table.start_time
        );

        Self {
            table_in: Trace::new(table.inbound, config),
            table_out: Trace::new(table.outbound, config),
            client: Trace::new(aligned, config),
            bounds: table.bounds,
            table_start: table.start_time,
            client_start: client.start_time,
        }
    }

    /// Read both logs and assemble a session from them.
    ///
    /// The table log is read first. Each log is closed before the next step
    /// begins, on success and failure alike.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while reading either log.
    pub fn run<P, Q>(table_path: P, client_path: Q, config: &RateConfig) -> Result<Self, reader::Error>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let table = read_table_log(table_path)?;
        let client = read_client_log(client_path)?;
        Ok(Self::assemble(table, client, config))
    }

    /// The trace of `origin`.
    #[must_use]
    pub fn trace(&self, origin: Origin) -> &Trace {
        match origin {
            Origin::TableIn => &self.table_in,
            Origin::TableOut => &self.table_out,
            Origin::Client => &self.client,
        }
    }

    /// Every trace, in the order table-in, table-out, client.
    pub fn traces(&self) -> impl Iterator<Item = &Trace> {
        Origin::ALL.into_iter().map(|origin| self.trace(origin))
    }
}
