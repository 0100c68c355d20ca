//! Canonical representation of trace observations
//!
//! This module defines the data shared by every stage of the pipeline: the
//! single counter observation, the cumulative series built from a log, the
//! step-shaped rate series derived from it and the axis bounds of a table
//! log.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
/// The counter a [`Series`] was observed from.
pub enum Origin {
    /// Messages written into the traced table.
    TableIn,
    /// Messages flushed out of the traced table.
    TableOut,
    /// Messages observed by the client.
    Client,
}

impl Origin {
    /// All origins, in the order a session reports them.
    pub const ALL: [Origin; 3] = [Origin::TableIn, Origin::TableOut, Origin::Client];

    /// Short label of this origin, e.g. `table-in`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Origin::TableIn => "table-in",
            Origin::TableOut => "table-out",
            Origin::Client => "client",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
/// A single counter observation.
pub struct Sample {
    /// Elapsed time of the observation, in seconds.
    pub time: f64,
    /// The cumulative count at `time`.
    pub count: u64,
}

impl Sample {
    /// Create a new `Sample`
    #[must_use]
    pub fn new(time: f64, count: u64) -> Self {
        Self { time, count }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One cumulative counter observed over elapsed time.
///
/// Samples are kept in the order they were read. Logs are written in time
/// order and nothing here sorts, merges or deduplicates them.
pub struct Series {
    origin: Origin,
    samples: Vec<Sample>,
}

impl Series {
    /// Create an empty `Series` for `origin`
    #[must_use]
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            samples: Vec::new(),
        }
    }

    /// Create a `Series` holding `samples`, in the given order
    #[must_use]
    pub fn from_samples(origin: Origin, samples: Vec<Sample>) -> Self {
        Self { origin, samples }
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// The counter this series was observed from.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// The samples of this series.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples in this series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether this series holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
/// A single point of a [`RateSeries`].
pub struct RatePoint {
    /// Elapsed time, in seconds.
    pub time: f64,
    /// Rate in the configured unit, always strictly positive.
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
/// Throughput of a [`Series`] drawn as a step function.
///
/// Every adjacent pair of samples contributes two points, one at each end of
/// the pair, carrying the same rate. A series of `N` samples therefore
/// yields `2 * (N - 1)` points.
pub struct RateSeries {
    origin: Origin,
    points: Vec<RatePoint>,
}

impl RateSeries {
    pub(crate) fn with_capacity(origin: Origin, capacity: usize) -> Self {
        Self {
            origin,
            points: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push_step(&mut self, start: f64, end: f64, rate: f64) {
        self.points.push(RatePoint { time: start, rate });
        self.points.push(RatePoint { time: end, rate });
    }

    /// The counter this rate was derived from.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// The points of this rate series, two per step.
    #[must_use]
    pub fn points(&self) -> &[RatePoint] {
        &self.points
    }

    /// Iterate the steps of this series as `(start, end, rate)`.
    pub fn steps(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.points
            .chunks_exact(2)
            .map(|pair| (pair[0].time, pair[1].time, pair[0].rate))
    }

    /// Number of points in this series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether this series holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
/// Maxima of a table log, used to size chart axes.
pub struct TraceBounds {
    /// The largest elapsed time of any `IN` or `OUT` record.
    pub max_time: f64,
    /// The largest count of any `IN` or `OUT` record.
    pub max_count: u64,
}

impl TraceBounds {
    /// Widen these bounds to include `sample`.
    pub fn observe(&mut self, sample: Sample) {
        if sample.time > self.max_time {
            self.max_time = sample.time;
        }
        if sample.count > self.max_count {
            self.max_count = sample.count;
        }
    }
}
