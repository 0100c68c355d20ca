//! Per-series statistics
//!
//! A short numeric description of each trace, reported next to the charts.

use crate::sample::{Origin, RateSeries, Series};

/// Statistics of one cumulative series and its rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    /// The counter summarized
    pub origin: Origin,
    /// Number of samples
    pub samples: usize,
    /// Time of the first sample, if any
    pub first_time: Option<f64>,
    /// Time of the last sample, if any
    pub last_time: Option<f64>,
    /// Count of the last sample, zero when empty
    pub final_count: u64,
    /// Rate between the first and last samples, in the rate unit. `None` when
    /// fewer than two samples span a positive time.
    pub mean_rate: Option<f64>,
    /// Largest rate of any step, `None` when there are no steps
    pub peak_rate: Option<f64>,
    /// Whether counts never decrease
    pub is_monotonic: bool,
}

impl SeriesSummary {
    /// Time between the first and last samples, zero when empty.
    #[must_use]
    pub fn duration(&self) -> f64 {
        match (self.first_time, self.last_time) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

/// Summarize `series` and the rate derived from it.
#[must_use]
pub fn summarize(series: &Series, rates: &RateSeries, unit_scale: f64) -> SeriesSummary {
    let samples = series.samples();
    let first = samples.first();
    let last = samples.last();

    let mean_rate = match (first, last) {
        (Some(first), Some(last)) if last.time > first.time => {
            Some(unit_scale * (last.count as f64 - first.count as f64) / (last.time - first.time))
        }
        _ => None,
    };
    let peak_rate = rates
        .points()
        .iter()
        .map(|point| point.rate)
        .reduce(f64::max);

    SeriesSummary {
        origin: series.origin(),
        samples: samples.len(),
        first_time: first.map(|s| s.time),
        last_time: last.map(|s| s.time),
        final_count: last.map_or(0, |s| s.count),
        mean_rate,
        peak_rate,
        is_monotonic: samples.windows(2).all(|w| w[0].count <= w[1].count),
    }
}
