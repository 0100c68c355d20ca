//! Rebase a series onto another log's clock
//!
//! Each trace log records times elapsed since its own start. To draw the
//! client next to the table, the client's samples are shifted by the
//! difference of the two start times.

use crate::sample::{Sample, Series};

/// Shift every sample of `series` by `series_start - reference_start`.
///
/// Counts and sample order are left untouched.
#[must_use]
pub fn align(series: &Series, series_start: f64, reference_start: f64) -> Series {
    let offset = series_start - reference_start;
    let samples = series
        .samples()
        .iter()
        .map(|sample| Sample::new(sample.time + offset, sample.count))
        .collect();
    Series::from_samples(series.origin(), samples)
}
