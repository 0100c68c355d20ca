//! Derive throughput from a cumulative counter
//!
//! The rate between two adjacent samples is their count difference over
//! their time difference. Rather than joining rates with slanted lines each
//! one is held flat across the interval it was measured over, so a rate
//! series is a step function with two points per step.

use serde::{Deserialize, Serialize};

use crate::sample::{RateSeries, Series};

/// Rates are reported in thousands of messages per second.
pub const RATE_UNIT_SCALE: f64 = 1e-3;

/// Rates that are not strictly positive are raised to this value so a
/// logarithmic axis can still draw them.
pub const RATE_FLOOR: f64 = 1e-6;

fn default_unit_scale() -> f64 {
    RATE_UNIT_SCALE
}

fn default_floor() -> f64 {
    RATE_FLOOR
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
/// Configuration of [`derive`].
pub struct RateConfig {
    /// Multiplier converting messages per second into the reported unit.
    #[serde(default = "default_unit_scale")]
    pub unit_scale: f64,
    /// Smallest rate reported, in the reported unit.
    #[serde(default = "default_floor")]
    pub floor: f64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            unit_scale: RATE_UNIT_SCALE,
            floor: RATE_FLOOR,
        }
    }
}

impl RateConfig {
    /// The rate between two observations of a counter.
    ///
    /// A decreasing or stalled counter, or one observed twice at the same
    /// instant without change, reports `floor`.
    #[must_use]
    pub fn rate(&self, from: (f64, u64), to: (f64, u64)) -> f64 {
        let delta = to.1 as f64 - from.1 as f64;
        let span = to.0 - from.0;
        let rate = self.unit_scale * delta / span;
        if rate.is_nan() || rate <= 0.0 {
            self.floor
        } else {
            rate
        }
    }
}

/// Derive the step-shaped rate series of `series`.
///
/// A series of fewer than two samples has no intervals and derives an empty
/// rate series.
#[must_use]
pub fn derive(series: &Series, config: &RateConfig) -> RateSeries {
    let samples = series.samples();
    let steps = samples.len().saturating_sub(1);
    let mut rates = RateSeries::with_capacity(series.origin(), 2 * steps);

    for pair in samples.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let rate = config.rate((start.time, start.count), (end.time, end.count));
        rates.push_step(start.time, end.time, rate);
    }

    rates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{Origin, RatePoint, Sample};
    use proptest::prelude::*;

    fn series(samples: &[(f64, u64)]) -> Series {
        Series::from_samples(
            Origin::TableIn,
            samples
                .iter()
                .map(|&(time, count)| Sample::new(time, count))
                .collect(),
        )
    }

    fn unscaled() -> RateConfig {
        RateConfig {
            unit_scale: 1.0,
            ..RateConfig::default()
        }
    }

    #[test]
    fn defaults_match_constants() {
        let config = RateConfig::default();
        assert!((config.unit_scale - 1e-3).abs() < f64::EPSILON);
        assert!((config.floor - 1e-6).abs() < f64::EPSILON);
    }

    #[test]
    fn single_step() {
        let rates = derive(&series(&[(1.0, 5), (2.0, 15)]), &unscaled());

        assert_eq!(
            rates.points(),
            &[
                RatePoint {
                    time: 1.0,
                    rate: 10.0
                },
                RatePoint {
                    time: 2.0,
                    rate: 10.0
                },
            ]
        );
        assert_eq!(rates.origin(), Origin::TableIn);
    }

    #[test]
    fn default_unit_is_kilo_per_second() {
        let rates = derive(&series(&[(0.0, 0), (0.5, 1000)]), &RateConfig::default());
        let (_, _, rate) = rates.steps().next().expect("one step");
        assert!((rate - 2.0).abs() < 1e-12);
    }

    #[test]
    fn short_series_derive_nothing() {
        assert!(derive(&series(&[]), &RateConfig::default()).is_empty());
        assert!(derive(&series(&[(1.0, 5)]), &RateConfig::default()).is_empty());
    }

    #[test]
    fn stalled_and_decreasing_counters_floor() {
        let rates = derive(
            &series(&[(0.0, 10), (1.0, 10), (2.0, 4), (2.0, 4)]),
            &RateConfig::default(),
        );

        assert_eq!(rates.len(), 6);
        for point in rates.points() {
            assert!((point.rate - RATE_FLOOR).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: RateConfig = serde_json::from_str(r#"{"floor": 0.01}"#).expect("valid config");
        assert!((config.unit_scale - RATE_UNIT_SCALE).abs() < f64::EPSILON);
        assert!((config.floor - 0.01).abs() < f64::EPSILON);

        assert!(serde_json::from_str::<RateConfig>(r#"{"scale": 1.0}"#).is_err());
    }

    fn monotone_samples() -> impl Strategy<Value = Vec<(f64, u64)>> {
        prop::collection::vec((0.001f64..10.0, 0u64..10_000), 0..64).prop_map(|steps| {
            let mut time = 0.0;
            let mut count = 0;
            steps
                .into_iter()
                .map(|(dt, dn)| {
                    time += dt;
                    count += dn;
                    (time, count)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn two_points_per_interval(samples in monotone_samples()) {
            let rates = derive(&series(&samples), &RateConfig::default());

            prop_assert_eq!(rates.len(), 2 * samples.len().saturating_sub(1));
            for (pair, (start, end, _)) in samples.windows(2).zip(rates.steps()) {
                prop_assert_eq!(pair[0].0, start);
                prop_assert_eq!(pair[1].0, end);
            }
            for step in rates.points().chunks_exact(2) {
                prop_assert_eq!(step[0].rate, step[1].rate);
            }
        }

        #[test]
        fn rates_are_strictly_positive(
            samples in prop::collection::vec((-10.0f64..10.0, any::<u64>()), 0..64),
        ) {
            let rates = derive(&series(&samples), &RateConfig::default());
            for point in rates.points() {
                prop_assert!(point.rate > 0.0);
            }
        }

        #[test]
        fn non_increasing_counts_floor(
            start in 0.0f64..1e4,
            span in 0.0f64..1e4,
            count in any::<u64>(),
            drop in any::<u64>(),
        ) {
            let samples = [(start, count), (start + span, count.saturating_sub(drop))];
            let rates = derive(&series(&samples), &RateConfig::default());
            for point in rates.points() {
                prop_assert_eq!(point.rate, RATE_FLOOR);
            }
        }
    }
}
