//! Chart rendering
//!
//! Two charts are drawn from a [`SessionResult`]: the cumulative counts of
//! every trace against elapsed time, and their rates on a logarithmic axis.
//! Axis ranges come from the table log's bounds alone, so the client's
//! counters are clipped to the table's time span.

use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracegraph_series::sample::{Origin, RatePoint, Sample, TraceBounds};
use tracegraph_series::session::SessionResult;
use tracing::info;

const ELAPSED_DESC: &str = "Elapsed Time (secs)";
const COUNT_DESC: &str = "Messages Handled";
const RATE_DESC: &str = "Message Handling Rate (kHz)";

/// Errors produced while rendering charts
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The output directory could not be created.
    #[error("Failed to create output directory {path:?}: {source}")]
    OutputDir {
        /// Directory path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// The drawing backend failed.
    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

fn draw_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> Error {
    Error::Draw(err.to_string())
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_padding() -> f64 {
    0.05
}

fn default_rate_axis_min() -> f64 {
    1e-2
}

fn default_rate_axis_max() -> f64 {
    1e2
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
/// Configuration of the chart renderer.
pub struct Config {
    /// Width of each chart, in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Height of each chart, in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
    /// Fraction of the table bounds added around the linear axes.
    #[serde(default = "default_padding")]
    pub padding: f64,
    /// Bottom of the logarithmic rate axis.
    #[serde(default = "default_rate_axis_min")]
    pub rate_axis_min: f64,
    /// Top of the logarithmic rate axis.
    #[serde(default = "default_rate_axis_max")]
    pub rate_axis_max: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            padding: default_padding(),
            rate_axis_min: default_rate_axis_min(),
            rate_axis_max: default_rate_axis_max(),
        }
    }
}

impl Config {
    /// Describe why this configuration cannot draw a chart, if it cannot.
    #[must_use]
    pub fn problem(&self) -> Option<&'static str> {
        if self.width == 0 || self.height == 0 {
            Some("chart width and height must be non-zero")
        } else if self.padding < 0.0 || !self.padding.is_finite() {
            Some("padding must be a finite, non-negative fraction")
        } else if self.rate_axis_min <= 0.0 || !self.rate_axis_min.is_finite() {
            Some("rate_axis_min must be positive")
        } else if self.rate_axis_max <= self.rate_axis_min || !self.rate_axis_max.is_finite() {
            Some("rate_axis_max must be greater than rate_axis_min")
        } else {
            None
        }
    }
}

/// How a trace is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    /// Legend label.
    pub label: &'static str,
    /// Line colour.
    pub colour: RGBColor,
}

impl Style {
    /// The style of `origin`'s trace.
    #[must_use]
    pub fn of(origin: Origin) -> Self {
        match origin {
            Origin::TableIn => Style {
                label: "Table in",
                colour: BLUE,
            },
            Origin::TableOut => Style {
                label: "Table out",
                colour: RED,
            },
            Origin::Client => Style {
                label: "Client",
                colour: GREEN,
            },
        }
    }
}

/// Axis ranges shared by both charts.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Elapsed time axis, shared by both charts.
    pub time: Range<f64>,
    /// Linear count axis.
    pub count: Range<f64>,
    /// Logarithmic rate axis.
    pub rate: Range<f64>,
}

impl Layout {
    /// Size the axes for `bounds`. Empty bounds are widened to one unit so
    /// the axes never collapse.
    #[must_use]
    pub fn new(bounds: &TraceBounds, config: &Config) -> Self {
        let max_time = if bounds.max_time > 0.0 {
            bounds.max_time
        } else {
            1.0
        };
        let max_count = if bounds.max_count > 0 {
            bounds.max_count as f64
        } else {
            1.0
        };

        Self {
            time: -config.padding * max_time..(1.0 + config.padding) * max_time,
            count: 0.0..(1.0 + config.padding) * max_count,
            rate: config.rate_axis_min..config.rate_axis_max,
        }
    }

    fn on_time_axis(&self, time: f64) -> bool {
        time >= self.time.start && time <= self.time.end
    }

    /// Place a cumulative series on the count chart. See
    /// [`Layout::clip_line`].
    #[must_use]
    pub fn clip_counts(&self, samples: &[Sample]) -> Vec<Vec<(f64, f64)>> {
        self.clip_line(
            samples.iter().map(|s| (s.time, s.count as f64)),
            &self.count,
        )
    }

    /// Place a rate series on the rate chart. Rates are held inside the rate
    /// axis so floored rates still draw along its bottom. See
    /// [`Layout::clip_line`].
    #[must_use]
    pub fn clip_rates(&self, points: &[RatePoint]) -> Vec<Vec<(f64, f64)>> {
        self.clip_line(points.iter().map(|p| (p.time, p.rate)), &self.rate)
    }

    /// Clip the line through `points` to the time axis. Values are first held
    /// inside `values`, then every segment crossing an edge of the time axis
    /// is cut where it crosses. Each returned run is one connected piece of
    /// the line.
    #[must_use]
    pub fn clip_line<I>(&self, points: I, values: &Range<f64>) -> Vec<Vec<(f64, f64)>>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut runs = Vec::new();
        let mut run: Vec<(f64, f64)> = Vec::new();
        let mut previous: Option<(f64, f64)> = None;

        for (time, value) in points {
            let point = (time, value.clamp(values.start, values.end));
            match previous.and_then(|from| self.clip_segment(from, point)) {
                Some(cut) => {
                    if cut.entered && !run.is_empty() {
                        runs.push(std::mem::take(&mut run));
                    }
                    if run.is_empty() {
                        run.push(cut.start);
                    }
                    run.push(cut.end);
                    if cut.left {
                        runs.push(std::mem::take(&mut run));
                    }
                }
                None if previous.is_none() && self.on_time_axis(time) => run.push(point),
                None => {
                    if !run.is_empty() {
                        runs.push(std::mem::take(&mut run));
                    }
                }
            }
            previous = Some(point);
        }
        if !run.is_empty() {
            runs.push(run);
        }
        runs
    }

    fn clip_segment(&self, from: (f64, f64), to: (f64, f64)) -> Option<Cut> {
        let (low, high) = (self.time.start, self.time.end);
        if (from.0 < low && to.0 < low) || (from.0 > high && to.0 > high) {
            return None;
        }
        // An endpoint off the axis has its partner across that edge, so the
        // segment has a non-zero span wherever it is cut.
        let cross = |time: f64| {
            let edge = time.clamp(low, high);
            (
                edge,
                from.1 + (to.1 - from.1) * (edge - from.0) / (to.0 - from.0),
            )
        };
        let entered = !self.on_time_axis(from.0);
        let left = !self.on_time_axis(to.0);
        Some(Cut {
            start: if entered { cross(from.0) } else { from },
            end: if left { cross(to.0) } else { to },
            entered,
            left,
        })
    }
}

/// The part of a segment inside the time axis.
#[derive(Debug, Clone, Copy)]
struct Cut {
    start: (f64, f64),
    end: (f64, f64),
    /// The segment starts off the axis.
    entered: bool,
    /// The segment ends off the axis.
    left: bool,
}

/// Draw both charts of `result` into `dir` as SVG, returning the paths
/// written.
///
/// # Errors
///
/// Returns an error if `dir` cannot be created or a chart cannot be drawn.
pub fn render(result: &SessionResult, config: &Config, dir: &Path) -> Result<Vec<PathBuf>, Error> {
    std::fs::create_dir_all(dir).map_err(|source| Error::OutputDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let layout = Layout::new(&result.bounds, config);
    let size = (config.width, config.height);
    let elapsed_path = dir.join("elapsed.svg");
    let rates_path = dir.join("rates.svg");

    draw_elapsed(
        &SVGBackend::new(&elapsed_path, size).into_drawing_area(),
        result,
        &layout,
    )?;
    draw_rates(
        &SVGBackend::new(&rates_path, size).into_drawing_area(),
        result,
        &layout,
    )?;

    info!("Wrote {elapsed_path:?} and {rates_path:?}");
    Ok(vec![elapsed_path, rates_path])
}

fn draw_elapsed<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    result: &SessionResult,
    layout: &Layout,
) -> Result<(), Error> {
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(layout.time.clone(), layout.count.clone())
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(ELAPSED_DESC)
        .y_desc(COUNT_DESC)
        .draw()
        .map_err(draw_err)?;

    for trace in result.traces() {
        let style = Style::of(trace.counts.origin());
        for run in layout.clip_counts(trace.counts.samples()) {
            chart
                .draw_series(LineSeries::new(run, style.colour.stroke_width(2)))
                .map_err(draw_err)?;
        }
        // legend entry, present even when the trace is off the chart
        chart
            .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
            .map_err(draw_err)?
            .label(style.label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], style.colour.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.filled())
        .border_style(BLACK.stroke_width(1))
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)
}

fn draw_rates<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    result: &SessionResult,
    layout: &Layout,
) -> Result<(), Error> {
    root.fill(&WHITE).map_err(draw_err)?;

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(layout.time.clone(), layout.rate.clone().log_scale())
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(ELAPSED_DESC)
        .y_desc(RATE_DESC)
        .draw()
        .map_err(draw_err)?;

    for trace in result.traces() {
        let style = Style::of(trace.rates.origin());
        for run in layout.clip_rates(trace.rates.points()) {
            chart
                .draw_series(LineSeries::new(run, style.colour.stroke_width(2)))
                .map_err(draw_err)?;
        }
        chart
            .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
            .map_err(draw_err)?
            .label(style.label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], style.colour.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.filled())
        .border_style(BLACK.stroke_width(1))
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::io::Cursor;
    use tracegraph_series::rate::RateConfig;
    use tracegraph_series::reader::{ClientLog, TableLog};
    use tracegraph_series::session::{DEFAULT_CLIENT_LOG, DEFAULT_TABLE_LOG};
    use tracegraph_series::write::{ClientTraceWriter, TableTraceWriter};

    #[test]
    fn axes_are_padded_by_five_percent() {
        let layout = Layout::new(
            &TraceBounds {
                max_time: 20.0,
                max_count: 1000,
            },
            &Config::default(),
        );

        assert_relative_eq!(layout.time.start, -1.0);
        assert_relative_eq!(layout.time.end, 21.0);
        assert_relative_eq!(layout.count.start, 0.0);
        assert_relative_eq!(layout.count.end, 1050.0);
        assert_relative_eq!(layout.rate.start, 1e-2);
        assert_relative_eq!(layout.rate.end, 1e2);
    }

    #[test]
    fn empty_bounds_do_not_collapse() {
        let layout = Layout::new(&TraceBounds::default(), &Config::default());
        assert!(layout.time.end > layout.time.start);
        assert!(layout.count.end > layout.count.start);
    }

    fn ten_by_hundred() -> Layout {
        Layout::new(
            &TraceBounds {
                max_time: 10.0,
                max_count: 100,
            },
            &Config::default(),
        )
    }

    fn assert_runs_eq(actual: &[Vec<(f64, f64)>], expected: &[Vec<(f64, f64)>]) {
        assert_eq!(actual.len(), expected.len(), "runs: {actual:?}");
        for (run, expected_run) in actual.iter().zip(expected) {
            assert_eq!(run.len(), expected_run.len(), "run: {run:?}");
            for (&(time, value), &(expected_time, expected_value)) in run.iter().zip(expected_run) {
                assert_relative_eq!(time, expected_time, epsilon = 1e-9);
                assert_relative_eq!(value, expected_value, epsilon = 1e-9);
            }
        }
    }

    fn rate_points(points: &[(f64, f64)]) -> Vec<RatePoint> {
        points
            .iter()
            .map(|&(time, rate)| RatePoint { time, rate })
            .collect()
    }

    #[test]
    fn floored_rates_sit_on_the_axis() {
        let layout = ten_by_hundred();
        let runs = layout.clip_rates(&rate_points(&[
            (1.0, 1e-6),
            (2.0, 1e-6),
            (2.0, f64::INFINITY),
            (3.0, f64::INFINITY),
        ]));

        assert_eq!(
            runs,
            vec![vec![(1.0, 1e-2), (2.0, 1e-2), (2.0, 1e2), (3.0, 1e2)]]
        );
    }

    #[test]
    fn step_straddling_axis_end_is_cut_at_the_edge() {
        let layout = ten_by_hundred();
        let runs = layout.clip_rates(&rate_points(&[
            (2.0, 0.0167),
            (5.0, 0.0167),
            (5.0, 0.005),
            (15.0, 0.005),
        ]));

        assert_runs_eq(
            &runs,
            &[vec![
                (2.0, 0.0167),
                (5.0, 0.0167),
                (5.0, 1e-2),
                (layout.time.end, 1e-2),
            ]],
        );
    }

    #[test]
    fn segments_are_cut_at_both_edges() {
        let layout = ten_by_hundred();

        let entering = layout.clip_counts(&[Sample::new(-2.0, 0), Sample::new(2.0, 40)]);
        assert_runs_eq(&entering, &[vec![(-0.5, 15.0), (2.0, 40.0)]]);

        let crossing = layout.clip_counts(&[Sample::new(-10.0, 0), Sample::new(30.0, 100)]);
        assert_runs_eq(&crossing, &[vec![(-0.5, 23.75), (10.5, 51.25)]]);

        let outside = layout.clip_counts(&[Sample::new(20.0, 1), Sample::new(30.0, 2)]);
        assert!(outside.is_empty());
    }

    #[test]
    fn leaving_and_returning_splits_the_line() {
        let layout = ten_by_hundred();
        let runs = layout.clip_line(
            [(1.0, 10.0), (20.0, 20.0), (30.0, 30.0), (4.0, 40.0)],
            &layout.count,
        );

        assert_runs_eq(
            &runs,
            &[
                vec![(1.0, 10.0), (10.5, 15.0)],
                vec![(10.5, 37.5), (4.0, 40.0)],
            ],
        );
    }

    #[test]
    fn counts_are_held_inside_the_count_axis() {
        let layout = ten_by_hundred();
        let runs = layout.clip_counts(&[Sample::new(1.0, 50), Sample::new(5.0, 500)]);
        assert_runs_eq(&runs, &[vec![(1.0, 50.0), (5.0, 105.0)]]);
    }

    fn session(client_start: f64) -> SessionResult {
        let mut table = TableTraceWriter::new(Vec::new(), 100.0).expect("header");
        for step in 0..=10_u32 {
            let elapsed = f64::from(step);
            table.inbound(u64::from(step) * 100, elapsed).expect("write");
            table.outbound(u64::from(step) * 90, elapsed + 0.25).expect("write");
        }
        let table = TableLog::from_reader(
            Cursor::new(table.into_inner()),
            Path::new(DEFAULT_TABLE_LOG),
        )
        .expect("table log");

        let mut client = ClientTraceWriter::new(Vec::new(), client_start).expect("header");
        for step in 0..=12_u32 {
            client
                .observed(u64::from(step) * 80, f64::from(step))
                .expect("write");
        }
        let client = ClientLog::from_reader(
            Cursor::new(client.into_inner()),
            Path::new(DEFAULT_CLIENT_LOG),
        )
        .expect("client log");

        SessionResult::assemble(table, client, &RateConfig::default())
    }

    fn assert_svg(path: &Path) {
        let contents = std::fs::read_to_string(path).expect("read chart");
        assert!(contents.contains("<svg"), "{path:?} is not SVG");
        assert!(contents.contains("</svg>"), "{path:?} is incomplete");
    }

    #[test]
    fn render_writes_both_charts() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let output = dir.path().join("charts").join("run-1");

        // The client outlives the table's span by several seconds.
        let paths = render(&session(102.0), &Config::default(), &output).expect("render");

        assert_eq!(
            paths,
            vec![output.join("elapsed.svg"), output.join("rates.svg")]
        );
        for path in &paths {
            assert!(path.metadata().expect("chart exists").len() > 0);
            assert_svg(path);
        }
    }

    #[test]
    fn render_handles_empty_logs() {
        let table = TableLog::from_reader(Cursor::new("START 1.0\n"), Path::new(DEFAULT_TABLE_LOG))
            .expect("table log");
        let client =
            ClientLog::from_reader(Cursor::new("START 1.0\n"), Path::new(DEFAULT_CLIENT_LOG))
                .expect("client log");
        let result = SessionResult::assemble(table, client, &RateConfig::default());

        let dir = tempfile::tempdir().expect("create temp dir");
        let paths = render(&result, &Config::default(), dir.path()).expect("render");
        for path in &paths {
            assert_svg(path);
        }
    }

    #[test]
    fn unusable_output_dir() {
        let file = tempfile::NamedTempFile::new().expect("create temp file");
        let err = render(&session(100.0), &Config::default(), &file.path().join("charts"))
            .expect_err("output dir under a file");
        assert!(matches!(err, Error::OutputDir { .. }));
    }

    #[test]
    fn styles_are_distinct() {
        let styles: Vec<Style> = Origin::ALL.into_iter().map(Style::of).collect();
        for (i, a) in styles.iter().enumerate() {
            for b in &styles[i + 1..] {
                assert_ne!(a.colour, b.colour);
                assert_ne!(a.label, b.label);
            }
        }
        assert_eq!(Style::of(Origin::TableIn).colour, BLUE);
        assert_eq!(Style::of(Origin::TableOut).colour, RED);
        assert_eq!(Style::of(Origin::Client).colour, GREEN);
    }

    #[test]
    fn config_problems() {
        assert_eq!(Config::default().problem(), None);
        let inverted = Config {
            rate_axis_min: 10.0,
            rate_axis_max: 1.0,
            ..Config::default()
        };
        assert!(inverted.problem().is_some());
        let non_positive = Config {
            rate_axis_min: 0.0,
            ..Config::default()
        };
        assert!(non_positive.problem().is_some());
        let empty = Config {
            width: 0,
            ..Config::default()
        };
        assert!(empty.problem().is_some());
    }

    proptest! {
        #[test]
        fn bounds_fit_inside_layout(
            max_time in 0.001f64..1e6,
            max_count in 1u64..1_000_000_000,
            padding in 0.0f64..0.5,
        ) {
            let config = Config { padding, ..Config::default() };
            let layout = Layout::new(&TraceBounds { max_time, max_count }, &config);

            prop_assert!(layout.time.start <= 0.0);
            prop_assert!(layout.time.end >= max_time);
            prop_assert!(layout.count.end >= max_count as f64);
        }

        #[test]
        fn clipped_lines_stay_on_the_chart(
            points in prop::collection::vec((-50.0f64..50.0, 0.0f64..1000.0), 0..40),
        ) {
            let layout = ten_by_hundred();
            for run in layout.clip_line(points, &layout.count) {
                prop_assert!(!run.is_empty());
                for (time, count) in run {
                    prop_assert!(time >= layout.time.start && time <= layout.time.end);
                    prop_assert!(count >= layout.count.start - 1e-9);
                    prop_assert!(count <= layout.count.end + 1e-9);
                }
            }
        }
    }
}
