//! Chart a table trace log against its client trace log.

use std::{fs::File, io::BufWriter, path::PathBuf};

use clap::Parser;
use tracegraph::{
    config::{self, Config},
    render::{self, render},
};
use tracegraph_series::{
    dump,
    reader::{self, read_client_log, read_table_log},
    session::{DEFAULT_CLIENT_LOG, DEFAULT_TABLE_LOG, SessionResult},
    summary::summarize,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// path to the table trace log
    #[clap(default_value = DEFAULT_TABLE_LOG)]
    table_log: PathBuf,

    /// path to the client trace log
    #[clap(default_value = DEFAULT_CLIENT_LOG)]
    client_log: PathBuf,

    /// path on disk to a YAML configuration file
    #[clap(long)]
    config_path: Option<PathBuf>,

    /// directory the SVG charts are written into
    #[clap(long, default_value = ".")]
    output_dir: PathBuf,

    /// write every count and rate point as JSON lines to this path
    #[clap(long)]
    dump_path: Option<PathBuf>,

    /// log statistics of every series
    #[clap(long)]
    summary: bool,

    /// do not draw charts
    #[clap(long)]
    no_render: bool,
}

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::Error),
    #[error(transparent)]
    Read(#[from] reader::Error),
    #[error("Failed to dump session: {0}")]
    Dump(#[from] dump::Error),
    #[error("Failed to render charts: {0}")]
    Render(#[from] render::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

async fn blocking<T, F, E>(task: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<Error> + Send + 'static,
{
    tokio::task::spawn_blocking(task).await?.map_err(Into::into)
}

fn report_summaries(result: &SessionResult, unit_scale: f64) {
    for trace in result.traces() {
        let summary = summarize(&trace.counts, &trace.rates, unit_scale);
        let mean = summary
            .mean_rate
            .map_or_else(|| "n/a".to_string(), |rate| format!("{rate:.3}"));
        let peak = summary
            .peak_rate
            .map_or_else(|| "n/a".to_string(), |rate| format!("{rate:.3}"));
        info!(
            "{origin}: samples: {samples}, final count: {count}, duration: {duration:.3}s, mean rate: {mean}, peak rate: {peak}, is_monotonic: {monotonic}",
            origin = summary.origin,
            samples = summary.samples,
            count = summary.final_count,
            duration = summary.duration(),
            monotonic = summary.is_monotonic,
        );
        if !summary.is_monotonic {
            warn!("{origin} counter decreases", origin = summary.origin);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .finish()
        .init();

    let version = env!("CARGO_PKG_VERSION");
    info!("Starting tracegraph {version}");
    let args = Args::parse();

    let config = match &args.config_path {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    // The logs share nothing, read them side by side. A failed read returns
    // at once and the other read is left to finish on the blocking pool, its
    // result discarded.
    let table_path = args.table_log.clone();
    let client_path = args.client_log.clone();
    let (table, client) = tokio::try_join!(
        blocking(move || read_table_log(table_path)),
        blocking(move || read_client_log(client_path)),
    )?;
    let result = SessionResult::assemble(table, client, &config.rate);

    if args.summary {
        report_summaries(&result, config.rate.unit_scale);
    }

    if let Some(dump_path) = &args.dump_path {
        let file = File::create(dump_path)?;
        let written = dump::Format::new(BufWriter::new(file)).write_session(&result)?;
        info!("Dumped {written} points to {dump_path:?}");
    }

    if args.no_render {
        info!("Rendering disabled");
    } else {
        let render_config = config.render;
        let output_dir = args.output_dir.clone();
        let paths = blocking(move || render(&result, &render_config, &output_dir)).await?;
        info!("Wrote {charts} charts", charts = paths.len());
    }

    info!("Bye. :)");
    Ok(())
}
