//! Command-line entry point: runs the full wind-resource analysis once.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wind_resource::config::AnalysisConfig;
use wind_resource::models::arima::SearchMode;
use wind_resource::pipeline;
use wind_resource::report::{self, ExportOptions};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SearchArg {
    None,
    Stepwise,
    Exhaustive,
}

impl From<SearchArg> for SearchMode {
    fn from(arg: SearchArg) -> Self {
        match arg {
            SearchArg::None => SearchMode::None,
            SearchArg::Stepwise => SearchMode::Stepwise,
            SearchArg::Exhaustive => SearchMode::Exhaustive,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "wind-resource")]
#[command(about = "Weibull wind-resource analysis and 48-hour SARIMA forecast", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "WIND_RESOURCE_CONFIG")]
    config: Option<PathBuf>,

    /// Input CSV (overrides the configuration)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for plot data and summary.json (overrides the configuration)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Order search mode (overrides the configuration)
    #[arg(long, value_enum)]
    search: Option<SearchArg>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,wind_resource=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(input) = cli.input {
        config.input = input;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(search) = cli.search {
        config.search.mode = search.into();
    }
    info!(?config, "starting analysis");

    let analysis = pipeline::run(&config)
        .with_context(|| format!("analysing {}", config.input.display()))?;

    print!("{}", report::render(&analysis));

    let written = report::export_all(
        &analysis,
        &ExportOptions {
            output_dir: &config.output_dir,
            input: &config.input,
            window: config.window,
            histogram_bins: config.weibull.histogram_bins,
        },
    )
    .with_context(|| format!("writing outputs to {}", config.output_dir.display()))?;

    info!(files = written.len(), dir = %config.output_dir.display(), "analysis complete");
    Ok(())
}
