use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sw_predict::{PredictionConfig, Runner};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "sw-predict")]
#[command(
    about = "Decode swipe gestures into ranked word predictions, one artifact per model",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Path to the JSON configuration holding a `prediction_config` section
    #[arg(short, long)]
    config: PathBuf,

    /// Worker threads per model; overrides `num_workers` from the config
    #[arg(short = 'j', long)]
    num_workers: Option<usize>,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let mut config = PredictionConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(n) = cli.num_workers {
        config.num_workers = n;
    }

    let runner = Runner::prepare(config)?.with_progress(!cli.no_progress);
    let report = runner.run();
    report.log_summary();

    let failed = report.failed().count();
    if failed > 0 {
        anyhow::bail!("{} of {} model(s) failed", failed, report.bindings.len());
    }
    Ok(())
}
