//! ranklab CLI: evaluate retrieval runs with mean reciprocal rank.

mod commands;
mod input;

use clap::Parser;
use commands::Precision;
use ranklab_core::{EmptyTargetAction, RanklabConfig};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// ranklab: retrieval ranking metrics
#[derive(Parser, Debug)]
#[command(name = "ranklab", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (looked up for `.ranklab/config.toml`)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Compute MRR over a JSON array or JSON-lines file of records
    Evaluate {
        /// Records with `query`, `score`, and `relevant` fields
        input: PathBuf,

        /// Policy for queries without a relevant item: error, skip, neg, pos
        #[arg(long)]
        empty_target_action: Option<EmptyTargetAction>,

        /// Target value marking items to drop
        #[arg(long, allow_hyphen_values = true)]
        ignore_index: Option<i64>,

        /// Number of simulated workers
        #[arg(long)]
        workers: Option<usize>,

        /// Score precision
        #[arg(long, value_enum, default_value_t = Precision::default())]
        precision: Precision,
    },
    /// Print the effective configuration
    Config,
}

fn init_tracing(cli: &Cli, config: &RanklabConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = match cli.verbose {
        0 if cli.quiet => "error".to_string(),
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer, only when a log directory is configured
    let (json_layer, guard) = match &config.logging.json_dir {
        Some(dir) => {
            let _ = std::fs::create_dir_all(dir);
            let file_appender = tracing_appender::rolling::daily(dir, "ranklab.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    guard
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| cli.workspace.clone());

    let mut config = ranklab_core::load_config(Some(&workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let _guard = init_tracing(&cli, &config);

    match cli.command {
        Commands::Evaluate {
            input,
            empty_target_action,
            ignore_index,
            workers,
            precision,
        } => {
            if let Some(action) = empty_target_action {
                config.metric.empty_target_action = action;
            }
            if ignore_index.is_some() {
                config.metric.ignore_index = ignore_index;
            }
            if let Some(workers) = workers {
                config.distributed.world_size = workers;
            }
            let report = commands::evaluate(&input, &config, precision)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Config => {
            print!("{}", commands::show_config(&config)?);
        }
    }

    Ok(())
}
