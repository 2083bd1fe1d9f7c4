use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use darkwatch::config::Config;
use darkwatch::error::{DarkwatchErrorTrait, Error};

mod commands;

#[derive(Parser)]
#[command(
    name = "darkwatch",
    version,
    about = "Keyword monitor for onion services reachable through a Tor SOCKS proxy",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (environment variables are used when absent)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the periodic scanner until interrupted
    Run {
        /// Serve Prometheus metrics at http://ADDR/metrics (e.g. 127.0.0.1:9100)
        #[arg(long)]
        metrics_addr: Option<SocketAddr>,
    },

    /// Run a single gated scan cycle now
    Scan,

    /// Check whether traffic exits through Tor
    Health,

    /// List stored matches, newest first
    Results {
        /// Maximum number of results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Replace the watch list
    Watch {
        /// Endpoint URLs to scan
        #[arg(short, long, num_args = 1.., required = true)]
        urls: Vec<String>,

        /// Keyword searched for on every endpoint
        #[arg(short, long)]
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    // Initialize tracing/logging
    let format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(format, &config.logging.level, cli.verbose)?;

    if let Err(e) = darkwatch::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed, continuing without metrics");
    }

    if let Err(e) = execute(cli.command, &config).await {
        report_failure(&e);
        return Err(e);
    }

    Ok(())
}

async fn execute(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run { metrics_addr } => {
            tracing::info!(
                period_secs = config.scheduler.period_secs,
                pool_size = config.scanner.pool_size,
                "Starting run command"
            );
            commands::run(config, metrics_addr).await?;
        }

        Commands::Scan => {
            tracing::info!("Starting scan command");
            commands::scan(config).await?;
        }

        Commands::Health => {
            let healthy = commands::health(config).await?;
            if !healthy {
                std::process::exit(1);
            }
        }

        Commands::Results { limit } => {
            commands::results(config, limit)?;
        }

        Commands::Watch { urls, query } => {
            tracing::info!(urls = urls.len(), query = %query, "Updating watch list");
            commands::watch(config, urls, query).await?;
        }
    }

    Ok(())
}

/// Log the category of a library failure before exiting
fn report_failure(err: &anyhow::Error) {
    if let Some(e) = err.chain().find_map(|cause| cause.downcast_ref::<Error>()) {
        tracing::error!(
            category = e.category().label(),
            recoverable = e.is_recoverable(),
            "Command failed: {e}"
        );
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env().context("Failed to load configuration from environment")?,
    };

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("darkwatch=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("darkwatch={level},warn")))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
