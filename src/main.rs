//! rosniff - passive login-server listener
//!
//! Captures the server list a game login server sends after login and
//! prints each sub-server's population.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rosniff::capture::PnetCapture;
use rosniff::reporter::{ConsoleReporter, ServerListReporter};
use rosniff::{Config, Monitor};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rosniff", version)]
#[command(about = "Passive login-server listener - reports sub-server populations")]
struct Cli {
    /// Targets file (defaults to $ROSNIFF_CONFIG or ./rosniff.conf)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured targets
    Targets,
    /// List network interfaces and whether they are captured
    Interfaces,
    /// Capture a target's server list
    Watch {
        /// Target name (e.g., "Taiwan")
        target: String,
        /// Give up after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_filter(cli.verbose, &config)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Targets => {
            for target in &config.targets {
                println!("{}", target);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Interfaces => {
            for line in PnetCapture::list_interfaces() {
                println!("{}", line);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Watch { target, timeout } => watch(&config, &target, timeout, cli.verbose).await,
    }
}

/// Log filter used when `RUST_LOG` is not set.
fn fallback_filter(verbose: bool, config: &Config) -> &str {
    if verbose {
        "debug"
    } else {
        config.tracing_filter()
    }
}

async fn watch(config: &Config, name: &str, timeout: Option<u64>, verbose: bool) -> Result<ExitCode> {
    let target = config
        .target(name)
        .cloned()
        .with_context(|| format!("Unknown target '{}', see `rosniff targets`", name))?;

    let monitor = Arc::new(Monitor::new(config.targets.clone(), config.session_config()));
    let reporter = ConsoleReporter::new().with_verbose(verbose);

    // Ctrl-C stops the capture; the handler runs on its own thread
    let handle = tokio::runtime::Handle::current();
    let stopper = monitor.clone();
    ctrlc::set_handler(move || {
        let monitor = stopper.clone();
        handle.spawn(async move {
            info!("Received Ctrl-C, stopping capture");
            monitor.stop().await;
        });
    })
    .context("Error setting Ctrl-C handler")?;

    if let Some(secs) = timeout {
        let monitor = monitor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            info!("Timed out after {}s, stopping capture", secs);
            monitor.stop().await;
        });
    }

    reporter.on_start(&target);

    match monitor.start(&target.name).await {
        Ok(Some(servers)) => {
            reporter.report(&target, &servers);
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => {
            reporter.on_nothing_found(&target);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            error!("Capture failed: {}", e);
            Err(e.into())
        }
    }
}
