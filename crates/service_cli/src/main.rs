//! Pricer CLI - command-line operations for bond, option and portfolio pricing.
//!
//! # Commands
//!
//! - `pricer bond` - Price a bond request
//! - `pricer option` - Price an option request
//! - `pricer strategy` - Price a multi-leg option strategy
//! - `pricer risk` - Portfolio Greeks, VaR and stress scenarios

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use service_cli::commands::{bond, option, risk, strategy};
use service_cli::config::{build_config, resolve_log_filter, CliOverrides};
use service_cli::output::{emit, OutputFormat};

/// Bond and derivatives pricing CLI
#[derive(Parser)]
#[command(name = "pricer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path (TOML); defaults to ./pricer.toml when present
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Write the result to a file instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Monte Carlo path count override
    #[arg(long, global = true)]
    mc_paths: Option<usize>,

    /// Monte Carlo seed override
    #[arg(long, global = true)]
    mc_seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a bond: yields, durations, spreads, credit and tax analytics
    Bond(bond::BondArgs),

    /// Price a single option with Greeks
    Option(option::OptionArgs),

    /// Price a multi-leg option strategy
    Strategy(strategy::StrategyArgs),

    /// Aggregate portfolio risk: Greeks, VaR and stress scenarios
    Risk(risk::RiskArgs),
}

fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        config_file: cli.config.clone(),
        log_level: cli.log_level.clone(),
        format: cli.format,
        mc_paths: cli.mc_paths,
        mc_seed: cli.mc_seed,
    };
    let config = build_config(&overrides).context("failed to load configuration")?;

    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = resolve_log_filter(cli.log_level.as_deref(), rust_log.as_deref(), config.log_level)
        .context("invalid log level")?;
    init_tracing(&filter);
    info!(log_filter = %filter, format = ?config.format, "configuration loaded");

    let output = cli.output.as_deref();
    match &cli.command {
        Commands::Bond(args) => {
            let result = bond::execute(args, &config).context("bond pricing failed")?;
            emit(&result, config.format, output)?;
        }
        Commands::Option(args) => {
            let result = option::execute(args, &config).context("option pricing failed")?;
            emit(&result, config.format, output)?;
        }
        Commands::Strategy(args) => {
            let result = strategy::execute(args, &config).context("strategy pricing failed")?;
            emit(&result, config.format, output)?;
        }
        Commands::Risk(args) => {
            let report = risk::execute(args, &config).context("risk run failed")?;
            emit(&report, config.format, output)?;
        }
    }

    Ok(())
}
