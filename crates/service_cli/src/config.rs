//! CLI configuration management
//!
//! Settings are layered, highest priority first:
//!
//! 1. Command-line flags
//! 2. Environment variables (`PRICER_LOG_LEVEL`, `PRICER_MC_PATHS`, `PRICER_MC_SEED`)
//! 3. TOML config file
//! 4. Defaults
//!
//! The tracing filter has one extra layer: `RUST_LOG` sits between the
//! `--log-level` flag and every other source.

use pricer_core::market_data::LogDiscountCurve;
use pricer_models::models::{MonteCarloConfig, PricingModel};
use pricer_pricing::options::OptionRequest;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{CliError, Result};
use crate::output::OutputFormat;

/// Config file read when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_FILE: &str = "pricer.toml";

/// Environment variable for the log level.
pub const ENV_LOG_LEVEL: &str = "PRICER_LOG_LEVEL";
/// Environment variable for the Monte Carlo path count.
pub const ENV_MC_PATHS: &str = "PRICER_MC_PATHS";
/// Environment variable for the Monte Carlo seed.
pub const ENV_MC_SEED: &str = "PRICER_MC_SEED";

/// Log levels accepted by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Engine routing and solver detail
    Debug,
    /// Progress
    #[default]
    Info,
    /// Fallbacks and warnings only
    Warn,
    /// Failures only
    Error,
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(CliError::InvalidArgument(format!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                s
            ))),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Monte Carlo overrides applied to every option request.
///
/// Unset fields leave the request's own configuration alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonteCarloSettings {
    /// Path count override
    pub paths: Option<usize>,
    /// Time-step override
    pub steps: Option<usize>,
    /// Seed override
    pub seed: Option<u64>,
}

impl MonteCarloSettings {
    /// Returns `true` if no override is set.
    pub fn is_empty(&self) -> bool {
        self.paths.is_none() && self.steps.is_none() && self.seed.is_none()
    }

    /// Applies the overrides on top of `base`.
    ///
    /// # Errors
    ///
    /// Returns the Monte Carlo config error if an override is out of range.
    pub fn apply(&self, base: &MonteCarloConfig) -> Result<MonteCarloConfig> {
        let mut builder = MonteCarloConfig::builder()
            .n_paths(self.paths.unwrap_or(base.n_paths()))
            .n_steps(self.steps.unwrap_or(base.n_steps()))
            .variance_reduction(base.variance_reduction())
            .batch_size(base.batch_size());
        if let Some(seed) = self.seed.or(base.seed()) {
            builder = builder.seed(seed);
        }
        Ok(builder.build()?)
    }

    /// Rewrites the simulation settings of an option request.
    ///
    /// Both the Monte Carlo model parameters and the fallback simulation
    /// config are overridden, so a request routed to simulation by a
    /// model fallback also honours the CLI settings.
    pub fn apply_to_request(&self, request: &mut OptionRequest) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        if let PricingModel::MonteCarlo(config) = &request.model {
            request.model = PricingModel::MonteCarlo(self.apply(config)?);
        }
        let fallback = request.monte_carlo.clone().unwrap_or_default();
        request.monte_carlo = Some(self.apply(&fallback)?);
        Ok(())
    }
}

/// Discount curve description.
///
/// Either a flat continuously compounded rate or a list of
/// `[maturity, zero_rate]` pillars.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CurveSettings {
    /// Flat zero rate
    pub flat_rate: Option<f64>,
    /// Zero-rate pillars
    pub zero_rates: Vec<[f64; 2]>,
}

impl CurveSettings {
    /// Flat curve settings.
    pub fn flat(rate: f64) -> Self {
        Self {
            flat_rate: Some(rate),
            zero_rates: Vec::new(),
        }
    }

    /// Returns `true` if no curve is described.
    pub fn is_empty(&self) -> bool {
        self.flat_rate.is_none() && self.zero_rates.is_empty()
    }

    /// Builds the curve. Pillars take precedence over a flat rate.
    ///
    /// # Errors
    ///
    /// - `CliError::Config` if nothing is configured
    /// - `CliError::Curve` if the pillars do not form a valid curve
    pub fn build(&self) -> Result<LogDiscountCurve> {
        if !self.zero_rates.is_empty() {
            let pillars: Vec<(f64, f64)> = self.zero_rates.iter().map(|p| (p[0], p[1])).collect();
            return Ok(LogDiscountCurve::from_zero_rates(&pillars)?);
        }
        match self.flat_rate {
            Some(rate) => Ok(LogDiscountCurve::flat(rate)?),
            None => Err(CliError::Config(
                "no discount curve configured; set [curve] or pass --rate".to_string(),
            )),
        }
    }
}

/// Resolved CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Log level used when neither `--log-level` nor `RUST_LOG` is set
    pub log_level: LogLevel,
    /// Output format
    pub format: OutputFormat,
    /// Monte Carlo overrides
    pub monte_carlo: MonteCarloSettings,
    /// Default discount curve
    pub curve: CurveSettings,
}

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| CliError::FileNotFound(path.display().to_string()))?;
        toml::from_str(&content).map_err(|e| CliError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Overrides settings from environment variables read through `lookup`.
    pub fn merge_with_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(paths) = lookup(ENV_MC_PATHS) {
            let paths = paths.trim().parse().map_err(|_| {
                CliError::Config(format!("{ENV_MC_PATHS} must be a positive integer, got {paths}"))
            })?;
            self.monte_carlo.paths = Some(paths);
        }
        if let Some(seed) = lookup(ENV_MC_SEED) {
            let seed = seed.trim().parse().map_err(|_| {
                CliError::Config(format!("{ENV_MC_SEED} must be an unsigned integer, got {seed}"))
            })?;
            self.monte_carlo.seed = Some(seed);
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliOverrides) -> Result<()> {
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        if let Some(format) = cli.format {
            self.format = format;
        }
        if let Some(paths) = cli.mc_paths {
            self.monte_carlo.paths = Some(paths);
        }
        if let Some(seed) = cli.mc_seed {
            self.monte_carlo.seed = Some(seed);
        }
        Ok(())
    }
}

/// Values taken from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Log level override
    pub log_level: Option<String>,
    /// Output format override
    pub format: Option<OutputFormat>,
    /// Monte Carlo path count override
    pub mc_paths: Option<usize>,
    /// Monte Carlo seed override
    pub mc_seed: Option<u64>,
}

/// Build configuration from all sources, with a custom environment lookup.
pub fn build_config_with<F>(cli: &CliOverrides, env: F) -> Result<CliConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &cli.config_file {
        Some(path) => CliConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            CliConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => CliConfig::default(),
    };
    config.merge_with_env(env)?;
    config.merge_with_cli(cli)?;
    Ok(config)
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliOverrides) -> Result<CliConfig> {
    build_config_with(cli, |key| std::env::var(key).ok())
}

/// Chooses the tracing filter directive.
///
/// `--log-level` wins, then a non-empty `RUST_LOG`, then the configured level.
pub fn resolve_log_filter(
    cli_level: Option<&str>,
    rust_log: Option<&str>,
    configured: LogLevel,
) -> Result<String> {
    if let Some(level) = cli_level {
        return Ok(LogLevel::from_str(level)?.as_filter_str().to_string());
    }
    match rust_log {
        Some(directive) if !directive.trim().is_empty() => Ok(directive.to_string()),
        _ => Ok(configured.as_filter_str().to_string()),
    }
}
