//! Option command implementation
//!
//! Prices a single option request, applying the configured Monte Carlo
//! overrides.

use clap::Args;
use pricer_pricing::options::{price_option, OptionRequest, OptionResult};
use std::path::PathBuf;
use tracing::info;

use super::load_input;
use crate::config::CliConfig;
use crate::error::Result;

/// Arguments for the option command.
#[derive(Args, Debug)]
pub struct OptionArgs {
    /// Option request file (TOML, or JSON with a .json extension)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
}

/// Run the option command
pub fn execute(args: &OptionArgs, config: &CliConfig) -> Result<OptionResult> {
    let mut request: OptionRequest = load_input(&args.input)?;
    config.monte_carlo.apply_to_request(&mut request)?;

    info!(
        input = %args.input.display(),
        model = %request.model.kind(),
        payoff = ?request.terms.payoff,
        "pricing option"
    );
    let result = price_option(&request)?;
    for warning in &result.warnings {
        tracing::warn!(%warning, "option pricing warning");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::write_temp;
    use crate::config::MonteCarloSettings;
    use pricer_models::models::ModelKind;

    const ATM_CALL: &str = r#"
        [terms]
        spot = 100.0
        strike = 100.0
        time_to_expiration = 0.25
        risk_free_rate = 0.05
        dividend_yield = 0.0
        volatility = 0.2
        payoff = "call"
    "#;

    #[test]
    fn test_price_black_scholes_file() {
        let path = write_temp("call.toml", ATM_CALL);
        let result = execute(&OptionArgs { input: path }, &CliConfig::default()).unwrap();
        assert_eq!(result.model, ModelKind::BlackScholes);
        assert!((result.fair_value - 4.615).abs() < 1e-3);
        assert!((result.greeks.delta - 0.559).abs() < 1e-3);
    }

    #[test]
    fn test_monte_carlo_overrides_are_deterministic() {
        let content = format!(
            "{ATM_CALL}\n[model]\nmodel = \"monte_carlo\"\nn_paths = 50000\nn_steps = 1\n"
        );
        let path = write_temp("call-mc.toml", &content);
        let config = CliConfig {
            monte_carlo: MonteCarloSettings {
                paths: Some(4_000),
                steps: None,
                seed: Some(11),
            },
            ..CliConfig::default()
        };

        let first = execute(&OptionArgs { input: path.clone() }, &config).unwrap();
        let second = execute(&OptionArgs { input: path }, &config).unwrap();
        assert_eq!(first.model, ModelKind::MonteCarlo);
        assert_eq!(first.fair_value, second.fair_value);
        assert!(first.standard_error.is_some());
    }
}
