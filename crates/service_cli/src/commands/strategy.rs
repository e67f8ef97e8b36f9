//! Strategy command implementation
//!
//! Prices a multi-leg option strategy under Black-Scholes.

use clap::Args;
use pricer_models::instruments::{StrategyDefinition, StrategyKind, StrategyLeg};
use pricer_pricing::options::OptionResult;
use pricer_pricing::strategy::price_complex_strategy;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use super::load_input;
use crate::config::CliConfig;
use crate::error::Result;

/// Arguments for the strategy command.
#[derive(Args, Debug)]
pub struct StrategyArgs {
    /// Strategy file (TOML, or JSON with a .json extension)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
}

/// Strategy file layout.
#[derive(Debug, Deserialize)]
struct StrategyInput {
    #[serde(default)]
    kind: StrategyKind,
    legs: Vec<StrategyLeg>,
    #[serde(default)]
    underlying_position_size: f64,
    spot: f64,
    rate: f64,
    #[serde(default)]
    dividend_yield: f64,
    volatility: f64,
}

/// Run the strategy command
pub fn execute(args: &StrategyArgs, _config: &CliConfig) -> Result<OptionResult> {
    let input: StrategyInput = load_input(&args.input)?;
    let definition = StrategyDefinition {
        legs: input.legs,
        underlying_position_size: input.underlying_position_size,
    };

    info!(
        input = %args.input.display(),
        kind = ?input.kind,
        legs = definition.legs.len(),
        "pricing strategy"
    );
    let result = price_complex_strategy(
        input.kind,
        &definition,
        input.spot,
        input.rate,
        input.dividend_yield,
        input.volatility,
    )?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::write_temp;
    use crate::error::CliError;

    #[test]
    fn test_straddle_file() {
        let content = r#"
            kind = "straddle"
            spot = 100.0
            rate = 0.05
            volatility = 0.2

            [[legs]]
            option_type = "call"
            strike = 100.0
            expiration = 0.5
            signed_quantity = 1.0
            entry_price = 6.89

            [[legs]]
            option_type = "put"
            strike = 100.0
            expiration = 0.5
            signed_quantity = 1.0
            entry_price = 4.42
        "#;
        let path = write_temp("straddle.toml", content);
        let result = execute(&StrategyArgs { input: path }, &CliConfig::default()).unwrap();

        assert_eq!(result.breakeven_prices.len(), 2);
        assert!(result.max_profit.is_infinite());
        assert!(result.max_loss < 0.0);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let content = r#"
            kind = "straddle"
            spot = 100.0
            rate = 0.05
            volatility = 0.2

            [[legs]]
            option_type = "call"
            strike = 100.0
            expiration = 0.5
            signed_quantity = 1.0
            entry_price = 6.89
        "#;
        let path = write_temp("bad-straddle.toml", content);
        assert!(matches!(
            execute(&StrategyArgs { input: path }, &CliConfig::default()),
            Err(CliError::Pricing(_))
        ));
    }
}
