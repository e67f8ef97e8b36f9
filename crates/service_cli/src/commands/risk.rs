//! Risk command implementation
//!
//! Prices a portfolio, then reports aggregate Greeks, VaR and stress P&L.

use clap::Args;
use pricer_core::cancel::CancellationToken;
use pricer_core::market_data::LogDiscountCurve;
use pricer_risk::{
    delta_normal_var, historical_var, preset_scenarios, run_scenarios, PortfolioRisk, Position,
    PositionInstrument, PositionRequest, RiskFactorVolatilities, RiskMetricsAggregator,
    ScenarioPnl, StressScenario, VarEstimate, DEFAULT_CONFIDENCE,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use super::{load_input, resolve_curve};
use crate::config::{CliConfig, CurveSettings};
use crate::error::Result;

/// Ten trading days.
const DEFAULT_HORIZON: f64 = 10.0 / 252.0;

/// Arguments for the risk command.
#[derive(Args, Debug)]
pub struct RiskArgs {
    /// Portfolio file (TOML, or JSON with a .json extension)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Flat discount rate, overriding any configured curve
    #[arg(long)]
    pub rate: Option<f64>,

    /// VaR confidence level, overriding the portfolio file
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Skip the preset stress scenarios
    #[arg(long)]
    pub no_presets: bool,
}

/// Annualised factor volatilities for delta-normal VaR.
#[derive(Debug, Deserialize)]
struct FactorInput {
    spot_vol: f64,
    #[serde(default)]
    vol_of_vol: f64,
    #[serde(default)]
    rate_vol: f64,
}

fn default_horizon() -> f64 {
    DEFAULT_HORIZON
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

fn default_presets() -> bool {
    true
}

/// Portfolio file layout.
#[derive(Debug, Deserialize)]
struct RiskInput {
    positions: Vec<PositionRequest>,
    /// Level of the shared underlying
    spot: f64,
    #[serde(default)]
    curve: Option<CurveSettings>,
    #[serde(default)]
    factors: Option<FactorInput>,
    #[serde(default = "default_horizon")]
    horizon: f64,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default = "default_presets")]
    presets: bool,
    #[serde(default)]
    scenarios: Vec<StressScenario>,
    #[serde(default)]
    pnl_sample: Vec<f64>,
}

/// Risk report.
#[derive(Debug, Serialize)]
pub struct RiskReport {
    /// Aggregate value and Greeks
    pub portfolio: PortfolioRisk,
    /// Priced positions in input order
    pub positions: Vec<Position>,
    /// Delta-normal estimate, when factor volatilities are given
    pub var: Option<VarEstimate>,
    /// Historical estimate, when a P&L sample is given
    pub historical_var: Option<VarEstimate>,
    /// Stress P&L, presets first
    pub scenarios: Vec<ScenarioPnl>,
}

fn has_bonds(positions: &[PositionRequest]) -> bool {
    positions
        .iter()
        .any(|p| matches!(p.instrument, PositionInstrument::Bond(_)))
}

/// Run the risk command
pub fn execute(args: &RiskArgs, config: &CliConfig) -> Result<RiskReport> {
    let mut input: RiskInput = load_input(&args.input)?;
    for entry in &mut input.positions {
        if let PositionInstrument::Option(request) = &mut entry.instrument {
            config.monte_carlo.apply_to_request(request)?;
        }
    }
    let confidence = args.confidence.unwrap_or(input.confidence);

    // Option-only books never touch the curve
    let curve = if has_bonds(&input.positions) || args.rate.is_some() {
        resolve_curve(args.rate, input.curve.as_ref(), &config.curve)?
    } else {
        LogDiscountCurve::flat(0.0)?
    };

    info!(
        input = %args.input.display(),
        positions = input.positions.len(),
        confidence,
        horizon = input.horizon,
        "running portfolio risk"
    );
    let book = RiskMetricsAggregator::price_portfolio(
        &input.positions,
        &curve,
        &CancellationToken::new(),
    )?;
    let portfolio = book.aggregate();

    let var = match &input.factors {
        Some(f) => {
            let factors = RiskFactorVolatilities::new(input.spot, f.spot_vol)
                .with_vol_of_vol(f.vol_of_vol)
                .with_rate_vol(f.rate_vol);
            Some(delta_normal_var(&portfolio, &factors, input.horizon, confidence)?)
        }
        None => None,
    };
    let historical = if input.pnl_sample.is_empty() {
        None
    } else {
        Some(historical_var(&input.pnl_sample, confidence)?)
    };

    let mut scenarios = if input.presets && !args.no_presets {
        preset_scenarios()
    } else {
        Vec::new()
    };
    scenarios.extend(input.scenarios);
    let scenarios = run_scenarios(&portfolio, input.spot, &scenarios)?;

    Ok(RiskReport {
        portfolio,
        positions: book.positions().to_vec(),
        var,
        historical_var: historical,
        scenarios,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::write_temp;

    const BOOK: &str = r#"
        spot = 100.0
        presets = true

        [curve]
        flat_rate = 0.05

        [factors]
        spot_vol = 0.2
        rate_vol = 0.01

        [[positions]]
        label = "calls"
        weight = 100.0
        [positions.instrument]
        kind = "option"
        [positions.instrument.terms]
        spot = 100.0
        strike = 100.0
        time_to_expiration = 0.5
        risk_free_rate = 0.05
        dividend_yield = 0.0
        volatility = 0.2
        payoff = "call"

        [[positions]]
        label = "note"
        weight = 10.0
        [positions.instrument]
        kind = "bond"
        [positions.instrument.terms]
        face_value = 1000.0
        coupon_rate = 0.05
        maturity = 5.0
        frequency = 2

        [[scenarios]]
        name = "Spot -5%"
        spot_shift = -0.05
    "#;

    #[test]
    fn test_risk_report() {
        let path = write_temp("book.toml", BOOK);
        let args = RiskArgs {
            input: path,
            rate: None,
            confidence: None,
            no_presets: false,
        };
        let report = execute(&args, &CliConfig::default()).unwrap();

        assert_eq!(report.positions.len(), 2);
        assert_eq!(report.portfolio.positions, 2);
        let var = report.var.unwrap();
        assert!((var.var - 2.33 * var.stdev).abs() < 1e-9);
        assert!(report.historical_var.is_none());
        assert_eq!(report.scenarios.len(), 5);
        assert_eq!(report.scenarios[4].name, "Spot -5%");
        assert!(report.scenarios[4].pnl < 0.0);
    }

    #[test]
    fn test_historical_only_without_presets() {
        let content = r#"
            spot = 100.0
            presets = false
            pnl_sample = [-5.0, 1.0, 2.0, -1.0, 3.0]

            [[positions]]
            label = "put"
            weight = 1.0
            [positions.instrument]
            kind = "option"
            [positions.instrument.terms]
            spot = 100.0
            strike = 95.0
            time_to_expiration = 0.25
            risk_free_rate = 0.03
            dividend_yield = 0.0
            volatility = 0.25
            payoff = "put"
        "#;
        let path = write_temp("book-hist.toml", content);
        let args = RiskArgs {
            input: path,
            rate: None,
            confidence: Some(0.8),
            no_presets: false,
        };
        let report = execute(&args, &CliConfig::default()).unwrap();

        assert!(report.var.is_none());
        assert!(report.scenarios.is_empty());
        let historical = report.historical_var.unwrap();
        assert_eq!(historical.var, 1.0);
    }
}
