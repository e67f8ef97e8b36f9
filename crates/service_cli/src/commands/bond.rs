//! Bond command implementation
//!
//! Prices a bond request file against a discount curve.

use clap::Args;
use pricer_pricing::bond::{price_bond, BondRequest, BondResult};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use super::{load_input, resolve_curve};
use crate::config::{CliConfig, CurveSettings};
use crate::error::Result;

/// Arguments for the bond command.
#[derive(Args, Debug)]
pub struct BondArgs {
    /// Bond request file (TOML, or JSON with a .json extension)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Flat discount rate, overriding any configured curve
    #[arg(long)]
    pub rate: Option<f64>,

    /// Quoted dirty price, overriding the one in the request
    #[arg(long)]
    pub market_price: Option<f64>,
}

/// Bond request file layout: the request itself plus an optional curve.
#[derive(Debug, Deserialize)]
struct BondInput {
    #[serde(flatten)]
    request: BondRequest,
    #[serde(default)]
    curve: Option<CurveSettings>,
}

/// Run the bond command
pub fn execute(args: &BondArgs, config: &CliConfig) -> Result<BondResult> {
    let BondInput { mut request, curve } = load_input(&args.input)?;
    if let Some(price) = args.market_price {
        request.terms.market_price = Some(price);
    }
    let curve = resolve_curve(args.rate, curve.as_ref(), &config.curve)?;

    info!(
        input = %args.input.display(),
        structure = ?request.terms.structure,
        maturity = request.terms.maturity,
        "pricing bond"
    );
    let result = price_bond(&request, &curve)?;
    for warning in &result.warnings {
        tracing::warn!(%warning, "bond pricing warning");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::write_temp;
    use crate::error::CliError;

    const PAR_BOND: &str = r#"
        [terms]
        face_value = 1000.0
        coupon_rate = 0.05
        maturity = 10.0
        frequency = 2

        [curve]
        flat_rate = 0.05
    "#;

    #[test]
    fn test_price_bond_file() {
        let path = write_temp("bond.toml", PAR_BOND);
        let args = BondArgs {
            input: path,
            rate: None,
            market_price: None,
        };
        let result = execute(&args, &CliConfig::default()).unwrap();
        assert_eq!(
            result.dirty_price,
            result.clean_price + result.accrued_interest
        );
        assert!(result.ytm > 0.04 && result.ytm < 0.06);
    }

    #[test]
    fn test_market_price_override_sets_yield() {
        let path = write_temp("bond-quoted.toml", PAR_BOND);
        let args = BondArgs {
            input: path,
            rate: None,
            market_price: Some(1000.0),
        };
        let result = execute(&args, &CliConfig::default()).unwrap();
        assert!((result.ytm - 0.05).abs() < 1e-8);
    }

    #[test]
    fn test_missing_curve_is_reported() {
        let path = write_temp(
            "bond-nocurve.toml",
            "[terms]\nface_value = 100.0\ncoupon_rate = 0.04\nmaturity = 5.0\nfrequency = 1\n",
        );
        let args = BondArgs {
            input: path,
            rate: None,
            market_price: None,
        };
        assert!(matches!(
            execute(&args, &CliConfig::default()),
            Err(CliError::Config(_))
        ));
    }
}
