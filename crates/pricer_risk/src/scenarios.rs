//! Stress scenarios and Greek-based P&L estimation.
//!
//! A scenario shocks spot (relative), implied volatility (absolute) and
//! rates (absolute, parallel) and optionally lets time pass. P&L is the
//! second-order Taylor expansion of portfolio value in those moves:
//!
//! ```text
//! ΔV ≈ Δ·dS + ½Γ·dS² + vega·dσ + ½volga·dσ² + vanna·dS·dσ
//!    + ρ·dr + ½C·dr² + θ·h
//! ```
//!
//! No model is recalibrated, so large shocks carry expansion error.

use rayon::prelude::*;

use crate::aggregator::PortfolioRisk;
use crate::error::RiskError;

/// Preset stress scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PresetScenario {
    /// Spot −20%, implied vol +10 points
    EquityCrash,
    /// Rates +100bp parallel
    RatesUp100bp,
    /// Rates −100bp parallel
    RatesDown100bp,
    /// Implied vol +15 points
    VolSpike,
}

impl PresetScenario {
    /// Every preset, in display order.
    pub const ALL: [PresetScenario; 4] = [
        PresetScenario::EquityCrash,
        PresetScenario::RatesUp100bp,
        PresetScenario::RatesDown100bp,
        PresetScenario::VolSpike,
    ];

    /// Get the name of this scenario.
    pub fn name(&self) -> &'static str {
        match self {
            PresetScenario::EquityCrash => "Equity Crash",
            PresetScenario::RatesUp100bp => "Rates +100bp",
            PresetScenario::RatesDown100bp => "Rates -100bp",
            PresetScenario::VolSpike => "Vol Spike",
        }
    }

    /// Get a description of this scenario.
    pub fn description(&self) -> &'static str {
        match self {
            PresetScenario::EquityCrash => "Spot falls 20% with implied volatility up 10 points",
            PresetScenario::RatesUp100bp => "All rates shift up by 100 basis points",
            PresetScenario::RatesDown100bp => "All rates shift down by 100 basis points",
            PresetScenario::VolSpike => "Implied volatility up 15 points",
        }
    }

    /// Builds the shocks for this preset.
    pub fn scenario(&self) -> StressScenario {
        let base = StressScenario::named(self.name());
        match self {
            PresetScenario::EquityCrash => base.with_spot_shift(-0.20).with_vol_shift(0.10),
            PresetScenario::RatesUp100bp => base.with_rate_shift(0.01),
            PresetScenario::RatesDown100bp => base.with_rate_shift(-0.01),
            PresetScenario::VolSpike => base.with_vol_shift(0.15),
        }
    }
}

/// Returns every preset scenario.
pub fn preset_scenarios() -> Vec<StressScenario> {
    PresetScenario::ALL.iter().map(|p| p.scenario()).collect()
}

/// Caller-supplied market shocks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StressScenario {
    /// Display name
    pub name: String,
    /// Relative spot move; −0.2 is a 20% fall
    pub spot_shift: f64,
    /// Absolute implied-vol move; 0.1 is ten vol points
    pub vol_shift: f64,
    /// Absolute parallel rate move; 0.01 is 100bp
    pub rate_shift: f64,
    /// Time elapsed, in years
    pub horizon: f64,
}

impl Default for StressScenario {
    fn default() -> Self {
        Self::named("Custom")
    }
}

impl StressScenario {
    /// Creates an unshocked scenario.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spot_shift: 0.0,
            vol_shift: 0.0,
            rate_shift: 0.0,
            horizon: 0.0,
        }
    }

    /// Sets the relative spot shift.
    pub fn with_spot_shift(mut self, shift: f64) -> Self {
        self.spot_shift = shift;
        self
    }

    /// Sets the absolute volatility shift.
    pub fn with_vol_shift(mut self, shift: f64) -> Self {
        self.vol_shift = shift;
        self
    }

    /// Sets the absolute rate shift.
    pub fn with_rate_shift(mut self, shift: f64) -> Self {
        self.rate_shift = shift;
        self
    }

    /// Sets the elapsed time.
    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    /// Checks shocks are finite, spot stays positive and time moves forward.
    pub fn validate(&self) -> Result<(), RiskError> {
        for (name, value) in [
            ("spot_shift", self.spot_shift),
            ("vol_shift", self.vol_shift),
            ("rate_shift", self.rate_shift),
        ] {
            if !value.is_finite() {
                return Err(RiskError::parameter(name, "must be finite"));
            }
        }
        if self.spot_shift <= -1.0 {
            return Err(RiskError::parameter("spot_shift", "must be greater than -1"));
        }
        if !(self.horizon.is_finite() && self.horizon >= 0.0) {
            return Err(RiskError::InvalidHorizon {
                horizon: self.horizon,
            });
        }
        Ok(())
    }
}

/// P&L contribution of each Taylor term.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PnlExplain {
    /// Δ·dS
    pub delta: f64,
    /// ½Γ·dS²
    pub gamma: f64,
    /// vega·dσ
    pub vega: f64,
    /// ½volga·dσ²
    pub volga: f64,
    /// vanna·dS·dσ
    pub vanna: f64,
    /// ρ·dr
    pub rho: f64,
    /// ½C·dr²
    pub rate_convexity: f64,
    /// θ·h
    pub theta: f64,
}

impl PnlExplain {
    /// Sum of all terms.
    pub fn total(&self) -> f64 {
        self.delta
            + self.gamma
            + self.vega
            + self.volga
            + self.vanna
            + self.rho
            + self.rate_convexity
            + self.theta
    }
}

/// Estimated P&L of one scenario.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioPnl {
    /// Scenario name
    pub name: String,
    /// Total estimated P&L
    pub pnl: f64,
    /// Portfolio value after the scenario
    pub stressed_value: f64,
    /// Per-term breakdown
    pub explain: PnlExplain,
}

/// Estimates portfolio P&L under one scenario.
///
/// `spot` is the level of the underlying the spot shift applies to.
///
/// # Examples
///
/// ```
/// use pricer_models::greeks::GreeksSet;
/// use pricer_risk::{stress_pnl, PortfolioRisk, StressScenario};
///
/// let risk = PortfolioRisk {
///     value: 1000.0,
///     greeks: GreeksSet { delta: 10.0, ..GreeksSet::zero() },
///     ..PortfolioRisk::default()
/// };
/// let down = StressScenario::named("down 10%").with_spot_shift(-0.1);
/// let pnl = stress_pnl(&risk, 100.0, &down).unwrap();
/// assert!((pnl.pnl + 100.0).abs() < 1e-12);
/// ```
///
/// # Errors
///
/// `RiskError::InvalidParameter` for a non-positive spot or a scenario
/// that fails [`StressScenario::validate`].
pub fn stress_pnl(
    risk: &PortfolioRisk,
    spot: f64,
    scenario: &StressScenario,
) -> Result<ScenarioPnl, RiskError> {
    if !(spot.is_finite() && spot > 0.0) {
        return Err(RiskError::parameter("spot", "must be positive and finite"));
    }
    scenario.validate()?;

    let g = &risk.greeks;
    let ds = spot * scenario.spot_shift;
    let dv = scenario.vol_shift;
    let dr = scenario.rate_shift;

    let explain = PnlExplain {
        delta: g.delta * ds,
        gamma: 0.5 * g.gamma * ds * ds,
        vega: g.vega * dv,
        volga: 0.5 * g.volga * dv * dv,
        vanna: g.vanna * ds * dv,
        rho: g.rho * dr,
        rate_convexity: 0.5 * risk.rate_convexity * dr * dr,
        theta: g.theta * scenario.horizon,
    };
    let pnl = explain.total();
    tracing::debug!(scenario = %scenario.name, pnl, "stress scenario");

    Ok(ScenarioPnl {
        name: scenario.name.clone(),
        pnl,
        stressed_value: risk.value + pnl,
        explain,
    })
}

/// Evaluates scenarios in parallel, preserving their order.
///
/// # Errors
///
/// The first invalid scenario in input order.
pub fn run_scenarios(
    risk: &PortfolioRisk,
    spot: f64,
    scenarios: &[StressScenario],
) -> Result<Vec<ScenarioPnl>, RiskError> {
    scenarios
        .par_iter()
        .map(|scenario| stress_pnl(risk, spot, scenario))
        .collect()
}
