//! Portfolio aggregation of priced positions.
//!
//! Positions carry the per-unit value and sensitivities of one priced
//! instrument together with a signed weight (quantity). Aggregation is a
//! weighted sum, so portfolio Greeks assume linear additivity across
//! positions: each option's Greeks are taken with respect to its own
//! underlying, and spot-type Greeks are only meaningful in aggregate when
//! the positions share one underlying.
//!
//! Bonds have no option Greeks. They enter with their rate sensitivities
//! restated as per-unit-rate Greeks:
//!
//! - `rho = −modified_duration × dirty_price`
//! - `rate_convexity = convexity × dirty_price`
//!
//! so that a parallel rate move `dr` contributes `rho·dr + ½·rate_convexity·dr²`
//! to scenario P&L.

use pricer_core::cancel::CancellationToken;
use pricer_core::market_data::curves::YieldCurve;
use pricer_models::greeks::GreeksSet;
use pricer_pricing::bond::{price_bond_with_cancel, BondRequest, BondResult};
use pricer_pricing::options::{price_option_with_cancel, OptionRequest, OptionResult};
use rayon::prelude::*;

use crate::error::RiskError;

/// Kind of instrument behind a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PositionKind {
    /// Single option or option strategy
    Option,
    /// Bond, straight or with embedded features
    Bond,
}

/// One weighted entry in a portfolio.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Caller-supplied identifier
    pub label: String,
    /// Instrument kind
    pub kind: PositionKind,
    /// Signed quantity; negative for short positions
    pub weight: f64,
    /// Per-unit fair value (dirty price for bonds)
    pub value: f64,
    /// Per-unit sensitivities
    pub greeks: GreeksSet,
    /// Per-unit second derivative with respect to a parallel rate move
    pub rate_convexity: f64,
}

impl Position {
    /// Creates a position from an option result.
    pub fn from_option(label: impl Into<String>, result: &OptionResult, weight: f64) -> Self {
        Self {
            label: label.into(),
            kind: PositionKind::Option,
            weight,
            value: result.fair_value,
            greeks: result.greeks,
            rate_convexity: 0.0,
        }
    }

    /// Creates a position from a bond result.
    ///
    /// The bond's duration and convexity are restated as rho and a
    /// rate-convexity term, both per unit of parallel rate move.
    pub fn from_bond(label: impl Into<String>, result: &BondResult, weight: f64) -> Self {
        let price = result.dirty_price;
        let greeks = GreeksSet {
            rho: -result.modified_duration * price,
            ..GreeksSet::zero()
        };
        Self {
            label: label.into(),
            kind: PositionKind::Bond,
            weight,
            value: price,
            greeks,
            rate_convexity: result.convexity * price,
        }
    }

    /// Weighted value of the position.
    #[inline]
    pub fn market_value(&self) -> f64 {
        self.weight * self.value
    }
}

/// Aggregated value and sensitivities of a portfolio.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortfolioRisk {
    /// Σ weight × value
    pub value: f64,
    /// Σ weight × greeks
    pub greeks: GreeksSet,
    /// Σ weight × rate convexity
    pub rate_convexity: f64,
    /// Number of positions aggregated
    pub positions: usize,
}

/// Instrument to price for a portfolio entry.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum PositionInstrument {
    /// Option request, priced through the option dispatcher
    Option(OptionRequest),
    /// Bond request, priced against the portfolio curve
    Bond(BondRequest),
}

/// A labelled, weighted instrument waiting to be priced.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionRequest {
    /// Identifier carried onto the priced position
    pub label: String,
    /// Signed quantity
    pub weight: f64,
    /// What to price
    pub instrument: PositionInstrument,
}

impl PositionRequest {
    /// Creates an option entry.
    pub fn option(label: impl Into<String>, request: OptionRequest, weight: f64) -> Self {
        Self {
            label: label.into(),
            weight,
            instrument: PositionInstrument::Option(request),
        }
    }

    /// Creates a bond entry.
    pub fn bond(label: impl Into<String>, request: BondRequest, weight: f64) -> Self {
        Self {
            label: label.into(),
            weight,
            instrument: PositionInstrument::Bond(request),
        }
    }
}

/// Collects positions and produces portfolio-level risk.
///
/// # Examples
///
/// ```
/// use pricer_models::greeks::GreeksSet;
/// use pricer_risk::{Position, PositionKind, RiskMetricsAggregator};
///
/// let call = Position {
///     label: "call".into(),
///     kind: PositionKind::Option,
///     weight: 10.0,
///     value: 4.6,
///     greeks: GreeksSet { delta: 0.56, ..GreeksSet::zero() },
///     rate_convexity: 0.0,
/// };
///
/// let mut book = RiskMetricsAggregator::new();
/// book.add(call);
/// let risk = book.aggregate();
/// assert!((risk.value - 46.0).abs() < 1e-12);
/// assert!((risk.greeks.delta - 5.6).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RiskMetricsAggregator {
    positions: Vec<Position>,
}

impl RiskMetricsAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a position.
    pub fn add(&mut self, position: Position) -> &mut Self {
        self.positions.push(position);
        self
    }

    /// Adds a priced option.
    pub fn add_option(
        &mut self,
        label: impl Into<String>,
        result: &OptionResult,
        weight: f64,
    ) -> &mut Self {
        self.add(Position::from_option(label, result, weight))
    }

    /// Adds a priced bond.
    pub fn add_bond(
        &mut self,
        label: impl Into<String>,
        result: &BondResult,
        weight: f64,
    ) -> &mut Self {
        self.add(Position::from_bond(label, result, weight))
    }

    /// Positions in insertion order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if no positions have been added.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sums weighted values and sensitivities.
    pub fn aggregate(&self) -> PortfolioRisk {
        let risk = self
            .positions
            .iter()
            .fold(PortfolioRisk::default(), |mut acc, p| {
                acc.value += p.market_value();
                acc.greeks += p.greeks * p.weight;
                acc.rate_convexity += p.weight * p.rate_convexity;
                acc.positions += 1;
                acc
            });
        tracing::debug!(
            positions = risk.positions,
            value = risk.value,
            delta = risk.greeks.delta,
            rho = risk.greeks.rho,
            "portfolio aggregated"
        );
        risk
    }

    /// Prices every request in parallel and collects the positions.
    ///
    /// Bonds are priced against `curve`. Positions keep the order of
    /// `requests` regardless of which worker priced them.
    ///
    /// # Errors
    ///
    /// The first failing request, in request order, as
    /// [`RiskError::Pricing`] carrying its label.
    pub fn price_portfolio<C>(
        requests: &[PositionRequest],
        curve: &C,
        token: &CancellationToken,
    ) -> Result<Self, RiskError>
    where
        C: YieldCurve + Sync + ?Sized,
    {
        let positions = requests
            .par_iter()
            .map(|entry| price_position(entry, curve, token))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(positions = positions.len(), "portfolio priced");
        Ok(Self { positions })
    }
}

impl Extend<Position> for RiskMetricsAggregator {
    fn extend<I: IntoIterator<Item = Position>>(&mut self, iter: I) {
        self.positions.extend(iter);
    }
}

impl FromIterator<Position> for RiskMetricsAggregator {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

fn price_position<C>(
    entry: &PositionRequest,
    curve: &C,
    token: &CancellationToken,
) -> Result<Position, RiskError>
where
    C: YieldCurve + ?Sized,
{
    let wrap = |source| RiskError::Pricing {
        label: entry.label.clone(),
        source,
    };
    match &entry.instrument {
        PositionInstrument::Option(request) => {
            let result = price_option_with_cancel(request, token).map_err(wrap)?;
            Ok(Position::from_option(&entry.label, &result, entry.weight))
        }
        PositionInstrument::Bond(request) => {
            let result = price_bond_with_cancel(request, curve, token).map_err(wrap)?;
            Ok(Position::from_bond(&entry.label, &result, entry.weight))
        }
    }
}
