//! Multi-leg option strategies.
//!
//! A strategy is a set of European option legs on one underlying plus an
//! optional position in the underlying itself. Its value and Greeks are the
//! quantity-weighted sums of the legs' Black-Scholes values and Greeks.
//!
//! ## Additivity
//!
//! Greeks are partial derivatives of value with respect to inputs that every
//! leg shares (spot, volatility, time, rate). Differentiation is linear, so
//! the Greeks of `Σ qᵢ·Vᵢ + n·S` are `Σ qᵢ·∂Vᵢ + n·∂S`. This holds only
//! while all legs reference the same underlying and the same volatility;
//! strategies mixing underlyings or a volatility surface are not covered.
//!
//! ## Payoff profile
//!
//! P&L is measured at the earliest leg expiry. Legs expiring then pay their
//! intrinsic value, later legs are marked at their Black-Scholes value for
//! the remaining life, and the underlying contributes `n·(S - spot)`.
//! Breakevens are the roots of that function, bracketed on a price grid and
//! refined by bisection; max profit and max loss are its supremum and
//! infimum, or `±∞` when the slope for large prices is non-zero.

use pricer_core::cancel::CancellationToken;
use pricer_core::math::solvers::{BisectionSolver, SolverConfig};
use pricer_core::types::PricingError;
use pricer_models::analytical::BlackScholes;
use pricer_models::greeks::GreeksSet;
use pricer_models::instruments::{
    OptionTerms, OptionType, StrategyDefinition, StrategyKind, StrategyLeg,
};
use pricer_models::models::ModelKind;
use rayon::prelude::*;

use crate::options::OptionResult;

/// Grid intervals used to bracket breakevens.
const GRID_INTERVALS: usize = 600;

/// Grid upper bound as a multiple of `max(strike, spot)`.
const GRID_MULTIPLE: f64 = 3.0;

/// Times the bracket is doubled looking for a root beyond the grid.
const MAX_EXTENSIONS: usize = 20;

/// Slope magnitude below which P&L is treated as flat for large prices.
const FLAT_SLOPE: f64 = 1e-12;

/// Breakevens and P&L bounds of a payoff function.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoffProfile {
    /// Underlying prices at which P&L is zero, ascending
    pub breakevens: Vec<f64>,
    /// Supremum of P&L, `+∞` when unbounded
    pub max_profit: f64,
    /// Infimum of P&L, `-∞` when unbounded
    pub max_loss: f64,
}

/// Profile of `pnl` over underlying prices in `[0, ∞)`.
///
/// `kinks` are prices where `pnl` is not smooth (strikes); they are added to
/// the grid so that extrema at a kink are found exactly. `slope` is the
/// limit of `dP&L/dS` as `S → ∞`.
///
/// # Errors
///
/// `PricingError::Convergence` if a bracketed root cannot be refined.
///
/// # Examples
///
/// ```
/// use pricer_pricing::strategy::payoff_profile;
///
/// // Long call, strike 100, premium 5
/// let profile = payoff_profile(|s| (s - 100.0).max(0.0) - 5.0, &[100.0], 100.0, 1.0).unwrap();
/// assert_eq!(profile.breakevens.len(), 1);
/// assert!((profile.breakevens[0] - 105.0).abs() < 1e-8);
/// assert_eq!(profile.max_profit, f64::INFINITY);
/// assert_eq!(profile.max_loss, -5.0);
/// ```
pub fn payoff_profile<F>(
    pnl: F,
    kinks: &[f64],
    spot: f64,
    slope: f64,
) -> Result<PayoffProfile, PricingError>
where
    F: Fn(f64) -> f64,
{
    let scale = kinks.iter().copied().fold(spot, f64::max);
    let upper = GRID_MULTIPLE * scale;
    let mut grid: Vec<f64> = (0..=GRID_INTERVALS)
        .map(|i| upper * i as f64 / GRID_INTERVALS as f64)
        .chain(kinks.iter().copied().filter(|k| k.is_finite() && *k > 0.0))
        .collect();
    grid.sort_by(f64::total_cmp);
    grid.dedup();
    let values: Vec<f64> = grid.iter().map(|&s| pnl(s)).collect();

    let solver = BisectionSolver::new(SolverConfig::new(1e-10, 200));
    let mut breakevens = Vec::new();
    for i in 0..grid.len() {
        let (a, va) = (grid[i], values[i]);
        if va == 0.0 && (i == 0 || values[i - 1] != 0.0) {
            breakevens.push(a);
            continue;
        }
        if let Some(&vb) = values.get(i + 1) {
            if va * vb < 0.0 {
                breakevens.push(solver.find_root(&pnl, a, grid[i + 1])?);
            }
        }
    }

    let last = values.last().copied().unwrap_or(0.0);
    if slope.abs() > FLAT_SLOPE && last != 0.0 && last.signum() != slope.signum() {
        let mut lo = upper;
        for _ in 0..MAX_EXTENSIONS {
            let hi = 2.0 * lo;
            if pnl(hi).signum() == slope.signum() {
                breakevens.push(solver.find_root(&pnl, lo, hi)?);
                break;
            }
            lo = hi;
        }
    }

    let max_profit = if slope > FLAT_SLOPE {
        f64::INFINITY
    } else {
        values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    };
    let max_loss = if slope < -FLAT_SLOPE {
        f64::NEG_INFINITY
    } else {
        values.iter().copied().fold(f64::INFINITY, f64::min)
    };
    Ok(PayoffProfile {
        breakevens,
        max_profit,
        max_loss,
    })
}

/// Value of `leg` at underlying price `s` with `remaining` years to expiry.
fn mark(
    leg: &StrategyLeg,
    s: f64,
    remaining: f64,
    rate: f64,
    dividend_yield: f64,
    vol: f64,
) -> f64 {
    if remaining <= 0.0 {
        return leg.option_type.intrinsic(s, leg.strike);
    }
    if s <= 0.0 {
        return match leg.option_type {
            OptionType::Call => 0.0,
            OptionType::Put => leg.strike * (-rate * remaining).exp(),
        };
    }
    match BlackScholes::new(s, rate, dividend_yield, vol) {
        Ok(model) => model.price(leg.option_type, leg.strike, remaining),
        Err(_) => f64::NAN,
    }
}

/// Prices a strategy under Black-Scholes.
///
/// See [`price_complex_strategy_with_cancel`].
pub fn price_complex_strategy(
    kind: StrategyKind,
    definition: &StrategyDefinition,
    spot: f64,
    rate: f64,
    dividend_yield: f64,
    volatility: f64,
) -> Result<OptionResult, PricingError> {
    price_complex_strategy_with_cancel(
        kind,
        definition,
        spot,
        rate,
        dividend_yield,
        volatility,
        &CancellationToken::new(),
    )
}

/// Prices a strategy under Black-Scholes, legs in parallel.
///
/// The fair value is the net cost of the position at current prices,
/// `Σ qᵢ·Vᵢ + n·S`; Greeks are aggregated linearly (see the module
/// documentation for when that is valid).
///
/// # Errors
///
/// - `PricingError::Validation` for a leg outside its domain, a shape that
///   does not match `kind`, or invalid market inputs
/// - `PricingError::Cancelled` if `token` is set while legs are priced
///
/// # Examples
///
/// ```
/// use pricer_models::instruments::{OptionType, StrategyDefinition, StrategyKind, StrategyLeg};
/// use pricer_pricing::strategy::price_complex_strategy;
///
/// let straddle = StrategyDefinition::new(vec![
///     StrategyLeg::new(OptionType::Call, 100.0, 0.5, 1.0, 6.0),
///     StrategyLeg::new(OptionType::Put, 100.0, 0.5, 1.0, 5.0),
/// ]);
/// let result = price_complex_strategy(StrategyKind::Straddle, &straddle, 100.0, 0.05, 0.0, 0.2).unwrap();
/// assert_eq!(result.breakeven_prices.len(), 2);
/// assert!((result.breakeven_prices[0] - 89.0).abs() < 1e-8);
/// assert!((result.breakeven_prices[1] - 111.0).abs() < 1e-8);
/// assert_eq!(result.max_profit, f64::INFINITY);
/// assert!((result.max_loss + 11.0).abs() < 1e-12);
/// ```
pub fn price_complex_strategy_with_cancel(
    kind: StrategyKind,
    definition: &StrategyDefinition,
    spot: f64,
    rate: f64,
    dividend_yield: f64,
    volatility: f64,
    token: &CancellationToken,
) -> Result<OptionResult, PricingError> {
    definition.validate(kind)?;
    for leg in &definition.legs {
        OptionTerms::new(
            spot,
            leg.strike,
            leg.expiration,
            rate,
            dividend_yield,
            volatility,
            leg.option_type,
        )
        .validate()?;
    }
    let model = BlackScholes::new(spot, rate, dividend_yield, volatility)?;

    let legs: Vec<(f64, GreeksSet)> = definition
        .legs
        .par_iter()
        .map(|leg| {
            token.check()?;
            let price = model.price(leg.option_type, leg.strike, leg.expiration);
            let greeks = model.greeks(leg.option_type, leg.strike, leg.expiration);
            Ok((leg.signed_quantity * price, greeks.scale(leg.signed_quantity)))
        })
        .collect::<Result<_, PricingError>>()?;

    let size = definition.underlying_position_size;
    let fair_value = legs.iter().map(|(v, _)| v).sum::<f64>() + size * spot;
    let mut greeks: GreeksSet = legs.into_iter().map(|(_, g)| g).sum();
    greeks.delta += size;

    let horizon = definition.earliest_expiry().unwrap_or(0.0);
    let pnl = |s: f64| {
        let options: f64 = definition
            .legs
            .iter()
            .map(|leg| {
                let remaining = leg.expiration - horizon;
                let value = mark(leg, s, remaining, rate, dividend_yield, volatility);
                leg.signed_quantity * (value - leg.entry_price)
            })
            .sum();
        options + size * (s - spot)
    };
    let slope = definition
        .legs
        .iter()
        .filter(|leg| leg.option_type.is_call())
        .map(|leg| leg.signed_quantity * (-dividend_yield * (leg.expiration - horizon)).exp())
        .sum::<f64>()
        + size;
    let strikes: Vec<f64> = definition.legs.iter().map(|l| l.strike).collect();
    let profile = payoff_profile(pnl, &strikes, spot, slope)?;

    tracing::debug!(
        ?kind,
        legs = definition.legs.len(),
        fair_value,
        breakevens = profile.breakevens.len(),
        "strategy priced"
    );
    Ok(OptionResult {
        breakeven_prices: profile.breakevens,
        max_profit: profile.max_profit,
        max_loss: profile.max_loss,
        greeks,
        ..OptionResult::priced(fair_value, ModelKind::BlackScholes)
    })
}
