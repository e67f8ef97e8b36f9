//! Finite-difference Greeks for engines without analytic sensitivities.
//!
//! Every Greek is a stencil over revaluations at bumped inputs. The set of
//! bumps needed is collected first, deduplicated, and revalued in parallel;
//! the stencils then read from the resulting table. Central differences are
//! used where the bumped input stays in its domain, forward differences
//! otherwise (volatility near zero, expiry shorter than the time bump).
//!
//! | Greek   | Stencil                                  |
//! |---------|------------------------------------------|
//! | delta   | `(V₊ - V₋) / 2h`                          |
//! | gamma   | `(V₊ - 2V₀ + V₋) / h²`                    |
//! | speed   | `(V₊₂ - 2V₊ + 2V₋ - V₋₂) / 2h³`           |
//! | vega    | central or `(-3V₀ + 4V₁ - V₂) / 2h`       |
//! | volga   | central or `(V₀ - 2V₁ + V₂) / h²`         |
//! | ultima  | central or `(-V₀ + 3V₁ - 3V₂ + V₃) / h³`  |
//! | theta   | `-∂V/∂T`                                  |
//! | rho     | central                                   |
//!
//! Vanna, zomma and charm difference delta or gamma across volatility or
//! expiry.

use std::collections::{BTreeMap, BTreeSet};

use pricer_core::cancel::CancellationToken;
use pricer_core::types::{InstabilityKind, PricingError, PricingWarning};
use pricer_models::greeks::GreeksSet;
use rayon::prelude::*;

/// Bump sizes for finite-difference Greeks.
///
/// # Examples
///
/// ```
/// use pricer_pricing::options::GreeksConfig;
///
/// let config = GreeksConfig::default();
/// assert_eq!(config.spot_bump, 0.01);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GreeksConfig {
    /// Spot bump relative to spot
    pub spot_bump: f64,
    /// Absolute volatility bump for vega, volga and vanna
    pub vol_bump: f64,
    /// Absolute volatility bump for ultima
    pub ultima_vol_bump: f64,
    /// Expiry bump in years
    pub time_bump: f64,
    /// Absolute rate bump
    pub rate_bump: f64,
}

impl Default for GreeksConfig {
    fn default() -> Self {
        Self {
            spot_bump: 0.01,
            vol_bump: 1e-4,
            ultima_vol_bump: 0.01,
            time_bump: 1.0 / 252.0,
            rate_bump: 1e-4,
        }
    }
}

impl GreeksConfig {
    /// Rejects non-positive or non-finite bumps.
    pub fn validate(&self) -> Result<(), PricingError> {
        for (name, value) in [
            ("spot_bump", self.spot_bump),
            ("vol_bump", self.vol_bump),
            ("ultima_vol_bump", self.ultima_vol_bump),
            ("time_bump", self.time_bump),
            ("rate_bump", self.rate_bump),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(PricingError::validation(format!(
                    "greeks {} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Absolute input shifts for one revaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bump {
    /// Added to spot
    pub spot: f64,
    /// Added to the model's volatility input
    pub volatility: f64,
    /// Added to time to expiry
    pub expiry: f64,
    /// Added to the risk-free rate
    pub rate: f64,
}

/// Grid offsets: spot, small vol bump, ultima vol bump, expiry, rate.
type Key = (i8, i8, i8, i8, i8);

const BASE: Key = (0, 0, 0, 0, 0);

fn spot_key(i: i8) -> Key {
    (i, 0, 0, 0, 0)
}

/// Point of the base configuration on which the stencils are evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseInputs {
    /// Current spot
    pub spot: f64,
    /// Volatility input that the volatility bump shifts
    pub volatility: f64,
    /// Time to expiry
    pub expiry: f64,
    /// Price at the unbumped inputs
    pub value: f64,
}

#[derive(Debug, Clone, Copy)]
struct Stencils {
    vol: [i8; 2],
    vol_central: bool,
    ultima_central: bool,
    time: [i8; 2],
}

impl Stencils {
    fn new(config: &GreeksConfig, base: &BaseInputs) -> Self {
        let vol_central = base.volatility >= 2.0 * config.vol_bump;
        let ultima_central = base.volatility >= 2.0 * config.ultima_vol_bump;
        let time_central = base.expiry >= config.time_bump;
        Self {
            vol: if vol_central { [-1, 1] } else { [0, 1] },
            vol_central,
            ultima_central,
            time: if time_central { [-1, 1] } else { [0, 1] },
        }
    }

    fn keys(&self) -> BTreeSet<Key> {
        let mut keys = BTreeSet::new();
        for s in -2..=2 {
            keys.insert(spot_key(s));
        }
        let vol_range: &[i8] = if self.vol_central { &[-1, 1] } else { &[1, 2] };
        for &v in vol_range {
            keys.insert((0, v, 0, 0, 0));
        }
        for &v in &self.vol {
            for s in -1..=1 {
                keys.insert((s, v, 0, 0, 0));
            }
        }
        let ultima_range: &[i8] = if self.ultima_central { &[-2, -1, 1, 2] } else { &[1, 2, 3] };
        for &u in ultima_range {
            keys.insert((0, 0, u, 0, 0));
        }
        for &t in &self.time {
            for s in -1..=1 {
                keys.insert((s, 0, 0, t, 0));
            }
        }
        keys.insert((0, 0, 0, 0, 1));
        keys.insert((0, 0, 0, 0, -1));
        keys
    }
}

/// Computes all eleven Greeks by finite differences of `price`.
///
/// `price` revalues the instrument with the given [`Bump`] applied; the
/// unbumped value is taken from `base.value`. A revaluation that fails
/// leaves its stencils non-finite; non-finite Greeks are zeroed and reported
/// as one `DegenerateGreeks` warning.
///
/// # Errors
///
/// `PricingError::Cancelled` if `token` is set during revaluation.
///
/// # Examples
///
/// ```
/// use pricer_core::cancel::CancellationToken;
/// use pricer_pricing::options::{finite_difference_greeks, BaseInputs, GreeksConfig};
///
/// // V = S²·σ: delta = 2Sσ, vega = S²
/// let base = BaseInputs { spot: 10.0, volatility: 0.2, expiry: 1.0, value: 20.0 };
/// let (greeks, warnings) = finite_difference_greeks(
///     &GreeksConfig::default(),
///     &base,
///     &CancellationToken::new(),
///     |b| Ok((10.0 + b.spot).powi(2) * (0.2 + b.volatility)),
/// )
/// .unwrap();
/// assert!((greeks.delta - 4.0).abs() < 1e-9);
/// assert!((greeks.vega - 100.0).abs() < 1e-6);
/// assert!(warnings.is_empty());
/// ```
pub fn finite_difference_greeks<F>(
    config: &GreeksConfig,
    base: &BaseInputs,
    token: &CancellationToken,
    price: F,
) -> Result<(GreeksSet, Vec<PricingWarning>), PricingError>
where
    F: Fn(Bump) -> Result<f64, PricingError> + Sync,
{
    let h = config.spot_bump * base.spot;
    let dv = config.vol_bump;
    let du = config.ultima_vol_bump;
    let dt = config.time_bump;
    let dr = config.rate_bump;
    let stencils = Stencils::new(config, base);

    let keys: Vec<Key> = stencils.keys().into_iter().filter(|k| *k != BASE).collect();
    let evaluated: Vec<(Key, f64)> = keys
        .par_iter()
        .map(|&key| {
            token.check()?;
            let (s, v, u, t, r) = key;
            let bump = Bump {
                spot: f64::from(s) * h,
                volatility: f64::from(v) * dv + f64::from(u) * du,
                expiry: f64::from(t) * dt,
                rate: f64::from(r) * dr,
            };
            match price(bump) {
                Ok(value) => Ok((key, value)),
                Err(PricingError::Cancelled) => Err(PricingError::Cancelled),
                Err(err) => {
                    tracing::debug!(?key, error = %err, "bumped revaluation failed");
                    Ok((key, f64::NAN))
                }
            }
        })
        .collect::<Result<_, PricingError>>()?;

    let mut table: BTreeMap<Key, f64> = evaluated.into_iter().collect();
    table.insert(BASE, base.value);
    let at = |key: Key| table.get(&key).copied().unwrap_or(f64::NAN);

    let delta_at = |v: i8, t: i8| (at((1, v, 0, t, 0)) - at((-1, v, 0, t, 0))) / (2.0 * h);
    let gamma_at = |v: i8, t: i8| {
        (at((1, v, 0, t, 0)) - 2.0 * at((0, v, 0, t, 0)) + at((-1, v, 0, t, 0))) / (h * h)
    };

    let delta = delta_at(0, 0);
    let gamma = gamma_at(0, 0);
    let speed =
        (at(spot_key(2)) - 2.0 * at(spot_key(1)) + 2.0 * at(spot_key(-1)) - at(spot_key(-2)))
            / (2.0 * h * h * h);

    let vol_at = |v: i8| at((0, v, 0, 0, 0));
    let (vega, volga) = if stencils.vol_central {
        (
            (vol_at(1) - vol_at(-1)) / (2.0 * dv),
            (vol_at(1) - 2.0 * base.value + vol_at(-1)) / (dv * dv),
        )
    } else {
        (
            (-3.0 * base.value + 4.0 * vol_at(1) - vol_at(2)) / (2.0 * dv),
            (base.value - 2.0 * vol_at(1) + vol_at(2)) / (dv * dv),
        )
    };

    let ultima_at = |u: i8| at((0, 0, u, 0, 0));
    let ultima = if stencils.ultima_central {
        (ultima_at(2) - 2.0 * ultima_at(1) + 2.0 * ultima_at(-1) - ultima_at(-2))
            / (2.0 * du * du * du)
    } else {
        (-base.value + 3.0 * ultima_at(1) - 3.0 * ultima_at(2) + ultima_at(3)) / (du * du * du)
    };

    let [v_lo, v_hi] = stencils.vol;
    let vol_span = f64::from(v_hi - v_lo) * dv;
    let vanna = (delta_at(v_hi, 0) - delta_at(v_lo, 0)) / vol_span;
    let zomma = (gamma_at(v_hi, 0) - gamma_at(v_lo, 0)) / vol_span;

    let [t_lo, t_hi] = stencils.time;
    let time_span = f64::from(t_hi - t_lo) * dt;
    let theta = -(at((0, 0, 0, t_hi, 0)) - at((0, 0, 0, t_lo, 0))) / time_span;
    let charm = -(delta_at(0, t_hi) - delta_at(0, t_lo)) / time_span;

    let rho = (at((0, 0, 0, 0, 1)) - at((0, 0, 0, 0, -1))) / (2.0 * dr);

    let mut greeks = GreeksSet {
        delta,
        gamma,
        theta,
        vega,
        rho,
        vanna,
        volga,
        charm,
        speed,
        zomma,
        ultima,
    };
    let degenerate = greeks.sanitise();
    let mut warnings = Vec::new();
    if !degenerate.is_empty() {
        tracing::warn!(?degenerate, "non-finite finite-difference Greeks zeroed");
        warnings.push(PricingWarning::instability(
            InstabilityKind::DegenerateGreeks,
            format!("non-finite Greeks set to zero: {}", degenerate.join(", ")),
        ));
    }
    Ok((greeks, warnings))
}
