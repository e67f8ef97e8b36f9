//! Path-dependent option pricing.
//!
//! Closed forms under Black-Scholes where they exist:
//! - single barriers (Reiner-Rubinstein, rebate paid at expiry)
//! - geometric-average Asians (Kemna-Vorst, discrete observations)
//! - floating and fixed strike lookbacks (Conze-Viswanathan)
//!
//! Arithmetic Asians and every payoff under stochastic-volatility or jump
//! dynamics are simulated by [`simulate`].

mod asian;
mod barrier;
mod lookback;
mod monte_carlo;

pub use asian::{expected_average, geometric_asian_price};
pub use barrier::{barrier_price, hit_probability, BarrierValue};
pub use lookback::{expected_extrema, lookback_price, LookbackExtrema, LookbackValue};
pub use monte_carlo::{simulate, BGK_BETA};

use pricer_models::analytical::BlackScholes;
use pricer_models::instruments::{AveragingType, ExoticPayoff, LookbackType, OptionTerms};

/// Price of an exotic payoff with its payoff-specific outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExoticValue {
    /// Present value
    pub price: f64,
    /// Barrier touch probability
    pub knock_probability: Option<f64>,
    /// Expected average of the observed prices
    pub average_price: Option<f64>,
    /// Expected path extrema
    pub extrema: Option<LookbackExtrema>,
    /// Monte Carlo standard error
    pub std_error: Option<f64>,
    /// Monte Carlo 95% confidence interval
    pub confidence_interval: Option<(f64, f64)>,
}

impl ExoticValue {
    pub(crate) fn priced(price: f64) -> Self {
        Self {
            price,
            ..Self::default()
        }
    }
}

/// Closed-form value under Black-Scholes.
///
/// Returns `None` for arithmetic Asians. Expects `volatility > 0` and
/// `time_to_expiration > 0`.
pub fn closed_form(terms: &OptionTerms, payoff: &ExoticPayoff) -> Option<ExoticValue> {
    match payoff {
        ExoticPayoff::Barrier(spec) => {
            let vanilla = BlackScholes::new(
                terms.spot,
                terms.risk_free_rate,
                terms.dividend_yield,
                terms.volatility,
            )
            .ok()?
            .price(terms.payoff, terms.strike, terms.time_to_expiration);
            let value = barrier_price(terms, spec, vanilla);
            Some(ExoticValue {
                knock_probability: Some(value.knock_probability),
                ..ExoticValue::priced(value.price)
            })
        }
        ExoticPayoff::Asian(spec) => match spec.averaging {
            AveragingType::Geometric => Some(ExoticValue {
                average_price: Some(expected_average(terms, spec.observations, spec.averaging)),
                ..ExoticValue::priced(geometric_asian_price(terms, spec.observations))
            }),
            AveragingType::Arithmetic => None,
        },
        ExoticPayoff::Lookback(spec) => {
            let value = lookback_price(terms, spec);
            Some(ExoticValue {
                extrema: Some(value.extrema),
                ..ExoticValue::priced(value.price)
            })
        }
    }
}

/// Value at expiry, where the path is the current spot alone.
pub fn at_expiry(terms: &OptionTerms, payoff: &ExoticPayoff) -> ExoticValue {
    let s = terms.spot;
    let intrinsic = terms.intrinsic();
    match payoff {
        ExoticPayoff::Barrier(spec) => {
            let knocked = spec.barrier_type.is_breached(s, spec.level);
            let price = if knocked == spec.barrier_type.is_in() {
                intrinsic
            } else {
                spec.rebate
            };
            ExoticValue {
                knock_probability: Some(if knocked { 1.0 } else { 0.0 }),
                ..ExoticValue::priced(price)
            }
        }
        ExoticPayoff::Asian(_) => ExoticValue {
            average_price: Some(s),
            ..ExoticValue::priced(intrinsic)
        },
        ExoticPayoff::Lookback(spec) => {
            let price = match spec.lookback_type {
                LookbackType::FloatingStrike => 0.0,
                LookbackType::FixedStrike => intrinsic,
            };
            ExoticValue {
                extrema: Some(LookbackExtrema {
                    minimum: s,
                    maximum: s,
                }),
                ..ExoticValue::priced(price)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_models::instruments::{AsianSpec, BarrierSpec, BarrierType, LookbackSpec, OptionType};

    fn terms() -> OptionTerms {
        OptionTerms::new(100.0, 95.0, 0.0, 0.05, 0.0, 0.2, OptionType::Call)
    }

    #[test]
    fn test_arithmetic_asian_has_no_closed_form() {
        let t = OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call);
        let asian = ExoticPayoff::Asian(AsianSpec {
            averaging: AveragingType::Arithmetic,
            observations: 12,
        });
        assert!(closed_form(&t, &asian).is_none());
    }

    #[test]
    fn test_expired_barrier() {
        let up_out = ExoticPayoff::Barrier(BarrierSpec {
            barrier_type: BarrierType::UpOut,
            level: 110.0,
            rebate: 2.0,
        });
        let v = at_expiry(&terms(), &up_out);
        assert_eq!(v.price, 5.0);
        assert_eq!(v.knock_probability, Some(0.0));

        let down_in = ExoticPayoff::Barrier(BarrierSpec {
            barrier_type: BarrierType::DownIn,
            level: 90.0,
            rebate: 2.0,
        });
        assert_eq!(at_expiry(&terms(), &down_in).price, 2.0);
    }

    #[test]
    fn test_expired_lookback() {
        let floating = ExoticPayoff::Lookback(LookbackSpec {
            lookback_type: LookbackType::FloatingStrike,
        });
        let v = at_expiry(&terms(), &floating);
        assert_eq!(v.price, 0.0);
        assert_eq!(v.extrema.map(|e| e.maximum), Some(100.0));
    }
}
