//! Continuously monitored lookback options under Black-Scholes.
//!
//! Both payoff families reduce to two building blocks at inception:
//! the value of `(M_T - X)⁺` for `X ≥ S` and of `(X - m_T)⁺` for `X ≤ S`,
//! where `M_T` and `m_T` are the running maximum and minimum (Conze and
//! Viswanathan; Goldman, Sosin and Gatto).

use pricer_core::math::distributions::norm_cdf;
use pricer_models::instruments::{LookbackSpec, LookbackType, OptionTerms, OptionType};

/// Cost of carry below which the closed forms are evaluated at this value.
const MIN_CARRY: f64 = 1e-7;

/// Expected path extrema over the option's life.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LookbackExtrema {
    /// Expected minimum of the spot
    pub minimum: f64,
    /// Expected maximum of the spot
    pub maximum: f64,
}

/// Lookback value with the expected extrema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookbackValue {
    /// Present value
    pub price: f64,
    /// Expected extrema under the pricing measure
    pub extrema: LookbackExtrema,
}

#[derive(Debug, Clone, Copy)]
struct Market {
    spot: f64,
    rate: f64,
    carry: f64,
    vol: f64,
    expiry: f64,
}

impl Market {
    fn new(terms: &OptionTerms) -> Self {
        let carry = terms.risk_free_rate - terms.dividend_yield;
        let carry = if carry.abs() < MIN_CARRY {
            MIN_CARRY.copysign(carry)
        } else {
            carry
        };
        Self {
            spot: terms.spot,
            rate: terms.risk_free_rate,
            carry,
            vol: terms.volatility,
            expiry: terms.time_to_expiration,
        }
    }

    fn d1(&self, strike: f64) -> f64 {
        let std = self.vol * self.expiry.sqrt();
        ((self.spot / strike).ln() + (self.carry + 0.5 * self.vol * self.vol) * self.expiry) / std
    }

    /// Present value of `(M_T - x)⁺` for `x ≥ S`.
    fn max_call(&self, x: f64) -> f64 {
        let Market { spot: s, rate: r, carry: b, vol, expiry: t } = *self;
        let std = vol * t.sqrt();
        let d1 = self.d1(x);
        let d2 = d1 - std;
        let lambda = vol * vol / (2.0 * b);
        s * ((b - r) * t).exp() * norm_cdf(d1) - x * (-r * t).exp() * norm_cdf(d2)
            + s * (-r * t).exp()
                * lambda
                * (-(s / x).powf(-1.0 / lambda) * norm_cdf(d1 - 2.0 * b * t.sqrt() / vol)
                    + (b * t).exp() * norm_cdf(d1))
    }

    /// Present value of `(x - m_T)⁺` for `x ≤ S`.
    fn min_put(&self, x: f64) -> f64 {
        let Market { spot: s, rate: r, carry: b, vol, expiry: t } = *self;
        let std = vol * t.sqrt();
        let d1 = self.d1(x);
        let d2 = d1 - std;
        let lambda = vol * vol / (2.0 * b);
        x * (-r * t).exp() * norm_cdf(-d2) - s * ((b - r) * t).exp() * norm_cdf(-d1)
            + s * (-r * t).exp()
                * lambda
                * ((s / x).powf(-1.0 / lambda) * norm_cdf(-d1 + 2.0 * b * t.sqrt() / vol)
                    - (b * t).exp() * norm_cdf(-d1))
    }
}

/// Expected running minimum and maximum of GBM over `[0, T]`.
pub fn expected_extrema(terms: &OptionTerms) -> LookbackExtrema {
    let s = terms.spot;
    if terms.volatility * terms.time_to_expiration.sqrt() <= 0.0 {
        let terminal = terms.forward();
        return LookbackExtrema {
            minimum: s.min(terminal),
            maximum: s.max(terminal),
        };
    }
    let market = Market::new(terms);
    let growth = (market.rate * market.expiry).exp();
    LookbackExtrema {
        minimum: s - growth * market.min_put(s),
        maximum: s + growth * market.max_call(s),
    }
}

/// Closed-form lookback value at inception.
///
/// Requires `volatility > 0` and `time_to_expiration > 0`.
///
/// # Examples
///
/// ```
/// use pricer_models::instruments::{LookbackSpec, LookbackType, OptionTerms, OptionType};
/// use pricer_pricing::exotic::lookback_price;
///
/// let terms = OptionTerms::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call);
/// let floating = lookback_price(&terms, &LookbackSpec { lookback_type: LookbackType::FloatingStrike });
/// assert!(floating.extrema.minimum < 100.0 && floating.extrema.maximum > 100.0);
/// assert!(floating.price > 10.45); // worth more than the at-the-money vanilla
/// ```
pub fn lookback_price(terms: &OptionTerms, spec: &LookbackSpec) -> LookbackValue {
    let market = Market::new(terms);
    let s = terms.spot;
    let k = terms.strike;
    let df_r = (-terms.risk_free_rate * terms.time_to_expiration).exp();
    let df_q = (-terms.dividend_yield * terms.time_to_expiration).exp();

    let price = match (spec.lookback_type, terms.payoff) {
        (LookbackType::FloatingStrike, OptionType::Call) => s * df_q - s * df_r + market.min_put(s),
        (LookbackType::FloatingStrike, OptionType::Put) => market.max_call(s) + s * df_r - s * df_q,
        (LookbackType::FixedStrike, OptionType::Call) if k >= s => market.max_call(k),
        (LookbackType::FixedStrike, OptionType::Call) => df_r * (s - k) + market.max_call(s),
        (LookbackType::FixedStrike, OptionType::Put) if k <= s => market.min_put(k),
        (LookbackType::FixedStrike, OptionType::Put) => df_r * (k - s) + market.min_put(s),
    };

    LookbackValue {
        price: price.max(0.0),
        extrema: expected_extrema(terms),
    }
}
