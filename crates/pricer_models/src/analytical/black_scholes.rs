//! Black-Scholes pricing model for European options with continuous dividend yield.
//!
//! ## Mathematical Formulas
//!
//! **Call Price**: C = S·e^(-qT)·N(d₁) - K·e^(-rT)·N(d₂)
//! **Put Price**: P = K·e^(-rT)·N(-d₂) - S·e^(-qT)·N(-d₁)
//!
//! Where:
//! - d₁ = (ln(S/K) + (r - q + σ²/2)T) / (σ√T)
//! - d₂ = d₁ - σ√T
//!
//! When σ√T vanishes the price collapses to the discounted intrinsic value
//! on the forward, `max(±(S·e^(-qT) - K·e^(-rT)), 0)`, and the Greeks to
//! those of that deterministic payoff.

use pricer_core::math::distributions::{norm_cdf, norm_pdf};
use pricer_core::math::solvers::{solve_with_fallback, SolverConfig};

use super::error::AnalyticalError;
use crate::greeks::GreeksSet;
use crate::instruments::OptionType;

/// σ√T below which the lognormal density is treated as a point mass.
const DEGENERATE_STD: f64 = 1e-12;

/// Lower and upper bounds of the implied volatility search.
const IMPLIED_VOL_BRACKET: (f64, f64) = (1e-6, 5.0);

/// Black-Scholes model for European option pricing.
///
/// # Examples
/// ```
/// use pricer_models::analytical::BlackScholes;
/// use pricer_models::instruments::OptionType;
///
/// let bs = BlackScholes::new(100.0, 0.05, 0.0, 0.2).unwrap();
/// let call = bs.price(OptionType::Call, 100.0, 0.25);
/// let put = bs.price(OptionType::Put, 100.0, 0.25);
///
/// // Put-call parity: C - P = S - K·e^(-rT)
/// let parity = call - put - (100.0 - 100.0 * (-0.05_f64 * 0.25).exp());
/// assert!(parity.abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholes {
    /// Spot price (S)
    spot: f64,
    /// Risk-free interest rate (r)
    rate: f64,
    /// Continuous dividend yield (q)
    dividend_yield: f64,
    /// Volatility (σ)
    volatility: f64,
}

impl BlackScholes {
    /// Creates a new Black-Scholes model.
    ///
    /// Zero volatility is accepted and handled as the deterministic limit.
    ///
    /// # Errors
    /// - `AnalyticalError::InvalidSpot` if spot <= 0
    /// - `AnalyticalError::InvalidVolatility` if volatility < 0 or not finite
    pub fn new(
        spot: f64,
        rate: f64,
        dividend_yield: f64,
        volatility: f64,
    ) -> Result<Self, AnalyticalError> {
        if !(spot.is_finite() && spot > 0.0) {
            return Err(AnalyticalError::InvalidSpot { spot });
        }
        if !(volatility.is_finite() && volatility >= 0.0) {
            return Err(AnalyticalError::InvalidVolatility { volatility });
        }
        Ok(Self {
            spot,
            rate,
            dividend_yield,
            volatility,
        })
    }

    /// Returns the spot price.
    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Returns the risk-free rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns the dividend yield.
    #[inline]
    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    /// Returns the volatility.
    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Returns a copy with a different volatility.
    pub fn with_volatility(&self, volatility: f64) -> Result<Self, AnalyticalError> {
        Self::new(self.spot, self.rate, self.dividend_yield, volatility)
    }

    /// d₁ = (ln(S/K) + (r - q + σ²/2)T) / (σ√T)
    #[inline]
    pub fn d1(&self, strike: f64, expiry: f64) -> f64 {
        let std = self.volatility * expiry.sqrt();
        ((self.spot / strike).ln()
            + (self.rate - self.dividend_yield + 0.5 * self.volatility * self.volatility) * expiry)
            / std
    }

    /// d₂ = d₁ - σ√T
    #[inline]
    pub fn d2(&self, strike: f64, expiry: f64) -> f64 {
        self.d1(strike, expiry) - self.volatility * expiry.sqrt()
    }

    fn is_degenerate(&self, expiry: f64) -> bool {
        self.volatility * expiry.max(0.0).sqrt() < DEGENERATE_STD
    }

    /// Option value.
    pub fn price(&self, payoff: OptionType, strike: f64, expiry: f64) -> f64 {
        let t = expiry.max(0.0);
        let dq = (-self.dividend_yield * t).exp();
        let dr = (-self.rate * t).exp();
        if self.is_degenerate(t) {
            return (payoff.sign() * (self.spot * dq - strike * dr)).max(0.0);
        }
        let d1 = self.d1(strike, t);
        let d2 = d1 - self.volatility * t.sqrt();
        match payoff {
            OptionType::Call => self.spot * dq * norm_cdf(d1) - strike * dr * norm_cdf(d2),
            OptionType::Put => strike * dr * norm_cdf(-d2) - self.spot * dq * norm_cdf(-d1),
        }
    }

    /// Call value.
    #[inline]
    pub fn price_call(&self, strike: f64, expiry: f64) -> f64 {
        self.price(OptionType::Call, strike, expiry)
    }

    /// Put value.
    #[inline]
    pub fn price_put(&self, strike: f64, expiry: f64) -> f64 {
        self.price(OptionType::Put, strike, expiry)
    }

    /// All eleven analytic Greeks.
    ///
    /// Theta and charm are calendar-time derivatives; vega-type Greeks are
    /// per unit of volatility; rho is per unit of rate.
    ///
    /// # Examples
    /// ```
    /// use pricer_models::analytical::BlackScholes;
    /// use pricer_models::instruments::OptionType;
    ///
    /// let bs = BlackScholes::new(100.0, 0.05, 0.0, 0.2).unwrap();
    /// let g = bs.greeks(OptionType::Call, 100.0, 0.25);
    /// assert!((g.delta - 0.5695).abs() < 1e-3);
    /// assert!(g.gamma > 0.0 && g.vega > 0.0 && g.theta < 0.0);
    /// ```
    pub fn greeks(&self, payoff: OptionType, strike: f64, expiry: f64) -> GreeksSet {
        let t = expiry.max(0.0);
        let (s, r, q, sigma) = (self.spot, self.rate, self.dividend_yield, self.volatility);
        let dq = (-q * t).exp();
        let dr = (-r * t).exp();

        if self.is_degenerate(t) {
            return self.degenerate_greeks(payoff, strike, t, dq, dr);
        }

        let sqrt_t = t.sqrt();
        let std = sigma * sqrt_t;
        let d1 = self.d1(strike, t);
        let d2 = d1 - std;
        let pdf = norm_pdf(d1);

        let gamma = dq * pdf / (s * std);
        let vega = s * dq * pdf * sqrt_t;
        let decay = -s * dq * pdf * sigma / (2.0 * sqrt_t);
        let charm_common = dq * pdf * (2.0 * (r - q) * t - d2 * std) / (2.0 * t * std);

        let (delta, theta, rho, charm) = match payoff {
            OptionType::Call => (
                dq * norm_cdf(d1),
                decay - r * strike * dr * norm_cdf(d2) + q * s * dq * norm_cdf(d1),
                strike * t * dr * norm_cdf(d2),
                q * dq * norm_cdf(d1) - charm_common,
            ),
            OptionType::Put => (
                dq * (norm_cdf(d1) - 1.0),
                decay + r * strike * dr * norm_cdf(-d2) - q * s * dq * norm_cdf(-d1),
                -strike * t * dr * norm_cdf(-d2),
                -q * dq * norm_cdf(-d1) - charm_common,
            ),
        };

        let d1d2 = d1 * d2;
        GreeksSet {
            delta,
            gamma,
            theta,
            vega,
            rho,
            vanna: -dq * pdf * d2 / sigma,
            volga: vega * d1d2 / sigma,
            charm,
            speed: -gamma / s * (d1 / std + 1.0),
            zomma: gamma * (d1d2 - 1.0) / sigma,
            ultima: -vega / (sigma * sigma) * (d1d2 * (1.0 - d1d2) + d1 * d1 + d2 * d2),
        }
    }

    /// Greeks of `max(ω(S·Dq - K·Dr), 0)`, the σ√T → 0 limit.
    fn degenerate_greeks(
        &self,
        payoff: OptionType,
        strike: f64,
        t: f64,
        dq: f64,
        dr: f64,
    ) -> GreeksSet {
        let omega = payoff.sign();
        let in_the_money = omega * (self.spot * dq - strike * dr) > 0.0;
        if !in_the_money {
            return GreeksSet::zero();
        }
        GreeksSet {
            delta: omega * dq,
            theta: omega * (self.dividend_yield * self.spot * dq - self.rate * strike * dr),
            rho: omega * strike * t * dr,
            charm: omega * self.dividend_yield * dq,
            ..GreeksSet::zero()
        }
    }

    /// Volatility that reproduces `price`.
    ///
    /// Newton-Raphson on vega from a Brenner-Subrahmanyam style guess, with a
    /// bisection fallback over [1e-6, 5].
    ///
    /// # Errors
    /// - `AnalyticalError::InvalidPrice` if `price` violates no-arbitrage bounds
    /// - `AnalyticalError::Solver` if both solvers fail
    pub fn implied_volatility(
        &self,
        payoff: OptionType,
        strike: f64,
        expiry: f64,
        price: f64,
    ) -> Result<f64, AnalyticalError> {
        let dq = (-self.dividend_yield * expiry).exp();
        let dr = (-self.rate * expiry).exp();
        let (lower, upper) = match payoff {
            OptionType::Call => ((self.spot * dq - strike * dr).max(0.0), self.spot * dq),
            OptionType::Put => ((strike * dr - self.spot * dq).max(0.0), strike * dr),
        };
        if !(price > lower && price < upper) || expiry <= 0.0 {
            return Err(AnalyticalError::InvalidPrice {
                price,
                lower,
                upper,
            });
        }

        let objective = |sigma: f64| {
            let model = Self { volatility: sigma, ..*self };
            model.price(payoff, strike, expiry) - price
        };
        let vega = |sigma: f64| {
            let model = Self { volatility: sigma, ..*self };
            model.greeks(payoff, strike, expiry).vega
        };
        let guess =
            ((2.0 * std::f64::consts::PI / expiry).sqrt() * price / self.spot).clamp(0.05, 2.0);

        let (sigma, _) = solve_with_fallback(
            objective,
            vega,
            guess,
            IMPLIED_VOL_BRACKET,
            SolverConfig::new(1e-10, 50),
            SolverConfig::bracketing(),
        )?;
        Ok(sigma)
    }
}

/// Black-76 value of an option on a forward.
///
/// `discount` multiplies the undiscounted expectation. A zero `vol` or
/// `expiry` returns the discounted intrinsic value of the forward.
///
/// # Examples
/// ```
/// use pricer_models::analytical::black76;
/// use pricer_models::instruments::OptionType;
///
/// let c = black76(OptionType::Call, 100.0, 100.0, 1.0, 0.2, 1.0);
/// let p = black76(OptionType::Put, 100.0, 100.0, 1.0, 0.2, 1.0);
/// assert!((c - p).abs() < 1e-12);
/// ```
pub fn black76(
    payoff: OptionType,
    forward: f64,
    strike: f64,
    expiry: f64,
    vol: f64,
    discount: f64,
) -> f64 {
    let std = vol * expiry.max(0.0).sqrt();
    if std < DEGENERATE_STD {
        return discount * payoff.intrinsic(forward, strike);
    }
    let d1 = ((forward / strike).ln() + 0.5 * std * std) / std;
    let d2 = d1 - std;
    let omega = payoff.sign();
    discount * omega * (forward * norm_cdf(omega * d1) - strike * norm_cdf(omega * d2))
}
