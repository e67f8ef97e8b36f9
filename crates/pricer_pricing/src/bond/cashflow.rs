//! Coupon schedules and the yield arithmetic built on them.
//!
//! A flow at period `t` (counted from settlement, so `t = k − accrued`)
//! is discounted by `(1 + y/f)^{-t}` on the yield side and by
//! `D(t/f) · e^{-s·t/f}` on the curve side.

use pricer_core::market_data::curves::YieldCurve;
use pricer_core::math::solvers::{solve_with_fallback, SolveMethod, SolverConfig};
use pricer_core::types::PricingError;
use pricer_models::instruments::BondTerms;

/// Admissible yield range for the bisection fallback.
pub const YIELD_BRACKET: (f64, f64) = (-0.99, 10.0);

/// Admissible Z-spread range for the bisection fallback.
pub const SPREAD_BRACKET: (f64, f64) = (-0.5, 5.0);

/// Tolerance used to decide whether a coupon falls on a redemption date.
const DATE_EPSILON: f64 = 1e-9;

/// One dated payment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlow {
    /// Coupon periods from settlement
    pub period: f64,
    /// Years from settlement
    pub time: f64,
    /// Payment amount
    pub amount: f64,
}

/// Ordered payments of a bond up to a redemption date.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowSchedule {
    frequency: f64,
    flows: Vec<CashFlow>,
}

impl CashFlowSchedule {
    /// Coupons and principal of `terms` to maturity.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_models::instruments::BondTerms;
    /// use pricer_pricing::bond::CashFlowSchedule;
    ///
    /// let schedule = CashFlowSchedule::from_terms(&BondTerms::fixed(1000.0, 0.05, 2.0, 2));
    /// assert_eq!(schedule.flows().len(), 4);
    /// assert_eq!(schedule.flows()[3].amount, 1025.0);
    /// assert!((schedule.price_at_yield(0.05) - 1000.0).abs() < 1e-9);
    /// ```
    pub fn from_terms(terms: &BondTerms) -> Self {
        let frequency = f64::from(terms.frequency);
        let periods = terms.periods();
        let coupon = terms.coupon();
        let flows = (1..=periods)
            .map(|k| {
                let period = k as f64 - terms.accrued_fraction;
                let amount = if k == periods {
                    coupon + terms.face_value
                } else {
                    coupon
                };
                CashFlow {
                    period,
                    time: period / frequency,
                    amount,
                }
            })
            .collect();
        Self { frequency, flows }
    }

    /// Coupons paid up to `date` followed by `redemption` at `date`.
    ///
    /// Returns `None` when `date` is not after settlement.
    pub fn to_redemption(terms: &BondTerms, date: f64, redemption: f64) -> Option<Self> {
        if date <= DATE_EPSILON {
            return None;
        }
        let frequency = f64::from(terms.frequency);
        let coupon = terms.coupon();
        let mut flows: Vec<CashFlow> = (1..=terms.periods())
            .map(|k| k as f64 - terms.accrued_fraction)
            .take_while(|period| period / frequency <= date + DATE_EPSILON)
            .map(|period| CashFlow {
                period,
                time: period / frequency,
                amount: coupon,
            })
            .collect();

        match flows.last_mut() {
            Some(last) if (last.time - date).abs() <= DATE_EPSILON => last.amount += redemption,
            _ => flows.push(CashFlow {
                period: date * frequency,
                time: date,
                amount: redemption,
            }),
        }
        Some(Self { frequency, flows })
    }

    /// Payments in time order.
    pub fn flows(&self) -> &[CashFlow] {
        &self.flows
    }

    /// Coupons per year.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Years to the last payment.
    pub fn horizon(&self) -> f64 {
        self.flows.last().map_or(0.0, |flow| flow.time)
    }

    /// Dirty price at annual yield `y` compounded `frequency` times a year.
    pub fn price_at_yield(&self, y: f64) -> f64 {
        let base = 1.0 + y / self.frequency;
        self.flows
            .iter()
            .map(|flow| flow.amount * base.powf(-flow.period))
            .sum()
    }

    /// Derivative of [`price_at_yield`](Self::price_at_yield) in `y`.
    pub fn yield_slope(&self, y: f64) -> f64 {
        let base = 1.0 + y / self.frequency;
        self.flows
            .iter()
            .map(|flow| -flow.period * flow.amount * base.powf(-flow.period - 1.0) / self.frequency)
            .sum()
    }

    /// Yield at which the schedule prices to `target`.
    ///
    /// Newton-Raphson from `guess` (tolerance 1e-8, 100 iterations), then
    /// bisection over [`YIELD_BRACKET`].
    ///
    /// # Errors
    ///
    /// `PricingError::Convergence` if both solvers fail.
    pub fn solve_yield(&self, target: f64, guess: f64) -> Result<(f64, SolveMethod), PricingError> {
        solve_with_fallback(
            |y| self.price_at_yield(y) - target,
            |y| self.yield_slope(y),
            guess,
            YIELD_BRACKET,
            SolverConfig::yield_solver(),
            SolverConfig::bracketing(),
        )
        .map_err(|err| PricingError::convergence(format!("yield for price {}: {}", target, err)))
    }

    /// Macaulay duration in years at yield `y`.
    pub fn macaulay_duration(&self, y: f64) -> f64 {
        let base = 1.0 + y / self.frequency;
        let (weighted, price) = self.flows.iter().fold((0.0, 0.0), |(w, p), flow| {
            let pv = flow.amount * base.powf(-flow.period);
            (w + flow.time * pv, p + pv)
        });
        weighted / price
    }

    /// Modified duration, Macaulay over `1 + y/f`.
    pub fn modified_duration(&self, y: f64) -> f64 {
        self.macaulay_duration(y) / (1.0 + y / self.frequency)
    }

    /// Annualised convexity at yield `y`.
    pub fn convexity(&self, y: f64) -> f64 {
        let base = 1.0 + y / self.frequency;
        let (weighted, price) = self.flows.iter().fold((0.0, 0.0), |(w, p), flow| {
            let t = flow.period;
            (
                w + t * (t + 1.0) * flow.amount * base.powf(-(t + 2.0)),
                p + flow.amount * base.powf(-t),
            )
        });
        weighted / price / (self.frequency * self.frequency)
    }

    /// Curve discount factor of every payment.
    pub fn discount_factors<C: YieldCurve + ?Sized>(
        &self,
        curve: &C,
    ) -> Result<Vec<f64>, PricingError> {
        self.flows
            .iter()
            .map(|flow| curve.discount_factor(flow.time).map_err(PricingError::from))
            .collect()
    }

    /// Present value on `curve` with a continuously compounded `spread`.
    pub fn present_value<C: YieldCurve + ?Sized>(
        &self,
        curve: &C,
        spread: f64,
    ) -> Result<f64, PricingError> {
        let dfs = self.discount_factors(curve)?;
        Ok(self.spread_value(&dfs, spread))
    }

    /// Spread over `curve` that reprices the schedule to `target`.
    ///
    /// # Errors
    ///
    /// `PricingError::Convergence` if neither Newton nor bisection over
    /// [`SPREAD_BRACKET`] finds it.
    pub fn solve_spread<C: YieldCurve + ?Sized>(
        &self,
        curve: &C,
        target: f64,
    ) -> Result<(f64, SolveMethod), PricingError> {
        let dfs = self.discount_factors(curve)?;
        solve_with_fallback(
            |s| self.spread_value(&dfs, s) - target,
            |s| self.spread_slope(&dfs, s),
            0.0,
            SPREAD_BRACKET,
            SolverConfig::yield_solver(),
            SolverConfig::bracketing(),
        )
        .map_err(|err| PricingError::convergence(format!("z-spread for price {}: {}", target, err)))
    }

    fn spread_value(&self, dfs: &[f64], spread: f64) -> f64 {
        self.flows
            .iter()
            .zip(dfs)
            .map(|(flow, df)| flow.amount * df * (-spread * flow.time).exp())
            .sum()
    }

    fn spread_slope(&self, dfs: &[f64], spread: f64) -> f64 {
        self.flows
            .iter()
            .zip(dfs)
            .map(|(flow, df)| -flow.time * flow.amount * df * (-spread * flow.time).exp())
            .sum()
    }
}
