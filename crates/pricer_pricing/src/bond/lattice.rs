//! Black-Derman-Toy short-rate lattice.
//!
//! Node rates are lognormal, `r(i,j) = a_i · e^{σ√Δt (2j − i)}`, with
//! equal branch probabilities. Each level `a_i` is fitted so the
//! Arrow-Debreu prices at step `i` reproduce the curve discount factor
//! at `(i+1)Δt`. A spread added to every node rate gives the OAS.

use pricer_core::cancel::CancellationToken;
use pricer_core::market_data::curves::YieldCurve;
use pricer_core::math::solvers::{BrentSolver, SolverConfig};
use pricer_core::types::PricingError;
use pricer_models::instruments::{EmbeddedExercise, EmbeddedOption, OptionType};

use super::cashflow::CashFlowSchedule;

/// Doublings allowed while bracketing a level.
const MAX_BRACKET_DOUBLINGS: usize = 60;

/// Calibrated rate levels of a BDT tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ShortRateLattice {
    dt: f64,
    spacing: f64,
    levels: Vec<f64>,
}

impl ShortRateLattice {
    /// Fits `steps` levels of width `dt` to `curve`.
    pub fn calibrate<C: YieldCurve + ?Sized>(
        curve: &C,
        steps: usize,
        dt: f64,
        volatility: f64,
        token: &CancellationToken,
    ) -> Result<Self, PricingError> {
        let spacing = volatility * dt.sqrt();
        let mut levels = Vec::with_capacity(steps);
        let mut arrow = vec![1.0];

        for i in 0..steps {
            token.check()?;
            let target = curve.discount_factor((i + 1) as f64 * dt)?;
            let multipliers: Vec<f64> = (0..=i)
                .map(|j| (spacing * (2.0 * j as f64 - i as f64)).exp())
                .collect();
            let level = fit_level(&arrow, &multipliers, dt, target)?;

            let mut next = vec![0.0; i + 2];
            for (j, (&q, &m)) in arrow.iter().zip(&multipliers).enumerate() {
                let half = 0.5 * q * (-level * m * dt).exp();
                next[j] += half;
                next[j + 1] += half;
            }
            levels.push(level);
            arrow = next;
        }

        Ok(Self {
            dt,
            spacing,
            levels,
        })
    }

    /// Short rate at node `(i, j)`.
    pub fn rate(&self, i: usize, j: usize) -> f64 {
        self.levels[i] * (self.spacing * (2.0 * j as f64 - i as f64)).exp()
    }

    /// Number of time steps.
    pub fn steps(&self) -> usize {
        self.levels.len()
    }

    /// Present value of `cash` (one entry per step, `steps + 1` long) with
    /// `spread` added to every rate.
    ///
    /// The boundary, if any, caps and floors the ex-coupon continuation
    /// value before that step's payment is added.
    pub fn roll_back(
        &self,
        cash: &[f64],
        boundary: Option<&ExerciseBoundary>,
        spread: f64,
        token: &CancellationToken,
    ) -> Result<f64, PricingError> {
        let steps = self.steps();
        let mut values = vec![cash[steps]; steps + 1];
        for i in (0..steps).rev() {
            token.check()?;
            for j in 0..=i {
                let discount = (-(self.rate(i, j) + spread) * self.dt).exp();
                let mut value = 0.5 * (values[j] + values[j + 1]) * discount;
                if let Some(boundary) = boundary {
                    value = boundary.apply(i, value);
                }
                values[j] = value + cash[i];
            }
            values.truncate(i + 1);
        }
        Ok(values[0])
    }
}

/// Solves `Σ_j Q_j e^{-a m_j Δt} = D` for the level `a`.
fn fit_level(
    arrow: &[f64],
    multipliers: &[f64],
    dt: f64,
    target: f64,
) -> Result<f64, PricingError> {
    let price = |a: f64| -> f64 {
        arrow
            .iter()
            .zip(multipliers)
            .map(|(q, m)| q * (-a * m * dt).exp())
            .sum::<f64>()
            - target
    };

    let at_zero = price(0.0);
    if at_zero == 0.0 {
        return Ok(0.0);
    }
    // Price falls as the level rises; walk outward until the sign flips
    let direction = if at_zero > 0.0 { 1.0 } else { -1.0 };
    let mut far = 0.01 * direction;
    let mut doublings = 0;
    while price(far).signum() == at_zero.signum() {
        doublings += 1;
        if doublings > MAX_BRACKET_DOUBLINGS {
            return Err(PricingError::convergence(
                "short-rate level could not be bracketed",
            ));
        }
        far *= 2.0;
    }

    let (lo, hi) = if direction > 0.0 { (0.0, far) } else { (far, 0.0) };
    BrentSolver::new(SolverConfig::new(1e-14, 200))
        .find_root(price, lo, hi)
        .map_err(|err| PricingError::convergence(format!("short-rate level: {}", err)))
}

/// Per-step call caps and put floors.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExerciseBoundary {
    cap: Vec<f64>,
    floor: Vec<f64>,
}

impl ExerciseBoundary {
    /// Boundary of `options` on a grid of `steps` steps of width `dt`.
    ///
    /// European options are eligible at their first listed date, or at
    /// `maturity`. Bermudan options at each listed date, or at
    /// `maturity`. American options at every step from the first listed
    /// date, or from settlement.
    pub fn from_options(options: &[EmbeddedOption], steps: usize, dt: f64, maturity: f64) -> Self {
        let mut cap = vec![f64::INFINITY; steps + 1];
        let mut floor = vec![f64::NEG_INFINITY; steps + 1];
        let step_of = |date: f64| ((date / dt).round() as usize).min(steps);

        for option in options {
            let eligible: Vec<usize> = match option.exercise_style {
                EmbeddedExercise::European => vec![step_of(option.first_exercise(maturity))],
                EmbeddedExercise::Bermudan if option.exercise_dates.is_empty() => {
                    vec![step_of(maturity)]
                }
                EmbeddedExercise::Bermudan => {
                    option.exercise_dates.iter().map(|&d| step_of(d)).collect()
                }
                EmbeddedExercise::American => {
                    (step_of(option.first_exercise(0.0))..=steps).collect()
                }
            };
            for i in eligible {
                match option.option_type {
                    OptionType::Call => cap[i] = cap[i].min(option.exercise_price),
                    OptionType::Put => floor[i] = floor[i].max(option.exercise_price),
                }
            }
        }
        Self { cap, floor }
    }

    fn apply(&self, step: usize, value: f64) -> f64 {
        value.min(self.cap[step]).max(self.floor[step])
    }
}

/// Bond payments and exercise boundary laid on a lattice time grid.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LatticeGrid {
    steps: usize,
    dt: f64,
    cash: Vec<f64>,
    boundary: ExerciseBoundary,
}

impl LatticeGrid {
    /// Grid of at least `min_steps` steps, a whole number per coupon period.
    pub fn new(
        schedule: &CashFlowSchedule,
        options: &[EmbeddedOption],
        maturity: f64,
        min_steps: usize,
    ) -> Self {
        let periods = schedule.flows().len().max(1);
        let per_period = min_steps.div_ceil(periods).max(1);
        let steps = periods * per_period;
        let dt = schedule.horizon() / steps as f64;

        let mut cash = vec![0.0; steps + 1];
        for flow in schedule.flows() {
            let index = ((flow.time / dt).round() as usize).clamp(1, steps);
            cash[index] += flow.amount;
        }
        let boundary = ExerciseBoundary::from_options(options, steps, dt, maturity);

        Self {
            steps,
            dt,
            cash,
            boundary,
        }
    }

    /// Lattice fitted to `curve` on this grid.
    pub fn calibrate<C: YieldCurve + ?Sized>(
        &self,
        curve: &C,
        volatility: f64,
        token: &CancellationToken,
    ) -> Result<ShortRateLattice, PricingError> {
        ShortRateLattice::calibrate(curve, self.steps, self.dt, volatility, token)
    }

    /// Bond value on `lattice` at `spread`, with or without exercise.
    pub fn price(
        &self,
        lattice: &ShortRateLattice,
        spread: f64,
        exercise: bool,
        token: &CancellationToken,
    ) -> Result<f64, PricingError> {
        let boundary = exercise.then_some(&self.boundary);
        lattice.roll_back(&self.cash, boundary, spread, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::market_data::curves::{FlatCurve, LogDiscountCurve};
    use pricer_models::instruments::BondTerms;

    fn call(price: f64, style: EmbeddedExercise, dates: Vec<f64>) -> EmbeddedOption {
        EmbeddedOption {
            option_type: OptionType::Call,
            exercise_style: style,
            exercise_price: price,
            exercise_dates: dates,
            volatility: 0.15,
        }
    }

    fn put(price: f64, dates: Vec<f64>) -> EmbeddedOption {
        EmbeddedOption {
            option_type: OptionType::Put,
            exercise_style: EmbeddedExercise::Bermudan,
            exercise_price: price,
            exercise_dates: dates,
            volatility: 0.15,
        }
    }

    // ========================================
    // Calibration
    // ========================================

    #[test]
    fn test_reproduces_discount_factors() {
        let curve = LogDiscountCurve::from_zero_rates(&[(1.0, 0.02), (3.0, 0.03), (5.0, 0.035)])
            .unwrap();
        let token = CancellationToken::new();
        let (steps, dt) = (40, 0.125);
        let lattice = ShortRateLattice::calibrate(&curve, steps, dt, 0.2, &token).unwrap();

        for k in [1, 8, 24, 40] {
            let mut cash = vec![0.0; steps + 1];
            cash[k] = 1.0;
            let price = lattice.roll_back(&cash, None, 0.0, &token).unwrap();
            let expected = curve.discount_factor(k as f64 * dt).unwrap();
            assert_relative_eq!(price, expected, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_zero_volatility_levels_are_forwards() {
        let curve = FlatCurve::new(0.04);
        let token = CancellationToken::new();
        let lattice = ShortRateLattice::calibrate(&curve, 12, 0.25, 0.0, &token).unwrap();
        for i in 0..12 {
            assert_relative_eq!(lattice.rate(i, 0), 0.04, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_negative_rates_calibrate() {
        let curve = FlatCurve::new(-0.005);
        let token = CancellationToken::new();
        let lattice = ShortRateLattice::calibrate(&curve, 8, 0.5, 0.1, &token).unwrap();
        assert!(lattice.rate(0, 0) < 0.0);
    }

    #[test]
    fn test_cancelled_calibration() {
        let token = CancellationToken::new();
        token.cancel();
        let result = ShortRateLattice::calibrate(&FlatCurve::new(0.03), 10, 0.1, 0.1, &token);
        assert_eq!(result, Err(PricingError::Cancelled));
    }

    // ========================================
    // Exercise
    // ========================================

    #[test]
    fn test_boundary_eligibility() {
        let options = [
            call(101.0, EmbeddedExercise::European, vec![2.0]),
            call(100.5, EmbeddedExercise::American, vec![3.0]),
            put(99.0, vec![1.0, 4.0]),
        ];
        let boundary = ExerciseBoundary::from_options(&options, 10, 0.5, 5.0);
        assert_eq!(boundary.cap[4], 101.0);
        assert_eq!(boundary.cap[5], f64::INFINITY);
        assert!(boundary.cap[6..].iter().all(|&c| c == 100.5));
        assert_eq!(boundary.floor[2], 99.0);
        assert_eq!(boundary.floor[8], 99.0);
        assert_eq!(boundary.floor[3], f64::NEG_INFINITY);
    }

    #[test]
    fn test_call_lowers_and_put_raises_value() {
        let terms = BondTerms::fixed(100.0, 0.06, 5.0, 2);
        let schedule = CashFlowSchedule::from_terms(&terms);
        let curve = FlatCurve::new(0.04);
        let token = CancellationToken::new();

        let calls = [call(100.0, EmbeddedExercise::American, vec![1.0])];
        let puts = [put(100.0, vec![2.0, 3.0])];
        let callable = LatticeGrid::new(&schedule, &calls, 5.0, 120);
        let putable = LatticeGrid::new(&schedule, &puts, 5.0, 120);
        let lattice = callable.calibrate(&curve, 0.15, &token).unwrap();

        let straight = callable.price(&lattice, 0.0, false, &token).unwrap();
        let called = callable.price(&lattice, 0.0, true, &token).unwrap();
        let put_value = putable.price(&lattice, 0.0, true, &token).unwrap();

        assert_relative_eq!(
            straight,
            schedule.present_value(&curve, 0.0).unwrap(),
            max_relative = 1e-9
        );
        assert!(called < straight);
        assert!(put_value >= straight);
    }

    #[test]
    fn test_spread_lowers_value() {
        let schedule = CashFlowSchedule::from_terms(&BondTerms::fixed(100.0, 0.05, 3.0, 1));
        let grid = LatticeGrid::new(&schedule, &[], 3.0, 30);
        let token = CancellationToken::new();
        let lattice = grid.calibrate(&FlatCurve::new(0.03), 0.1, &token).unwrap();
        let base = grid.price(&lattice, 0.0, true, &token).unwrap();
        let wide = grid.price(&lattice, 0.01, true, &token).unwrap();
        assert!(wide < base);
    }
}
