//! Bond pricing.
//!
//! The target dirty price is the quoted market price or, without a quote,
//! the curve-implied model price:
//!
//! | Structure         | Model price                                              |
//! |-------------------|----------------------------------------------------------|
//! | fixed             | cash flows discounted at `D(t)·e^{-spread·t}`             |
//! | callable, putable | Black-Derman-Toy lattice at the credit spread            |
//! | convertible       | straight value plus `ratio ×` Black-Scholes call on the share |
//!
//! Yield measures are solved against that target. Option-bearing bonds
//! report effective duration and convexity from parallel curve shifts with
//! the OAS (or Z-spread for convertibles) held fixed; option-free bonds
//! bump the yield instead.
//!
//! # Examples
//!
//! ```
//! use pricer_core::market_data::curves::FlatCurve;
//! use pricer_models::instruments::BondTerms;
//! use pricer_pricing::bond::{price_bond, BondRequest};
//!
//! let bond = BondTerms::fixed(1000.0, 0.05, 10.0, 2).with_market_price(1000.0);
//! let result = price_bond(&BondRequest::new(bond), &FlatCurve::new(0.04)).unwrap();
//! assert!((result.ytm - 0.05).abs() < 1e-9);
//! assert_eq!(result.dirty_price, result.clean_price + result.accrued_interest);
//! ```

mod cashflow;
mod config;
mod credit;
mod lattice;
mod tax;

pub use cashflow::{CashFlow, CashFlowSchedule, SPREAD_BRACKET, YIELD_BRACKET};
pub use config::{
    BondEngineConfig, MAX_CREDIT_TRIALS, MAX_LATTICE_STEPS, MAX_YIELD_BUMP, MIN_YIELD_BUMP,
};
pub use credit::{credit_var, expected_loss, CREDIT_VAR_CONFIDENCE};
pub use tax::{tax_yields, TaxYields};

use pricer_core::cancel::CancellationToken;
use pricer_core::market_data::curves::{ShiftedCurve, YieldCurve};
use pricer_core::math::solvers::{BisectionSolver, SolveMethod, SolverConfig};
use pricer_core::types::{PricingError, PricingWarning, SolverError};
use pricer_models::analytical::BlackScholes;
use pricer_models::instruments::{
    validate_bond_features, BondStructure, BondTerms, ConversionTerms, CreditAnalysis,
    EmbeddedOption, OptionType, TaxAnalysis,
};

use lattice::{LatticeGrid, ShortRateLattice};

/// One basis point.
const BASIS_POINT: f64 = 1e-4;

/// Widenings allowed while bracketing the option-adjusted spread.
const MAX_OAS_DOUBLINGS: usize = 12;

/// A bond with its optional features and engine settings.
///
/// # Examples
///
/// ```
/// use pricer_models::instruments::{
///     BondStructure, BondTerms, EmbeddedExercise, EmbeddedOption, OptionType,
/// };
/// use pricer_pricing::bond::BondRequest;
///
/// let terms = BondTerms::fixed(100.0, 0.06, 10.0, 2).with_structure(BondStructure::Callable);
/// let call = EmbeddedOption {
///     option_type: OptionType::Call,
///     exercise_style: EmbeddedExercise::American,
///     exercise_price: 100.0,
///     exercise_dates: vec![3.0],
///     volatility: 0.15,
/// };
/// let request = BondRequest::new(terms).with_embedded_option(call);
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BondRequest {
    /// Contractual terms
    pub terms: BondTerms,
    /// Issuer credit; no spread and no default when absent
    #[cfg_attr(feature = "serde", serde(default))]
    pub credit: Option<CreditAnalysis>,
    /// Call and put provisions
    #[cfg_attr(feature = "serde", serde(default))]
    pub embedded_options: Vec<EmbeddedOption>,
    /// Investor tax treatment
    #[cfg_attr(feature = "serde", serde(default))]
    pub tax: Option<TaxAnalysis>,
    /// Equity conversion feature
    #[cfg_attr(feature = "serde", serde(default))]
    pub conversion: Option<ConversionTerms>,
    /// Engine settings
    #[cfg_attr(feature = "serde", serde(default))]
    pub config: BondEngineConfig,
}

impl BondRequest {
    /// Request for `terms` with no optional features.
    pub fn new(terms: BondTerms) -> Self {
        Self {
            terms,
            credit: None,
            embedded_options: Vec::new(),
            tax: None,
            conversion: None,
            config: BondEngineConfig::default(),
        }
    }

    /// Sets the issuer credit.
    pub fn with_credit(mut self, credit: CreditAnalysis) -> Self {
        self.credit = Some(credit);
        self
    }

    /// Adds a call or put provision.
    pub fn with_embedded_option(mut self, option: EmbeddedOption) -> Self {
        self.embedded_options.push(option);
        self
    }

    /// Sets the tax treatment.
    pub fn with_tax(mut self, tax: TaxAnalysis) -> Self {
        self.tax = Some(tax);
        self
    }

    /// Sets the conversion feature.
    pub fn with_conversion(mut self, conversion: ConversionTerms) -> Self {
        self.conversion = Some(conversion);
        self
    }

    /// Sets the engine settings.
    pub fn with_config(mut self, config: BondEngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Checks the terms, every feature and the engine settings.
    pub fn validate(&self) -> Result<(), PricingError> {
        validate_bond_features(&self.terms, &self.embedded_options, self.conversion.as_ref())?;
        if let Some(credit) = &self.credit {
            credit.validate()?;
        }
        if let Some(tax) = &self.tax {
            tax.validate()?;
        }
        self.config.validate()
    }
}

/// Prices, yields, risk measures and spreads of a bond.
///
/// Yields are annual, compounded at the coupon frequency. Spreads are
/// continuously compounded. Durations are in years.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BondResult {
    /// Price including accrued interest
    pub dirty_price: f64,
    /// Price excluding accrued interest
    pub clean_price: f64,
    /// Coupon accrued since the last payment
    pub accrued_interest: f64,
    /// Yield to maturity
    pub ytm: f64,
    /// Yield to the first call date, for bonds with a call
    pub ytc: Option<f64>,
    /// Lowest of the yield to maturity and every yield to call
    pub ytw: f64,
    /// Annual coupon over clean price
    pub current_yield: f64,
    /// Present-value weighted time to the cash flows
    pub macaulay_duration: f64,
    /// Macaulay duration over `1 + ytm/frequency`
    pub modified_duration: f64,
    /// Duration from central price differences
    pub effective_duration: f64,
    /// Yield convexity
    pub convexity: f64,
    /// Convexity from central price differences
    pub effective_convexity: f64,
    /// Yield-based value of one basis point
    pub dv01: f64,
    /// Curve-based value of one basis point, spreads held
    pub pvbp: f64,
    /// Spread over the curve repricing the straight cash flows
    pub z_spread: f64,
    /// Yield to maturity minus the curve's par yield
    pub i_spread: f64,
    /// Option-adjusted spread; the Z-spread for fixed and convertible bonds
    pub oas: f64,
    /// 99th-percentile default loss
    pub credit_var: f64,
    /// Mean default loss
    pub expected_loss: f64,
    /// Yield after the investor's tax
    pub after_tax_yield: Option<f64>,
    /// Taxable yield with the same after-tax return
    pub tax_equivalent_yield: Option<f64>,
    /// Value of the embedded call, put or conversion feature
    pub option_value: f64,
    /// Non-fatal diagnostics
    pub warnings: Vec<PricingWarning>,
}

/// Optional features that change how the bond is valued on a curve.
enum Embedded<'a> {
    None,
    Lattice { grid: LatticeGrid, volatility: f64 },
    Conversion(&'a ConversionTerms),
}

/// Curve valuation of one bond, parameterised by curve shift and spread.
struct CurveModel<'a> {
    terms: &'a BondTerms,
    schedule: &'a CashFlowSchedule,
    embedded: Embedded<'a>,
    token: &'a CancellationToken,
}

impl CurveModel<'_> {
    fn value<C: YieldCurve + ?Sized>(
        &self,
        curve: &C,
        shift: f64,
        spread: f64,
    ) -> Result<f64, PricingError> {
        let curve = ShiftedCurve::new(curve, shift);
        match &self.embedded {
            Embedded::None => self.schedule.present_value(&curve, spread),
            Embedded::Lattice { grid, volatility } => {
                let lattice = grid.calibrate(&curve, *volatility, self.token)?;
                grid.price(&lattice, spread, true, self.token)
            }
            Embedded::Conversion(conversion) => Ok(self.schedule.present_value(&curve, spread)?
                + conversion_value(self.terms, conversion, &curve)?),
        }
    }
}

/// `ratio ×` Black-Scholes call struck at the conversion price.
fn conversion_value<C: YieldCurve + ?Sized>(
    terms: &BondTerms,
    conversion: &ConversionTerms,
    curve: &C,
) -> Result<f64, PricingError> {
    let rate = curve.zero_rate(terms.maturity)?;
    let model = BlackScholes::new(
        conversion.stock_price,
        rate,
        conversion.dividend_yield,
        conversion.stock_volatility,
    )?;
    let strike = conversion.conversion_price(terms.face_value);
    Ok(conversion.conversion_ratio * model.price_call(strike, terms.maturity))
}

/// Lattice volatility: that of the first provision.
fn lattice_volatility(options: &[EmbeddedOption], warnings: &mut Vec<PricingWarning>) -> f64 {
    let volatility = options.first().map_or(0.0, |o| o.volatility);
    if options
        .iter()
        .any(|o| (o.volatility - volatility).abs() > 1e-12)
    {
        let message = format!(
            "embedded options quote different volatilities; lattice uses {}",
            volatility
        );
        tracing::warn!(%message, "lattice volatility");
        warnings.push(PricingWarning::fallback(message));
    }
    volatility
}

/// Spread over the lattice rates that reprices the bond to `target`.
///
/// The configured bracket is a starting interval: while both ends price on
/// the same side of the target, the offending end is pushed outward by a
/// doubling width.
fn solve_oas(
    grid: &LatticeGrid,
    lattice: &ShortRateLattice,
    target: f64,
    bracket: (f64, f64),
    token: &CancellationToken,
) -> Result<f64, PricingError> {
    let excess = |spread: f64| grid.price(lattice, spread, true, token).map(|p| p - target);
    let (mut lo, mut hi) = bracket;
    let mut width = (hi - lo).max(BASIS_POINT);
    let mut doublings = 0;
    loop {
        let (at_lo, at_hi) = (excess(lo)?, excess(hi)?);
        if at_lo.signum() != at_hi.signum() || at_lo == 0.0 || at_hi == 0.0 {
            break;
        }
        doublings += 1;
        if doublings > MAX_OAS_DOUBLINGS {
            return Err(PricingError::convergence(format!(
                "option-adjusted spread could not be bracketed: price {} out of reach on [{}, {}]",
                target, lo, hi
            )));
        }
        // Price falls as the spread rises
        if at_hi > 0.0 {
            lo = hi;
            hi += width;
        } else {
            hi = lo;
            lo -= width;
        }
        width *= 2.0;
    }
    if (lo, hi) != bracket {
        tracing::debug!(lo, hi, doublings, "OAS bracket widened");
    }

    BisectionSolver::new(SolverConfig::bracketing())
        .find_root_with(
            |spread| excess(spread).map_err(|_| SolverError::Cancelled),
            lo,
            hi,
        )
        .map_err(|err| match err {
            SolverError::Cancelled => PricingError::Cancelled,
            other => PricingError::convergence(format!("option-adjusted spread: {}", other)),
        })
}

/// Duration and convexity from prices at the base and at `∓bump`.
fn central_measures(base: f64, down: f64, up: f64, bump: f64) -> (f64, f64) {
    (
        (down - up) / (2.0 * base * bump),
        (down + up - 2.0 * base) / (base * bump * bump),
    )
}

/// Yield to the first call date and yield to worst.
fn call_yields(
    terms: &BondTerms,
    options: &[EmbeddedOption],
    dirty: f64,
    ytm: f64,
) -> Result<(Option<f64>, f64), PricingError> {
    let mut calls: Vec<(f64, f64)> = options
        .iter()
        .filter(|o| o.option_type == OptionType::Call)
        .flat_map(|o| {
            let dates = if o.exercise_dates.is_empty() {
                vec![terms.maturity]
            } else {
                o.exercise_dates.clone()
            };
            dates.into_iter().map(move |d| (d, o.exercise_price))
        })
        .collect();
    calls.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut ytc = None;
    let mut ytw = ytm;
    for (date, price) in calls {
        let Some(schedule) = CashFlowSchedule::to_redemption(terms, date, price) else {
            continue;
        };
        let (y, _) = schedule.solve_yield(dirty, terms.coupon_rate)?;
        ytc.get_or_insert(y);
        ytw = ytw.min(y);
    }
    Ok((ytc, ytw))
}

/// Prices a bond.
///
/// See [`price_bond_with_cancel`].
pub fn price_bond<C: YieldCurve + ?Sized>(
    request: &BondRequest,
    curve: &C,
) -> Result<BondResult, PricingError> {
    price_bond_with_cancel(request, curve, &CancellationToken::new())
}

/// Prices a bond with cooperative cancellation.
///
/// # Errors
///
/// - `PricingError::Validation` for terms or features outside their domain
/// - `PricingError::Convergence` if a yield, spread or lattice level cannot
///   be solved after its bisection fallback
/// - `PricingError::Cancelled` if `token` is set while pricing
pub fn price_bond_with_cancel<C: YieldCurve + ?Sized>(
    request: &BondRequest,
    curve: &C,
    token: &CancellationToken,
) -> Result<BondResult, PricingError> {
    request.validate()?;
    token.check()?;

    let terms = &request.terms;
    let config = &request.config;
    let frequency = f64::from(terms.frequency);
    let schedule = CashFlowSchedule::from_terms(terms);
    let credit = request.credit.clone().unwrap_or_default();
    let mut warnings = Vec::new();

    let embedded = match terms.structure {
        BondStructure::Fixed => Embedded::None,
        BondStructure::Callable | BondStructure::Putable => Embedded::Lattice {
            grid: LatticeGrid::new(
                &schedule,
                &request.embedded_options,
                terms.maturity,
                config.lattice_steps,
            ),
            volatility: lattice_volatility(&request.embedded_options, &mut warnings),
        },
        BondStructure::Convertible => match &request.conversion {
            Some(conversion) => Embedded::Conversion(conversion),
            None => {
                return Err(PricingError::validation(
                    "convertible bond requires conversion terms",
                ))
            }
        },
    };
    let model = CurveModel {
        terms,
        schedule: &schedule,
        embedded,
        token,
    };

    let model_price = model.value(curve, 0.0, credit.spread)?;
    let target = terms.market_price.unwrap_or(model_price);

    let (ytm, method) = schedule.solve_yield(target, terms.coupon_rate)?;
    if method == SolveMethod::Bisection {
        let message = format!("yield to maturity {} found by bisection", ytm);
        tracing::warn!(%message, "solver fallback");
        warnings.push(PricingWarning::fallback(message));
    }

    let accrued_interest = terms.coupon() * terms.accrued_fraction;
    let clean_price = target - accrued_interest;
    let dirty_price = clean_price + accrued_interest;

    let macaulay_duration = schedule.macaulay_duration(ytm);
    let modified_duration = macaulay_duration / (1.0 + ytm / frequency);
    let convexity = schedule.convexity(ytm);

    let conversion = match &model.embedded {
        Embedded::Conversion(conversion) => conversion_value(terms, conversion, curve)?,
        _ => 0.0,
    };
    let (z_spread, _) = schedule.solve_spread(curve, target - conversion)?;
    token.check()?;

    let (oas, option_value) = match &model.embedded {
        Embedded::Lattice { grid, volatility } => {
            let lattice = grid.calibrate(curve, *volatility, token)?;
            let oas = solve_oas(grid, &lattice, target, config.oas_bracket, token)?;
            let straight = grid.price(&lattice, oas, false, token)?;
            let exercised = grid.price(&lattice, oas, true, token)?;
            (oas, (straight - exercised).abs())
        }
        Embedded::Conversion(_) => (z_spread, conversion),
        Embedded::None => (z_spread, 0.0),
    };

    let bump = config.yield_bump;
    let (effective_duration, effective_convexity) = match &model.embedded {
        Embedded::None => central_measures(
            schedule.price_at_yield(ytm),
            schedule.price_at_yield(ytm - bump),
            schedule.price_at_yield(ytm + bump),
            bump,
        ),
        _ => central_measures(
            model.value(curve, 0.0, oas)?,
            model.value(curve, -bump, oas)?,
            model.value(curve, bump, oas)?,
            bump,
        ),
    };
    let pvbp =
        (model.value(curve, -BASIS_POINT, oas)? - model.value(curve, BASIS_POINT, oas)?) / 2.0;

    let (ytc, ytw) = call_yields(terms, &request.embedded_options, dirty_price, ytm)?;
    let i_spread = ytm - curve.par_yield(terms.maturity, terms.frequency)?;
    let tax = request.tax.as_ref().map(|tax| tax_yields(ytm, tax));

    tracing::debug!(
        structure = ?terms.structure,
        periods = schedule.flows().len(),
        dirty_price,
        ytm,
        z_spread,
        oas,
        "bond priced"
    );

    Ok(BondResult {
        dirty_price,
        clean_price,
        accrued_interest,
        ytm,
        ytc,
        ytw,
        current_yield: terms.face_value * terms.coupon_rate / clean_price,
        macaulay_duration,
        modified_duration,
        effective_duration,
        convexity,
        effective_convexity,
        dv01: modified_duration * dirty_price * BASIS_POINT,
        pvbp,
        z_spread,
        i_spread,
        oas,
        credit_var: credit_var(terms.face_value, &credit, config.credit_trials),
        expected_loss: expected_loss(terms.face_value, &credit),
        after_tax_yield: tax.map(|t| t.after_tax_yield),
        tax_equivalent_yield: tax.map(|t| t.tax_equivalent_yield),
        option_value,
        warnings,
    })
}
