//! Model dispatch for single options.
//!
//! A request is first turned into a `Plan`: the numerical engine that will
//! actually run, the model reported on the result, and any fallback warnings.
//! The plan is fixed before pricing starts, including the Monte Carlo seed,
//! so that every Greek revaluation runs the same engine on the same paths.
//!
//! | Request                                   | Engine                           |
//! |-------------------------------------------|----------------------------------|
//! | expired                                   | intrinsic value                  |
//! | European, Black-Scholes                   | closed form                      |
//! | European, Heston / SABR / jump-diffusion  | Fourier / Hagan / Merton series  |
//! | any, binomial                             | CRR lattice                      |
//! | European, Monte Carlo                     | GBM simulation                   |
//! | American, Monte Carlo                     | Longstaff-Schwartz               |
//! | American, any other model                 | CRR lattice, with a warning      |
//! | European exotic, Black-Scholes, closed form | Reiner-Rubinstein, Kemna-Vorst, Conze-Viswanathan |
//! | exotic, anything else (American included) | path simulation under the model's dynamics |

use pricer_core::cancel::CancellationToken;
use pricer_core::types::{PricingError, PricingWarning};
use pricer_models::analytical::BlackScholes;
use pricer_models::greeks::GreeksSet;
use pricer_models::instruments::{
    AveragingType, BarrierType, ExerciseStyle, ExoticPayoff, LookbackType, OptionTerms, OptionType,
};
use pricer_models::models::{
    HestonParams, JumpDiffusionParams, ModelError, ModelKind, MonteCarloConfig, PricingModel,
    SabrParams, DEFAULT_BINOMIAL_STEPS,
};

use super::binomial::binomial_price;
use super::greeks::{finite_difference_greeks, BaseInputs, Bump, GreeksConfig};
use super::heston::heston_price;
use super::merton::merton_price;
use super::request::{OptionRequest, OptionResult};
use super::sabr::{sabr_price, sabr_reference_vol};
use crate::exotic::{self, ExoticValue};
use crate::mc::{price_american, Dynamics, McEstimate, MonteCarloEngine, PathOutcome, PathSimulator};
use crate::rng::entropy_seed;
use crate::strategy::payoff_profile;

/// Numerical method selected for a request.
#[derive(Debug, Clone, PartialEq)]
enum Engine {
    Intrinsic,
    BlackScholes,
    Binomial { steps: usize },
    MonteCarlo { config: MonteCarloConfig, dynamics: Dynamics },
    LongstaffSchwartz { config: MonteCarloConfig },
    Heston(HestonParams),
    Sabr(SabrParams),
    Merton(JumpDiffusionParams),
    ExoticClosedForm(ExoticPayoff),
    ExoticMonteCarlo {
        payoff: ExoticPayoff,
        config: MonteCarloConfig,
        dynamics: Dynamics,
    },
    ExoticExpired(ExoticPayoff),
}

impl Engine {
    fn label(&self) -> &'static str {
        match self {
            Engine::Intrinsic => "intrinsic",
            Engine::BlackScholes => "black_scholes",
            Engine::Binomial { .. } => "binomial",
            Engine::MonteCarlo { .. } => "monte_carlo",
            Engine::LongstaffSchwartz { .. } => "longstaff_schwartz",
            Engine::Heston(_) => "heston",
            Engine::Sabr(_) => "sabr",
            Engine::Merton(_) => "merton",
            Engine::ExoticClosedForm(_) => "exotic_closed_form",
            Engine::ExoticMonteCarlo { .. } => "exotic_monte_carlo",
            Engine::ExoticExpired(_) => "exotic_expired",
        }
    }

    /// Volatility input that the vega bump shifts.
    fn reference_volatility(&self, terms: &OptionTerms) -> f64 {
        match self {
            Engine::Heston(p)
            | Engine::MonteCarlo {
                dynamics: Dynamics::Heston(p),
                ..
            }
            | Engine::ExoticMonteCarlo {
                dynamics: Dynamics::Heston(p),
                ..
            } => p.v0.max(0.0).sqrt(),
            Engine::Sabr(p)
            | Engine::MonteCarlo {
                dynamics: Dynamics::Sabr(p),
                ..
            }
            | Engine::ExoticMonteCarlo {
                dynamics: Dynamics::Sabr(p),
                ..
            } => sabr_reference_vol(terms, p),
            _ => terms.volatility,
        }
    }

    /// Copy of the engine with its volatility input shifted by `shift`.
    ///
    /// Stochastic-volatility models move their own level (`√v₀` for Heston,
    /// the at-the-money vol for SABR); every other engine moves
    /// `terms.volatility`.
    fn with_volatility_shift(&self, terms: &mut OptionTerms, shift: f64) -> Engine {
        match self {
            Engine::Heston(p) => Engine::Heston(shift_heston(p, shift)),
            Engine::Sabr(p) => Engine::Sabr(shift_sabr(p, terms, shift)),
            Engine::MonteCarlo { config, dynamics } => Engine::MonteCarlo {
                config: config.clone(),
                dynamics: shift_dynamics(*dynamics, terms, shift),
            },
            Engine::ExoticMonteCarlo {
                payoff,
                config,
                dynamics,
            } => Engine::ExoticMonteCarlo {
                payoff: *payoff,
                config: config.clone(),
                dynamics: shift_dynamics(*dynamics, terms, shift),
            },
            other => {
                terms.volatility = (terms.volatility + shift).max(0.0);
                other.clone()
            }
        }
    }
}

fn shift_heston(p: &HestonParams, shift: f64) -> HestonParams {
    let level = (p.v0.max(0.0).sqrt() + shift).max(0.0);
    HestonParams { v0: level * level, ..*p }
}

fn shift_sabr(p: &SabrParams, terms: &OptionTerms, shift: f64) -> SabrParams {
    let scale = terms.forward().powf(1.0 - p.beta);
    SabrParams {
        alpha: (p.alpha + shift * scale).max(0.0),
        ..*p
    }
}

fn shift_dynamics(dynamics: Dynamics, terms: &mut OptionTerms, shift: f64) -> Dynamics {
    match dynamics {
        Dynamics::Heston(p) => Dynamics::Heston(shift_heston(&p, shift)),
        Dynamics::Sabr(p) => Dynamics::Sabr(shift_sabr(&p, terms, shift)),
        Dynamics::Gbm | Dynamics::JumpDiffusion(_) => {
            terms.volatility = (terms.volatility + shift).max(0.0);
            dynamics
        }
    }
}

/// Engine, reported model and routing warnings for one request.
#[derive(Debug, Clone, PartialEq)]
struct Plan {
    engine: Engine,
    model: ModelKind,
    terms: OptionTerms,
    warnings: Vec<PricingWarning>,
}

/// Price of one engine run with its diagnostics.
#[derive(Debug, Clone, Default)]
struct Valuation {
    price: f64,
    std_error: Option<f64>,
    confidence_interval: Option<(f64, f64)>,
    exotic: Option<ExoticValue>,
    warnings: Vec<PricingWarning>,
}

impl Valuation {
    fn priced(price: f64) -> Self {
        Self {
            price,
            ..Self::default()
        }
    }

    fn estimated(estimate: &McEstimate) -> Self {
        Self {
            price: estimate.price,
            std_error: Some(estimate.std_error),
            confidence_interval: Some(estimate.confidence_interval()),
            ..Self::default()
        }
    }
}

fn seeded(config: &MonteCarloConfig) -> MonteCarloConfig {
    config.with_seed(config.seed().unwrap_or_else(entropy_seed))
}

fn fallback(warnings: &mut Vec<PricingWarning>, message: String) {
    tracing::warn!(%message, "model fallback");
    warnings.push(PricingWarning::fallback(message));
}

fn has_closed_form(payoff: &ExoticPayoff) -> bool {
    !matches!(
        payoff,
        ExoticPayoff::Asian(spec) if spec.averaging == AveragingType::Arithmetic
    )
}

fn plan(request: &OptionRequest) -> Plan {
    let mut terms = request.terms;
    let mut warnings = Vec::new();
    let requested = request.model.kind();
    let expired = terms.time_to_expiration <= 0.0;
    let simulation_config = || match &request.model {
        PricingModel::MonteCarlo(cfg) => seeded(cfg),
        _ => seeded(&request.monte_carlo.clone().unwrap_or_default()),
    };

    if let Some(payoff) = request.exotic {
        let american = terms.style == ExerciseStyle::American;
        if american {
            fallback(
                &mut warnings,
                format!(
                    "American exercise is not supported for {} options; simulated as European",
                    payoff.label()
                ),
            );
            terms.style = ExerciseStyle::European;
        }
        if expired {
            return Plan {
                engine: Engine::ExoticExpired(payoff),
                model: requested,
                terms,
                warnings,
            };
        }
        let dynamics = match &request.model {
            PricingModel::Heston(p) => Dynamics::Heston(*p),
            PricingModel::Sabr(p) => Dynamics::Sabr(*p),
            PricingModel::JumpDiffusion(p) => Dynamics::JumpDiffusion(*p),
            PricingModel::BlackScholes
            | PricingModel::BinomialTree(_)
            | PricingModel::MonteCarlo(_) => Dynamics::Gbm,
        };
        let closed_form = !american && terms.volatility > 0.0 && has_closed_form(&payoff);
        match &request.model {
            PricingModel::BlackScholes if closed_form => {
                return Plan {
                    engine: Engine::ExoticClosedForm(payoff),
                    model: ModelKind::BlackScholes,
                    terms,
                    warnings,
                };
            }
            PricingModel::BinomialTree(_) => fallback(
                &mut warnings,
                format!(
                    "{} payoff is not supported on the binomial tree; simulated instead",
                    payoff.label()
                ),
            ),
            _ => {}
        }
        let model = if request.model.has_non_gbm_dynamics() {
            requested
        } else {
            ModelKind::MonteCarlo
        };
        return Plan {
            engine: Engine::ExoticMonteCarlo {
                payoff,
                config: simulation_config(),
                dynamics,
            },
            model,
            terms,
            warnings,
        };
    }

    if expired {
        return Plan {
            engine: Engine::Intrinsic,
            model: requested,
            terms,
            warnings,
        };
    }

    let american = terms.style == ExerciseStyle::American;
    let lattice = Engine::Binomial {
        steps: DEFAULT_BINOMIAL_STEPS,
    };
    let (engine, model) = match &request.model {
        PricingModel::BlackScholes if american => {
            fallback(
                &mut warnings,
                "Black-Scholes values European exercise only; \
                 American option priced on the binomial tree"
                    .to_string(),
            );
            (lattice, ModelKind::BinomialTree)
        }
        PricingModel::BlackScholes => (Engine::BlackScholes, ModelKind::BlackScholes),
        PricingModel::BinomialTree(cfg) => {
            (Engine::Binomial { steps: cfg.steps }, ModelKind::BinomialTree)
        }
        PricingModel::MonteCarlo(_) if terms.volatility == 0.0 => {
            // Deterministic path: the lattice collapses to the exact exercise value
            (lattice, ModelKind::BinomialTree)
        }
        PricingModel::MonteCarlo(_) if american => (
            Engine::LongstaffSchwartz {
                config: simulation_config(),
            },
            ModelKind::MonteCarlo,
        ),
        PricingModel::MonteCarlo(_) => (
            Engine::MonteCarlo {
                config: simulation_config(),
                dynamics: Dynamics::Gbm,
            },
            ModelKind::MonteCarlo,
        ),
        model if american => {
            let proxy = Engine::from_model(model).reference_volatility(&terms);
            fallback(
                &mut warnings,
                format!(
                    "American exercise forces the binomial tree; \
                     {} dynamics replaced by a flat volatility of {:.4}",
                    requested, proxy
                ),
            );
            terms.volatility = proxy;
            (lattice, ModelKind::BinomialTree)
        }
        model => (Engine::from_model(model), requested),
    };
    Plan {
        engine,
        model,
        terms,
        warnings,
    }
}

impl Engine {
    /// European engine of a stochastic model.
    fn from_model(model: &PricingModel) -> Engine {
        match model {
            PricingModel::Heston(p) => Engine::Heston(*p),
            PricingModel::Sabr(p) => Engine::Sabr(*p),
            PricingModel::JumpDiffusion(p) => Engine::Merton(*p),
            PricingModel::BlackScholes
            | PricingModel::BinomialTree(_)
            | PricingModel::MonteCarlo(_) => Engine::BlackScholes,
        }
    }
}

fn simulate_vanilla(
    terms: &OptionTerms,
    config: &MonteCarloConfig,
    dynamics: Dynamics,
    token: &CancellationToken,
) -> Result<McEstimate, PricingError> {
    let sim = PathSimulator::new(terms, dynamics, config.n_steps());
    let engine = MonteCarloEngine::new(config, sim);
    let (payoff, strike, spot) = (terms.payoff, terms.strike, terms.spot);
    engine.run(
        |path| {
            let terminal = path.last().copied().unwrap_or(spot);
            PathOutcome {
                payoff: payoff.intrinsic(terminal, strike),
                control: terminal,
                ..PathOutcome::default()
            }
        },
        Some(terms.forward()),
        token,
    )
}

fn value(
    engine: &Engine,
    terms: &OptionTerms,
    token: &CancellationToken,
) -> Result<Valuation, PricingError> {
    let valuation = match engine {
        Engine::Intrinsic => Valuation::priced(terms.intrinsic()),
        Engine::BlackScholes => {
            let model = BlackScholes::new(
                terms.spot,
                terms.risk_free_rate,
                terms.dividend_yield,
                terms.volatility,
            )?;
            Valuation::priced(model.price(terms.payoff, terms.strike, terms.time_to_expiration))
        }
        Engine::Binomial { steps } => {
            let lattice = binomial_price(terms, *steps, token)?;
            Valuation {
                warnings: lattice.warning.into_iter().collect(),
                ..Valuation::priced(lattice.price)
            }
        }
        Engine::MonteCarlo { config, dynamics } => {
            Valuation::estimated(&simulate_vanilla(terms, config, *dynamics, token)?)
        }
        Engine::LongstaffSchwartz { config } => {
            let sim = PathSimulator::new(terms, Dynamics::Gbm, config.n_steps());
            let engine = MonteCarloEngine::new(config, sim);
            Valuation::estimated(&price_american(&engine, terms.payoff, terms.strike, token)?)
        }
        Engine::Heston(p) => {
            let heston = heston_price(terms, p)?;
            Valuation {
                warnings: heston.warnings,
                ..Valuation::priced(heston.price)
            }
        }
        Engine::Sabr(p) => Valuation::priced(sabr_price(terms, p)?),
        Engine::Merton(p) => {
            let merton = merton_price(terms, p)?;
            Valuation {
                warnings: merton.warning.into_iter().collect(),
                ..Valuation::priced(merton.price)
            }
        }
        Engine::ExoticClosedForm(payoff) => {
            let exotic = exotic::closed_form(terms, payoff).ok_or_else(|| {
                PricingError::convergence(format!("no closed form for {} payoff", payoff.label()))
            })?;
            Valuation {
                exotic: Some(exotic),
                ..Valuation::priced(exotic.price)
            }
        }
        Engine::ExoticMonteCarlo {
            payoff,
            config,
            dynamics,
        } => {
            let exotic = exotic::simulate(terms, payoff, *dynamics, config, token)?;
            Valuation {
                std_error: exotic.std_error,
                confidence_interval: exotic.confidence_interval,
                exotic: Some(exotic),
                ..Valuation::priced(exotic.price)
            }
        }
        Engine::ExoticExpired(payoff) => {
            let exotic = exotic::at_expiry(terms, payoff);
            Valuation {
                exotic: Some(exotic),
                ..Valuation::priced(exotic.price)
            }
        }
    };
    Ok(valuation)
}

fn sensitivities(
    plan: &Plan,
    base: &Valuation,
    config: &GreeksConfig,
    token: &CancellationToken,
) -> Result<(GreeksSet, Vec<PricingWarning>), PricingError> {
    let terms = &plan.terms;
    match &plan.engine {
        Engine::Intrinsic | Engine::BlackScholes => {
            let model = BlackScholes::new(
                terms.spot,
                terms.risk_free_rate,
                terms.dividend_yield,
                terms.volatility,
            )?;
            let greeks = model.greeks(terms.payoff, terms.strike, terms.time_to_expiration);
            Ok((greeks, Vec::new()))
        }
        Engine::ExoticExpired(_) => Ok((GreeksSet::zero(), Vec::new())),
        engine => {
            let inputs = BaseInputs {
                spot: terms.spot,
                volatility: engine.reference_volatility(terms),
                expiry: terms.time_to_expiration,
                value: base.price,
            };
            finite_difference_greeks(config, &inputs, token, |bump: Bump| {
                let mut bumped = *terms;
                bumped.spot += bump.spot;
                bumped.time_to_expiration += bump.expiry;
                bumped.risk_free_rate += bump.rate;
                let shifted = engine.with_volatility_shift(&mut bumped, bump.volatility);
                Ok(value(&shifted, &bumped, token)?.price)
            })
        }
    }
}

/// Highest payoff an exotic can reach, `+∞` when unbounded.
fn exotic_payoff_ceiling(terms: &OptionTerms, payoff: &ExoticPayoff) -> f64 {
    let k = terms.strike;
    let call = terms.payoff == OptionType::Call;
    match payoff {
        ExoticPayoff::Barrier(spec) => {
            let capped = match (call, spec.barrier_type) {
                (true, BarrierType::UpOut) => (spec.level - k).max(0.0),
                (true, _) => f64::INFINITY,
                (false, BarrierType::DownOut) => (k - spec.level).max(0.0),
                (false, _) => k,
            };
            capped.max(spec.rebate)
        }
        ExoticPayoff::Asian(_) if call => f64::INFINITY,
        ExoticPayoff::Asian(_) => k,
        ExoticPayoff::Lookback(spec) => match (spec.lookback_type, call) {
            (LookbackType::FixedStrike, false) => k,
            _ => f64::INFINITY,
        },
    }
}

fn validate(request: &OptionRequest) -> Result<(), PricingError> {
    request.terms.validate()?;
    request.model.validate()?;
    if let Some(payoff) = &request.exotic {
        payoff.validate()?;
    }
    if let Some(config) = &request.monte_carlo {
        config.validate().map_err(ModelError::from)?;
    }
    request.greeks.validate()
}

/// Prices a single option.
///
/// See [`price_option_with_cancel`].
pub fn price_option(request: &OptionRequest) -> Result<OptionResult, PricingError> {
    price_option_with_cancel(request, &CancellationToken::new())
}

/// Prices a single option with cooperative cancellation.
///
/// Greeks are analytic on the Black-Scholes route and finite differences of
/// the selected engine otherwise. The breakevens and P&L bounds describe a
/// long position held to expiry, bought at the fair value; for exotics only
/// the bounds are reported.
///
/// # Errors
///
/// - `PricingError::Validation` for inputs outside their domain
/// - `PricingError::Convergence` if an engine fails after its fallback
/// - `PricingError::Cancelled` if `token` is set while pricing
///
/// # Examples
///
/// ```
/// use pricer_models::instruments::{ExerciseStyle, OptionTerms, OptionType};
/// use pricer_models::models::ModelKind;
/// use pricer_pricing::options::{price_option, OptionRequest};
///
/// let terms = OptionTerms::new(100.0, 100.0, 0.25, 0.05, 0.0, 0.2, OptionType::Call);
/// let result = price_option(&OptionRequest::new(terms)).unwrap();
/// assert!((result.fair_value - 4.615).abs() < 1e-3);
/// assert!((result.greeks.delta - 0.5695).abs() < 1e-3);
///
/// // American exercise moves to the lattice and says so
/// let american = OptionRequest::new(terms.with_style(ExerciseStyle::American));
/// let result = price_option(&american).unwrap();
/// assert_eq!(result.model, ModelKind::BinomialTree);
/// assert_eq!(result.warnings.len(), 1);
/// ```
pub fn price_option_with_cancel(
    request: &OptionRequest,
    token: &CancellationToken,
) -> Result<OptionResult, PricingError> {
    validate(request)?;
    token.check()?;
    let plan = plan(request);
    tracing::debug!(
        requested = %request.model.kind(),
        model = %plan.model,
        engine = plan.engine.label(),
        "option routed"
    );

    let valuation = value(&plan.engine, &plan.terms, token)?;
    let (greeks, greek_warnings) = sensitivities(&plan, &valuation, &request.greeks, token)?;

    let terms = &plan.terms;
    let fair_value = valuation.price;
    let mut result = OptionResult::priced(fair_value, plan.model);
    match &request.exotic {
        None => {
            let (payoff, strike) = (terms.payoff, terms.strike);
            let slope = if payoff.is_call() { 1.0 } else { 0.0 };
            let profile = payoff_profile(
                |s| payoff.intrinsic(s, strike) - fair_value,
                &[strike],
                terms.spot,
                slope,
            )?;
            result.breakeven_prices = profile.breakevens;
            result.max_profit = profile.max_profit;
            result.max_loss = profile.max_loss;
        }
        Some(payoff) => {
            result.max_profit = exotic_payoff_ceiling(terms, payoff) - fair_value;
            result.max_loss = -fair_value;
        }
    }
    if let Some(exotic) = valuation.exotic {
        result.barrier_knock_probability = exotic.knock_probability;
        result.asian_average_price = exotic.average_price;
        result.lookback_extrema = exotic.extrema;
    }
    result.greeks = greeks;
    result.standard_error = valuation.std_error;
    result.confidence_interval = valuation.confidence_interval;
    result.warnings = plan
        .warnings
        .into_iter()
        .chain(valuation.warnings)
        .chain(greek_warnings)
        .collect();
    Ok(result)
}
