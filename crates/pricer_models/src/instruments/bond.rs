//! Bond terms, embedded options and the credit, tax and conversion inputs
//! consumed by the bond engine.

use super::error::InstrumentError;
use super::option::OptionType;

/// Coupon frequencies accepted by the bond engine.
pub const SUPPORTED_FREQUENCIES: [u32; 4] = [1, 2, 4, 12];

/// Optionality class of a bond.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BondStructure {
    /// Plain bullet bond.
    #[default]
    Fixed,
    /// Issuer may redeem early.
    Callable,
    /// Holder may sell back early.
    Putable,
    /// Holder may convert into shares.
    Convertible,
}

/// Contractual terms of a coupon bond.
///
/// # Example
///
/// ```
/// use pricer_models::instruments::BondTerms;
///
/// let bond = BondTerms::fixed(1000.0, 0.05, 10.0, 2);
/// assert!(bond.validate().is_ok());
/// assert_eq!(bond.periods(), 20);
/// assert_eq!(bond.coupon(), 25.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BondTerms {
    /// Face (par) value, > 0
    pub face_value: f64,
    /// Annual coupon rate, >= 0
    pub coupon_rate: f64,
    /// Years to maturity, > 0
    pub maturity: f64,
    /// Coupons per year, one of 1, 2, 4, 12
    pub frequency: u32,
    /// Optionality class
    #[cfg_attr(feature = "serde", serde(default))]
    pub structure: BondStructure,
    /// Quoted dirty price; the model price is used when absent
    #[cfg_attr(feature = "serde", serde(default))]
    pub market_price: Option<f64>,
    /// Fraction of the current coupon period already elapsed, in [0, 1)
    #[cfg_attr(feature = "serde", serde(default))]
    pub accrued_fraction: f64,
}

impl BondTerms {
    /// Option-free bond settling on a coupon date with no market quote.
    pub fn fixed(face_value: f64, coupon_rate: f64, maturity: f64, frequency: u32) -> Self {
        Self {
            face_value,
            coupon_rate,
            maturity,
            frequency,
            structure: BondStructure::Fixed,
            market_price: None,
            accrued_fraction: 0.0,
        }
    }

    /// Returns a copy with the given structure.
    pub fn with_structure(mut self, structure: BondStructure) -> Self {
        self.structure = structure;
        self
    }

    /// Returns a copy with a quoted dirty price.
    pub fn with_market_price(mut self, price: f64) -> Self {
        self.market_price = Some(price);
        self
    }

    /// Returns a copy settling part-way through a coupon period.
    pub fn with_accrued_fraction(mut self, fraction: f64) -> Self {
        self.accrued_fraction = fraction;
        self
    }

    /// Number of remaining coupon periods, `maturity × frequency` rounded, at least 1.
    pub fn periods(&self) -> usize {
        ((self.maturity * f64::from(self.frequency)).round() as usize).max(1)
    }

    /// Coupon paid each period.
    pub fn coupon(&self) -> f64 {
        self.face_value * self.coupon_rate / f64::from(self.frequency)
    }

    /// Checks every field against its domain.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if !(self.face_value.is_finite() && self.face_value > 0.0) {
            return Err(InstrumentError::parameter("face_value", "must be positive"));
        }
        if !(self.coupon_rate.is_finite() && self.coupon_rate >= 0.0) {
            return Err(InstrumentError::parameter("coupon_rate", "must be non-negative"));
        }
        if !(self.maturity.is_finite() && self.maturity > 0.0) {
            return Err(InstrumentError::InvalidExpiry {
                expiry: self.maturity,
            });
        }
        if !SUPPORTED_FREQUENCIES.contains(&self.frequency) {
            return Err(InstrumentError::parameter(
                "frequency",
                format!("{} is not one of 1, 2, 4, 12", self.frequency),
            ));
        }
        if let Some(price) = self.market_price {
            if !(price.is_finite() && price > 0.0) {
                return Err(InstrumentError::parameter("market_price", "must be positive"));
            }
        }
        if !(0.0..1.0).contains(&self.accrued_fraction) {
            return Err(InstrumentError::parameter("accrued_fraction", "must lie in [0, 1)"));
        }
        Ok(())
    }
}

/// Exercise schedule of an embedded bond option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EmbeddedExercise {
    /// Single exercise date.
    #[default]
    European,
    /// Any time on or after the first exercise date.
    American,
    /// On each listed exercise date.
    Bermudan,
}

/// Call or put provision embedded in a bond.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmbeddedOption {
    /// `Call` for issuer calls, `Put` for holder puts
    pub option_type: OptionType,
    /// Exercise schedule
    #[cfg_attr(feature = "serde", serde(default))]
    pub exercise_style: EmbeddedExercise,
    /// Redemption price on exercise (same units as face value), > 0
    pub exercise_price: f64,
    /// Exercise dates in years from settlement
    #[cfg_attr(feature = "serde", serde(default))]
    pub exercise_dates: Vec<f64>,
    /// Lognormal short-rate volatility used by the lattice, >= 0
    pub volatility: f64,
}

impl EmbeddedOption {
    /// Checks every field against its domain.
    pub fn validate(&self, maturity: f64) -> Result<(), InstrumentError> {
        if !(self.exercise_price.is_finite() && self.exercise_price > 0.0) {
            return Err(InstrumentError::parameter("exercise_price", "must be positive"));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(InstrumentError::InvalidVolatility {
                volatility: self.volatility,
            });
        }
        if let Some(&bad) = self
            .exercise_dates
            .iter()
            .find(|&&d| !(d.is_finite() && d >= 0.0 && d <= maturity))
        {
            return Err(InstrumentError::parameter(
                "exercise_dates",
                format!("{} outside [0, maturity]", bad),
            ));
        }
        Ok(())
    }

    /// Earliest exercise date, or `default` if none is listed.
    pub fn first_exercise(&self, default: f64) -> f64 {
        self.exercise_dates
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
            .unwrap_or(default)
    }
}

/// Issuer credit inputs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreditAnalysis {
    /// Agency rating label, informational
    pub rating: String,
    /// Continuously compounded credit spread over the risk-free curve
    pub spread: f64,
    /// Recovery rate on default, in [0, 1]
    pub recovery_rate: f64,
    /// Probability of default over the bond's life, in [0, 1]
    pub default_probability: f64,
}

impl Default for CreditAnalysis {
    fn default() -> Self {
        Self {
            rating: "NR".to_string(),
            spread: 0.0,
            recovery_rate: 0.4,
            default_probability: 0.0,
        }
    }
}

impl CreditAnalysis {
    /// Checks every field against its domain.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if !self.spread.is_finite() {
            return Err(InstrumentError::parameter("credit.spread", "must be finite"));
        }
        if !(0.0..=1.0).contains(&self.recovery_rate) {
            return Err(InstrumentError::parameter("credit.recovery_rate", "must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.default_probability) {
            return Err(InstrumentError::parameter(
                "credit.default_probability",
                "must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Loss given default as a fraction of face.
    pub fn loss_given_default(&self) -> f64 {
        1.0 - self.recovery_rate
    }
}

/// Investor tax inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaxAnalysis {
    /// Federal income tax rate
    pub federal_rate: f64,
    /// State income tax rate
    pub state_rate: f64,
    /// Local income tax rate
    pub local_rate: f64,
    /// Coupon income is exempt from tax
    pub is_exempt: bool,
}

impl TaxAnalysis {
    /// Combined marginal rate `federal + state + local`.
    pub fn total_rate(&self) -> f64 {
        self.federal_rate + self.state_rate + self.local_rate
    }

    /// Checks every rate is in [0, 1) and the total stays below 1.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        for (name, rate) in [
            ("tax.federal_rate", self.federal_rate),
            ("tax.state_rate", self.state_rate),
            ("tax.local_rate", self.local_rate),
        ] {
            if !(rate.is_finite() && rate >= 0.0) {
                return Err(InstrumentError::parameter(name, "must be non-negative"));
            }
        }
        if self.total_rate() >= 1.0 {
            return Err(InstrumentError::parameter("tax", "total rate must be below 100%"));
        }
        Ok(())
    }
}

/// Equity conversion feature of a convertible bond.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConversionTerms {
    /// Shares received per bond, > 0
    pub conversion_ratio: f64,
    /// Current share price, > 0
    pub stock_price: f64,
    /// Share price volatility, >= 0
    pub stock_volatility: f64,
    /// Continuous dividend yield of the share
    pub dividend_yield: f64,
}

impl ConversionTerms {
    /// Checks every field against its domain.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if !(self.conversion_ratio.is_finite() && self.conversion_ratio > 0.0) {
            return Err(InstrumentError::parameter("conversion_ratio", "must be positive"));
        }
        if !(self.stock_price.is_finite() && self.stock_price > 0.0) {
            return Err(InstrumentError::InvalidSpot {
                spot: self.stock_price,
            });
        }
        if !(self.stock_volatility.is_finite() && self.stock_volatility >= 0.0) {
            return Err(InstrumentError::InvalidVolatility {
                volatility: self.stock_volatility,
            });
        }
        if !self.dividend_yield.is_finite() {
            return Err(InstrumentError::parameter("dividend_yield", "must be finite"));
        }
        Ok(())
    }

    /// Effective strike per share, `face / ratio`.
    pub fn conversion_price(&self, face_value: f64) -> f64 {
        face_value / self.conversion_ratio
    }
}

/// Cross-checks a bond's structure against its optional features.
///
/// - Fixed bonds carry no options
/// - Callable bonds need at least one call, putable bonds at least one put
/// - Convertible bonds need conversion terms and carry no call or put
pub fn validate_bond_features(
    terms: &BondTerms,
    options: &[EmbeddedOption],
    conversion: Option<&ConversionTerms>,
) -> Result<(), InstrumentError> {
    terms.validate()?;
    for option in options {
        option.validate(terms.maturity)?;
    }
    if let Some(conversion) = conversion {
        conversion.validate()?;
    }

    let has_call = options.iter().any(|o| o.option_type == OptionType::Call);
    let has_put = options.iter().any(|o| o.option_type == OptionType::Put);
    match terms.structure {
        BondStructure::Fixed if !options.is_empty() => Err(InstrumentError::parameter(
            "structure",
            "fixed bonds cannot carry embedded options",
        )),
        BondStructure::Callable if !has_call => Err(InstrumentError::parameter(
            "structure",
            "callable bond requires a call option",
        )),
        BondStructure::Putable if !has_put => Err(InstrumentError::parameter(
            "structure",
            "putable bond requires a put option",
        )),
        BondStructure::Convertible if !options.is_empty() => Err(InstrumentError::parameter(
            "structure",
            "convertible bonds cannot carry call or put provisions",
        )),
        BondStructure::Convertible if conversion.is_none() => Err(InstrumentError::parameter(
            "structure",
            "convertible bond requires conversion terms",
        )),
        _ => Ok(()),
    }
}
