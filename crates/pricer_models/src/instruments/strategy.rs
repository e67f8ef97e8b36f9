//! Multi-leg option strategies on a single underlying.

use super::error::InstrumentError;
use super::option::OptionType;

/// One option leg of a strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyLeg {
    /// Call or put
    pub option_type: OptionType,
    /// Strike price, > 0
    pub strike: f64,
    /// Time to expiration in years, >= 0
    pub expiration: f64,
    /// Positive for long, negative for short
    pub signed_quantity: f64,
    /// Premium paid (long) or received (short) per unit
    pub entry_price: f64,
}

impl StrategyLeg {
    /// Builds a leg.
    pub fn new(
        option_type: OptionType,
        strike: f64,
        expiration: f64,
        signed_quantity: f64,
        entry_price: f64,
    ) -> Self {
        Self {
            option_type,
            strike,
            expiration,
            signed_quantity,
            entry_price,
        }
    }

    /// `true` when the quantity is positive.
    pub fn is_long(&self) -> bool {
        self.signed_quantity > 0.0
    }

    fn validate(&self) -> Result<(), InstrumentError> {
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(InstrumentError::InvalidStrike {
                strike: self.strike,
            });
        }
        if !(self.expiration.is_finite() && self.expiration >= 0.0) {
            return Err(InstrumentError::InvalidExpiry {
                expiry: self.expiration,
            });
        }
        if !(self.signed_quantity.is_finite() && self.signed_quantity != 0.0) {
            return Err(InstrumentError::parameter("signed_quantity", "must be non-zero"));
        }
        if !self.entry_price.is_finite() {
            return Err(InstrumentError::parameter("entry_price", "must be finite"));
        }
        Ok(())
    }
}

/// Legs plus an optional position in the underlying.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyDefinition {
    /// Option legs
    pub legs: Vec<StrategyLeg>,
    /// Signed number of underlying units held
    pub underlying_position_size: f64,
}

impl StrategyDefinition {
    /// Strategy with option legs only.
    pub fn new(legs: Vec<StrategyLeg>) -> Self {
        Self {
            legs,
            underlying_position_size: 0.0,
        }
    }

    /// Returns a copy holding `size` units of the underlying.
    pub fn with_underlying(mut self, size: f64) -> Self {
        self.underlying_position_size = size;
        self
    }

    /// Earliest leg expiry, the horizon at which P&L is measured.
    pub fn earliest_expiry(&self) -> Option<f64> {
        self.legs
            .iter()
            .map(|l| l.expiration)
            .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |a| a.min(t))))
    }

    /// Largest strike across legs, or 0 when there are none.
    pub fn max_strike(&self) -> f64 {
        self.legs.iter().map(|l| l.strike).fold(0.0, f64::max)
    }

    /// Validates every leg and the shape required by `kind`.
    pub fn validate(&self, kind: StrategyKind) -> Result<(), InstrumentError> {
        if self.legs.is_empty() && self.underlying_position_size == 0.0 {
            return Err(InstrumentError::parameter("legs", "strategy has no positions"));
        }
        if !self.underlying_position_size.is_finite() {
            return Err(InstrumentError::parameter(
                "underlying_position_size",
                "must be finite",
            ));
        }
        for leg in &self.legs {
            leg.validate()?;
        }
        kind.check_shape(self)
    }
}

/// Named strategy shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StrategyKind {
    /// Long underlying, short call.
    CoveredCall,
    /// Long underlying, long put.
    ProtectivePut,
    /// Long lower-strike call, short higher-strike call.
    BullCallSpread,
    /// Long higher-strike put, short lower-strike put.
    BearPutSpread,
    /// Long call and long put at the same strike.
    Straddle,
    /// Long put and long call at different strikes.
    Strangle,
    /// Three strikes with quantities 1, -2, 1 on one option type.
    Butterfly,
    /// Put spread below a call spread.
    IronCondor,
    /// Long underlying, long put, short call.
    Collar,
    /// Any combination.
    #[default]
    Custom,
}

fn shape_error(kind: StrategyKind, message: &str) -> InstrumentError {
    InstrumentError::parameter("strategy", format!("{:?}: {}", kind, message))
}

fn count(def: &StrategyDefinition, option_type: OptionType, long: bool) -> usize {
    def.legs
        .iter()
        .filter(|l| l.option_type == option_type && l.is_long() == long)
        .count()
}

impl StrategyKind {
    /// Checks leg count, option types and direction for the named shape.
    pub fn check_shape(self, def: &StrategyDefinition) -> Result<(), InstrumentError> {
        use OptionType::{Call, Put};
        let legs = &def.legs;
        let n = legs.len();
        let long_underlying = def.underlying_position_size > 0.0;

        match self {
            StrategyKind::Custom => Ok(()),
            StrategyKind::CoveredCall => {
                if n == 1 && long_underlying && count(def, Call, false) == 1 {
                    Ok(())
                } else {
                    Err(shape_error(self, "needs long underlying and one short call"))
                }
            }
            StrategyKind::ProtectivePut => {
                if n == 1 && long_underlying && count(def, Put, true) == 1 {
                    Ok(())
                } else {
                    Err(shape_error(self, "needs long underlying and one long put"))
                }
            }
            StrategyKind::Collar => {
                let ok = n == 2
                    && long_underlying
                    && count(def, Put, true) == 1
                    && count(def, Call, false) == 1;
                if ok {
                    Ok(())
                } else {
                    Err(shape_error(self, "needs long underlying, long put, short call"))
                }
            }
            StrategyKind::BullCallSpread => {
                let ok = n == 2 && count(def, Call, true) == 1 && count(def, Call, false) == 1;
                let ordered = ok && {
                    let long = legs.iter().find(|l| l.is_long()).map(|l| l.strike);
                    let short = legs.iter().find(|l| !l.is_long()).map(|l| l.strike);
                    matches!((long, short), (Some(a), Some(b)) if a < b)
                };
                if ordered {
                    Ok(())
                } else {
                    Err(shape_error(self, "needs long low-strike call, short high-strike call"))
                }
            }
            StrategyKind::BearPutSpread => {
                let ok = n == 2 && count(def, Put, true) == 1 && count(def, Put, false) == 1;
                let ordered = ok && {
                    let long = legs.iter().find(|l| l.is_long()).map(|l| l.strike);
                    let short = legs.iter().find(|l| !l.is_long()).map(|l| l.strike);
                    matches!((long, short), (Some(a), Some(b)) if a > b)
                };
                if ordered {
                    Ok(())
                } else {
                    Err(shape_error(self, "needs long high-strike put, short low-strike put"))
                }
            }
            StrategyKind::Straddle => {
                let ok = n == 2
                    && count(def, Call, true) == 1
                    && count(def, Put, true) == 1
                    && legs[0].strike == legs[1].strike;
                if ok {
                    Ok(())
                } else {
                    Err(shape_error(self, "needs long call and long put at one strike"))
                }
            }
            StrategyKind::Strangle => {
                let ok = n == 2 && count(def, Call, true) == 1 && count(def, Put, true) == 1;
                let ordered = ok && {
                    let put = legs.iter().find(|l| l.option_type == Put).map(|l| l.strike);
                    let call = legs.iter().find(|l| l.option_type == Call).map(|l| l.strike);
                    matches!((put, call), (Some(p), Some(c)) if p < c)
                };
                if ordered {
                    Ok(())
                } else {
                    Err(shape_error(self, "needs long put below long call"))
                }
            }
            StrategyKind::Butterfly => {
                if n != 3 || legs.iter().any(|l| l.option_type != legs[0].option_type) {
                    return Err(shape_error(self, "needs three legs of one option type"));
                }
                let mut sorted = legs.clone();
                sorted.sort_by(|a, b| a.strike.total_cmp(&b.strike));
                let wings = sorted[0].signed_quantity;
                let ok = wings > 0.0
                    && sorted[2].signed_quantity == wings
                    && sorted[1].signed_quantity == -2.0 * wings
                    && sorted[0].strike < sorted[1].strike
                    && sorted[1].strike < sorted[2].strike;
                if ok {
                    Ok(())
                } else {
                    Err(shape_error(self, "needs quantities 1, -2, 1 on increasing strikes"))
                }
            }
            StrategyKind::IronCondor => {
                let ok = n == 4
                    && count(def, Put, true) == 1
                    && count(def, Put, false) == 1
                    && count(def, Call, true) == 1
                    && count(def, Call, false) == 1;
                if !ok {
                    return Err(shape_error(self, "needs one long and one short of each type"));
                }
                let strike = |t: OptionType, long: bool| {
                    legs.iter()
                        .find(|l| l.option_type == t && l.is_long() == long)
                        .map_or(f64::NAN, |l| l.strike)
                };
                let (lp, sp, sc, lc) = (
                    strike(Put, true),
                    strike(Put, false),
                    strike(Call, false),
                    strike(Call, true),
                );
                if lp < sp && sp <= sc && sc < lc {
                    Ok(())
                } else {
                    Err(shape_error(
                        self,
                        "strikes must order long put < short put <= short call < long call",
                    ))
                }
            }
        }
    }
}
