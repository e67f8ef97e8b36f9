//! Path-dependent payoff specifications.
//!
//! These types only describe the contract; valuation lives in the pricing
//! layer, which chooses between closed forms and simulation.

use super::error::InstrumentError;

/// Barrier direction and knock behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BarrierType {
    /// Activated when the spot rises through the barrier.
    UpIn,
    /// Extinguished when the spot rises through the barrier.
    UpOut,
    /// Activated when the spot falls through the barrier.
    DownIn,
    /// Extinguished when the spot falls through the barrier.
    DownOut,
}

impl BarrierType {
    /// `true` for up barriers.
    #[inline]
    pub fn is_up(self) -> bool {
        matches!(self, BarrierType::UpIn | BarrierType::UpOut)
    }

    /// `true` for knock-in barriers.
    #[inline]
    pub fn is_in(self) -> bool {
        matches!(self, BarrierType::UpIn | BarrierType::DownIn)
    }

    /// `true` if `spot` is on or beyond the barrier.
    #[inline]
    pub fn is_breached(self, spot: f64, level: f64) -> bool {
        if self.is_up() {
            spot >= level
        } else {
            spot <= level
        }
    }

    /// The opposite knock type on the same side (in ↔ out).
    pub fn complement(self) -> Self {
        match self {
            BarrierType::UpIn => BarrierType::UpOut,
            BarrierType::UpOut => BarrierType::UpIn,
            BarrierType::DownIn => BarrierType::DownOut,
            BarrierType::DownOut => BarrierType::DownIn,
        }
    }
}

/// Single continuously monitored barrier.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BarrierSpec {
    /// Barrier direction and knock type
    pub barrier_type: BarrierType,
    /// Barrier level, > 0
    pub level: f64,
    /// Cash paid at expiry if a knock-out occurs or a knock-in never does
    pub rebate: f64,
}

/// How the average of an Asian option is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AveragingType {
    /// Arithmetic mean of observations.
    Arithmetic,
    /// Geometric mean of observations.
    Geometric,
}

/// Average-price Asian option observed at equally spaced dates `T·i/n`, i = 1..n.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AsianSpec {
    /// Arithmetic or geometric
    pub averaging: AveragingType,
    /// Number of averaging observations, >= 1
    pub observations: usize,
}

/// Lookback payoff flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LookbackType {
    /// Call pays `S_T - min S`, put pays `max S - S_T`.
    FloatingStrike,
    /// Call pays `max(max S - K, 0)`, put pays `max(K - min S, 0)`.
    FixedStrike,
}

/// Continuously monitored lookback.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LookbackSpec {
    /// Floating or fixed strike
    pub lookback_type: LookbackType,
}

/// Path-dependent payoff attached to an option request.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExoticPayoff {
    /// Knock-in / knock-out barrier
    Barrier(BarrierSpec),
    /// Average-price Asian
    Asian(AsianSpec),
    /// Path-extremum lookback
    Lookback(LookbackSpec),
}

impl ExoticPayoff {
    /// Checks the payoff parameters.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        match self {
            ExoticPayoff::Barrier(b) => {
                if !(b.level.is_finite() && b.level > 0.0) {
                    return Err(InstrumentError::parameter("barrier.level", "must be positive"));
                }
                if !(b.rebate.is_finite() && b.rebate >= 0.0) {
                    return Err(InstrumentError::parameter(
                        "barrier.rebate",
                        "must be non-negative",
                    ));
                }
            }
            ExoticPayoff::Asian(a) => {
                if a.observations == 0 {
                    return Err(InstrumentError::parameter(
                        "asian.observations",
                        "at least one observation required",
                    ));
                }
            }
            ExoticPayoff::Lookback(_) => {}
        }
        Ok(())
    }

    /// Short label for logs and warnings.
    pub fn label(&self) -> &'static str {
        match self {
            ExoticPayoff::Barrier(_) => "barrier",
            ExoticPayoff::Asian(_) => "asian",
            ExoticPayoff::Lookback(_) => "lookback",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barrier_flags() {
        assert!(BarrierType::UpOut.is_up());
        assert!(!BarrierType::UpOut.is_in());
        assert!(BarrierType::DownIn.is_in());
        assert_eq!(BarrierType::DownIn.complement(), BarrierType::DownOut);
        assert!(BarrierType::DownOut.is_breached(80.0, 90.0));
        assert!(!BarrierType::UpIn.is_breached(80.0, 90.0));
    }

    #[test]
    fn test_validate() {
        let bad = ExoticPayoff::Barrier(BarrierSpec {
            barrier_type: BarrierType::UpOut,
            level: -1.0,
            rebate: 0.0,
        });
        assert!(bad.validate().is_err());
        let bad = ExoticPayoff::Asian(AsianSpec {
            averaging: AveragingType::Arithmetic,
            observations: 0,
        });
        assert!(bad.validate().is_err());
        let ok = ExoticPayoff::Lookback(LookbackSpec {
            lookback_type: LookbackType::FloatingStrike,
        });
        assert!(ok.validate().is_ok());
        assert_eq!(ok.label(), "lookback");
    }
}
