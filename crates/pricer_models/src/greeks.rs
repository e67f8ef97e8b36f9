//! Option sensitivities.
//!
//! [`GreeksSet`] holds first, second and third order partial derivatives of
//! fair value with respect to spot, volatility, time and rate. Sensitivities
//! of instruments on one underlying add linearly, so portfolio and strategy
//! Greeks are plain weighted sums of [`GreeksSet`] values.

use std::ops::{Add, AddAssign, Mul};

/// Full set of option Greeks.
///
/// Conventions:
/// - `theta` and `charm` are calendar-time derivatives (`∂/∂t = -∂/∂T`), per year
/// - `vega`, `volga`, `vanna`, `zomma`, `ultima` are per unit of volatility
/// - `rho` is per unit of rate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GreeksSet {
    /// ∂V/∂S
    pub delta: f64,
    /// ∂²V/∂S²
    pub gamma: f64,
    /// ∂V/∂t
    pub theta: f64,
    /// ∂V/∂σ
    pub vega: f64,
    /// ∂V/∂r
    pub rho: f64,
    /// ∂²V/∂S∂σ
    pub vanna: f64,
    /// ∂²V/∂σ²
    pub volga: f64,
    /// ∂²V/∂S∂t
    pub charm: f64,
    /// ∂³V/∂S³
    pub speed: f64,
    /// ∂³V/∂S²∂σ
    pub zomma: f64,
    /// ∂³V/∂σ³
    pub ultima: f64,
}

impl GreeksSet {
    /// All-zero sensitivities.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns every Greek multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
            theta: self.theta * factor,
            vega: self.vega * factor,
            rho: self.rho * factor,
            vanna: self.vanna * factor,
            volga: self.volga * factor,
            charm: self.charm * factor,
            speed: self.speed * factor,
            zomma: self.zomma * factor,
            ultima: self.ultima * factor,
        }
    }

    /// Name and value pairs in declaration order.
    pub fn entries(&self) -> [(&'static str, f64); 11] {
        [
            ("delta", self.delta),
            ("gamma", self.gamma),
            ("theta", self.theta),
            ("vega", self.vega),
            ("rho", self.rho),
            ("vanna", self.vanna),
            ("volga", self.volga),
            ("charm", self.charm),
            ("speed", self.speed),
            ("zomma", self.zomma),
            ("ultima", self.ultima),
        ]
    }

    /// `true` if every Greek is finite.
    pub fn is_finite(&self) -> bool {
        self.entries().iter().all(|(_, v)| v.is_finite())
    }

    /// Replaces non-finite Greeks with zero and returns their names.
    pub fn sanitise(&mut self) -> Vec<&'static str> {
        let mut degenerate = Vec::new();
        for (name, slot) in [
            ("delta", &mut self.delta),
            ("gamma", &mut self.gamma),
            ("theta", &mut self.theta),
            ("vega", &mut self.vega),
            ("rho", &mut self.rho),
            ("vanna", &mut self.vanna),
            ("volga", &mut self.volga),
            ("charm", &mut self.charm),
            ("speed", &mut self.speed),
            ("zomma", &mut self.zomma),
            ("ultima", &mut self.ultima),
        ] {
            if !slot.is_finite() {
                *slot = 0.0;
                degenerate.push(name);
            }
        }
        degenerate
    }
}

impl Add for GreeksSet {
    type Output = GreeksSet;

    fn add(self, other: GreeksSet) -> GreeksSet {
        GreeksSet {
            delta: self.delta + other.delta,
            gamma: self.gamma + other.gamma,
            theta: self.theta + other.theta,
            vega: self.vega + other.vega,
            rho: self.rho + other.rho,
            vanna: self.vanna + other.vanna,
            volga: self.volga + other.volga,
            charm: self.charm + other.charm,
            speed: self.speed + other.speed,
            zomma: self.zomma + other.zomma,
            ultima: self.ultima + other.ultima,
        }
    }
}

impl AddAssign for GreeksSet {
    fn add_assign(&mut self, other: GreeksSet) {
        *self = *self + other;
    }
}

impl Mul<f64> for GreeksSet {
    type Output = GreeksSet;

    fn mul(self, factor: f64) -> GreeksSet {
        self.scale(factor)
    }
}

impl std::iter::Sum for GreeksSet {
    fn sum<I: Iterator<Item = GreeksSet>>(iter: I) -> GreeksSet {
        iter.fold(GreeksSet::zero(), |acc, g| acc + g)
    }
}
