//! Standard normal distribution functions.
//!
//! This module provides:
//! - `norm_cdf`: Cumulative distribution function (CDF)
//! - `norm_pdf`: Probability density function (PDF)
//! - `norm_inv`: Quantile function (inverse CDF)
//!
//! The CDF uses Hart's double-precision rational approximation (as given by
//! West, 2005), accurate to roughly 1e-14 and exactly symmetric:
//! `norm_cdf(x) + norm_cdf(-x) == 1` up to a single rounding. Put-call
//! parity of the closed-form engines relies on that symmetry.

use crate::math::solvers::constant;
use num_traits::Float;

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// sqrt(2 * pi)
const SQRT_2PI: f64 = 2.506_628_274_631_000_5;

/// Upper tail probability Q(|x|) = 1 - Φ(|x|).
#[inline]
fn upper_tail<T: Float>(x_abs: T) -> T {
    if x_abs > constant(37.0) {
        return T::zero();
    }
    let e = (-x_abs * x_abs * constant(0.5)).exp();
    if x_abs < constant(7.071_067_811_865_47) {
        let mut num: T =
            constant::<T>(3.526_249_659_989_11e-2) * x_abs + constant(0.700_383_064_443_688);
        num = num * x_abs + constant(6.373_962_203_531_65);
        num = num * x_abs + constant(33.912_866_078_383);
        num = num * x_abs + constant(112.079_291_497_871);
        num = num * x_abs + constant(221.213_596_169_931);
        num = num * x_abs + constant(220.206_867_912_376);

        let mut den: T =
            constant::<T>(8.838_834_764_831_84e-2) * x_abs + constant(1.755_667_163_182_64);
        den = den * x_abs + constant(16.064_177_579_207);
        den = den * x_abs + constant(86.780_732_202_946_1);
        den = den * x_abs + constant(296.564_248_779_674);
        den = den * x_abs + constant(637.333_633_378_831);
        den = den * x_abs + constant(793.826_512_519_948);
        den = den * x_abs + constant(440.413_735_824_752);

        e * num / den
    } else {
        // Continued fraction for the far tail
        let mut b = x_abs + constant(0.65);
        b = x_abs + constant::<T>(4.0) / b;
        b = x_abs + constant::<T>(3.0) / b;
        b = x_abs + constant::<T>(2.0) / b;
        b = x_abs + T::one() / b;
        e / b / constant(SQRT_2PI)
    }
}

/// Standard normal cumulative distribution function.
///
/// Computes P(X <= x) where X ~ N(0, 1).
///
/// # Examples
/// ```
/// use pricer_core::math::distributions::norm_cdf;
///
/// assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-15);
/// assert!((norm_cdf(1.0_f64) - 0.8413447460685429).abs() < 1e-12);
/// ```
#[inline]
pub fn norm_cdf<T: Float>(x: T) -> T {
    let tail = upper_tail(x.abs());
    if x > T::zero() {
        T::one() - tail
    } else {
        tail
    }
}

/// Standard normal probability density function.
///
/// Computes the density φ(x) = (1 / sqrt(2π)) * exp(-x² / 2).
///
/// # Examples
/// ```
/// use pricer_core::math::distributions::norm_pdf;
///
/// assert!((norm_pdf(0.0_f64) - 0.3989422804).abs() < 1e-9);
/// ```
#[inline]
pub fn norm_pdf<T: Float>(x: T) -> T {
    constant::<T>(FRAC_1_SQRT_2PI) * (-constant::<T>(0.5) * x * x).exp()
}

/// Standard normal quantile function (Acklam's algorithm with one Halley
/// refinement step).
///
/// Returns `-inf` / `+inf` at `p = 0` / `p = 1` and NaN outside `[0, 1]`.
///
/// # Examples
/// ```
/// use pricer_core::math::distributions::norm_inv;
///
/// assert!((norm_inv(0.99_f64) - 2.326347874).abs() < 1e-8);
/// assert!(norm_inv(0.5_f64).abs() < 1e-12);
/// ```
pub fn norm_inv(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    if !(0.0..=1.0).contains(&p) || p.is_nan() {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let x = if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    // Halley step against the accurate CDF
    let e = norm_cdf(x) - p;
    let u = e * SQRT_2PI * (x * x / 2.0).exp();
    x - u / (1.0 + x * u / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    // ==========================================================
    // norm_cdf tests
    // ==========================================================

    #[test]
    fn test_norm_cdf_reference_values() {
        assert_relative_eq!(norm_cdf(1.0_f64), 0.841_344_746_068_542_9, epsilon = 1e-12);
        assert_relative_eq!(norm_cdf(-1.0_f64), 0.158_655_253_931_457_07, epsilon = 1e-12);
        assert_relative_eq!(norm_cdf(2.0_f64), 0.977_249_868_051_820_8, epsilon = 1e-12);
        assert_relative_eq!(norm_cdf(-2.326_347_874_040_841), 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_norm_cdf_far_tail() {
        assert!(norm_cdf(-40.0_f64) == 0.0);
        assert!(norm_cdf(40.0_f64) == 1.0);
        // Continued fraction branch
        assert_relative_eq!(norm_cdf(-8.0_f64), 6.220_960_574_271_785e-16, max_relative = 1e-6);
    }

    // ==========================================================
    // norm_pdf tests
    // ==========================================================

    #[test]
    fn test_norm_pdf_reference() {
        assert_relative_eq!(norm_pdf(1.0_f64), 0.241_970_724_519_143_37, epsilon = 1e-14);
    }

    // ==========================================================
    // norm_inv tests
    // ==========================================================

    #[test]
    fn test_norm_inv_endpoints() {
        assert!(norm_inv(0.0).is_infinite());
        assert!(norm_inv(1.0).is_infinite());
        assert!(norm_inv(1.5).is_nan());
    }

    proptest! {
        #[test]
        fn prop_cdf_symmetry(x in -10.0f64..10.0) {
            prop_assert!((norm_cdf(x) + norm_cdf(-x) - 1.0).abs() < 1e-15);
        }

        #[test]
        fn prop_inverse_roundtrip(p in 1e-10f64..(1.0 - 1e-10)) {
            let x = norm_inv(p);
            prop_assert!((norm_cdf(x) - p).abs() < 1e-12 * p.max(1e-3));
        }
    }
}
