//! After-tax yield measures.

use pricer_models::instruments::TaxAnalysis;

/// Yields adjusted for the investor's combined tax rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxYields {
    /// Yield kept after tax on coupon income
    pub after_tax_yield: f64,
    /// Taxable yield equivalent to the bond's after-tax yield
    pub tax_equivalent_yield: f64,
}

/// Applies `tax` to a yield to maturity.
///
/// An exempt bond keeps its yield and is grossed up by `1/(1 − t)` for
/// the taxable equivalent. A taxable bond loses `t` of its yield and is
/// its own taxable equivalent.
///
/// # Examples
///
/// ```
/// use pricer_models::instruments::TaxAnalysis;
/// use pricer_pricing::bond::tax_yields;
///
/// let muni = TaxAnalysis { federal_rate: 0.37, is_exempt: true, ..TaxAnalysis::default() };
/// let yields = tax_yields(0.04, &muni);
/// assert_eq!(yields.after_tax_yield, 0.04);
/// assert!((yields.tax_equivalent_yield - 0.04 / 0.63).abs() < 1e-15);
/// ```
pub fn tax_yields(ytm: f64, tax: &TaxAnalysis) -> TaxYields {
    let rate = tax.total_rate();
    if tax.is_exempt {
        TaxYields {
            after_tax_yield: ytm,
            tax_equivalent_yield: ytm / (1.0 - rate),
        }
    } else {
        TaxYields {
            after_tax_yield: ytm * (1.0 - rate),
            tax_equivalent_yield: ytm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_taxable_bond() {
        let tax = TaxAnalysis {
            federal_rate: 0.24,
            state_rate: 0.05,
            local_rate: 0.01,
            is_exempt: false,
        };
        let yields = tax_yields(0.05, &tax);
        assert_relative_eq!(yields.after_tax_yield, 0.035, epsilon = 1e-12);
        assert_eq!(yields.tax_equivalent_yield, 0.05);
    }

    #[test]
    fn test_zero_rate_is_neutral() {
        let yields = tax_yields(0.03, &TaxAnalysis { is_exempt: true, ..TaxAnalysis::default() });
        assert_eq!(yields.after_tax_yield, 0.03);
        assert_eq!(yields.tax_equivalent_yield, 0.03);
    }
}
