//! Model parameter errors.

use pricer_core::types::PricingError;
use thiserror::Error;

/// Model parameter validation errors.
///
/// # Examples
/// ```
/// use pricer_models::models::ModelError;
///
/// let err = ModelError::parameter("Heston", "rho", 1.5, "must lie in [-1, 1]");
/// assert_eq!(
///     format!("{}", err),
///     "Invalid Heston parameter rho = 1.5: must lie in [-1, 1]"
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Parameter outside its domain.
    #[error("Invalid {model} parameter {name} = {value}: {message}")]
    InvalidParameter {
        /// Model name
        model: &'static str,
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f64,
        /// Domain description
        message: &'static str,
    },

    /// Monte Carlo or lattice configuration rejected.
    #[error(transparent)]
    Config(#[from] super::monte_carlo::ConfigError),
}

impl ModelError {
    /// Shorthand for [`ModelError::InvalidParameter`].
    pub fn parameter(
        model: &'static str,
        name: &'static str,
        value: f64,
        message: &'static str,
    ) -> Self {
        ModelError::InvalidParameter {
            model,
            name,
            value,
            message,
        }
    }
}

impl From<ModelError> for PricingError {
    fn from(err: ModelError) -> Self {
        PricingError::Validation(err.to_string())
    }
}

/// Fails with `InvalidParameter` unless `ok` holds and `value` is finite.
pub(crate) fn ensure(
    ok: bool,
    model: &'static str,
    name: &'static str,
    value: f64,
    message: &'static str,
) -> Result<(), ModelError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::parameter(model, name, value, message))
    }
}
