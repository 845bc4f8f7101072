use thiserror::Error;

/// Errors raised by expression, selection and mutation models and by the
/// regulatory network.
///
/// Every variant is detected eagerly, either when a model is constructed or
/// at the start of a batch call before anything is written.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A model parameter is invalid (rate outside [0, 1], negative magnitude,
    /// asymmetric interaction matrix, ...).
    #[error("Invalid model configuration: {0}")]
    Configuration(String),

    /// A matrix dimension disagrees with the configured gene or objective
    /// count.
    #[error("Shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// A kinetics parameter lies outside its mathematical domain.
    #[error("Parameter {parameter} = {value} out of domain (must be {requirement})")]
    NumericDomain {
        parameter: &'static str,
        value: f64,
        requirement: &'static str,
    },
}

impl ModelError {
    pub(crate) fn shape(context: &'static str, expected: usize, found: usize) -> Self {
        Self::ShapeMismatch {
            context,
            expected,
            found,
        }
    }

    pub(crate) fn domain(parameter: &'static str, value: f64, requirement: &'static str) -> Self {
        Self::NumericDomain {
            parameter,
            value,
            requirement,
        }
    }
}

/// Errors that can occur while building a `GeneNetwork`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderError {
    /// A required parameter is missing
    #[error("Missing required parameter: {0}")]
    MissingRequired(&'static str),

    /// An invalid parameter value was provided
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A model rejected its configuration
    #[error(transparent)]
    Model(#[from] ModelError),
}
