use super::Parameter;

use thiserror::Error;

/// An error type indicating a parameter value
/// could not be interpreted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    /// The value is present but has the wrong format.
    #[error("parameter {key} has value '{value}', expected {expected}")]
    Malformed {
        key: Parameter,
        value: String,
        expected: &'static str,
    },
}
