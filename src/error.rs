//! Error taxonomy for wattlab calculations
//!
//! Estimation and model functions never panic on bad input. They return an
//! [`EngineError`] describing what was wrong, and physiologically suspicious
//! but usable values are reported through [`RangeWarning`] next to the value
//! instead of failing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all wattlab calculations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Non-numeric, non-positive or NaN argument
    #[error("Invalid input for {calculation}: {parameter}={value}")]
    InvalidInput {
        calculation: String,
        parameter: String,
        value: String,
    },

    /// A domain ordering requirement does not hold
    #[error("Precondition failed for {calculation}: {reason}")]
    ModelPrecondition { calculation: String, reason: String },
}

/// Flat classification of everything the engine can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    ModelPrecondition,
    /// Valid but suspicious value; never blocks a calculation
    OutOfRangeWarning,
}

/// Result type alias for wattlab operations
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub(crate) fn invalid_input(
        calculation: &str,
        parameter: &str,
        value: impl std::fmt::Display,
    ) -> Self {
        EngineError::InvalidInput {
            calculation: calculation.to_string(),
            parameter: parameter.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn precondition(calculation: &str, reason: impl Into<String>) -> Self {
        EngineError::ModelPrecondition {
            calculation: calculation.to_string(),
            reason: reason.into(),
        }
    }

    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidInput { .. } => ErrorKind::InvalidInput,
            EngineError::ModelPrecondition { .. } => ErrorKind::ModelPrecondition,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        self.kind().severity()
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            EngineError::InvalidInput {
                calculation,
                parameter,
                ..
            } => format!(
                "Cannot calculate {}: please enter a positive number for {}.",
                calculation, parameter
            ),
            EngineError::ModelPrecondition { reason, .. } => {
                format!("These test results cannot be used together: {}.", reason)
            }
        }
    }
}

impl ErrorKind {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorKind::InvalidInput => ErrorSeverity::Warning,
            ErrorKind::ModelPrecondition => ErrorSeverity::Warning,
            ErrorKind::OutOfRangeWarning => ErrorSeverity::Info,
        }
    }
}

/// A value that was accepted but lies outside the expected physiological range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeWarning {
    /// FTP below the plausible minimum (watts)
    BelowExpected { value: f64, minimum: u16 },
    /// FTP above the plausible maximum (watts); kept as-is
    AboveExpected { value: f64, maximum: u16 },
}

impl RangeWarning {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::OutOfRangeWarning
    }

    pub fn message(&self) -> String {
        match self {
            RangeWarning::BelowExpected { value, minimum } => format!(
                "FTP {} W is below the expected minimum of {} W and was replaced",
                value, minimum
            ),
            RangeWarning::AboveExpected { value, maximum } => format!(
                "FTP {} W is above {} W; accepted, please double-check the test",
                value, maximum
            ),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Rejected input; the calculation returned no value
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
