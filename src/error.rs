//! Error types.
//!
//! Two layers:
//!
//! - [`EngineError`]: deterministic failures of the scoring/curve engine caused by
//!   malformed input. None of these are transient.
//! - [`AppError`]: what the `combo` binary reports, carrying a process exit code.

use thiserror::Error;

/// Failures raised by the numeric engine (`math`, `models`, `matrix`, `synergy`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Invalid numeric input to the concentration transform or a curve parameter.
    #[error("domain error: {what} is out of range (got {value})")]
    Domain { what: &'static str, value: f64 },

    /// The curve slope parameter is zero or non-finite.
    #[error("degenerate curve fit: slope parameter scal={scal} must be finite and non-zero")]
    FitDegenerate { scal: f64 },

    /// A matrix is missing wells, has duplicates, or is not square.
    #[error("incomplete matrix: {0}")]
    IncompleteMatrix(String),

    /// A window size that cannot be placed on the matrix.
    #[error("invalid window size {size} for a {dimension}x{dimension} matrix")]
    InvalidWindow { size: usize, dimension: usize },

    /// An aggregate was requested over zero wells.
    #[error("cannot aggregate excess over an empty set of wells")]
    EmptyWellSet,
}

/// Application-level error with a process exit code.
///
/// Exit codes: 2 = invalid input, 3 = no usable data, 4 = engine failure.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::new(4, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_exit_code_4() {
        let err: AppError = EngineError::FitDegenerate { scal: 0.0 }.into();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("scal=0"));
    }
}
