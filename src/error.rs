use thiserror::Error;

/// Errors raised by the library before any fitting work starts.
///
/// Expected fit outcomes (non-convergence, degenerate data) are *not* errors;
/// they are reported through [`crate::domain::FitResult::Failed`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("unknown model '{0}' (run `specfit models` for the list)")]
    UnknownModel(String),

    #[error("{what}: expected length {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("log transform needs value > 0 (index {index}: {value})")]
    NonPositiveValue { index: usize, value: f64 },

    #[error("y error at index {index} must be finite and > 0, got {value}")]
    InvalidUncertainty { index: usize, value: f64 },

    #[error("{what} at index {index} is not finite")]
    NonFiniteData { what: &'static str, index: usize },

    #[error("model '{model}' has no parameter '{name}'")]
    UnknownParameter { model: String, name: String },
}

/// Application-level error carried up to `main`.
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

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::UnknownModel(_) | FitError::UnknownParameter { .. } => 2,
            FitError::NonFiniteData { .. } | FitError::InvalidUncertainty { .. } => 3,
            FitError::ShapeMismatch { .. } | FitError::NonPositiveValue { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
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
