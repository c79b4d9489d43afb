//! Error types for the wind-resource pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, WindError>;

/// Errors that can occur while loading, fitting or forecasting.
#[derive(Error, Debug)]
pub enum WindError {
    /// A single input row could not be interpreted.
    #[error("data error on line {line}: {message}")]
    Data { line: usize, message: String },

    /// A required input column is absent.
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    /// A numerical fit failed for the named target (season, "annual", or model order).
    #[error("fit failed for {target}: {message}")]
    Fit { target: String, message: String },

    /// Requested data lies outside what is available.
    #[error("input range error: {0}")]
    InputRange(String),

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl WindError {
    /// Build a fit error for the given target.
    pub fn fit(target: impl Into<String>, message: impl Into<String>) -> Self {
        WindError::Fit {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a per-candidate fit failure.
    pub fn is_fit_failure(&self) -> bool {
        matches!(self, WindError::Fit { .. })
    }
}
