//! Error types for the meta-ensemble crate

use thiserror::Error;

/// Result type alias for ensemble operations
pub type Result<T> = std::result::Result<T, EnsembleError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum EnsembleError {
    /// Raised by the dataset guard before any fitting takes place.
    #[error("Class imbalance: class '{label}' holds {share:.1}% of samples, minimum is {min:.1}%")]
    ClassImbalance {
        label: String,
        share: f64,
        min: f64,
    },

    /// A predict-family method was called before a successful fit.
    #[error("{component} is not fitted: call fit before predicting")]
    NotFitted { component: &'static str },

    /// A capability-gated method was called under the wrong voting mode.
    #[error("{method} is not available when voting={voting}")]
    ModeUnavailable {
        method: &'static str,
        voting: &'static str,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },
}

impl From<polars::error::PolarsError> for EnsembleError {
    fn from(err: polars::error::PolarsError) -> Self {
        EnsembleError::Data(err.to_string())
    }
}

impl From<ndarray::ShapeError> for EnsembleError {
    fn from(err: ndarray::ShapeError) -> Self {
        EnsembleError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_unavailable_display() {
        let err = EnsembleError::ModeUnavailable {
            method: "predict_proba",
            voting: "hard",
        };
        assert_eq!(
            err.to_string(),
            "predict_proba is not available when voting=hard"
        );
    }

    #[test]
    fn test_not_fitted_display() {
        let err = EnsembleError::NotFitted {
            component: "estimator pool",
        };
        assert_eq!(
            err.to_string(),
            "estimator pool is not fitted: call fit before predicting"
        );
    }
}
