use thiserror::Error;

/// Main error type for the forecaster
#[derive(Error, Debug)]
pub enum WattError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // Dataset errors
    #[error("Invalid dataset: {0}")]
    Dataset(String),

    // Model / artifact errors
    #[error("Model error: {0}")]
    Model(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for WattError
pub type Result<T> = std::result::Result<T, WattError>;

/// Errors a single prediction request can be rejected with
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredictError {
    #[error("Invalid date format")]
    InvalidDate { value: String },

    #[error("City not recognized")]
    UnknownCity { city: String },

    #[error("Feature vector has {got} columns, network expects {expected}")]
    FeatureMismatch { got: usize, expected: usize },

    #[error("Model evaluation failed: {0}")]
    Model(String),
}

impl PredictError {
    /// Whether the caller sent something we cannot serve (as opposed to a
    /// broken model on our side).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidDate { .. } | Self::UnknownCity { .. })
    }
}

impl From<PredictError> for WattError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::FeatureMismatch { .. } | PredictError::Model(_) => {
                WattError::Model(err.to_string())
            }
            other => WattError::Validation(other.to_string()),
        }
    }
}
