//! Unified error handling for the application layer.

use neupool_core::{PrecommitError, StateError, ValidationError};
use thiserror::Error;

use crate::advisor::AdvisorError;
use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::store::StoreError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Required configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The advisor call failed or returned an unusable reply.
    #[error("Recommendation failed: {0}")]
    Recommendation(AdvisorError),

    /// The visit cannot be committed against the current snapshot.
    #[error("Cannot save log entry: {0}")]
    Precommit(#[from] PrecommitError),

    /// User input is incomplete or invalid.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Loading or saving the snapshot failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Login or registration failed.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl AppError {
    /// Returns `true` if the same action may succeed when simply retried,
    /// possibly after fixing configuration.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Recommendation(_))
    }
}

impl From<AdvisorError> for AppError {
    fn from(err: AdvisorError) -> Self {
        if err.is_configuration() {
            Self::Configuration(err.to_string())
        } else {
            Self::Recommendation(err)
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<StateError> for AppError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Validation(e) => Self::Validation(e),
            not_found => Self::NotFound(not_found.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neupool_core::PoolId;

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = AppError::from(AdvisorError::MissingApiKey);
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_advisor_failure_is_recommendation_error() {
        let err = AppError::from(AdvisorError::RateLimited(30));
        assert!(matches!(
            err,
            AppError::Recommendation(AdvisorError::RateLimited(30))
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_state_error_mapping() {
        let err = AppError::from(StateError::PoolNotFound(PoolId::new("pool-9")));
        assert_eq!(err.to_string(), "Not found: pool pool-9 not found");
        assert!(!err.is_retryable());

        let err = AppError::from(StateError::Validation(ValidationError::InvalidVolume));
        assert!(matches!(err, AppError::Validation(ValidationError::InvalidVolume)));
    }
}
