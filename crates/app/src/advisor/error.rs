//! Error types for the chemistry advisor.

use thiserror::Error;

/// Errors that can occur when requesting a recommendation.
///
/// [`AdvisorError::MissingApiKey`] and [`AdvisorError::InvalidConfiguration`]
/// are configuration problems detected before any request is sent. Every
/// other variant means the advisor call itself failed or returned something
/// unusable; none of them leave a partial recommendation behind.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// No API key is configured.
    #[error("advisor API key is missing (set ANTHROPIC_API_KEY)")]
    MissingApiKey,

    /// The configuration cannot be used to build a client.
    #[error("invalid advisor configuration: {0}")]
    InvalidConfiguration(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an error.
    #[error("API error ({error_type}): {message}")]
    Api {
        /// Error type from the API.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse the API response envelope.
    #[error("parse error: {0}")]
    Parse(String),

    /// The recommendation payload is missing or violates the output schema.
    #[error("invalid recommendation: {0}")]
    InvalidRecommendation(String),
}

impl AdvisorError {
    /// Returns `true` for errors caused by local configuration rather than
    /// by the advisor call.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::InvalidConfiguration(_))
    }
}

/// API error response body.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisor_error_display() {
        let err = AdvisorError::RateLimited(60);
        assert_eq!(err.to_string(), "rate limited, retry after 60 seconds");

        let err = AdvisorError::Api {
            error_type: "invalid_request_error".to_string(),
            message: "max_tokens is too large".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (invalid_request_error): max_tokens is too large"
        );
    }

    #[test]
    fn test_is_configuration() {
        assert!(AdvisorError::MissingApiKey.is_configuration());
        assert!(AdvisorError::InvalidConfiguration("bad".to_string()).is_configuration());
        assert!(!AdvisorError::RateLimited(1).is_configuration());
        assert!(!AdvisorError::InvalidRecommendation("x".to_string()).is_configuration());
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{
            "type": "error",
            "error": {
                "type": "overloaded_error",
                "message": "Overloaded"
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error_type, "error");
        assert_eq!(response.error.error_type, "overloaded_error");
        assert_eq!(response.error.message, "Overloaded");
    }
}
