//! Error types and handling for the `Sentinel` monitor
//!
//! Upstream outages for the atmosphere and entropy sources never show up
//! here: those fetchers substitute fallback constants instead of failing.

use thiserror::Error;

/// Main error type for the `Sentinel` library
#[derive(Error, Debug)]
pub enum SentinelError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The geocoding service had no usable match for the query
    #[error("Location not found: {query}")]
    LocationNotFound { query: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// HTTP client construction errors
    #[error("HTTP client error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },
}

impl SentinelError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new location-not-found error
    pub fn location_not_found<S: Into<String>>(query: S) -> Self {
        Self::LocationNotFound {
            query: query.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SentinelError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file.")
            }
            SentinelError::LocationNotFound { query } => {
                format!("Location '{query}' not found. Try a different spelling or use coordinates.")
            }
            SentinelError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            SentinelError::Http { .. } => {
                "Unable to set up the HTTP client. Please check your TLS setup.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = SentinelError::config("bad url");
        assert!(matches!(config_err, SentinelError::Config { .. }));

        let missing = SentinelError::location_not_found("Atlantis");
        assert!(matches!(missing, SentinelError::LocationNotFound { .. }));

        let validation_err = SentinelError::validation("invalid coordinates");
        assert!(matches!(validation_err, SentinelError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = SentinelError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let missing = SentinelError::location_not_found("Atlantis");
        assert!(missing.user_message().contains("'Atlantis' not found"));

        let validation_err = SentinelError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_display_includes_query() {
        let missing = SentinelError::location_not_found("Paris, TX");
        assert_eq!(missing.to_string(), "Location not found: Paris, TX");
    }
}
