//! Error types and handling for the trip planner

use std::time::Duration;

use thiserror::Error;

use crate::models::FailureCode;

/// Application-level error type (configuration, providers, cache, I/O)
#[derive(Error, Debug)]
pub enum TripPlanError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// External provider communication errors
    #[error("Provider error: {message}")]
    Provider { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl TripPlanError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new provider error
    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripPlanError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file and API keys.")
            }
            TripPlanError::Provider { .. } => {
                "Unable to reach an external data provider. Please check your internet connection."
                    .to_string()
            }
            TripPlanError::Validation { message } => format!("Invalid input: {message}"),
            TripPlanError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            TripPlanError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            TripPlanError::General { message } => message.clone(),
        }
    }
}

/// Fatal orchestration outcome: no trip plan is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestrationError {
    #[error("Invalid trip request: {0}")]
    InvalidRequest(String),

    #[error("No feasible travel window: {0}")]
    NoFeasibleWindow(String),

    #[error("Date resolution failed after {attempts} attempt(s) ({code}): {message}")]
    DateResolution {
        code: FailureCode,
        message: String,
        attempts: u32,
    },

    #[error("Date advisor did not answer within {0:?}")]
    DateAdvisorTimedOut(Duration),

    #[error("Global deadline of {0:?} expired before any planning agent settled")]
    GlobalDeadlineExceeded(Duration),
}

impl OrchestrationError {
    /// Machine-readable reason code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::NoFeasibleWindow(_) => "no_feasible_window",
            Self::DateResolution { .. } => "date_resolution_failed",
            Self::DateAdvisorTimedOut(_) => "date_advisor_timed_out",
            Self::GlobalDeadlineExceeded(_) => "global_deadline_exceeded",
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest(message) => format!("Invalid trip request: {message}"),
            Self::NoFeasibleWindow(_) => {
                "Your travel window is shorter than the trip you asked for. Widen the window or shorten the trip."
                    .to_string()
            }
            Self::DateResolution { .. } | Self::DateAdvisorTimedOut(_) => {
                "We could not work out travel dates right now. Please try again shortly.".to_string()
            }
            Self::GlobalDeadlineExceeded(_) => {
                "Planning took too long and was cancelled. Please try again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = TripPlanError::config("missing API key");
        assert!(matches!(config_err, TripPlanError::Config { .. }));

        let provider_err = TripPlanError::provider("connection failed");
        assert!(matches!(provider_err, TripPlanError::Provider { .. }));

        let validation_err = TripPlanError::validation("duration out of range");
        assert!(matches!(validation_err, TripPlanError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = TripPlanError::config("llm.api_key missing");
        assert!(config_err.user_message().contains("llm.api_key missing"));

        let provider_err = TripPlanError::provider("test");
        assert!(provider_err.user_message().contains("Unable to reach"));

        let validation_err = TripPlanError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TripPlanError = io_err.into();
        assert!(matches!(err, TripPlanError::Io { .. }));
    }

    #[test]
    fn test_orchestration_codes_are_distinct() {
        let errors = [
            OrchestrationError::InvalidRequest("x".into()),
            OrchestrationError::NoFeasibleWindow("x".into()),
            OrchestrationError::DateResolution {
                code: FailureCode::ProviderUnavailable,
                message: "x".into(),
                attempts: 3,
            },
            OrchestrationError::DateAdvisorTimedOut(Duration::from_secs(1)),
            OrchestrationError::GlobalDeadlineExceeded(Duration::from_secs(1)),
        ];
        let mut codes: Vec<_> = errors.iter().map(OrchestrationError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
