//! Error handling for EventLens
//!
//! This module defines the main error types used throughout the crate
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for EventLens
#[derive(Error, Debug)]
pub enum EventLensError {
    #[error("Event retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("Invalid event {event_id}: {reason}")]
    InvalidEvent { event_id: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Event source specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("event service unavailable")]
    ServiceUnavailable,
}

/// Result type alias for EventLens operations
pub type Result<T> = std::result::Result<T, EventLensError>;

/// Result type alias for event source operations
pub type RetrievalResult<T> = std::result::Result<T, RetrievalError>;

impl EventLensError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            EventLensError::Retrieval(_) => true,
            EventLensError::LocationUnavailable(_) => true,
            EventLensError::InvalidCriteria(_) => false,
            EventLensError::InvalidEvent { .. } => false,
            EventLensError::Config(_) => false,
            EventLensError::Http(_) => true,
            EventLensError::Serialization(_) => false,
            EventLensError::Io(_) => true,
            EventLensError::UrlParse(_) => false,
            EventLensError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EventLensError::Config(_) => ErrorSeverity::Critical,
            EventLensError::LocationUnavailable(_) => ErrorSeverity::Warning,
            EventLensError::InvalidEvent { .. } => ErrorSeverity::Warning,
            EventLensError::InvalidCriteria(_) => ErrorSeverity::Info,
            EventLensError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_errors_are_recoverable() {
        let retrieval = EventLensError::from(RetrievalError::Timeout);
        assert!(retrieval.is_recoverable());
        assert_eq!(retrieval.severity(), ErrorSeverity::Error);

        let location = EventLensError::LocationUnavailable("permission denied".to_string());
        assert!(location.is_recoverable());
        assert_eq!(location.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_invalid_criteria_is_not_recoverable() {
        let err = EventLensError::InvalidCriteria("end before start".to_string());
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Invalid criteria: end before start");
    }
}
