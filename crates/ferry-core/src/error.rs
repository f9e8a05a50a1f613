use thiserror::Error;

/// Application-wide error types for Ferry Watch.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (fetching a schedule page or posting a notification).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Headless browser failed to launch, navigate or evaluate.
    #[error("Browser error: {0}")]
    BrowserError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Push notification could not be delivered.
    #[error("Notification error: {0}")]
    NotificationError(String),

    /// Export file could not be written.
    #[error("Export error: {0}")]
    ExportError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Query constraints supplied by the caller are malformed.
    #[error("Invalid query constraints: {0}")]
    InvalidConstraints(String),

    /// Missing or invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient, i.e. the next poll cycle
    /// has a fair chance of succeeding where this one failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::HttpError(msg) | AppError::BrowserError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(AppError::NetworkError("reset".into()).is_retryable());
        assert!(AppError::Timeout(30).is_retryable());
        assert!(AppError::HttpError("connection reset by peer".into()).is_retryable());
        assert!(AppError::BrowserError("navigation timeout".into()).is_retryable());
        assert!(!AppError::InvalidConstraints("no dates".into()).is_retryable());
        assert!(!AppError::ExportError("disk full".into()).is_retryable());
    }

    #[test]
    fn test_display_includes_context() {
        let err = AppError::InvalidConstraints("date '2026-13-01' is not YYYY-MM-DD".into());
        assert_eq!(
            err.to_string(),
            "Invalid query constraints: date '2026-13-01' is not YYYY-MM-DD"
        );
        assert_eq!(
            AppError::Timeout(30).to_string(),
            "Request timed out after 30 seconds"
        );
    }
}
