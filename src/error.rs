//! Error types for job execution
//!
//! Errors are classified by recoverability:
//! - Retryable: network issues, timeouts, rate limits
//! - NonRetryable: configuration errors, bad input, storage faults

use thiserror::Error;

/// Error types for job execution
#[derive(Debug, Error)]
pub enum ExecutionError {
    // Retryable errors
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("API rate limit exceeded")]
    ApiRateLimit,

    // Non-retryable errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl ExecutionError {
    /// Returns true if this error is transient and worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExecutionError::NetworkError(_)
                | ExecutionError::Timeout(_)
                | ExecutionError::ApiRateLimit
        )
    }
}

impl From<std::io::Error> for ExecutionError {
    fn from(err: std::io::Error) -> Self {
        ExecutionError::IoError(err.to_string())
    }
}

impl From<crate::db::DbError> for ExecutionError {
    fn from(err: crate::db::DbError) -> Self {
        ExecutionError::Database(err.to_string())
    }
}

/// Serializable error representation for the status API
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobError {
    pub message: String,
    pub can_retry: bool,
}

impl From<&ExecutionError> for JobError {
    fn from(err: &ExecutionError) -> Self {
        JobError {
            message: err.to_string(),
            can_retry: err.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ExecutionError::NetworkError("reset".into()).is_retryable());
        assert!(ExecutionError::ApiRateLimit.is_retryable());
        assert!(!ExecutionError::ConfigurationError("bad cron".into()).is_retryable());
        assert!(!ExecutionError::Database("locked".into()).is_retryable());
    }

    #[test]
    fn test_job_error_carries_retry_flag() {
        let err = ExecutionError::Timeout(30);
        let job_err = JobError::from(&err);
        assert!(job_err.can_retry);
        assert!(job_err.message.contains("30"));
    }
}
