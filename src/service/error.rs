use thiserror::Error;

use crate::error::HttpError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Analysis request {0} not found")]
    RequestNotFound(i64),

    #[error("Result row for analysis request {0} not found")]
    ResultNotFound(i64),

    #[error("Upstream call failed: {0}")]
    Upstream(String),

    #[error("Upstream returned an unusable payload: {0}")]
    BadUpstreamPayload(String),

    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("Job queue error: {0}")]
    Queue(String),

    #[error("Email delivery failed: {0}")]
    Mail(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    /// Only transport-level upstream failures are retried; a schema-violating
    /// payload will not get better on a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Upstream(_))
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::RequestNotFound(_) | ServiceError::ResultNotFound(_) => {
                HttpError::not_found(error.to_string())
            }
            _ => HttpError::server_error(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(ServiceError::Upstream("timeout".into()).is_retryable());
        assert!(!ServiceError::BadUpstreamPayload("bad json".into()).is_retryable());
        assert!(!ServiceError::RequestNotFound(7).is_retryable());
    }
}
