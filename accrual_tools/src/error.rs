use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AccrualApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Order {0} is not registered with the accrual system")]
    NotRegistered(String),
    #[error("Too many requests. Retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
    #[error("Giving up after {attempts} attempts. {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl AccrualApiError {
    /// Connection failures and server errors are worth another try. Everything else is a definitive answer.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RestResponseError(_) => true,
            // 501 Not Implemented will not fix itself
            Self::QueryError { status, .. } => (500..=599).contains(status) && *status != 501,
            _ => false,
        }
    }
}
