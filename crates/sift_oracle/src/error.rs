//! Error types for oracle queries.

use thiserror::Error;

/// Result type alias for oracle operations.
pub type OracleResult<T> = Result<T, OracleError>;

/// Errors that can occur while querying the cloud provider.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Cloud provider client not available: {0}")]
    Unavailable(String),

    #[error("Query {query} failed: {message}")]
    QueryFailed { query: String, message: String },

    #[error("Unexpected response for {query}: {message}")]
    InvalidResponse { query: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OracleError {
    pub fn query_failed(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryFailed {
            query: query.into(),
            message: message.into(),
        }
    }
}
