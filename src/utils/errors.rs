use serde_json::Value;
use thiserror::Error;

/// Result alias used throughout the client library
pub type ApiResult<T> = Result<T, ApiError>;

/// Main error type for staffdesk
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx response carrying a JSON body, usually field-level validation errors
    #[error("Request rejected with status {status}: {body}")]
    Rejected { status: u16, body: Value },

    #[error("Request failed with status {status}")]
    Status { status: u16 },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Expected a JSON body but the server answered {status} with none")]
    UnexpectedEmpty { status: u16 },

    #[error("{0}")]
    Invalid(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. }
            | ApiError::Status { status }
            | ApiError::UnexpectedEmpty { status } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Structured error body returned by the server
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}
