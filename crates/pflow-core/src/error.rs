//! Error types for remote round trips and form-boundary validation.

use thiserror::Error;

/// Result type for Remote Client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the Remote Client.
///
/// Server rejections are deliberately not split by status class: the query
/// layer treats every variant the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Connection, timeout or other network failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response
    #[error("Server responded with {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    /// 2xx response whose body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The configured base URL cannot be joined with a resource path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// HTTP status, when the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors caught before a submission reaches the Remote Client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required form field is empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Payload text is not valid JSON
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Payload parsed, but is not a JSON object
    #[error("Payload must be a JSON object, got {0}")]
    PayloadNotObject(&'static str),
}
