//! Error types for GLIMPS Detect client operations

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of response body bytes kept in an error message
const BODY_SNIPPET_LIMIT: usize = 1024;

/// Result type alias for GLIMPS Detect client operations
pub type Result<T> = std::result::Result<T, GdetectError>;

/// Errors that can occur during GLIMPS Detect client operations
#[derive(Error, Debug)]
pub enum GdetectError {
    /// Invalid constructor input (endpoint or token)
    #[error("validation error: {0}")]
    Validation(String),

    /// The file to submit could not be opened or read
    #[error("could not open file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Local I/O failure outside of file submission
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure (connection refused, reset, TLS, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with an unexpected non-2xx status
    #[error("invalid response from endpoint, {status}: {body}")]
    Request { status: StatusCode, body: String },

    /// Endpoint rejected the token (401/403)
    #[error("invalid response from endpoint, {status}: {body}")]
    Auth { status: StatusCode, body: String },

    /// Requested submission or hash is unknown (404)
    #[error("invalid response from endpoint, {status}: {body}")]
    NotFound { status: StatusCode, body: String },

    /// Endpoint failed on its side (5xx)
    #[error("invalid response from endpoint, {status}: {body}")]
    Server { status: StatusCode, body: String },

    /// Response body is not the expected JSON
    #[error("could not decode response: {message}: {body}")]
    Decode { message: String, body: String },

    /// Endpoint accepted the request but reported `status: false`
    #[error("submission rejected by endpoint: {body}")]
    Submission { body: String },

    /// Deadline expired before the operation finished
    #[error("operation timed out")]
    Timeout,

    /// Operation was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// Result lacks the field needed to build a view URL
    #[error("result has no {0} field")]
    MissingField(&'static str),

    /// Configuration could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl GdetectError {
    /// Map a non-2xx response to the matching status error
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = snippet(body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth { status, body },
            StatusCode::NOT_FOUND => Self::NotFound { status, body },
            s if s.is_server_error() => Self::Server { status, body },
            _ => Self::Request { status, body },
        }
    }

    /// Create a decode error keeping a bounded copy of the offending body
    pub fn decode(err: impl std::fmt::Display, body: &str) -> Self {
        Self::Decode {
            message: err.to_string(),
            body: snippet(body),
        }
    }

    /// Create a submission error from the raw response body
    pub fn submission(body: &str) -> Self {
        Self::Submission {
            body: snippet(body),
        }
    }

    /// HTTP status attached to this error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request { status, .. }
            | Self::Auth { status, .. }
            | Self::NotFound { status, .. }
            | Self::Server { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// True for transport failures and every non-2xx status error
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Request { .. }
                | Self::Auth { .. }
                | Self::NotFound { .. }
                | Self::Server { .. }
        )
    }

    /// True when retrying the same request later may succeed.
    ///
    /// Covers transport failures, 5xx answers and the 408/429 statuses.
    /// Cancellation and deadline expiry are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Server { .. } => true,
            Self::Request { status, .. } => matches!(
                *status,
                StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
            ),
            _ => false,
        }
    }

    /// True when the error comes from the caller's context
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Timeout | Self::Cancelled)
    }
}

/// Truncate a response body on a char boundary
fn snippet(body: &str) -> String {
    let body = body.trim();
    if body.len() <= BODY_SNIPPET_LIMIT {
        return body.to_string();
    }
    let mut end = BODY_SNIPPET_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
