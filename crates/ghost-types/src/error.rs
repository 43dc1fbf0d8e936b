use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for ghost-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or validating domain types
#[derive(Debug)]
pub enum Error {
    /// A value violated a documented invariant (e.g. relX outside [0,1])
    Invariant(String),

    /// (De)serialization failed
    Serde(serde_json::Error),

    /// A dependent service (LLM provider, transmit endpoint) returned a
    /// transient failure (§7 UpstreamTransient); the caller may retry.
    Upstream(String),

    /// An operation exceeded its configured deadline (e.g. the 30s LLM timeout, §5).
    Timeout(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Invariant(msg) => write!(f, "invariant violated: {}", msg),
            Error::Serde(err) => write!(f, "serialization error: {}", err),
            Error::Upstream(msg) => write!(f, "upstream error: {}", msg),
            Error::Timeout(msg) => write!(f, "operation timed out: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Invariant(_) | Error::Upstream(_) | Error::Timeout(_) => None,
            Error::Serde(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

/// The stable, user-visible error code set from the HTTP surface (§7/§8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidBatch,
    BatchTooLarge,
    MethodNotAllowed,
    RateLimitExceeded,
    MissingOrg,
    MissingGhost,
    GhostNotFound,
    GhostNotApproved,
    InsertFailed,
    ExecutionError,
    InternalError,
}

impl ErrorCode {
    /// The HTTP status conventionally paired with this code.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::InvalidBatch | ErrorCode::BatchTooLarge | ErrorCode::MissingOrg
            | ErrorCode::MissingGhost => 400,
            ErrorCode::GhostNotApproved => 403,
            ErrorCode::GhostNotFound => 404,
            ErrorCode::MethodNotAllowed => 405,
            ErrorCode::RateLimitExceeded => 429,
            ErrorCode::InsertFailed | ErrorCode::ExecutionError | ErrorCode::InternalError => 500,
        }
    }
}
