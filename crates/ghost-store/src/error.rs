use std::fmt;

/// Result type for ghost-store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Database operation failed.
    Database(rusqlite::Error),

    /// (De)serialization of a jsonb-equivalent column failed.
    Serde(serde_json::Error),

    /// Row not found where one was required.
    NotFound(String),

    /// A governance invariant was violated (e.g. invalid status transition).
    Invariant(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(err) => write!(f, "database error: {}", err),
            Error::Serde(err) => write!(f, "serialization error: {}", err),
            Error::NotFound(what) => write!(f, "not found: {}", what),
            Error::Invariant(msg) => write!(f, "invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(err) => Some(err),
            Error::Serde(err) => Some(err),
            Error::NotFound(_) | Error::Invariant(_) => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}
