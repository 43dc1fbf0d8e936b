use std::fmt;

use ghost_types::ErrorCode;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    GhostNotFound(Uuid),
    GhostNotApproved(Uuid),
    Llm(ghost_types::Error),
    Store(ghost_store::Error),
}

impl Error {
    /// Maps to the stable HTTP-facing code set (§7/§8) so `ghost-server` can
    /// render the envelope without re-deriving the mapping.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::GhostNotFound(_) => ErrorCode::GhostNotFound,
            Error::GhostNotApproved(_) => ErrorCode::GhostNotApproved,
            Error::Llm(_) | Error::Store(_) => ErrorCode::ExecutionError,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::GhostNotFound(id) => write!(f, "ghost {id} not found"),
            Error::GhostNotApproved(id) => write!(f, "ghost {id} is not approved or active"),
            Error::Llm(err) => write!(f, "LLM error during execution: {}", err),
            Error::Store(err) => write!(f, "store error during execution: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::GhostNotFound(_) | Error::GhostNotApproved(_) => None,
            Error::Llm(err) => Some(err),
            Error::Store(err) => Some(err),
        }
    }
}

impl From<ghost_types::Error> for Error {
    fn from(err: ghost_types::Error) -> Self {
        Error::Llm(err)
    }
}

impl From<ghost_store::Error> for Error {
    fn from(err: ghost_store::Error) -> Self {
        Error::Store(err)
    }
}
