use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Llm(ghost_types::Error),
    Store(ghost_store::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Llm(err) => write!(f, "LLM error during clustering: {}", err),
            Error::Store(err) => write!(f, "store error during clustering: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
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
