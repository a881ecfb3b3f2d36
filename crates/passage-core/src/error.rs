use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    InvalidVector { expected: usize, actual: usize },

    #[error("vector component at position {position} is not finite")]
    NonFiniteVector { position: usize },

    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("vector backend unavailable: {0}")]
    BackendUnavailable(#[source] anyhow::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a failure raised by an embedding collaborator.
    pub fn embedding(err: impl Into<anyhow::Error>) -> Self {
        Self::Embedding(err.into())
    }

    /// Wrap a failure raised by a vector-index backend driver.
    pub fn backend(err: impl Into<anyhow::Error>) -> Self {
        Self::BackendUnavailable(err.into())
    }

    /// True for errors caused by a caller-supplied vector.
    pub fn is_invalid_vector(&self) -> bool {
        matches!(self, Self::InvalidVector { .. } | Self::NonFiniteVector { .. })
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
