use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeywordError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Argument(String),

    #[error("{0}")]
    Lookup(String),

    #[error("{0}")]
    State(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Assertion(String),

    #[error(transparent)]
    Client(#[from] sudslib_soap::Error),
}

impl KeywordError {
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }
}
