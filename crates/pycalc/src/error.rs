//! Common error types for pycalc components.

use thiserror::Error;

/// Common error type for pycalc operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A request or result queue was closed on the other side
    #[error("channel error: {0}")]
    Channel(String),

    /// Internal error
    #[error("{0}")]
    Internal(String),

    /// An underlying failure annotated with what was being attempted
    #[error("{message}: {source}")]
    Context {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Wrap `source` with a message describing the failed operation.
    pub fn context<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Context {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

/// Result type alias using pycalc Error.
pub type Result<T> = std::result::Result<T, Error>;
