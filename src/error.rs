//! Error kinds surfaced by the retrieval engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Vector store is closed")]
    StoreClosed,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for RetrievalError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
