use thiserror::Error;

use crate::model::CompletionError;
use crate::tools::CatalogError;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("completion service error: {0}")]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("turn limit of {limit} exceeded")]
    TurnLimitExceeded { limit: usize },

    #[error("run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
