//! CLI error types.

use runtime::Anomaly;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or unreadable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The tool server could not be reached or initialized.
    #[error("failed to connect to tool server: {0}")]
    Connection(String),

    /// An error occurred while setting up the runtime.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// A run ended on a fatal error.
    #[error("run failed after {turns} turn(s): {source}")]
    Run {
        turns: usize,
        #[source]
        source: runtime::Error,
    },

    /// The model ended the conversation without a clean answer.
    #[error("conversation unresolved: {0}")]
    Unresolved(Anomaly),

    /// The completion backend could not be built.
    #[error(transparent)]
    Completion(#[from] runtime::CompletionError),
}

impl From<runtime::RunError> for Error {
    fn from(e: runtime::RunError) -> Self {
        Self::Run {
            turns: e.turns,
            source: e.error,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
