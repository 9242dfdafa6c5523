use thiserror::Error;

/// Errors from completion service calls.
///
/// Every variant is fatal to the run; the loop never retries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompletionError {
    /// The request never produced an HTTP response.
    #[error("network: {0}")]
    Network(String),

    /// The completion service answered with a non-success status.
    #[error("completion api: {0}")]
    Api(String),

    /// The response body could not be decoded or had no candidate.
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}
