use serde_json::json;
use thiserror::Error;

/// Failures intrinsic to a single tool call.
///
/// These never end a run. They are rendered with [`ToolError::to_payload`]
/// and handed to the model as ordinary tool output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("argument decode error: {0}")]
    ArgumentDecode(String),
    #[error("schema violation: {0}")]
    SchemaViolation(String),
    #[error("Function execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Function execution failed: timeout after {0}ms")]
    Timeout(u64),
    #[error("expected text content, got {0}")]
    ContentTypeMismatch(String),
    #[error("tool returned no content")]
    EmptyContent,
}

impl ToolError {
    /// Structured error text delivered back into the conversation.
    pub fn to_payload(&self) -> String {
        json!({ "error": self.to_string() }).to_string()
    }
}

/// Errors from the channel to the tool-execution service.
#[derive(Debug, Error)]
pub enum ToolServiceError {
    #[error("transport: {0}")]
    Transport(String),
    /// The service executed the call and flagged the result as an error.
    #[error("{0}")]
    Remote(String),
}

/// Errors while translating the tool catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("tool descriptor at position {index} has no name")]
    MissingToolName { index: usize },
}
