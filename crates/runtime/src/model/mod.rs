//! Conversation protocol types and the completion backend trait.

pub mod errors;
pub mod types;

pub use errors::CompletionError;
pub use types::{
    CompletionBackend, CompletionRequest, FinishReason, FunctionSpec, Message, Role,
    SamplingConfig, ToolCall, TurnResult,
};
