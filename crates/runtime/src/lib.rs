//! Tooloop runtime: a tool-calling conversation loop.
//!
//! This crate drives a multi-turn conversation between a chat completion
//! service and an MCP tool server. The model asks for tools, the runtime
//! runs them one at a time and feeds the results back, until the model
//! stops.
//!
//! # Overview
//!
//! - **ConversationLoop**: owns the conversation and drives turns until the
//!   model stops, goes off script, or the turn cap is hit.
//! - **CompletionBackend**: a trait over completion services; the
//!   OpenAI-compatible backend is provided.
//! - **ToolService**: a trait over tool-execution services; the MCP-backed
//!   service is provided.
//! - **Toolbox**: the dispatch table built once from the tool catalog.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{ConversationLoop, McpClient, McpIdentity, McpToolService, OpenAiBackend, Toolbox};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let identity = McpIdentity::new("micro agent", "0.0.0");
//! let client = McpClient::connect_http("http://localhost:9011/mcp", &identity).await?;
//! let toolbox = Toolbox::discover(McpToolService::new(client)).await?;
//!
//! let backend = OpenAiBackend::builder("http://localhost:12434/engines/llama.cpp/v1/", "model")
//!     .build()?;
//!
//! let agent = ConversationLoop::new(backend, toolbox);
//! let outcome = agent.run("Find a rust snippet about error handling.", &CancellationToken::new()).await?;
//! println!("{:?}", outcome.content());
//! # Ok(())
//! # }
//! ```

pub mod conversation;
mod error;
pub mod model;
pub mod providers;
pub mod tools;

// Conversation loop
pub use conversation::{
    Anomaly, Conversation, ConversationLoop, DEFAULT_MAX_TURNS, LoopConfig, RunError, RunOutcome,
    Termination,
};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use model::{
    CompletionBackend, CompletionError, FinishReason, FunctionSpec, Message, Role, SamplingConfig,
    ToolCall, TurnResult,
};

// Completion providers
pub use providers::{OpenAiBackend, OpenAiBackendBuilder};

// Tool types
pub use tools::{
    ArgumentPolicy, McpClient, McpError, McpIdentity, McpToolService, ToolDescriptor, ToolError,
    ToolService, Toolbox,
};
