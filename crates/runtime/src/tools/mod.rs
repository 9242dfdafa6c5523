//! Tool discovery, argument handling and dispatch.

pub mod catalog;
mod codec;
pub mod errors;
mod mcp_client;
mod mcp_host;
mod service;
pub(crate) mod toolbox;
mod types;

pub use codec::{ArgumentPolicy, decode_arguments};
pub use errors::{CatalogError, ToolError, ToolServiceError};
pub use mcp_client::{McpClient, McpError, McpIdentity};
pub use mcp_host::McpToolService;
pub use service::ToolService;
pub use toolbox::{DEFAULT_CALL_TIMEOUT, Toolbox};
pub use types::{Arguments, ParameterSchema, ToolContent, ToolDescriptor};
