//! Tool service trait.

use super::{Arguments, ToolContent, ToolDescriptor, ToolServiceError};
use std::future::Future;

/// Trait for tool-execution services.
///
/// This is the boundary between the conversation loop and side effects.
pub trait ToolService: Send + Sync {
    /// Discover the tools the service offers.
    fn list_tools(
        &self,
    ) -> impl Future<Output = Result<Vec<ToolDescriptor>, ToolServiceError>> + Send;

    /// Invoke one tool and return its content elements.
    fn invoke_tool(
        &self,
        name: &str,
        arguments: Arguments,
    ) -> impl Future<Output = Result<Vec<ToolContent>, ToolServiceError>> + Send;
}
