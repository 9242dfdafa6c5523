//! MCP-backed tool service.

use serde::Deserialize;
use serde_json::Value;

use super::{
    Arguments, McpClient, ToolContent, ToolDescriptor, ToolService, ToolServiceError,
};

/// Tool service backed by an MCP session.
pub struct McpToolService {
    client: McpClient,
}

impl McpToolService {
    pub fn new(client: McpClient) -> Self {
        Self { client }
    }

    /// Close the underlying MCP session.
    pub async fn shutdown(self) -> Result<(), ToolServiceError> {
        self.client
            .shutdown()
            .await
            .map_err(|e| ToolServiceError::Transport(e.to_string()))
    }
}

impl ToolService for McpToolService {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolServiceError> {
        let tools = self
            .client
            .list_tools()
            .await
            .map_err(|e| ToolServiceError::Transport(e.to_string()))?;

        tools
            .iter()
            .map(|tool| {
                serde_json::to_value(tool)
                    .map_err(|e| ToolServiceError::Transport(format!("encode tool: {e}")))
                    .and_then(descriptor_from_value)
            })
            .collect()
    }

    async fn invoke_tool(
        &self,
        name: &str,
        arguments: Arguments,
    ) -> Result<Vec<ToolContent>, ToolServiceError> {
        let result = self
            .client
            .call_tool(name, Some(arguments))
            .await
            .map_err(|e| ToolServiceError::Transport(e.to_string()))?;

        let value = serde_json::to_value(&result)
            .map_err(|e| ToolServiceError::Transport(format!("encode result: {e}")))?;
        contents_from_value(value)
    }
}

/// Wire shape of a `tools/call` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallResult {
    #[serde(default)]
    content: Vec<ToolContent>,
    #[serde(default)]
    is_error: Option<bool>,
}

fn descriptor_from_value(value: Value) -> Result<ToolDescriptor, ToolServiceError> {
    serde_json::from_value(value)
        .map_err(|e| ToolServiceError::Transport(format!("invalid tool descriptor: {e}")))
}

fn contents_from_value(value: Value) -> Result<Vec<ToolContent>, ToolServiceError> {
    let result: CallResult = serde_json::from_value(value)
        .map_err(|e| ToolServiceError::Transport(format!("invalid tool result: {e}")))?;

    if result.is_error == Some(true) {
        let message = result
            .content
            .iter()
            .filter_map(ToolContent::as_text)
            .collect::<Vec<_>>()
            .join("\n");
        return Err(ToolServiceError::Remote(message));
    }

    Ok(result.content)
}
