//! MCP (Model Context Protocol) client built on the rmcp SDK.
//!
//! The client performs the initialize handshake once on connect and the
//! resulting session is reused for every later request.
//!
//! # Example
//!
//! ```ignore
//! use runtime::tools::{McpClient, McpIdentity};
//!
//! # async fn example() -> Result<(), runtime::tools::McpError> {
//! let identity = McpIdentity::new("micro agent", "0.0.0");
//! let client = McpClient::connect_http("http://localhost:9011/mcp", &identity).await?;
//!
//! for tool in client.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//! # Ok(())
//! # }
//! ```

use rmcp::{
    ServiceExt,
    model::{CallToolRequestParams, CallToolResult, ClientInfo, JsonObject, Tool},
    service::{RoleClient, RunningService},
    transport::{ConfigureCommandExt, StreamableHttpClientTransport, TokioChildProcess},
};
use tokio::process::Command;
use tracing::info;

/// Error type for MCP operations.
pub type McpError = Box<dyn std::error::Error + Send + Sync>;

/// Client name and version announced during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpIdentity {
    pub name: String,
    pub version: String,
}

impl McpIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    fn client_info(&self) -> ClientInfo {
        let mut info = ClientInfo::default();
        info.client_info.name = self.name.clone();
        info.client_info.version = self.version.clone();
        info
    }
}

/// An initialized MCP session.
pub struct McpClient {
    service: RunningService<RoleClient, ClientInfo>,
}

impl McpClient {
    /// Connect to a server over streamable HTTP.
    pub async fn connect_http(url: &str, identity: &McpIdentity) -> Result<Self, McpError> {
        let transport = StreamableHttpClientTransport::from_uri(url.to_string());
        let service = identity.client_info().serve(transport).await?;
        Ok(Self::connected(service))
    }

    /// Spawn a server process and connect to it over stdio.
    pub async fn spawn(
        command: impl AsRef<str>,
        args: impl IntoIterator<Item = impl AsRef<str>>,
        identity: &McpIdentity,
    ) -> Result<Self, McpError> {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();

        let transport = TokioChildProcess::new(Command::new(command.as_ref()).configure(|cmd| {
            cmd.args(&args);
        }))?;

        let service = identity.client_info().serve(transport).await?;
        Ok(Self::connected(service))
    }

    fn connected(service: RunningService<RoleClient, ClientInfo>) -> Self {
        if let Some(peer) = service.peer_info() {
            info!(
                server = %peer.server_info.name,
                version = %peer.server_info.version,
                "connected to tool server"
            );
        }
        Self { service }
    }

    /// List available tools from the server.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        let response = self.service.list_tools(Default::default()).await?;
        Ok(response.tools)
    }

    /// Call a tool with the given name and arguments.
    pub async fn call_tool(
        &self,
        name: impl Into<String>,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let params = CallToolRequestParams {
            name: name.into().into(),
            arguments,
            meta: None,
            task: None,
        };

        let result = self.service.call_tool(params).await?;
        Ok(result)
    }

    /// Close the session.
    pub async fn shutdown(self) -> Result<(), McpError> {
        self.service.cancel().await?;
        Ok(())
    }
}
