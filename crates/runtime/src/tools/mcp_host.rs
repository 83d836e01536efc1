//! MCP-backed tool channel.

use super::{ToolChannel, ToolDescriptor};
use crate::{Error, Result};
use mcp::{Server, ServerConfig};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Tool channel backed by an MCP tool provider.
///
/// Owns the provider for its whole lifetime; [`McpToolChannel::shutdown`]
/// (or dropping the channel) terminates it.
pub struct McpToolChannel {
    server: Server,
}

impl McpToolChannel {
    /// Spawn the provider and perform the handshake.
    pub async fn connect(config: ServerConfig) -> Result<Self> {
        let name = config.name.clone();
        let server = Server::spawn(config)
            .await
            .map_err(|e| Error::Connection(format!("failed to spawn {name}: {e}")))?;
        Self::handshake(server).await
    }

    /// Perform the handshake on an already-connected server.
    pub async fn handshake(server: Server) -> Result<Self> {
        server.initialize().await.map_err(|e| {
            Error::Connection(format!("handshake with {} failed: {e}", server.name()))
        })?;
        Ok(Self { server })
    }

    /// Terminate the provider.
    pub async fn shutdown(self) -> Result<()> {
        self.server
            .shutdown()
            .await
            .map_err(|e| Error::Connection(format!("shutdown failed: {e}")))
    }
}

impl ToolChannel for McpToolChannel {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let tools = self
            .server
            .list_tools()
            .await
            .map_err(|e| Error::Connection(format!("tools/list failed: {e}")))?;
        info!(server = %self.server.name(), count = tools.len(), "discovered tools");
        Ok(tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<Value> {
        debug!(tool = %name, ?arguments, "calling tool");
        let result = self
            .server
            .call_tool(name, Some(arguments))
            .await
            .map_err(|e| Error::ToolInvocation(format!("{name}: {e}")))?;

        serde_json::to_value(&result)
            .map_err(|e| Error::ToolInvocation(format!("serialize result of {name}: {e}")))
    }
}
