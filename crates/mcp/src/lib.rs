//! MCP (Model Context Protocol) tool channel client.
//!
//! Speaks line-delimited JSON-RPC 2.0 to a tool provider over its stdio:
//! `initialize`, `tools/list`, `tools/call`.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Server, ServerConfig};
//! use std::collections::HashMap;
//!
//! # async fn example() -> mcp::Result<()> {
//! let config = ServerConfig {
//!     name: "weather".to_string(),
//!     command: "python".to_string(),
//!     args: vec!["./stdio_mcp.py".to_string()],
//!     env: HashMap::new(),
//! };
//!
//! let server = Server::spawn(config).await?;
//! server.initialize().await?;
//!
//! for tool in server.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! let mut args = serde_json::Map::new();
//! args.insert("city_name".into(), "Shenzhen".into());
//! let result = server.call_tool("get_weather", Some(args)).await?;
//! println!("{}", result.text());
//!
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod server;

pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, ClientInfo, EmbeddedResource, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    ListToolsResult, PROTOCOL_VERSION, RequestId, ServerCapabilities, ServerInfo, Tool,
    ToolContent, ToolsCapability,
};
pub use server::{DEFAULT_TIMEOUT, MAX_OUTPUT_SIZE, Server, ServerConfig};
