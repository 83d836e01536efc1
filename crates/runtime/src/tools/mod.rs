//! Tool channel abstraction and its MCP implementation.

mod channel;
mod mcp_host;
mod types;

pub use channel::ToolChannel;
pub use mcp_host::McpToolChannel;
pub use types::ToolDescriptor;
