//! Runtime for comparing model answers with and without MCP tools.
//!
//! # Overview
//!
//! - **ToolChannel**: lists and invokes tools; [`McpToolChannel`] talks to an
//!   MCP tool provider over stdio.
//! - **CompletionBackend**: a chat-completion endpoint; [`OpenAiBackend`]
//!   speaks the OpenAI-compatible protocol with function calling.
//! - **ComparisonRunner**: sends one query with the tools offered as
//!   functions, executes the function the model picks, then sends the same
//!   query without tools.
//!
//! # Example
//!
//! ```no_run
//! use runtime::{ComparisonRunner, EndpointConfig, McpToolChannel, OpenAiBackend};
//! use mcp::ServerConfig;
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = OpenAiBackend::new(EndpointConfig::new("sk-..."));
//! let channel = McpToolChannel::connect(ServerConfig {
//!     name: "weather".into(),
//!     command: "python".into(),
//!     args: vec!["./stdio_mcp.py".into()],
//!     env: Default::default(),
//! })
//! .await?;
//!
//! let outcome = ComparisonRunner::new()
//!     .run("深圳的天气怎么样", &channel, &backend)
//!     .await;
//! channel.shutdown().await?;
//! println!("{:?}", outcome?.with_mcp_tool.tool_called);
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod compare;
mod error;
pub mod schema;
pub mod tools;

pub use backend::{
    CompletionBackend, CompletionReply, CompletionRequest, EndpointConfig, FunctionCall,
    FunctionCallMode, Message, OpenAiBackend, Role,
};
pub use compare::{
    ComparisonResult, ComparisonRunner, WithToolResult, WithoutToolResult, parse_arguments,
};
pub use error::{Error, Result};
pub use schema::{FunctionSchema, default_fallback_schema, function_schema, function_schemas};
pub use tools::{McpToolChannel, ToolChannel, ToolDescriptor};
