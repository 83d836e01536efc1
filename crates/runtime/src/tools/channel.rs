//! Tool channel trait.

use crate::Result;
use crate::tools::ToolDescriptor;
use serde_json::{Map, Value};
use std::future::Future;

/// A connection to something that lists and executes tools.
///
/// This is the boundary between the comparison run and the tool provider;
/// tests substitute in-memory implementations.
pub trait ToolChannel: Send + Sync {
    /// List the available tools, in provider order.
    fn list_tools(&self) -> impl Future<Output = Result<Vec<ToolDescriptor>>> + Send;

    /// Invoke a tool by name.
    ///
    /// Fails with [`Error::ToolInvocation`](crate::Error::ToolInvocation) when
    /// the tool is unknown, rejects its arguments, or reports an error.
    fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> impl Future<Output = Result<Value>> + Send;
}
