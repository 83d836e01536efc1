//! Side-by-side comparison of a query answered with and without tools.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::backend::{CompletionBackend, CompletionRequest, FunctionCallMode, Message};
use crate::schema::{default_fallback_schema, function_schemas};
use crate::tools::ToolChannel;
use crate::{Error, Result};

/// Outcome of the query when the model was offered the tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WithToolResult {
    pub model_reply: Option<String>,
    pub tool_called: Option<String>,
    pub tool_arguments: Option<Map<String, Value>>,
    pub tool_result: Option<Value>,
}

/// Outcome of the query without any tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WithoutToolResult {
    pub model_reply: Option<String>,
}

/// Both outcomes for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub user_query: String,
    pub with_mcp_tool: WithToolResult,
    pub without_tool: WithoutToolResult,
}

/// Runs one query twice, once with the channel's tools and once without.
#[derive(Debug, Clone)]
pub struct ComparisonRunner {
    fallback_schema: Value,
}

impl Default for ComparisonRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparisonRunner {
    pub fn new() -> Self {
        Self {
            fallback_schema: default_fallback_schema(),
        }
    }

    /// Replace the schema offered for tools that declare none.
    pub fn with_fallback_schema(mut self, schema: Value) -> Self {
        self.fallback_schema = schema;
        self
    }

    /// Answer `query` with and without tools.
    ///
    /// Any failure aborts the run; no partial result is returned.
    pub async fn run<C, B>(&self, query: &str, channel: &C, backend: &B) -> Result<ComparisonResult>
    where
        C: ToolChannel,
        B: CompletionBackend,
    {
        let tools = channel.list_tools().await?;
        let functions = function_schemas(&tools, &self.fallback_schema)?;
        let messages = [Message::user(query)];

        let reply = backend
            .complete(
                CompletionRequest::new(&messages).with_functions(&functions, FunctionCallMode::Auto),
            )
            .await?;

        let mut with_tool = WithToolResult {
            model_reply: reply.content,
            ..Default::default()
        };

        if let Some(call) = reply.function_call {
            let arguments = parse_arguments(&call.name, &call.arguments)?;

            if !tools.iter().any(|t| t.name == call.name) {
                return Err(Error::ToolInvocation(format!(
                    "model requested unknown tool `{}`",
                    call.name
                )));
            }

            info!(tool = %call.name, "model requested a tool call");
            let result = channel.call_tool(&call.name, arguments.clone()).await?;

            with_tool.tool_called = Some(call.name);
            with_tool.tool_arguments = Some(arguments);
            with_tool.tool_result = Some(result);
        } else {
            info!("model answered without calling a tool");
        }

        let reply = backend.complete(CompletionRequest::new(&messages)).await?;

        Ok(ComparisonResult {
            user_query: query.to_string(),
            with_mcp_tool: with_tool,
            without_tool: WithoutToolResult {
                model_reply: reply.content,
            },
        })
    }
}

/// Decode a model-produced argument payload into a JSON object.
pub fn parse_arguments(function: &str, raw: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(raw).map_err(|source| Error::ArgumentParse {
        function: function.to_string(),
        source,
    })
}
