//! Human-readable rendering of a comparison.

use runtime::ComparisonResult;
use serde_json::Value;
use std::io::{self, Write};

/// Write the comparison as a plain-text report.
pub fn render(result: &ComparisonResult, out: &mut impl Write) -> io::Result<()> {
    let with_tool = &result.with_mcp_tool;

    writeln!(out, ">>> Query: {}", result.user_query)?;

    writeln!(out, "\n[With MCP tool]")?;
    writeln!(out, "Model reply: {}", reply_text(with_tool.model_reply.as_deref()))?;
    match &with_tool.tool_called {
        Some(name) => {
            writeln!(out, "Tool called: {name}")?;
            let arguments = with_tool
                .tool_arguments
                .as_ref()
                .map(|args| Value::Object(args.clone()).to_string())
                .unwrap_or_default();
            writeln!(out, "Tool arguments: {arguments}")?;
            let result = with_tool.tool_result.as_ref().map(tool_text).unwrap_or_default();
            writeln!(out, "Tool result: {result}")?;
        }
        None => writeln!(out, "No tool called")?,
    }

    writeln!(out, "\n[Without tool]")?;
    writeln!(
        out,
        "Model reply: {}",
        reply_text(result.without_tool.model_reply.as_deref())
    )?;
    Ok(())
}

fn reply_text(reply: Option<&str>) -> &str {
    match reply {
        Some(text) if !text.trim().is_empty() => text,
        _ => "(empty)",
    }
}

/// Text blocks of an MCP tool result, or the raw JSON when there are none.
fn tool_text(result: &Value) -> String {
    let texts: Vec<&str> = result
        .get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();

    if texts.is_empty() {
        result.to_string()
    } else {
        texts.join("\n")
    }
}
