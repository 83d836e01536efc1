//! Mapping tool descriptors onto the completion endpoint's function schema.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::tools::ToolDescriptor;
use crate::{Error, Result};

/// A callable function as offered to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Schema used for tools that declare no parameters: one required
/// `city_name` string.
pub fn default_fallback_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "city_name": {"type": "string", "description": "城市名称"}
        },
        "required": ["city_name"]
    })
}

/// The tool's declared schema, if any.
///
/// Absent, `null` and `{}` all count as undeclared.
fn declared_schema(tool: &ToolDescriptor) -> Option<&Value> {
    match tool.input_schema.as_ref()? {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        schema => Some(schema),
    }
}

/// Build the function schema for one tool.
///
/// A declared schema is passed through unchanged; an undeclared one is
/// replaced by `fallback`.
pub fn function_schema(tool: &ToolDescriptor, fallback: &Value) -> Result<FunctionSchema> {
    let parameters = match declared_schema(tool) {
        Some(schema) => {
            check_object_schema(&tool.name, schema)?;
            schema.clone()
        }
        None => fallback.clone(),
    };

    Ok(FunctionSchema {
        name: tool.name.clone(),
        description: tool.description.clone().unwrap_or_default(),
        parameters,
    })
}

/// Build function schemas for every tool, preserving order.
pub fn function_schemas(tools: &[ToolDescriptor], fallback: &Value) -> Result<Vec<FunctionSchema>> {
    tools.iter().map(|t| function_schema(t, fallback)).collect()
}

fn check_object_schema(tool: &str, schema: &Value) -> Result<()> {
    let Some(map) = schema.as_object() else {
        return Err(Error::SchemaMismatch {
            tool: tool.to_string(),
            reason: format!("expected a JSON object, got {schema}"),
        });
    };

    match map.get("type") {
        None => Ok(()),
        Some(Value::String(t)) if t == "object" => Ok(()),
        Some(other) => Err(Error::SchemaMismatch {
            tool: tool.to_string(),
            reason: format!("parameters must have type \"object\", got {other}"),
        }),
    }
}
