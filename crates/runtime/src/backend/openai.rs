//! OpenAI-compatible chat completion backend.

use super::{
    CompletionBackend, CompletionReply, CompletionRequest, FunctionCall, FunctionCallMode, Message,
};
use crate::schema::FunctionSchema;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// DashScope's OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_MODEL: &str = "qwen2.5-1.5b-instruct";

/// Connection settings for a completion endpoint.
#[derive(Clone)]
pub struct EndpointConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl EndpointConfig {
    /// Settings for the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    functions: Option<&'a [FunctionSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCallMode>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCall {
    function: FunctionCall,
}

/// OpenAI-compatible completion backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: EndpointConfig,
}

impl OpenAiBackend {
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn build_request<'a>(&'a self, request: &CompletionRequest<'a>) -> ApiRequest<'a> {
        let offers_functions = !request.functions.is_empty();
        ApiRequest {
            model: &self.config.model,
            messages: request.messages,
            functions: offers_functions.then_some(request.functions),
            function_call: offers_functions.then_some(request.function_call),
        }
    }
}

impl std::fmt::Display for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai({}, {})", self.config.model, self.config.base_url)
    }
}

/// Take the first choice. Endpoints that answer in the newer `tool_calls`
/// shape are mapped onto the single function call.
fn into_reply(response: ApiResponse) -> Result<CompletionReply> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidResponse("response has no choices".into()))?;

    let ApiMessage {
        content,
        function_call,
        tool_calls,
    } = choice.message;

    let function_call = function_call.or_else(|| {
        tool_calls
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|call| call.function)
    });

    Ok(CompletionReply {
        content,
        function_call,
    })
}

impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<CompletionReply> {
        let api_request = self.build_request(&request);
        debug!(
            backend = %self,
            messages = api_request.messages.len(),
            functions = api_request.functions.map_or(0, <[_]>::len),
            "sending completion request"
        );

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .header("accept", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let reply = into_reply(api_response)?;
        debug!(
            has_content = reply.content.is_some(),
            function_call = reply.function_call.as_ref().map(|c| c.name.as_str()),
            "completion received"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> OpenAiBackend {
        OpenAiBackend::new(EndpointConfig::new("sk-test"))
    }

    fn weather_function() -> FunctionSchema {
        FunctionSchema {
            name: "get_weather".into(),
            description: "Weather by city".into(),
            parameters: json!({"type": "object"}),
        }
    }

    #[test]
    fn request_with_functions() {
        let backend = backend();
        let messages = [Message::user("深圳的天气怎么样")];
        let functions = [weather_function()];
        let request =
            CompletionRequest::new(&messages).with_functions(&functions, FunctionCallMode::Auto);

        let body = serde_json::to_value(backend.build_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": DEFAULT_MODEL,
                "messages": [{"role": "user", "content": "深圳的天气怎么样"}],
                "functions": [{
                    "name": "get_weather",
                    "description": "Weather by city",
                    "parameters": {"type": "object"}
                }],
                "function_call": "auto"
            })
        );
    }

    #[test]
    fn request_without_functions_omits_directive() {
        let backend = backend();
        let messages = [Message::user("hi")];
        let body =
            serde_json::to_value(backend.build_request(&CompletionRequest::new(&messages))).unwrap();
        assert!(body.get("functions").is_none());
        assert!(body.get("function_call").is_none());
    }

    #[test]
    fn parse_text_reply() {
        let response: ApiResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "晴天"}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(into_reply(response).unwrap(), CompletionReply::text("晴天"));
    }

    #[test]
    fn parse_function_call_reply() {
        let response: ApiResponse = serde_json::from_value(json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "function_call": {"name": "get_weather", "arguments": "{\"city_name\": \"深圳\"}"}
            }}]
        }))
        .unwrap();
        assert_eq!(
            into_reply(response).unwrap(),
            CompletionReply::call("get_weather", "{\"city_name\": \"深圳\"}")
        );
    }

    #[test]
    fn parse_tool_calls_reply() {
        let response: ApiResponse = serde_json::from_value(json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "get_weather", "arguments": "{}"}
                }]
            }}]
        }))
        .unwrap();
        let reply = into_reply(response).unwrap();
        assert_eq!(reply.content.as_deref(), Some(""));
        assert_eq!(reply.function_call.unwrap().name, "get_weather");
    }

    #[test]
    fn empty_choices_is_invalid() {
        let response: ApiResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(into_reply(response), Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn config_debug_hides_key() {
        let config = EndpointConfig::new("sk-secret").with_base_url("http://localhost:1/v1/");
        assert!(!format!("{config:?}").contains("sk-secret"));
        assert_eq!(config.completions_url(), "http://localhost:1/v1/chat/completions");
    }
}
