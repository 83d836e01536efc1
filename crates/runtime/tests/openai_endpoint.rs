//! OpenAI-compatible backend against a mock HTTP endpoint.

use runtime::{
    CompletionBackend, CompletionRequest, ComparisonRunner, EndpointConfig, Error,
    FunctionCallMode, FunctionSchema, Message, OpenAiBackend, ToolChannel, ToolDescriptor,
};
use serde_json::{Map, Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const QUERY: &str = "深圳的天气怎么样";

/// Matches requests that offer no functions.
struct NoFunctions;

impl Match for NoFunctions {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .map(|body| body.get("functions").is_none() && body.get("function_call").is_none())
            .unwrap_or(false)
    }
}

fn backend(server: &MockServer) -> OpenAiBackend {
    OpenAiBackend::new(
        EndpointConfig::new("sk-test")
            .with_base_url(format!("{}/v1", server.uri()))
            .with_model("qwen-test"),
    )
}

fn completion(message: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": message, "finish_reason": "stop"}]
    }))
}

struct WeatherChannel;

impl ToolChannel for WeatherChannel {
    async fn list_tools(&self) -> runtime::Result<Vec<ToolDescriptor>> {
        Ok(vec![ToolDescriptor::new("get_weather")])
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> runtime::Result<Value> {
        assert_eq!(name, "get_weather");
        let city = arguments["city_name"].as_str().unwrap_or_default();
        Ok(json!({"content": [{"type": "text", "text": format!("{city}：晴")}]}))
    }
}

#[tokio::test]
async fn sends_functions_and_reads_function_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "qwen-test",
            "function_call": "auto"
        })))
        .respond_with(completion(json!({
            "role": "assistant",
            "content": null,
            "function_call": {"name": "get_weather", "arguments": "{\"city_name\":\"深圳\"}"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = [Message::user(QUERY)];
    let functions = [FunctionSchema {
        name: "get_weather".into(),
        description: String::new(),
        parameters: json!({"type": "object"}),
    }];
    let reply = backend(&server)
        .complete(CompletionRequest::new(&messages).with_functions(&functions, FunctionCallMode::Auto))
        .await
        .unwrap();

    assert!(reply.content.is_none());
    let call = reply.function_call.unwrap();
    assert_eq!(call.name, "get_weather");
    assert_eq!(call.arguments, "{\"city_name\":\"深圳\"}");
}

#[tokio::test]
async fn http_error_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let messages = [Message::user(QUERY)];
    let err = backend(&server)
        .complete(CompletionRequest::new(&messages))
        .await
        .unwrap_err();

    match err {
        Error::Api { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let messages = [Message::user(QUERY)];
    let err = backend(&server)
        .complete(CompletionRequest::new(&messages))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    // Reserve a free port, then release it so nothing is listening there.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let backend = OpenAiBackend::new(
        EndpointConfig::new("sk-test").with_base_url(format!("http://{addr}/v1")),
    );

    let messages = [Message::user(QUERY)];
    let err = backend
        .complete(CompletionRequest::new(&messages))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network(_)));
    assert!(err.is_endpoint());
}

#[tokio::test]
async fn full_comparison_against_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(NoFunctions)
        .respond_with(completion(json!({
            "role": "assistant",
            "content": "抱歉，我无法获取实时天气信息。"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"function_call": "auto"})))
        .respond_with(completion(json!({
            "role": "assistant",
            "content": "",
            "function_call": {"name": "get_weather", "arguments": "{\"city_name\": \"深圳\"}"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = ComparisonRunner::new()
        .run(QUERY, &WeatherChannel, &backend(&server))
        .await
        .unwrap();

    assert_eq!(result.with_mcp_tool.tool_called.as_deref(), Some("get_weather"));
    assert_eq!(
        result.with_mcp_tool.tool_result.unwrap()["content"][0]["text"],
        "深圳：晴"
    );
    assert!(!result.without_tool.model_reply.unwrap().is_empty());
}
