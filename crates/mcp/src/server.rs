//! Tool provider connection (spawn, handshake, request/response, lifecycle).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcMessage,
    JsonRpcNotification, JsonRpcRequest, ListToolsResult, RequestId, Tool,
};

/// Default timeout for a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum size of one incoming line (1MB). Longer lines are rejected before
/// they are fully buffered.
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

type Reader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// How to launch a tool provider.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

/// Handle to a connected tool provider.
///
/// The child process (if any) is killed on [`Server::shutdown`] or when the
/// handle is dropped.
pub struct Server {
    name: String,
    process: Option<Mutex<Child>>,
    stdin: Mutex<Writer>,
    stdout: Mutex<Reader>,
    next_id: AtomicI64,
    request_timeout: Duration,
    server_info: Mutex<Option<InitializeResult>>,
}

impl Server {
    /// Spawn a tool provider process and connect to its stdio.
    pub async fn spawn(config: ServerConfig) -> Result<Self> {
        info!(
            server = %config.name,
            command = %config.command,
            args = ?config.args,
            "spawning tool provider"
        );

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut process = cmd.spawn().map_err(|source| Error::Spawn {
            command: config.command.clone(),
            source,
        })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| Error::Io(std::io::Error::other("failed to capture stdin")))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| Error::Io(std::io::Error::other("failed to capture stdout")))?;

        let mut server = Self::from_streams(config.name, stdout, stdin);
        server.process = Some(Mutex::new(process));
        Ok(server)
    }

    /// Connect over an already-open pair of streams.
    pub fn from_streams<R, W>(name: impl Into<String>, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        let writer: Writer = Box::new(writer);
        Self {
            name: name.into(),
            process: None,
            stdin: Mutex::new(writer),
            stdout: Mutex::new(BufReader::new(reader)),
            next_id: AtomicI64::new(1),
            request_timeout: DEFAULT_TIMEOUT,
            server_info: Mutex::new(None),
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Perform the handshake (must be called before other operations).
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let result: InitializeResult = self
            .request("initialize", Some(InitializeParams::default()))
            .await?;

        self.notify(JsonRpcNotification::new("notifications/initialized"))
            .await?;

        info!(
            server = %self.name,
            provider = %result.server_info.name,
            protocol = %result.protocol_version,
            "tool provider initialized"
        );

        *self.server_info.lock().await = Some(result.clone());
        Ok(result)
    }

    /// Check if the handshake has completed.
    pub async fn is_initialized(&self) -> bool {
        self.server_info.lock().await.is_some()
    }

    /// List the tools the provider exposes, in provider order.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.ensure_initialized().await?;
        let result: ListToolsResult = self.request("tools/list", None::<()>).await?;
        debug!(server = %self.name, count = result.tools.len(), "listed tools");
        Ok(result.tools)
    }

    /// Call a tool by name.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult> {
        self.ensure_initialized().await?;

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };

        let result: CallToolResult = self.request("tools/call", Some(params)).await?;

        if result.is_error {
            return Err(Error::ToolCallFailed(result.text()));
        }

        Ok(result)
    }

    /// Terminate the provider process.
    pub async fn shutdown(self) -> Result<()> {
        if let Some(process) = self.process {
            let mut process = process.into_inner();
            // The process may already be gone.
            let _ = process.kill().await;
        }
        info!(server = %self.name, "tool provider shut down");
        Ok(())
    }

    // --- Internal methods ---

    async fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized().await {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn request<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_request_id();
        let mut request = JsonRpcRequest::new(id.clone(), method);
        if let Some(p) = params {
            request = request.with_params(p)?;
        }

        self.write_line(&serde_json::to_string(&request)?).await?;

        let response = timeout(self.request_timeout, self.read_response())
            .await
            .map_err(|_| Error::Timeout {
                method: method.to_string(),
            })??;

        // A null id is only accepted on error responses; see `is_response`.
        if response.id.is_some() && response.id.as_ref() != Some(&id) {
            return Err(Error::InvalidResponse(format!(
                "response ID mismatch: expected {id:?}, got {:?}",
                response.id
            )));
        }

        let result_value = response.into_result()?;
        let result: R = serde_json::from_value(result_value)?;

        Ok(result)
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<()> {
        self.write_line(&serde_json::to_string(&notification)?).await
    }

    async fn write_line(&self, line: &str) -> Result<()> {
        debug!(server = %self.name, "-> {line}");
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn read_response(&self) -> Result<JsonRpcMessage> {
        let mut stdout = self.stdout.lock().await;

        loop {
            let mut line = Vec::new();
            let limit = MAX_OUTPUT_SIZE as u64 + 1;
            let bytes_read = (&mut *stdout).take(limit).read_until(b'\n', &mut line).await?;
            if bytes_read == 0 {
                return Err(Error::ServerExited);
            }

            if line.len() > MAX_OUTPUT_SIZE {
                return Err(Error::OutputTooLarge {
                    size: line.len(),
                    max: MAX_OUTPUT_SIZE,
                });
            }

            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            debug!(server = %self.name, "<- {}", String::from_utf8_lossy(line));

            let message: JsonRpcMessage = serde_json::from_slice(line)?;
            if message.is_response() {
                return Ok(message);
            }

            match (message.id, message.method) {
                (Some(id), Some(method)) => self.answer_server_request(id, &method).await?,
                (None, Some(method)) => {
                    debug!(server = %self.name, %method, "skipping notification")
                }
                _ => warn!(server = %self.name, "skipping message without id or method"),
            }
        }
    }

    /// Answer a request the provider sent us: `ping` gets an empty result,
    /// anything else "method not found".
    async fn answer_server_request(&self, id: RequestId, method: &str) -> Result<()> {
        let reply = if method == "ping" {
            debug!(server = %self.name, "answering ping");
            json!({"jsonrpc": "2.0", "id": id, "result": {}})
        } else {
            warn!(server = %self.name, %method, "rejecting server-initiated request");
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32601, "message": format!("Method not found: {method}")}
            })
        };
        self.write_line(&reply.to_string()).await
    }
}
