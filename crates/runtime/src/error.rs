use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("tool channel connection failed: {0}")]
    Connection(String),

    #[error("tool `{tool}` has an unusable parameter schema: {reason}")]
    SchemaMismatch { tool: String, reason: String },

    #[error("malformed arguments for function `{function}`: {source}")]
    ArgumentParse {
        function: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("tool invocation failed: {0}")]
    ToolInvocation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Whether the failure came from the completion endpoint.
    pub fn is_endpoint(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Api { .. } | Self::InvalidResponse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
