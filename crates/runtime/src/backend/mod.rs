//! Completion endpoint abstraction.
//!
//! [`CompletionBackend`] is the seam between the comparison run and the
//! hosted chat-completion API; [`OpenAiBackend`] speaks the OpenAI-compatible
//! protocol with legacy function calling.

mod openai;

pub use openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, EndpointConfig, OpenAiBackend};

use crate::Result;
use crate::schema::FunctionSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Role of a message participant. Runs only ever send the user query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// How the model may use the offered functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionCallMode {
    /// Model decides whether to call a function.
    #[default]
    Auto,
}

/// Request to send to a completion backend.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    /// Functions offered to the model. Empty means none are offered.
    pub functions: &'a [FunctionSchema],
    /// Only sent when functions are offered.
    pub function_call: FunctionCallMode,
}

impl<'a> CompletionRequest<'a> {
    /// A plain request without functions.
    pub fn new(messages: &'a [Message]) -> Self {
        Self {
            messages,
            functions: &[],
            function_call: FunctionCallMode::Auto,
        }
    }

    /// Offer functions to the model.
    pub fn with_functions(mut self, functions: &'a [FunctionSchema], mode: FunctionCallMode) -> Self {
        self.functions = functions;
        self.function_call = mode;
        self
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, exactly as the model produced them.
    pub arguments: String,
}

/// The model's reply to a completion request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionReply {
    pub content: Option<String>,
    pub function_call: Option<FunctionCall>,
}

impl CompletionReply {
    /// A text-only reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            function_call: None,
        }
    }

    /// A reply requesting a function call.
    pub fn call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            content: None,
            function_call: Some(FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            }),
        }
    }
}

/// Trait for completion backends.
pub trait CompletionBackend: Send + Sync {
    /// Send a completion request and get the first choice's message.
    fn complete(
        &self,
        request: CompletionRequest<'_>,
    ) -> impl Future<Output = Result<CompletionReply>> + Send;
}
