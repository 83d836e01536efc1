//! Configuration loading from mcp-compare.toml.

use mcp::ServerConfig;
use runtime::{ComparisonRunner, EndpointConfig, backend};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Config file looked up in the current directory.
pub const CONFIG_FILE: &str = "mcp-compare.toml";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["OPENAI_API_KEY", "DASHSCOPE_API_KEY"];

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Completion endpoint settings.
    #[serde(default)]
    pub endpoint: EndpointSection,

    /// Tool provider launch settings.
    #[serde(default)]
    pub provider: ProviderSection,

    /// Parameter schema offered for tools that declare none.
    #[serde(default)]
    pub fallback_schema: Option<Value>,
}

/// Completion endpoint configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointSection {
    /// API key. Falls back to the environment when unset.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for EndpointSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: backend::DEFAULT_BASE_URL.to_string(),
            model: backend::DEFAULT_MODEL.to_string(),
        }
    }
}

/// Tool provider configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSection {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            name: "weather".to_string(),
            command: "python".to_string(),
            args: vec!["./stdio_mcp.py".to_string()],
            env: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Load `path` if given, else [`CONFIG_FILE`] in the current directory
    /// when present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::discover_in(Path::new("."), path)
    }

    /// Like [`Config::discover`], looking for [`CONFIG_FILE`] in `dir`.
    pub fn discover_in(dir: &Path, path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let implicit = dir.join(CONFIG_FILE);
        if implicit.exists() {
            Self::load(implicit)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build the endpoint settings, reading the API key from the process
    /// environment when the file has none.
    pub fn endpoint(&self) -> Result<EndpointConfig, ConfigError> {
        self.endpoint_with_env(|var| std::env::var(var).ok())
    }

    /// Build the endpoint settings with a custom environment lookup.
    pub fn endpoint_with_env(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<EndpointConfig, ConfigError> {
        let api_key = self
            .endpoint
            .api_key
            .clone()
            .or_else(|| API_KEY_VARS.into_iter().find_map(&lookup))
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(EndpointConfig::new(api_key)
            .with_base_url(&self.endpoint.base_url)
            .with_model(&self.endpoint.model))
    }

    /// Launch settings for the tool provider.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            name: self.provider.name.clone(),
            command: self.provider.command.clone(),
            args: self.provider.args.clone(),
            env: self.provider.env.clone(),
        }
    }

    /// Comparison runner honoring the configured fallback schema.
    pub fn runner(&self) -> ComparisonRunner {
        match &self.fallback_schema {
            Some(schema) => ComparisonRunner::new().with_fallback_schema(schema.clone()),
            None => ComparisonRunner::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("API key not configured: set endpoint.api_key or OPENAI_API_KEY / DASHSCOPE_API_KEY")]
    MissingApiKey,
}
