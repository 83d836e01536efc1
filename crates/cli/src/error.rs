//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The comparison run failed.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// The result could not be encoded as JSON.
    #[error("failed to encode result: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the report failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
