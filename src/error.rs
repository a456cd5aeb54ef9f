// Keyforge - Top-level error types
//
// Aggregates the module errors into a single enum for the application
// boundary (CLI commands and the serve loop).

use thiserror::Error;

/// Top-level error type for all Keyforge operations.
#[derive(Debug, Error)]
pub enum KeyforgeError {
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Tool error: {0}")]
    Tool(#[from] crate::toolchain::ToolError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] crate::gateway::GatewayError),

    #[error("{0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, KeyforgeError>;
