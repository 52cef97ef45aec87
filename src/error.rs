//! Error types for Corvus

use thiserror::Error;

/// Main error type for Corvus operations
#[derive(Debug, Error)]
pub enum CorvusError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Catalog error in '{0}': {1}")]
    CatalogError(String, String),

    #[error("Transport failure: {0}")]
    TransportError(String),
}

/// Result type alias for Corvus operations
pub type Result<T> = std::result::Result<T, CorvusError>;
