//! Error types for qxrule.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for qxrule operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (checksum ledger)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error (rule-provider payloads)
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Transport-level download failure
    #[error("download error: {0}")]
    Download(#[from] reqwest::Error),

    /// Remote answered with a non-success status
    #[error("HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// Invalid CIDR literal in an address-range rule
    #[error("invalid CIDR pattern: {0}")]
    InvalidCidrPattern(String),

    /// Section file syntax error
    #[error("configuration error: {0}")]
    Config(String),

    /// Section file does not exist
    #[error("rule section file not found: {0}")]
    MissingConfig(PathBuf),
}

/// Result type alias for qxrule operations.
pub type Result<T> = std::result::Result<T, Error>;
