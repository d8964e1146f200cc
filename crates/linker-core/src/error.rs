//! Error types for the model linker.
//!
//! Matching, analysis and rewriting never fail; they report partial results
//! with warnings. These errors belong to the plumbing around them (directory
//! scans, the cache file, configuration) and stay distinguishable so callers
//! can decide whether a partial result is still usable.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the model linker.
#[derive(Debug, Error)]
pub enum LinkerError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Download failed for {url}: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("Download cancelled")]
    DownloadCancelled,

    #[error("Download not found: {0}")]
    DownloadNotFound(String),

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("File already exists: {0}")]
    AlreadyExists(PathBuf),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("YAML error: {message}")]
    Yaml { message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Request errors
    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Workflow format not recognized")]
    UnknownFormat,

    #[error("No directory found for category: {0}")]
    UnknownCategory(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for linker operations.
pub type Result<T> = std::result::Result<T, LinkerError>;

impl From<std::io::Error> for LinkerError {
    fn from(err: std::io::Error) -> Self {
        LinkerError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for LinkerError {
    fn from(err: reqwest::Error) -> Self {
        LinkerError::Network {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for LinkerError {
    fn from(err: serde_json::Error) -> Self {
        LinkerError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_yaml::Error> for LinkerError {
    fn from(err: serde_yaml::Error) -> Self {
        LinkerError::Yaml {
            message: err.to_string(),
        }
    }
}

impl LinkerError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        LinkerError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// - -32601: Method not found
    /// - -32602: Invalid params
    /// - -32603: Internal error
    /// - -32000: Network/connectivity error
    /// - -32001: Workflow format not recognized
    /// - -32002: Download not found
    /// - -32003: Download failed
    /// - -32004: Download cancelled
    /// - -32009: Destination already exists
    /// - -32010: Filesystem error (directory unreadable, cache unwritable)
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            LinkerError::MethodNotFound(_) => -32601,
            LinkerError::InvalidParams { .. } | LinkerError::UnknownCategory(_) => -32602,
            LinkerError::Network { .. } => -32000,
            LinkerError::UnknownFormat => -32001,
            LinkerError::DownloadNotFound(_) => -32002,
            LinkerError::DownloadFailed { .. } => -32003,
            LinkerError::DownloadCancelled => -32004,
            LinkerError::AlreadyExists(_) => -32009,
            LinkerError::Io { .. } | LinkerError::NotADirectory(_) => -32010,
            _ => -32603,
        }
    }

    /// True for failures caused by the filesystem rather than by the request.
    pub fn is_filesystem(&self) -> bool {
        matches!(self, LinkerError::Io { .. } | LinkerError::NotADirectory(_))
    }
}
