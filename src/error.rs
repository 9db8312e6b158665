//! Error handling for the mini miner
//!
//! A single error type covers configuration, the two HTTP collaborators, the
//! block encoder and the nonce search. Every variant is fatal for the process;
//! the binary maps each one to a distinct exit code.

use thiserror::Error;

/// Result type alias for mini miner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the mini miner
#[derive(Error, Debug)]
pub enum Error {
    /// Missing credential, invalid flag or unusable config file
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// HTTP request failed or timed out
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport-level failure that is not a `reqwest` error (bad status, bad URL)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Response body does not have the expected shape
    #[error("Decoding error: {message}")]
    Decoding { message: String },

    /// Block could not be serialized for hashing
    #[error("Encoding error: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The configured search bound was hit before a solution was found
    #[error("Search exhausted after {attempts} attempts: {reason}")]
    SearchExhausted { attempts: u64, reason: String },

    /// JSON config file parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML config file parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking search task panicked or was cancelled
    #[error("Search task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a decoding error
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    /// Create an encoding error
    pub fn encoding(err: serde_json::Error) -> Self {
        Self::Encoding(err)
    }

    /// Create a search exhausted error
    pub fn search_exhausted(attempts: u64, reason: impl Into<String>) -> Self {
        Self::SearchExhausted {
            attempts,
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Config { .. } | Error::Json(_) | Error::Yaml(_) | Error::Io(_) => "config",
            Error::Http(_) | Error::Transport { .. } => "transport",
            Error::Decoding { .. } => "decoding",
            Error::Encoding(_) => "encoding",
            Error::SearchExhausted { .. } => "search_exhausted",
            Error::Task(_) => "task",
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self.category() {
            "config" => 2,
            "transport" => 3,
            "decoding" => 4,
            "encoding" => 5,
            "search_exhausted" => 6,
            _ => 1,
        }
    }
}
