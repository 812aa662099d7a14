//! Error types for the tracker_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tracker_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required input was missing or empty
    #[error("{0}")]
    Validation(String),

    /// No user exists for the requested id
    #[error("{0}")]
    NotFound(String),

    /// Appending an exercise failed; carries the underlying cause
    #[error("add exercise error: {0}")]
    Update(#[source] Box<Error>),

    /// Storage collaborator failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap any error as the cause of a failed exercise append
    pub fn update(cause: Error) -> Self {
        Error::Update(Box::new(cause))
    }
}
