//! Error types for the directory monitor.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur in the directory monitor.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// A callback is already registered for this path.
    #[error("callback already registered for: {}", .0.display())]
    DuplicateRegistration(PathBuf),

    /// A registration name is absolute or leaves the base directory.
    #[error("name must be relative to the watched directory: {}", .0.display())]
    InvalidName(PathBuf),

    /// A callback panicked while handling a change.
    #[error("callback for {} panicked: {message}", path.display())]
    CallbackPanicked { path: PathBuf, message: String },

    /// The backend could not create a watch handle.
    #[error("failed to create watch: {0}")]
    WatchCreate(#[source] notify::Error),

    /// The watch handle could not observe the base directory.
    #[error("failed to watch {}: {source}", path.display())]
    WatchDirectory {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Error reported by the backend while watching.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
