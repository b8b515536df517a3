//! Application error types

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Recoverable Errors (notify user, continue) =====
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Server returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Failed to delete {path}: {reason}")]
    DeleteFailed { path: String, reason: String },

    #[error("A deletion is already in progress")]
    DeleteInProgress,

    #[error("No media item is selected")]
    NothingToDelete,

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Fatal Errors (startup only) =====
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Init(String),
}

impl AppError {
    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Transport(msg) => format!("Could not reach the server: {}", msg),
            AppError::Status { status, .. } => format!("The server refused the request (HTTP {})", status),
            AppError::Decode(_) => "The server sent an unexpected response".to_string(),
            AppError::DeleteFailed { path, reason } => {
                let name = path.rsplit('/').next().unwrap_or(path);
                format!("Failed to delete \"{}\": {}", name, reason)
            }
            _ => self.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Decode(e.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}
