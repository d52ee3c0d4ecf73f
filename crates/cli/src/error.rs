//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An explicitly requested config file does not exist.
    #[error("config file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration is invalid or unreadable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested tool was not discovered on the controller.
    #[error("no tool {index}; controller reports {count} tools")]
    UnknownTool { index: usize, count: usize },

    /// An error occurred talking to the controller.
    #[error(transparent)]
    Printer(#[from] moonraker::Error),

    /// Output could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code: 2 when the machine is still usable, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Printer(e) if e.is_recoverable() => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
