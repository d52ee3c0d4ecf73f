//! Client error types.

use thiserror::Error;

/// Errors raised while talking to the controller.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The controller did not report a ready state during connect.
    #[error("unknown controller: {0}")]
    UnknownController(String),

    /// Tool count or current tool could not be determined.
    #[error("failed tool detection: {0}")]
    ToolDetection(String),

    /// A tool's offsets could not be read.
    #[error("failed offset capture: {0}")]
    OffsetCapture(String),

    /// Machine status could not be read.
    #[error("status query failed: {0}")]
    Status(String),

    /// Current coordinates could not be read.
    #[error("coordinate query failed: {0}")]
    Coordinates(String),

    /// A set-offset request was rejected before reaching the controller.
    #[error("set offset rejected: {0}")]
    SetOffset(String),

    /// A tool change did not finish within the tool-change timeout.
    #[error("tool change timed out: {0}")]
    ToolTimeout(String),

    /// Motion was requested while one or more axes are not homed.
    #[error("homing required: {0}")]
    Homing(String),

    /// A move was rejected before reaching the controller.
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// A move did not finish within the move timeout.
    #[error("move timed out: {0}")]
    MoveTimeout(String),

    /// The controller did not acknowledge a g-code command.
    #[error("g-code failed: {0}")]
    GCode(String),

    /// The controller answered with an `error` payload.
    #[error("controller error: {0}")]
    Controller(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The client configuration is unusable.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the caller can carry on after this error.
    ///
    /// Tool-change timeouts, rejected offset updates and missing homing leave
    /// the machine usable; every other kind should stop the application.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ToolTimeout(_) | Error::SetOffset(_) | Error::Homing(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::InvalidResponse(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
