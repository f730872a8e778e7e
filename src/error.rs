use std::io;
use thiserror::Error;

/// Custom error type for the dashboard
#[derive(Error, Debug)]
pub enum MdashError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("TUI error: {0}")]
    Tui(String),
}

/// Result type alias for the dashboard
pub type Result<T> = std::result::Result<T, MdashError>;

impl MdashError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        MdashError::Config(msg.into())
    }

    /// Create a channel error
    pub fn channel<S: Into<String>>(msg: S) -> Self {
        MdashError::Channel(msg.into())
    }

    /// Create a command error
    pub fn command<S: Into<String>>(msg: S) -> Self {
        MdashError::Command(msg.into())
    }

    pub fn feed<S: Into<String>>(msg: S) -> Self {
        MdashError::Feed(msg.into())
    }

    pub fn tui<S: Into<String>>(msg: S) -> Self {
        MdashError::Tui(msg.into())
    }
}
