//! # Scan Error Handling
//!
//! This module defines the ScanError enum, which represents the different error
//! types that can occur in the uvscan-rs crate.

use thiserror::Error;

/// Represents the different error types that can occur in the scan client.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Indicates an error while opening or using the device socket.
    #[error("Device connection error: {0}")]
    ConnectionError(String),

    /// Indicates a command was issued while the device socket was not open.
    #[error("Sensor disconnected")]
    NotConnected,

    /// Indicates an inbound device frame could not be parsed.
    #[error("Error parsing device frame: {0}")]
    FrameParseError(String),

    /// Indicates a sensor frame carried the wrong number of channels.
    #[error("Invalid channel count: expected {expected}, got {actual}")]
    InvalidChannelCount { expected: usize, actual: usize },

    /// Indicates an HTTP transport failure talking to the backend.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Indicates the backend answered with a non-success HTTP status.
    #[error("Server returned status {0}")]
    ServerStatus(u16),

    /// Indicates a configuration value could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Indicates the coordinator loop is no longer running.
    #[error("Coordinator stopped")]
    CoordinatorStopped,

    /// Wraps an I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ScanError::ServerStatus(status.as_u16()),
            None => ScanError::HttpError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::FrameParseError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ScanError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ScanError::ConnectionError(err.to_string())
    }
}
