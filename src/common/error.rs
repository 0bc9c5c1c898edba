//! Error types for the btstress CLI
//!
//! Only bridge-availability errors abort a run; everything that happens per
//! action is absorbed into a `CommandOutcome` and tallied.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the btstress CLI
#[derive(Error, Debug)]
pub enum Error {
    // === Bridge Errors ===
    #[error("adb not found in PATH. Install Android platform-tools and make sure 'adb' is on PATH")]
    AdbNotFound,

    #[error("Device '{serial}' not found. Check 'btstress devices' and the USB connection")]
    BridgeUnavailable { serial: String },

    #[error("Device '{serial}' is unauthorized. Accept the USB debugging prompt on the phone")]
    DeviceUnauthorized { serial: String },

    #[error("Failed to spawn adb: {0}")]
    BridgeSpawn(#[source] io::Error),

    // === Command Errors ===
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Command '{command}' timed out after {secs} seconds")]
    CommandTimeout { command: String, secs: u64 },

    // === Run Errors ===
    #[error("Speaker unreachable: still disconnected after a reconnect attempt, aborting the run")]
    SpeakerUnreachable,

    #[error("Unknown action type '{0}'")]
    UnknownAction(String),

    // === Plan / Configuration Errors ===
    #[error("Invalid task plan: {0}")]
    PlanInvalid(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid tap point '{0}'. Expected 'X,Y', e.g. --tap 400,900")]
    TapPointParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a command failed error
    pub fn command_failed(command: &str, message: &str) -> Self {
        Self::CommandFailed {
            command: command.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a command timeout error
    pub fn command_timeout(command: &str, secs: u64) -> Self {
        Self::CommandTimeout {
            command: command.to_string(),
            secs,
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
