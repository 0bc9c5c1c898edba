//! Device-bridge abstraction
//!
//! The execution core only needs "run a shell command against a named device
//! session and give me exit code + output". The trait keeps the core
//! testable against a scripted bridge; `AdbBridge` is the real thing.

pub mod adb;

pub use adb::AdbBridge;

use async_trait::async_trait;
use std::time::Duration;

use crate::common::{Error, Result};

/// Raw output of a bridge command
#[derive(Debug, Clone)]
pub struct BridgeOutput {
    /// Process exit code; None when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl BridgeOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// State of a device session as reported by the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    Device,
    Unauthorized,
    Offline,
    Other(String),
}

impl DeviceState {
    fn parse(token: &str) -> Self {
        match token {
            "device" => Self::Device,
            "unauthorized" => Self::Unauthorized,
            "offline" => Self::Offline,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device => write!(f, "device"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Offline => write!(f, "offline"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One row of the bridge's device list
#[derive(Debug, Clone)]
pub struct DeviceEntry {
    pub serial: String,
    pub state: DeviceState,
    /// Trailing descriptor fields (model, transport id, ...)
    pub description: String,
}

/// Synchronous shell-execution primitive against a device session
///
/// No two commands are issued concurrently against the same device; the
/// session and the physical screen are exclusive resources.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Run a device-side shell command, enforcing `timeout`
    async fn shell(&self, serial: &str, command: &str, timeout: Duration) -> Result<BridgeOutput>;

    /// List device sessions known to the bridge
    async fn devices(&self) -> Result<Vec<DeviceEntry>>;
}

/// Verify that `serial` is present and authorized, erroring otherwise
pub async fn check_device(bridge: &dyn Bridge, serial: &str) -> Result<()> {
    let entries = bridge.devices().await?;
    match entries.iter().find(|e| e.serial == serial) {
        Some(entry) if entry.state == DeviceState::Device => Ok(()),
        Some(entry) if entry.state == DeviceState::Unauthorized => Err(Error::DeviceUnauthorized {
            serial: serial.to_string(),
        }),
        _ => Err(Error::BridgeUnavailable {
            serial: serial.to_string(),
        }),
    }
}

/// Parse `adb devices -l` output into device entries
///
/// The first line is the `List of devices attached` banner; each following
/// non-empty line is `<serial> <state> <descriptors...>`.
pub fn parse_device_list(output: &str) -> Vec<DeviceEntry> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let state = parts.next()?;
            Some(DeviceEntry {
                serial: serial.to_string(),
                state: DeviceState::parse(state),
                description: parts.collect::<Vec<_>>().join(" "),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE_LIST: &str = "List of devices attached\n\
        b67c9d18               device usb:1-1 product:a52q model:SM_A525F transport_id:3\n\
        emulator-5554          offline transport_id:1\n\
        R5CW505P3RK            unauthorized usb:1-2\n";

    #[test]
    fn parses_device_list_rows() {
        let entries = parse_device_list(DEVICE_LIST);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].serial, "b67c9d18");
        assert_eq!(entries[0].state, DeviceState::Device);
        assert!(entries[0].description.contains("model:SM_A525F"));
        assert_eq!(entries[1].state, DeviceState::Offline);
        assert_eq!(entries[2].state, DeviceState::Unauthorized);
    }

    #[test]
    fn empty_list_is_empty() {
        assert!(parse_device_list("List of devices attached\n").is_empty());
        assert!(parse_device_list("").is_empty());
    }
}
