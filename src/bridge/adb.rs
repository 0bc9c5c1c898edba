//! Real adb bridge
//!
//! Spawns `adb -s <serial> shell <command>` per call. Output is decoded
//! lossily; some vendor ROMs emit non-UTF-8 bytes in dumpsys output.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use super::{parse_device_list, Bridge, BridgeOutput, DeviceEntry};
use crate::common::{Error, Result};

/// Bridge backed by the `adb` binary on PATH
pub struct AdbBridge {
    adb: PathBuf,
}

impl AdbBridge {
    /// Locate adb on PATH
    pub fn new() -> Result<Self> {
        let adb = which::which("adb").map_err(|_| Error::AdbNotFound)?;
        Ok(Self { adb })
    }

    /// Use an explicit adb binary (for non-standard installs)
    pub fn with_binary(adb: PathBuf) -> Self {
        Self { adb }
    }

    async fn run(&self, args: &[&str], limit: Duration) -> Result<BridgeOutput> {
        let mut cmd = Command::new(&self.adb);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(Error::BridgeSpawn)?;

        let output = timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| Error::command_timeout(&args.join(" "), limit.as_secs()))?
            .map_err(Error::BridgeSpawn)?;

        Ok(BridgeOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl Bridge for AdbBridge {
    async fn shell(&self, serial: &str, command: &str, limit: Duration) -> Result<BridgeOutput> {
        self.run(&["-s", serial, "shell", command], limit).await
    }

    async fn devices(&self) -> Result<Vec<DeviceEntry>> {
        let output = self.run(&["devices", "-l"], Duration::from_secs(10)).await?;
        if !output.success() {
            return Err(Error::command_failed("adb devices -l", output.stderr.trim()));
        }
        Ok(parse_device_list(&output.stdout))
    }
}
