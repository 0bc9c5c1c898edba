//! Scripted bridge for tests
//!
//! `MockBridge` models the phone as a tiny state machine: dumpsys reports
//! the current link state, and a settings-screen tap flips it (unless the
//! tap is configured to do nothing, which simulates a mis-calibrated
//! coordinate or a dead speaker). Every command issued is recorded so tests
//! can assert exact call traces.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::bridge::{Bridge, BridgeOutput, DeviceEntry, DeviceState};
use crate::common::{Error, Result};
use crate::device::probe::DUMP_COMMAND;

const CONNECTED_DUMP: &str = "\
AdapterProperties
  Name: Galaxy A52
  ConnectionState: STATE_CONNECTED
  Bonded devices:
    AA:BB:CC:DD:EE:FF [BR/EDR] JBL Flip 5
  ScanMode: SCAN_MODE_CONNECTABLE
";

const DISCONNECTED_DUMP: &str = "\
AdapterProperties
  Name: Galaxy A52
  ConnectionState: STATE_DISCONNECTED
  Bonded devices:
    AA:BB:CC:DD:EE:FF [BR/EDR] JBL Flip 5
  ScanMode: SCAN_MODE_NONE
";

const AMBIGUOUS_DUMP: &str = "\
AdapterProperties
  Name: Galaxy A52
  ScanMode: SCAN_MODE_NONE
";

struct Inner {
    connected: bool,
    tap_toggles: bool,
    ambiguous_dump: bool,
    serial: Option<String>,
    device_state: DeviceState,
    fail_matching: Option<String>,
    exit_nonzero: Option<(String, String)>,
    drop_after_keyevents: Option<usize>,
    keyevents_seen: usize,
    commands: Vec<(String, String)>,
}

/// Bridge with scripted device behavior
pub struct MockBridge {
    inner: Mutex<Inner>,
}

impl MockBridge {
    fn new(serial: &str, connected: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                connected,
                tap_toggles: true,
                ambiguous_dump: false,
                serial: Some(serial.to_string()),
                device_state: DeviceState::Device,
                fail_matching: None,
                exit_nonzero: None,
                drop_after_keyevents: None,
                keyevents_seen: 0,
                commands: Vec::new(),
            }),
        }
    }

    /// Device present, speaker connected, tap toggles the link
    pub fn connected(serial: &str) -> Self {
        Self::new(serial, true)
    }

    /// Device present, speaker disconnected, tap toggles the link
    pub fn disconnected(serial: &str) -> Self {
        Self::new(serial, false)
    }

    /// Make the settings tap a no-op (the link state never changes)
    pub fn set_tap_toggles(&self, toggles: bool) {
        self.inner.lock().unwrap().tap_toggles = toggles;
    }

    /// Serve dumps without the `ConnectionState:` marker
    pub fn set_ambiguous_dump(&self, ambiguous: bool) {
        self.inner.lock().unwrap().ambiguous_dump = ambiguous;
    }

    /// Time out every command containing `needle`
    pub fn fail_matching(&self, needle: &str) {
        self.inner.lock().unwrap().fail_matching = Some(needle.to_string());
    }

    /// Exit non-zero with `stderr` for commands containing `needle`
    pub fn exit_nonzero_matching(&self, needle: &str, stderr: &str) {
        self.inner.lock().unwrap().exit_nonzero =
            Some((needle.to_string(), stderr.to_string()));
    }

    /// Drop the link once the nth keyevent has been delivered, simulating
    /// a transient disconnect mid-run
    pub fn drop_link_after_keyevents(&self, n: usize) {
        self.inner.lock().unwrap().drop_after_keyevents = Some(n);
    }

    /// Remove the device from the bridge's device list
    pub fn remove_device(&self) {
        self.inner.lock().unwrap().serial = None;
    }

    /// Report the device session in the given state
    pub fn set_device_state(&self, state: DeviceState) {
        self.inner.lock().unwrap().device_state = state;
    }

    /// Current simulated link state
    pub fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    /// Every `(serial, command)` issued so far
    pub fn commands(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().commands.clone()
    }

    /// Number of issued commands containing `needle`
    pub fn count_containing(&self, needle: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .commands
            .iter()
            .filter(|(_, c)| c.contains(needle))
            .count()
    }
}

fn ok_output(stdout: &str) -> BridgeOutput {
    BridgeOutput {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

#[async_trait]
impl Bridge for MockBridge {
    async fn shell(&self, serial: &str, command: &str, timeout: Duration) -> Result<BridgeOutput> {
        let mut inner = self.inner.lock().unwrap();
        inner.commands.push((serial.to_string(), command.to_string()));

        if let Some(needle) = &inner.fail_matching {
            if command.contains(needle.as_str()) {
                return Err(Error::command_timeout(command, timeout.as_secs()));
            }
        }
        if let Some((needle, stderr)) = &inner.exit_nonzero {
            if command.contains(needle.as_str()) {
                return Ok(BridgeOutput {
                    exit_code: Some(1),
                    stdout: String::new(),
                    stderr: stderr.clone(),
                });
            }
        }

        if command.starts_with(DUMP_COMMAND) {
            let dump = if inner.ambiguous_dump {
                AMBIGUOUS_DUMP
            } else if inner.connected {
                CONNECTED_DUMP
            } else {
                DISCONNECTED_DUMP
            };
            return Ok(ok_output(dump));
        }

        if command.starts_with("input tap") {
            if inner.tap_toggles {
                inner.connected = !inner.connected;
            }
            return Ok(ok_output(""));
        }

        if command.starts_with("input keyevent") {
            inner.keyevents_seen += 1;
            if inner.drop_after_keyevents == Some(inner.keyevents_seen) {
                inner.connected = false;
            }
            return Ok(ok_output(""));
        }

        // The settings intent has no observable output.
        Ok(ok_output(""))
    }

    async fn devices(&self) -> Result<Vec<DeviceEntry>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .serial
            .iter()
            .map(|serial| DeviceEntry {
                serial: serial.clone(),
                state: inner.device_state.clone(),
                description: "usb:1-1 model:SM_A525F".to_string(),
            })
            .collect())
    }
}
