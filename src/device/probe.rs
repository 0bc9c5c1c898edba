//! Connectivity prober
//!
//! The phone exposes no push notifications for Bluetooth state, so state is
//! polled by screen-scraping `dumpsys bluetooth_manager` output. Parsing is
//! plain string search against the fixed markers the dump emits.

use crate::device::runner::CommandRunner;

/// Diagnostic dump holding the connection-state marker
pub const DUMP_COMMAND: &str = "dumpsys bluetooth_manager";

const STATE_MARKER: &str = "ConnectionState:";
const CONNECTED_TOKEN: &str = "STATE_CONNECTED";
const BONDED_MARKER: &str = "Bonded devices:";
const BONDED_END_MARKER: &str = "ScanMode";

/// Speaker link state as derived from the dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
    /// Marker absent or the dump command failed; treated as disconnected
    /// at every decision point
    Unknown,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A bonded Bluetooth device from the dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedDevice {
    pub name: String,
    pub address: String,
}

/// Polls speaker connectivity through the diagnostic dump
#[derive(Clone)]
pub struct Prober {
    runner: CommandRunner,
}

impl Prober {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Probe the current connection state
    ///
    /// Idempotent: no device state is mutated beyond issuing the dump.
    pub async fn state(&self, serial: &str) -> ConnectionState {
        let outcome = self.runner.run(serial, DUMP_COMMAND).await;
        if !outcome.ok {
            return ConnectionState::Unknown;
        }
        parse_connection_state(&outcome.output)
    }

    pub async fn is_connected(&self, serial: &str) -> bool {
        self.state(serial).await.is_connected()
    }

    /// List devices paired with the phone
    ///
    /// Empty on any failure; the runner has already logged the diagnostic.
    pub async fn paired_devices(&self, serial: &str) -> Vec<PairedDevice> {
        let outcome = self.runner.run(serial, DUMP_COMMAND).await;
        if !outcome.ok {
            return Vec::new();
        }
        parse_paired_devices(&outcome.output)
    }
}

/// Extract the connection state from dump text
pub fn parse_connection_state(dump: &str) -> ConnectionState {
    let Some(pos) = dump.find(STATE_MARKER) else {
        return ConnectionState::Unknown;
    };
    let rest = &dump[pos + STATE_MARKER.len()..];
    let token = rest.lines().next().unwrap_or("").trim();
    if token.is_empty() {
        ConnectionState::Unknown
    } else if token == CONNECTED_TOKEN {
        ConnectionState::Connected
    } else {
        ConnectionState::Disconnected
    }
}

/// Extract bonded devices from the `Bonded devices:` section of the dump
///
/// Each entry looks like `AA:BB:CC:DD:EE:FF [BR/EDR] JBL Flip 5`. The
/// transport tag between address and name varies by Android version and is
/// skipped when present.
pub fn parse_paired_devices(dump: &str) -> Vec<PairedDevice> {
    let Some(start) = dump.find(BONDED_MARKER) else {
        return Vec::new();
    };
    let section = &dump[start + BONDED_MARKER.len()..];
    let section = match section.find(BONDED_END_MARKER) {
        Some(end) => &section[..end],
        None => section,
    };

    section
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let address = line.get(..17)?;
            if !is_mac_address(address) {
                return None;
            }
            let rest = &line[17..];
            let mut name = rest.trim();
            if name.starts_with('[') {
                name = name.split_once(']').map(|(_, n)| n.trim()).unwrap_or("");
            }
            Some(PairedDevice {
                name: name.to_string(),
                address: address.to_string(),
            })
        })
        .collect()
}

fn is_mac_address(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 17 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, &b)| {
        if i % 3 == 2 {
            b == b':'
        } else {
            b.is_ascii_hexdigit()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONNECTED_DUMP: &str = "\
Bluetooth Status
  enabled: true
  state: ON

AdapterProperties
  Name: Galaxy A52
  Address: 22:22:05:1A:2B:3C
  ConnectionState: STATE_CONNECTED
  Bonded devices:
    AA:BB:CC:DD:EE:FF [BR/EDR] JBL Flip 5
    11:22:33:44:55:66 [BR/EDR] Soundcore Motion+
  ScanMode: SCAN_MODE_CONNECTABLE
";

    const DISCONNECTED_DUMP: &str = "\
AdapterProperties
  ConnectionState: STATE_DISCONNECTED
  Bonded devices:
    AA:BB:CC:DD:EE:FF [BR/EDR] JBL Flip 5
  ScanMode: SCAN_MODE_NONE
";

    #[test]
    fn parses_connected_state() {
        assert_eq!(
            parse_connection_state(CONNECTED_DUMP),
            ConnectionState::Connected
        );
    }

    #[test]
    fn parses_disconnected_state() {
        assert_eq!(
            parse_connection_state(DISCONNECTED_DUMP),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn missing_marker_is_unknown() {
        assert_eq!(
            parse_connection_state("Bluetooth Status\n  state: ON\n"),
            ConnectionState::Unknown
        );
        assert_eq!(parse_connection_state(""), ConnectionState::Unknown);
    }

    #[test]
    fn empty_token_is_unknown() {
        assert_eq!(
            parse_connection_state("ConnectionState:\nBonded devices:\n"),
            ConnectionState::Unknown
        );
    }

    #[test]
    fn parses_bonded_devices() {
        let devices = parse_paired_devices(CONNECTED_DUMP);
        assert_eq!(
            devices,
            vec![
                PairedDevice {
                    name: "JBL Flip 5".into(),
                    address: "AA:BB:CC:DD:EE:FF".into()
                },
                PairedDevice {
                    name: "Soundcore Motion+".into(),
                    address: "11:22:33:44:55:66".into()
                },
            ]
        );
    }

    #[test]
    fn bonded_section_missing_is_empty() {
        assert!(parse_paired_devices("ConnectionState: STATE_CONNECTED\n").is_empty());
    }

    #[test]
    fn skips_non_device_lines_in_bonded_section() {
        let dump = "Bonded devices:\n  (none)\n  not a mac at all\nScanMode: NONE\n";
        assert!(parse_paired_devices(dump).is_empty());
    }

    #[test]
    fn mac_address_shapes() {
        assert!(is_mac_address("AA:BB:CC:DD:EE:FF"));
        assert!(is_mac_address("0f:1e:2d:3c:4b:5a"));
        assert!(!is_mac_address("AA:BB:CC:DD:EE"));
        assert!(!is_mac_address("AA-BB-CC-DD-EE-FF"));
        assert!(!is_mac_address("ZZ:BB:CC:DD:EE:FF"));
    }
}
