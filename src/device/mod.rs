//! Device-side operations
//!
//! Everything here speaks to the phone through the bridge: running single
//! commands, probing connectivity, toggling the speaker link, and sending
//! media keyevents.

pub mod media;
pub mod probe;
pub mod reconnect;
pub mod runner;

pub use media::{ActionKind, Dispatcher};
pub use probe::{ConnectionState, PairedDevice, Prober};
pub use reconnect::ReconnectController;
pub use runner::{CommandOutcome, CommandRunner};

use serde::Deserialize;

use crate::common::{Error, Result};

/// Screen coordinate calibrated to hit the connect/disconnect control in
/// the Bluetooth settings screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TapPoint {
    pub x: u32,
    pub y: u32,
}

impl std::fmt::Display for TapPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl TapPoint {
    /// Parse an `X,Y` pair as given on the command line
    pub fn parse(s: &str) -> Result<Self> {
        let err = || Error::TapPointParse(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(err)?;
        Ok(Self {
            x: x.trim().parse().map_err(|_| err())?,
            y: y.trim().parse().map_err(|_| err())?,
        })
    }
}

/// Identifies the bridge session and the toggle coordinate for one run
#[derive(Debug, Clone)]
pub struct DeviceTarget {
    pub serial: String,
    pub tap: TapPoint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tap_point() {
        assert_eq!(TapPoint::parse("400,900").unwrap(), TapPoint { x: 400, y: 900 });
        assert_eq!(TapPoint::parse(" 12 , 34 ").unwrap(), TapPoint { x: 12, y: 34 });
    }

    #[test]
    fn rejects_malformed_tap_points() {
        assert!(TapPoint::parse("400").is_err());
        assert!(TapPoint::parse("400,").is_err());
        assert!(TapPoint::parse("a,b").is_err());
        assert!(TapPoint::parse("-1,5").is_err());
    }
}
