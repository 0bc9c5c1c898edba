//! Settings file handling
//!
//! Timeouts and settle delays live in a TOML file so calibrating a slow
//! device does not require a rebuild. Every field has a default; a missing
//! file means default settings.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Tool settings loaded from `config.toml`
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Settings {
    /// Per-command timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Settle delays after UI-mutating actions
    #[serde(default)]
    pub settle: Settle,
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Timeout for a single adb command
    #[serde(default = "default_command")]
    pub command_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_secs: default_command(),
        }
    }
}

fn default_command() -> u64 {
    10
}

/// Settle delays in seconds
///
/// The device offers no completion callbacks, so every state-changing
/// operation is followed by a fixed wait before the next probe.
#[derive(Debug, Deserialize, Clone)]
pub struct Settle {
    /// Wait between action repetitions
    #[serde(default = "default_action")]
    pub action_secs: f64,

    /// Wait after opening the Bluetooth settings screen
    #[serde(default = "default_settings_screen")]
    pub settings_screen_secs: f64,

    /// Wait after tapping the connect/disconnect control
    #[serde(default = "default_tap")]
    pub tap_secs: f64,
}

impl Default for Settle {
    fn default() -> Self {
        Self {
            action_secs: default_action(),
            settings_screen_secs: default_settings_screen(),
            tap_secs: default_tap(),
        }
    }
}

fn default_action() -> f64 {
    2.0
}
fn default_settings_screen() -> f64 {
    3.0
}
fn default_tap() -> f64 {
    2.5
}

impl Settings {
    /// Load settings from the default config file
    ///
    /// Returns default settings if the file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, e))?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Settings with all waits zeroed, for tests
    pub fn instant() -> Self {
        Self {
            timeouts: Timeouts { command_secs: 1 },
            settle: Settle {
                action_secs: 0.0,
                settings_screen_secs: 0.0,
                tap_secs: 0.0,
            },
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.command_secs)
    }

    pub fn action_settle(&self) -> Duration {
        Duration::from_secs_f64(self.settle.action_secs)
    }

    pub fn settings_screen_settle(&self) -> Duration {
        Duration::from_secs_f64(self.settle.settings_screen_secs)
    }

    pub fn tap_settle(&self) -> Duration {
        Duration::from_secs_f64(self.settle.tap_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_use_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.timeouts.command_secs, 10);
        assert_eq!(settings.settle.action_secs, 2.0);
        assert_eq!(settings.settle.settings_screen_secs, 3.0);
        assert_eq!(settings.settle.tap_secs, 2.5);
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [settle]
            action_secs = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(settings.settle.action_secs, 0.5);
        assert_eq!(settings.settle.tap_secs, 2.5);
        assert_eq!(settings.timeouts.command_secs, 10);
    }
}
