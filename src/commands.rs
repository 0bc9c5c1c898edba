//! CLI command definitions
//!
//! Defines the clap commands for the btstress CLI.

use clap::Subcommand;
use std::path::PathBuf;

use crate::device::ActionKind;

#[derive(Subcommand)]
pub enum Commands {
    /// Execute every task group in a plan file
    Run {
        /// Path to the JSON task plan
        plan: PathBuf,

        /// Override the device serial from the plan
        #[arg(long, short = 's')]
        device: Option<String>,

        /// Log directory (overrides the plan's log.file_path)
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },

    /// Check a plan file and report problems without touching a device
    Validate {
        /// Path to the JSON task plan
        plan: PathBuf,
    },

    /// List device sessions known to adb
    Devices,

    /// List Bluetooth devices paired with the phone
    Paired {
        /// Device serial
        #[arg(long, short = 's')]
        device: String,
    },

    /// Probe the speaker connection state
    Status {
        /// Device serial
        #[arg(long, short = 's')]
        device: String,
    },

    /// Toggle the speaker link once via the settings-screen tap
    Relink {
        /// Device serial
        #[arg(long, short = 's')]
        device: String,

        /// Tap coordinate as X,Y (e.g. 400,900)
        #[arg(long)]
        tap: String,
    },

    /// Send a media action as a keyevent
    Key {
        /// Action: volume_up, volume_down, play_pause, next_track, previous_track
        action: ActionKind,

        /// Device serial
        #[arg(long, short = 's')]
        device: String,

        /// Number of times to send it
        #[arg(long, default_value = "1")]
        repeat: u32,
    },

    /// Stress the media stack with randomly chosen actions
    Stress {
        /// Device serial
        #[arg(long, short = 's')]
        device: String,

        /// Number of operations to perform
        #[arg(long, default_value = "10")]
        count: u32,
    },
}
