//! Action dispatcher
//!
//! Closed mapping from action names to device operations. Media actions are
//! single keyevents; `relink` delegates to the reconnect controller and
//! synthesizes an outcome from its post-state.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use crate::common::Error;
use crate::device::reconnect::ReconnectController;
use crate::device::runner::{CommandOutcome, CommandRunner};
use crate::device::DeviceTarget;
use crate::sink::ProgressSink;

/// The actions a task plan can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    VolumeUp,
    VolumeDown,
    PlayPause,
    NextTrack,
    PreviousTrack,
    Relink,
}

/// Actions that map to a media keyevent, used by the random stress run
pub const MEDIA_ACTIONS: [ActionKind; 5] = [
    ActionKind::VolumeUp,
    ActionKind::VolumeDown,
    ActionKind::PlayPause,
    ActionKind::NextTrack,
    ActionKind::PreviousTrack,
];

impl ActionKind {
    /// Look up an action by its plan name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "volume_up" => Some(Self::VolumeUp),
            "volume_down" => Some(Self::VolumeDown),
            "play_pause" => Some(Self::PlayPause),
            "next_track" => Some(Self::NextTrack),
            "previous_track" => Some(Self::PreviousTrack),
            "relink" => Some(Self::Relink),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::VolumeUp => "volume_up",
            Self::VolumeDown => "volume_down",
            Self::PlayPause => "play_pause",
            Self::NextTrack => "next_track",
            Self::PreviousTrack => "previous_track",
            Self::Relink => "relink",
        }
    }

    /// Keyevent for this action; None for `relink`, which is a compound
    /// operation rather than a keypress
    pub fn keycode(self) -> Option<&'static str> {
        match self {
            Self::VolumeUp => Some("KEYCODE_VOLUME_UP"),
            Self::VolumeDown => Some("KEYCODE_VOLUME_DOWN"),
            Self::PlayPause => Some("KEYCODE_MEDIA_PLAY_PAUSE"),
            Self::NextTrack => Some("KEYCODE_MEDIA_NEXT"),
            Self::PreviousTrack => Some("KEYCODE_MEDIA_PREVIOUS"),
            Self::Relink => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Error::UnknownAction(s.to_string()))
    }
}

/// Maps named actions to device operations
#[derive(Clone)]
pub struct Dispatcher {
    runner: CommandRunner,
    reconnect: ReconnectController,
    sink: Arc<dyn ProgressSink>,
}

impl Dispatcher {
    pub fn new(
        runner: CommandRunner,
        reconnect: ReconnectController,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            runner,
            reconnect,
            sink,
        }
    }

    /// Execute one named action against the device
    ///
    /// An unknown name is a warned no-op with an ok outcome; it never
    /// aborts the run.
    pub async fn dispatch(&self, target: &DeviceTarget, action_name: &str) -> CommandOutcome {
        match ActionKind::from_name(action_name) {
            Some(kind) => self.dispatch_kind(target, kind).await,
            None => {
                self.sink
                    .warning(&format!("unknown action type '{action_name}', skipping"));
                CommandOutcome::success("", std::time::Duration::ZERO)
            }
        }
    }

    /// Execute a known action
    pub async fn dispatch_kind(&self, target: &DeviceTarget, kind: ActionKind) -> CommandOutcome {
        match kind.keycode() {
            Some(code) => self.send_key(&target.serial, code).await,
            None => {
                let start = Instant::now();
                let state = self.reconnect.relink(target).await;
                CommandOutcome::success(format!("relink complete, state: {state}"), start.elapsed())
            }
        }
    }

    /// Send a raw keyevent to the device
    pub async fn send_key(&self, serial: &str, keycode: &str) -> CommandOutcome {
        self.runner
            .run(serial, &format!("input keyevent {keycode}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keycode_table_covers_media_actions() {
        assert_eq!(ActionKind::VolumeUp.keycode(), Some("KEYCODE_VOLUME_UP"));
        assert_eq!(ActionKind::VolumeDown.keycode(), Some("KEYCODE_VOLUME_DOWN"));
        assert_eq!(
            ActionKind::PlayPause.keycode(),
            Some("KEYCODE_MEDIA_PLAY_PAUSE")
        );
        assert_eq!(ActionKind::NextTrack.keycode(), Some("KEYCODE_MEDIA_NEXT"));
        assert_eq!(
            ActionKind::PreviousTrack.keycode(),
            Some("KEYCODE_MEDIA_PREVIOUS")
        );
        assert_eq!(ActionKind::Relink.keycode(), None);
    }

    #[test]
    fn names_round_trip() {
        for kind in MEDIA_ACTIONS.into_iter().chain([ActionKind::Relink]) {
            assert_eq!(ActionKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(ActionKind::from_name("fast_forward"), None);
        assert!("fast_forward".parse::<ActionKind>().is_err());
    }
}
