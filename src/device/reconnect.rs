//! Reconnect controller
//!
//! This class of device offers no programmatic toggle for the speaker link
//! (vendor restriction), so the controller opens the Bluetooth settings
//! screen and taps a calibrated coordinate. The tap's meaning depends on
//! which affordance the screen is currently rendering, which we cannot
//! observe; the only source of truth is probing before and after and
//! checking the net transition.

use std::sync::Arc;
use tokio::time::sleep;

use crate::common::Settings;
use crate::device::probe::{ConnectionState, Prober};
use crate::device::runner::CommandRunner;
use crate::device::DeviceTarget;
use crate::sink::ProgressSink;

/// Intent that opens the Bluetooth settings screen
pub const SETTINGS_COMMAND: &str = "am start -a android.settings.BLUETOOTH_SETTINGS";

/// Toggles the speaker link through the settings-screen tap
#[derive(Clone)]
pub struct ReconnectController {
    runner: CommandRunner,
    prober: Prober,
    sink: Arc<dyn ProgressSink>,
    settings: Settings,
}

impl ReconnectController {
    pub fn new(
        runner: CommandRunner,
        prober: Prober,
        sink: Arc<dyn ProgressSink>,
        settings: Settings,
    ) -> Self {
        Self {
            runner,
            prober,
            sink,
            settings,
        }
    }

    /// Toggle the link once and report the post-tap state
    ///
    /// Never errors; a missed transition is logged and left to the caller.
    pub async fn relink(&self, target: &DeviceTarget) -> ConnectionState {
        let before = self.prober.state(&target.serial).await;
        if before.is_connected() {
            self.sink.info("speaker connected, toggling to disconnect");
        } else {
            self.sink.info("speaker not connected, toggling to connect");
        }

        self.runner.run(&target.serial, SETTINGS_COMMAND).await;
        sleep(self.settings.settings_screen_settle()).await;

        let tap = format!("input tap {} {}", target.tap.x, target.tap.y);
        self.runner.run(&target.serial, &tap).await;
        sleep(self.settings.tap_settle()).await;

        let after = self.prober.state(&target.serial).await;
        match (before.is_connected(), after.is_connected()) {
            (false, true) => self.sink.info("speaker connected successfully"),
            (false, false) => self.sink.error("speaker connect failed"),
            (true, false) => self.sink.info("speaker disconnected successfully"),
            (true, true) => self.sink.error("speaker disconnect failed"),
        }
        after
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::testing::MockBridge;
    use crate::device::TapPoint;

    fn controller(bridge: Arc<MockBridge>) -> (ReconnectController, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let settings = Settings::instant();
        let runner = CommandRunner::new(bridge, sink.clone(), settings.command_timeout());
        let prober = Prober::new(runner.clone());
        (
            ReconnectController::new(runner, prober, sink.clone(), settings),
            sink,
        )
    }

    fn target() -> DeviceTarget {
        DeviceTarget {
            serial: "b67c9d18".into(),
            tap: TapPoint { x: 400, y: 900 },
        }
    }

    #[tokio::test]
    async fn relink_connects_a_disconnected_speaker() {
        let bridge = Arc::new(MockBridge::disconnected("b67c9d18"));
        let (controller, sink) = controller(bridge.clone());

        let state = controller.relink(&target()).await;
        assert_eq!(state, ConnectionState::Connected);
        assert!(sink.contains("speaker connected successfully"));
        assert_eq!(bridge.count_containing("am start"), 1);
        assert_eq!(bridge.count_containing("input tap 400 900"), 1);
    }

    #[tokio::test]
    async fn relink_disconnects_a_connected_speaker() {
        let bridge = Arc::new(MockBridge::connected("b67c9d18"));
        let (controller, sink) = controller(bridge);

        let state = controller.relink(&target()).await;
        assert_eq!(state, ConnectionState::Disconnected);
        assert!(sink.contains("speaker disconnected successfully"));
    }

    #[tokio::test]
    async fn missed_transition_is_logged_not_raised() {
        let bridge = Arc::new(MockBridge::disconnected("b67c9d18"));
        bridge.set_tap_toggles(false);
        let (controller, sink) = controller(bridge);

        let state = controller.relink(&target()).await;
        assert_eq!(state, ConnectionState::Disconnected);
        assert!(sink.contains("speaker connect failed"));
    }
}
