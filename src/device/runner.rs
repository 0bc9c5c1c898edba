//! Command runner
//!
//! Runs one device-side command through the bridge, times it, and converts
//! every failure mode into a populated `CommandOutcome`. Nothing below this
//! layer raises past its boundary; callers branch on `outcome.ok`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::bridge::Bridge;
use crate::sink::ProgressSink;

/// Result of a single device command
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub ok: bool,
    /// Trimmed stdout on success, empty otherwise
    pub output: String,
    /// Diagnostic text on failure, empty otherwise
    pub error: String,
    pub duration: Duration,
}

impl CommandOutcome {
    pub fn success(output: impl Into<String>, duration: Duration) -> Self {
        Self {
            ok: true,
            output: output.into(),
            error: String::new(),
            duration,
        }
    }

    pub fn failure(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            ok: false,
            output: String::new(),
            error: error.into(),
            duration,
        }
    }
}

/// Executes single commands against one device session
#[derive(Clone)]
pub struct CommandRunner {
    bridge: Arc<dyn Bridge>,
    sink: Arc<dyn ProgressSink>,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(bridge: Arc<dyn Bridge>, sink: Arc<dyn ProgressSink>, timeout: Duration) -> Self {
        Self {
            bridge,
            sink,
            timeout,
        }
    }

    /// Run one shell command on the device, emitting exactly one sink entry
    pub async fn run(&self, serial: &str, command: &str) -> CommandOutcome {
        let start = Instant::now();
        let result = self.bridge.shell(serial, command, self.timeout).await;
        let duration = start.elapsed();

        let outcome = match result {
            Ok(output) if output.success() => {
                CommandOutcome::success(output.stdout.trim(), duration)
            }
            Ok(output) => {
                let mut diag = output.stderr.trim().to_string();
                if diag.is_empty() {
                    diag = match output.exit_code {
                        Some(code) => format!("exit code {code}"),
                        None => "killed by signal".to_string(),
                    };
                }
                CommandOutcome::failure(diag, duration)
            }
            Err(e) => CommandOutcome::failure(e.to_string(), duration),
        };

        if outcome.ok {
            self.sink.command(command, duration);
        } else {
            self.sink.command_error(command, &outcome.error, duration);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{Level, MemorySink};
    use crate::testing::MockBridge;

    fn setup(bridge: MockBridge) -> (CommandRunner, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let runner = CommandRunner::new(
            Arc::new(bridge),
            sink.clone(),
            Duration::from_secs(1),
        );
        (runner, sink)
    }

    #[tokio::test]
    async fn success_produces_ok_outcome_and_one_info_line() {
        let (runner, sink) = setup(MockBridge::connected("b67c9d18"));
        let outcome = runner.run("b67c9d18", "input keyevent KEYCODE_VOLUME_UP").await;
        assert!(outcome.ok);
        assert!(outcome.error.is_empty());
        assert_eq!(sink.lines().len(), 1);
        assert_eq!(sink.at_level(Level::Error).len(), 0);
    }

    #[tokio::test]
    async fn timeout_produces_failed_outcome_and_one_error_line() {
        let bridge = MockBridge::connected("b67c9d18");
        bridge.fail_matching("keyevent");
        let (runner, sink) = setup(bridge);

        let outcome = runner.run("b67c9d18", "input keyevent KEYCODE_MEDIA_NEXT").await;
        assert!(!outcome.ok);
        assert!(outcome.error.contains("timed out"));
        assert_eq!(sink.at_level(Level::Error).len(), 1);
        assert_eq!(sink.lines().len(), 1);
    }

    #[tokio::test]
    async fn nonzero_exit_reports_stderr() {
        let bridge = MockBridge::connected("b67c9d18");
        bridge.exit_nonzero_matching("dumpsys", "permission denied");
        let (runner, _sink) = setup(bridge);

        let outcome = runner.run("b67c9d18", "dumpsys bluetooth_manager").await;
        assert!(!outcome.ok);
        assert!(outcome.error.contains("permission denied"));
    }
}
