//! Progress sink capability
//!
//! Every component logs through an explicitly passed `ProgressSink` instead
//! of a global logger, so a host application can route the same lines to a
//! console, a file, or a UI channel. The sink is append-only; nothing reads
//! state back out of it during a run.

use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// Severity of a sink line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    fn prefix(self) -> &'static str {
        match self {
            Level::Info => "[INFO]",
            Level::Warning => "[WARN]",
            Level::Error => "[ERROR]",
        }
    }
}

/// Log sink consumed by the execution core
///
/// `command`/`command_error` have provided implementations so a minimal host
/// only needs the three level methods.
pub trait ProgressSink: Send + Sync {
    fn info(&self, msg: &str);
    fn warning(&self, msg: &str);
    fn error(&self, msg: &str);

    /// Record a completed command with its duration
    fn command(&self, command: &str, duration: Duration) {
        self.info(&format!(
            "command '{}' completed in {:.2}s",
            command,
            duration.as_secs_f64()
        ));
    }

    /// Record a failed command with its diagnostic and duration
    fn command_error(&self, command: &str, error: &str, duration: Duration) {
        self.error(&format!(
            "command '{}' failed after {:.2}s: {}",
            command,
            duration.as_secs_f64(),
            error
        ));
    }
}

/// Sink that forwards to `tracing`
///
/// With file logging initialized, the same lines land in the run log.
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn warning(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }
}

/// Sink that sends formatted lines over an mpsc channel
///
/// This is the host notification channel: one-way, append-only, suitable for
/// a UI thread consuming progress lines from a background worker.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, level: Level, msg: &str) {
        // A departed receiver just means the host stopped listening.
        let _ = self.tx.send(format!("{} {}", level.prefix(), msg));
    }
}

impl ProgressSink for ChannelSink {
    fn info(&self, msg: &str) {
        self.send(Level::Info, msg);
    }

    fn warning(&self, msg: &str) {
        self.send(Level::Warning, msg);
    }

    fn error(&self, msg: &str) {
        self.send(Level::Error, msg);
    }
}

/// Sink that buffers lines in memory, for assertions in tests
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    /// Lines at a given level
    pub fn at_level(&self, level: Level) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|(_, m)| m.contains(needle))
    }
}

impl ProgressSink for MemorySink {
    fn info(&self, msg: &str) {
        self.lines.lock().unwrap().push((Level::Info, msg.into()));
    }

    fn warning(&self, msg: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((Level::Warning, msg.into()));
    }

    fn error(&self, msg: &str) {
        self.lines.lock().unwrap().push((Level::Error, msg.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_formats_levels() {
        let (sink, mut rx) = ChannelSink::new();
        sink.info("starting");
        sink.error("boom");
        assert_eq!(rx.try_recv().unwrap(), "[INFO] starting");
        assert_eq!(rx.try_recv().unwrap(), "[ERROR] boom");
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.info("nobody listening");
    }

    #[test]
    fn memory_sink_filters_by_level() {
        let sink = MemorySink::new();
        sink.info("a");
        sink.warning("b");
        sink.error("c");
        assert_eq!(sink.at_level(Level::Error), vec!["c".to_string()]);
        assert!(sink.contains("b"));
    }
}
