//! Logging and tracing configuration
//!
//! Console logging for every subcommand; `run` additionally writes a rolling
//! log file so long stress runs leave a reviewable trace.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use super::paths;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("btstress=info,warn"))
}

/// Initialize tracing for console-only subcommands
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_console() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing for a stress run (console + rolling log file)
///
/// `log_dir` comes from the task plan when set, otherwise the platform data
/// directory. Returns the worker guard (must be kept alive for the run) and
/// the directory being written to, or falls back to console-only when no
/// directory can be created.
pub fn init_run(log_dir: Option<&Path>) -> Option<(WorkerGuard, PathBuf)> {
    let dir = log_dir.map(PathBuf::from).or_else(paths::log_dir);

    if let Some(dir) = dir {
        if std::fs::create_dir_all(&dir).is_ok() {
            let appender = tracing_appender::rolling::daily(&dir, "btstress.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .compact();

            let console_layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact();

            tracing_subscriber::registry()
                .with(env_filter())
                .with(file_layer)
                .with(console_layer)
                .init();

            return Some((guard, dir));
        }
        eprintln!("Warning: could not create log directory {}", dir.display());
    }

    init_console();
    None
}
