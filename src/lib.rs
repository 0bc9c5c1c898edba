//! btstress - Bluetooth audio stress testing over adb
//!
//! This library drives connect/disconnect and media-control stress tests
//! against an Android phone's Bluetooth speaker link. There is no native
//! Bluetooth API access on these devices; state is screen-scraped from
//! `dumpsys` output and the link is toggled by tapping a calibrated
//! coordinate in the settings screen.

pub mod bridge;
pub mod cli;
pub mod commands;
pub mod common;
pub mod device;
pub mod sink;
pub mod task;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result, Settings};
pub use task::{CancelToken, Tally, TaskExecutor, TaskPlan};
