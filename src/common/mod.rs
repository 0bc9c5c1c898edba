//! Common utilities shared across the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::Settings;
pub use error::{Error, Result};
