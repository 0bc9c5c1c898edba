//! btstress - Bluetooth audio stress testing over adb
//!
//! Command-line front end; see the library crate for the execution core.

use btstress::{cli, commands::Commands};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "btstress", about = "Bluetooth audio stress testing for Android devices over adb")]
#[command(version, long_about = None)]
struct Cli {
    /// Path to an alternate settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command, cli.config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
