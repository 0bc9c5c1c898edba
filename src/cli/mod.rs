//! CLI command handling
//!
//! Builds the bridge and execution components for each subcommand and
//! formats human-readable output.

use colored::Colorize;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::sleep;

use crate::bridge::{check_device, AdbBridge, Bridge};
use crate::commands::Commands;
use crate::common::{logging, Error, Result, Settings};
use crate::device::{
    media::MEDIA_ACTIONS, ActionKind, CommandRunner, ConnectionState, DeviceTarget, Dispatcher,
    Prober, ReconnectController, TapPoint,
};
use crate::sink::{ConsoleSink, ProgressSink};
use crate::task::{CancelToken, TaskExecutor, TaskPlan};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: Option<PathBuf>) -> Result<()> {
    let settings = match config {
        Some(path) => Settings::load_from(&path)?,
        None => Settings::load()?,
    };

    match command {
        Commands::Run {
            plan,
            device,
            log_dir,
        } => run(&plan, device, log_dir, settings).await,
        command => {
            logging::init_console();
            match command {
                Commands::Validate { plan } => validate(&plan),
                Commands::Devices => devices().await,
                Commands::Paired { device } => paired(&device, settings).await,
                Commands::Status { device } => status(&device, settings).await,
                Commands::Relink { device, tap } => relink(&device, &tap, settings).await,
                Commands::Key {
                    action,
                    device,
                    repeat,
                } => key(action, &device, repeat, settings).await,
                Commands::Stress { device, count } => stress(&device, count, settings).await,
                Commands::Run { .. } => unreachable!(),
            }
        }
    }
}

/// Wire the per-device components over a bridge
fn components(
    bridge: Arc<dyn Bridge>,
    sink: Arc<dyn ProgressSink>,
    settings: &Settings,
) -> (CommandRunner, Prober, ReconnectController, Dispatcher) {
    let runner = CommandRunner::new(bridge, sink.clone(), settings.command_timeout());
    let prober = Prober::new(runner.clone());
    let reconnect = ReconnectController::new(
        runner.clone(),
        prober.clone(),
        sink.clone(),
        settings.clone(),
    );
    let dispatcher = Dispatcher::new(runner.clone(), reconnect.clone(), sink);
    (runner, prober, reconnect, dispatcher)
}

async fn run(
    plan_path: &Path,
    device: Option<String>,
    log_dir: Option<PathBuf>,
    settings: Settings,
) -> Result<()> {
    let mut plan = TaskPlan::load(plan_path)?;
    if let Some(serial) = device {
        plan.device.serial = serial;
    }

    for issue in plan.validate() {
        eprintln!("{} {issue}", "warning:".yellow());
    }

    let log_dir = log_dir.or_else(|| plan.log.as_ref().map(|l| l.file_path.clone()));
    // The guard flushes the file appender on drop; hold it for the run.
    let _log_guard = logging::init_run(log_dir.as_deref());

    let bridge: Arc<dyn Bridge> = Arc::new(AdbBridge::new()?);
    let sink: Arc<dyn ProgressSink> = Arc::new(ConsoleSink);
    let executor = TaskExecutor::new(bridge, sink, settings);

    let cancel = CancelToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    let tally = executor.execute_with_cancel(&plan, &cancel).await?;

    let verdict = if tally.fail == 0 {
        "Run complete:".green().bold()
    } else {
        "Run complete:".yellow().bold()
    };
    println!(
        "\n{} {} succeeded, {} failed ({} operations)",
        verdict,
        tally.success,
        tally.fail,
        tally.total()
    );
    Ok(())
}

fn validate(plan_path: &Path) -> Result<()> {
    let plan = TaskPlan::load(plan_path)?;
    let issues = plan.validate();
    if issues.is_empty() {
        println!(
            "{} {} task groups, {} operations",
            "Plan OK:".green(),
            plan.groups.len(),
            plan.total_operations()
        );
        Ok(())
    } else {
        for issue in &issues {
            println!("{} {issue}", "problem:".red());
        }
        Err(Error::PlanInvalid(format!("{} problem(s)", issues.len())))
    }
}

async fn devices() -> Result<()> {
    let bridge = AdbBridge::new()?;
    let entries = bridge.devices().await?;
    if entries.is_empty() {
        println!("No devices attached");
        return Ok(());
    }
    for entry in entries {
        println!("{}\t{}\t{}", entry.serial, entry.state, entry.description);
    }
    Ok(())
}

async fn paired(serial: &str, settings: Settings) -> Result<()> {
    let bridge: Arc<dyn Bridge> = Arc::new(AdbBridge::new()?);
    check_device(bridge.as_ref(), serial).await?;
    let (_, prober, _, _) = components(bridge, Arc::new(ConsoleSink), &settings);

    let devices = prober.paired_devices(serial).await;
    if devices.is_empty() {
        println!("No paired Bluetooth devices found");
        return Ok(());
    }
    for device in devices {
        println!("{}\t{}", device.address, device.name);
    }
    Ok(())
}

async fn status(serial: &str, settings: Settings) -> Result<()> {
    let bridge: Arc<dyn Bridge> = Arc::new(AdbBridge::new()?);
    check_device(bridge.as_ref(), serial).await?;
    let (_, prober, _, _) = components(bridge, Arc::new(ConsoleSink), &settings);

    match prober.state(serial).await {
        ConnectionState::Connected => println!("{}", "connected".green()),
        ConnectionState::Disconnected => println!("{}", "disconnected".red()),
        ConnectionState::Unknown => println!("{}", "unknown".yellow()),
    }
    Ok(())
}

async fn relink(serial: &str, tap: &str, settings: Settings) -> Result<()> {
    let target = DeviceTarget {
        serial: serial.to_string(),
        tap: TapPoint::parse(tap)?,
    };
    let bridge: Arc<dyn Bridge> = Arc::new(AdbBridge::new()?);
    check_device(bridge.as_ref(), serial).await?;
    let (_, _, reconnect, _) = components(bridge, Arc::new(ConsoleSink), &settings);

    let state = reconnect.relink(&target).await;
    println!("Speaker is now: {state}");
    Ok(())
}

async fn key(action: ActionKind, serial: &str, repeat: u32, settings: Settings) -> Result<()> {
    let Some(keycode) = action.keycode() else {
        return Err(Error::Config(
            "'relink' needs a tap point; use 'btstress relink' instead".to_string(),
        ));
    };

    let bridge: Arc<dyn Bridge> = Arc::new(AdbBridge::new()?);
    check_device(bridge.as_ref(), serial).await?;
    let (_, _, _, dispatcher) = components(bridge, Arc::new(ConsoleSink), &settings);

    let mut failed = 0u32;
    for _ in 0..repeat {
        if !dispatcher.send_key(serial, keycode).await.ok {
            failed += 1;
        }
        sleep(settings.action_settle()).await;
    }
    if failed > 0 {
        return Err(Error::command_failed(
            keycode,
            &format!("{failed}/{repeat} sends failed"),
        ));
    }
    println!("Sent {action} x{repeat}");
    Ok(())
}

async fn stress(serial: &str, count: u32, settings: Settings) -> Result<()> {
    let bridge: Arc<dyn Bridge> = Arc::new(AdbBridge::new()?);
    check_device(bridge.as_ref(), serial).await?;
    let sink: Arc<dyn ProgressSink> = Arc::new(ConsoleSink);
    let (_, _, _, dispatcher) = components(bridge, sink.clone(), &settings);

    sink.info(&format!("starting media stress: {count} operations"));
    let mut success = 0u64;
    let mut fail = 0u64;
    for i in 0..count {
        let action = *MEDIA_ACTIONS
            .choose(&mut rand::thread_rng())
            .expect("non-empty action table");
        sink.info(&format!("({}/{count}) {action}", i + 1));

        let keycode = action.keycode().expect("media actions have keycodes");
        if dispatcher.send_key(serial, keycode).await.ok {
            success += 1;
        } else {
            fail += 1;
        }
        sleep(settings.action_settle()).await;
    }

    let verdict = if fail == 0 {
        "Stress complete:".green().bold()
    } else {
        "Stress complete:".yellow().bold()
    };
    println!("\n{verdict} {success} succeeded, {fail} failed");
    Ok(())
}
