//! Task executor
//!
//! Orchestrates a run: verify the device session, enforce the connectivity
//! precondition, then walk every task group and action in plan order,
//! re-probing before each repetition and tallying every attempt.
//!
//! Failure semantics: action-level failures are logged and counted, the run
//! continues; only an unreachable speaker at the precondition stage aborts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::sleep;

use crate::bridge::{check_device, Bridge};
use crate::common::{Error, Result, Settings};
use crate::device::{
    CommandRunner, DeviceTarget, Dispatcher, Prober, ReconnectController,
};
use crate::sink::ProgressSink;
use crate::task::plan::TaskPlan;

/// Success/failure counts across one run; never reset mid-run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub success: u64,
    pub fail: u64,
}

impl Tally {
    pub fn total(&self) -> u64 {
        self.success + self.fail
    }
}

/// Cooperative cancellation flag, polled between repetitions
///
/// A command already in flight runs to its own timeout or completion; there
/// is no preemption inside a command.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drives a whole task plan against one device
pub struct TaskExecutor {
    bridge: Arc<dyn Bridge>,
    prober: Prober,
    reconnect: ReconnectController,
    dispatcher: Dispatcher,
    sink: Arc<dyn ProgressSink>,
    settings: Settings,
}

impl TaskExecutor {
    pub fn new(bridge: Arc<dyn Bridge>, sink: Arc<dyn ProgressSink>, settings: Settings) -> Self {
        let runner = CommandRunner::new(bridge.clone(), sink.clone(), settings.command_timeout());
        let prober = Prober::new(runner.clone());
        let reconnect = ReconnectController::new(
            runner.clone(),
            prober.clone(),
            sink.clone(),
            settings.clone(),
        );
        let dispatcher = Dispatcher::new(runner, reconnect.clone(), sink.clone());
        Self {
            bridge,
            prober,
            reconnect,
            dispatcher,
            sink,
            settings,
        }
    }

    /// Execute the whole plan
    pub async fn execute(&self, plan: &TaskPlan) -> Result<Tally> {
        self.execute_with_cancel(plan, &CancelToken::new()).await
    }

    /// Execute the whole plan, honoring a host-owned cancel flag
    pub async fn execute_with_cancel(&self, plan: &TaskPlan, cancel: &CancelToken) -> Result<Tally> {
        let target = &plan.device;

        check_device(self.bridge.as_ref(), &target.serial).await?;
        self.sink.info(&format!("device serial: {}", target.serial));
        self.sink.info(&format!("tap point: {}", target.tap));

        self.sink.info("checking speaker connectivity...");
        if !self.ensure_connected(target).await {
            self.sink
                .error("speaker connection failed, aborting the run");
            return Err(Error::SpeakerUnreachable);
        }

        let mut tally = Tally::default();
        'groups: for group in &plan.groups {
            self.sink.info(&format!(">> task group: {}", group.name));
            for spec in &group.actions {
                for i in 0..spec.repeat {
                    if cancel.is_cancelled() {
                        self.sink.warning("run cancelled by host");
                        break 'groups;
                    }
                    self.run_once(target, &spec.action, i + 1, spec.repeat, &mut tally)
                        .await;
                }
            }
        }

        self.sink.info("=== run summary ===");
        self.sink
            .info(&format!("successful operations: {}", tally.success));
        self.sink.info(&format!("failed operations: {}", tally.fail));
        Ok(tally)
    }

    /// One repetition: probe, relink if needed, dispatch, settle, tally
    async fn run_once(
        &self,
        target: &DeviceTarget,
        action: &str,
        rep: u32,
        total: u32,
        tally: &mut Tally,
    ) {
        self.sink
            .info(&format!("executing {action} ({rep}/{total})"));

        // Transient disconnects between repetitions are common on consumer
        // hardware; probe before every repetition, not once per action.
        if !self.prober.is_connected(&target.serial).await {
            self.sink
                .warning("speaker disconnected, attempting to relink...");
            self.reconnect.relink(target).await;
        }

        let outcome = self.dispatcher.dispatch(target, action).await;
        sleep(self.settings.action_settle()).await;

        if outcome.ok {
            tally.success += 1;
        } else {
            tally.fail += 1;
            self.sink
                .error(&format!("{action} failed: {}", outcome.error));
        }
    }

    /// Connectivity precondition: probe, relink once if disconnected, and
    /// check the post-relink state
    async fn ensure_connected(&self, target: &DeviceTarget) -> bool {
        if self.prober.is_connected(&target.serial).await {
            return true;
        }
        self.sink
            .info("speaker not connected, attempting to relink...");
        self.reconnect.relink(target).await.is_connected()
    }
}
