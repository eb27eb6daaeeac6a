//! Scheduler/Worker: runs backup cycles back to back on a background task.
//!
//! The stop flag is checked once before each cycle; a cycle in flight always
//! runs to completion or failure. A failing cycle ends the worker and its
//! error comes back from [`BackupWorker::join`] as-is. A panic inside the
//! worker is resumed on the task that calls `join`.

use crate::cycle::BackupCycle;
use crate::error::{BackupError, Result};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

const RUNNING: u8 = 0;
const STOP_REQUESTED: u8 = 1;
const STOPPED: u8 = 2;

/// Cloneable handle for requesting a cooperative stop
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicU8>);

impl StopHandle {
    pub fn request_stop(&self) {
        let _ = self
            .0
            .compare_exchange(RUNNING, STOP_REQUESTED, Ordering::SeqCst, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst) != RUNNING
    }

    fn reset(&self) {
        self.0.store(RUNNING, Ordering::SeqCst);
    }

    /// Withdraws a stop request the loop has not acted on yet
    fn resume(&self) -> bool {
        self.0
            .compare_exchange(STOP_REQUESTED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Called by the loop before each cycle. Once this returns `true` the
    /// request can no longer be withdrawn.
    fn take_stop(&self) -> bool {
        match self
            .0
            .compare_exchange(STOP_REQUESTED, STOPPED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => true,
            Err(state) => state == STOPPED,
        }
    }

    fn mark_stopped(&self) {
        self.0.store(STOPPED, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst) == STOPPED
    }
}

/// The single background backup worker of a process
pub struct BackupWorker {
    cycle: Arc<BackupCycle>,
    stop: StopHandle,
    runtime: Handle,
    handle: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl BackupWorker {
    /// Creates a worker that spawns on the current tokio runtime.
    ///
    /// Must be called from within a runtime; use [`Self::with_runtime`]
    /// otherwise.
    pub fn new(cycle: BackupCycle) -> Self {
        Self::with_runtime(cycle, Handle::current())
    }

    /// Creates a worker that spawns on `runtime`, so the host hooks may
    /// fire from any thread
    pub fn with_runtime(cycle: BackupCycle, runtime: Handle) -> Self {
        Self {
            cycle: Arc::new(cycle),
            stop: StopHandle::default(),
            runtime,
            handle: Mutex::new(None),
        }
    }

    /// Spawns the cycle loop. Returns `false` if it is already running.
    ///
    /// A loop that was asked to stop but has not reached its next stop check
    /// keeps running instead, and a loop that already exited is replaced by
    /// a new one. Both count as a start.
    pub fn start(&self) -> bool {
        let mut handle = self.lock_handle();
        if handle.is_some() {
            if self.stop.resume() {
                info!("Backup worker stop withdrawn, continuing");
                return true;
            }
            if !self.stop.is_stopped() {
                debug!("Backup worker already started");
                return false;
            }
            debug!("Previous backup worker loop has exited, starting a new one");
        }

        self.stop.reset();
        let cycle = Arc::clone(&self.cycle);
        let stop = self.stop.clone();
        *handle = Some(self.runtime.spawn(run_loop(cycle, stop)));

        info!(
            "Backup worker started: every {} min, {} s save wait, {} day retention",
            self.cycle.settings().backup_interval_minutes,
            self.cycle.settings().pre_backup_save_wait_seconds,
            self.cycle.settings().remove_backups_older_than_days
        );
        true
    }

    /// Host load hook: start now if the world is already loaded
    pub fn on_load(&self, world_loaded: bool) -> bool {
        if world_loaded {
            self.start()
        } else {
            debug!("World not loaded yet, waiting for the ready signal");
            false
        }
    }

    /// Host world-ready hook
    pub fn on_world_ready(&self) -> bool {
        self.start()
    }

    /// Host unload hook
    pub fn on_unload(&self) {
        self.request_stop();
    }

    /// Asks the loop to exit before its next cycle
    pub fn request_stop(&self) {
        info!("Backup worker stop requested, finishing the current cycle");
        self.stop.request_stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Whether a started worker is still looping
    pub fn is_running(&self) -> bool {
        self.lock_handle()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Waits for the worker to exit.
    ///
    /// Returns the error of the failed cycle, unchanged. Returns `Ok` for a
    /// worker that stopped on request or was never started.
    pub async fn join(&self) -> Result<()> {
        let handle = self.lock_handle().take();
        let Some(handle) = handle else {
            return Ok(());
        };

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(BackupError::WorkerCancelled),
        }
    }

    fn lock_handle(&self) -> MutexGuard<'_, Option<JoinHandle<Result<()>>>> {
        self.handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn run_loop(cycle: Arc<BackupCycle>, stop: StopHandle) -> Result<()> {
    while !stop.take_stop() {
        match cycle.run_cycle().await {
            Ok(report) => debug!(
                "Backup {} finished: {} files, {} pruned",
                report.id,
                report.snapshot.total_files(),
                report.pruned.len()
            ),
            Err(e) => {
                error!("Backup cycle failed: {}", e);
                stop.mark_stopped();
                return Err(e);
            }
        }
    }

    info!("Backup worker stopped");
    Ok(())
}
