//! Sync execution engine
//!
//! Runs built rsync commands as child processes and sequences one
//! complete cycle: the pull phase, then the push phase. Each phase is
//! bounded by a wall-clock timeout and a combined-output ceiling, and
//! its stdout is scanned for percentage markers that feed the caller's
//! progress callback.
//!
//! The executor owns at most one in-flight child process. A second
//! cycle started while one is active is rejected with [`Error::Busy`]
//! rather than silently replacing the handle; `cancel()` terminates
//! whatever phase is active and the cycle fails with
//! [`Error::Cancelled`].

use crate::command::{RsyncCommand, build_rsync_command};
use crate::progress::scan_percentage;
use std::panic::AssertUnwindSafe;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vaultsync_core::{
    Direction, Error, Notifier, ProgressCallback, ProgressEvent, Result, SyncSettings,
    TracingNotifier,
};

/// Default wall-clock bound for one phase.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default ceiling for combined stdout + stderr of one phase.
const DEFAULT_MAX_OUTPUT: usize = 10 * 1024 * 1024;

/// Bounds enforced on each phase's child process.
///
/// The defaults match production use; tests tighten them.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorOptions {
    /// Wall-clock bound; exceeding it kills the process.
    pub timeout: Duration,
    /// Combined output ceiling in bytes; exceeding it kills the process.
    pub max_output_bytes: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT,
        }
    }
}

/// Orchestrates rsync child processes for complete sync cycles.
pub struct SyncExecutor {
    options: ExecutorOptions,
    notifier: Arc<dyn Notifier>,
    /// Cancellation token of the active cycle, if one is running.
    /// This is the executor's only mutable shared state.
    active: Mutex<Option<CancellationToken>>,
}

impl Default for SyncExecutor {
    fn default() -> Self {
        Self::new(Arc::new(TracingNotifier))
    }
}

impl SyncExecutor {
    /// Create an executor with default bounds.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_options(notifier, ExecutorOptions::default())
    }

    /// Create an executor with explicit bounds.
    pub fn with_options(notifier: Arc<dyn Notifier>, options: ExecutorOptions) -> Self {
        Self {
            options,
            notifier,
            active: Mutex::new(None),
        }
    }

    /// Run one complete sync cycle: pull, then push.
    ///
    /// The pull phase is skipped entirely when no pull paths are
    /// configured — no process is spawned and no pull progress events
    /// are emitted. A pull failure aborts the cycle before the push
    /// phase starts. The push phase is always the ordinary push;
    /// forced push is a separate operation.
    pub async fn execute_sync(
        &self,
        settings: &SyncSettings,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        let mut phases = Vec::with_capacity(2);
        if settings.pull_paths.is_empty() {
            debug!("no pull paths configured, skipping pull phase");
        } else {
            phases.push((
                build_rsync_command(settings, Direction::Pull),
                Direction::Pull,
            ));
        }
        phases.push((
            build_rsync_command(settings, Direction::Push),
            Direction::Push,
        ));
        self.run_phases(&phases, progress).await
    }

    /// Run only the pull phase.
    pub async fn execute_pull(
        &self,
        settings: &SyncSettings,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        if settings.pull_paths.is_empty() {
            return Err(Error::config(
                "no pull paths configured; nothing would be pulled",
            ));
        }
        let phases = [(
            build_rsync_command(settings, Direction::Pull),
            Direction::Pull,
        )];
        self.run_phases(&phases, progress).await
    }

    /// Run only the ordinary push phase.
    pub async fn execute_push(
        &self,
        settings: &SyncSettings,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        let phases = [(
            build_rsync_command(settings, Direction::Push),
            Direction::Push,
        )];
        self.run_phases(&phases, progress).await
    }

    /// Run a forced push: local overwrites remote with no pull-path
    /// exclusion. Never selected by `execute_sync` or the scheduler —
    /// callers reach this only through explicit intent.
    pub async fn execute_forced_push(
        &self,
        settings: &SyncSettings,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        let phases = [(
            build_rsync_command(settings, Direction::ForcedPush),
            Direction::ForcedPush,
        )];
        self.run_phases(&phases, progress).await
    }

    /// Terminate the active cycle, if any.
    ///
    /// The in-flight phase is killed, fails with [`Error::Cancelled`],
    /// and any later phase of the cycle never starts. With no active
    /// cycle this is a no-op.
    pub fn cancel(&self) {
        if let Ok(active) = self.active.lock()
            && let Some(token) = active.as_ref()
        {
            token.cancel();
        }
    }

    /// True while a cycle is in flight.
    pub fn is_running(&self) -> bool {
        self.active.lock().map(|a| a.is_some()).unwrap_or(false)
    }

    /// Run phases sequentially under a single run slot: the next phase
    /// starts only after the previous one finished successfully.
    async fn run_phases(
        &self,
        phases: &[(RsyncCommand, Direction)],
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        let guard = self.begin()?;
        for (cmd, direction) in phases {
            self.run_command(cmd, *direction, progress.as_ref(), &guard.token)
                .await?;
        }
        Ok(())
    }

    /// Claim the single run slot, rejecting re-entry.
    fn begin(&self) -> Result<RunGuard<'_>> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| Error::config("executor state poisoned"))?;
        if active.is_some() {
            return Err(Error::Busy);
        }
        let token = CancellationToken::new();
        *active = Some(token.clone());
        Ok(RunGuard {
            active: &self.active,
            token,
        })
    }

    /// Spawn one built command and drive it to completion.
    ///
    /// Consumes stdout continuously, emitting a progress event for
    /// every percentage marker seen; enforces the output ceiling and
    /// the wall-clock deadline; reacts to cancellation. Exit status
    /// zero is the sole success signal.
    async fn run_command(
        &self,
        cmd: &RsyncCommand,
        direction: Direction,
        progress: Option<&ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        debug!(command = %cmd.to_command_line(), "starting {direction}");

        let mut child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                self.notifier
                    .notify(&format!("{direction} failed to start: {e}"));
                Error::Spawn {
                    program: cmd.program.clone(),
                    source: e,
                }
            })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::config("child stdout was not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::config("child stderr was not captured"))?;

        let deadline = tokio::time::Instant::now() + self.options.timeout;
        let mut out_buf = [0u8; 8192];
        let mut err_buf = [0u8; 8192];
        let mut err_text = String::new();
        let mut total_bytes = 0usize;
        let mut stdout_done = false;
        let mut stderr_done = false;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    let _ = child.kill().await;
                    self.notifier.notify(&format!("{direction} cancelled"));
                    return Err(Error::Cancelled {
                        direction: direction.to_string(),
                    });
                }
                () = tokio::time::sleep_until(deadline) => {
                    let _ = child.kill().await;
                    let seconds = self.options.timeout.as_secs();
                    self.notifier
                        .notify(&format!("{direction} timed out after {seconds}s"));
                    return Err(Error::Timeout {
                        direction: direction.to_string(),
                        seconds,
                    });
                }
                read = stdout.read(&mut out_buf), if !stdout_done => {
                    match read {
                        Ok(0) => stdout_done = true,
                        Ok(n) => {
                            total_bytes += n;
                            if total_bytes > self.options.max_output_bytes {
                                let _ = child.kill().await;
                                return self.overflow(direction);
                            }
                            let text = String::from_utf8_lossy(&out_buf[..n]);
                            // rsync rewrites progress lines with \r
                            for line in text.split(['\n', '\r']) {
                                if let Some(pct) = scan_percentage(line) {
                                    emit(progress, direction, pct);
                                }
                            }
                        }
                        Err(e) => {
                            warn!("error reading {direction} stdout: {e}");
                            stdout_done = true;
                        }
                    }
                }
                read = stderr.read(&mut err_buf), if !stderr_done => {
                    match read {
                        Ok(0) => stderr_done = true,
                        Ok(n) => {
                            total_bytes += n;
                            if total_bytes > self.options.max_output_bytes {
                                let _ = child.kill().await;
                                return self.overflow(direction);
                            }
                            err_text.push_str(&String::from_utf8_lossy(&err_buf[..n]));
                        }
                        Err(e) => {
                            warn!("error reading {direction} stderr: {e}");
                            stderr_done = true;
                        }
                    }
                }
                status = child.wait(), if stdout_done && stderr_done => {
                    let status = status.map_err(|e| Error::io(e, None, "wait for child"))?;
                    if status.success() {
                        emit(progress, direction, 100);
                        self.notifier.notify(&format!("{direction} completed"));
                        return Ok(());
                    }
                    let stderr_trimmed = err_text.trim().to_string();
                    let detail = if stderr_trimmed.is_empty() {
                        status.to_string()
                    } else {
                        stderr_trimmed.clone()
                    };
                    self.notifier.notify(&format!("{direction} failed: {detail}"));
                    return Err(Error::Process {
                        direction: direction.to_string(),
                        status: status.to_string(),
                        stderr: stderr_trimmed,
                    });
                }
            }
        }
    }

    fn overflow(&self, direction: Direction) -> Result<()> {
        let limit = self.options.max_output_bytes;
        self.notifier.notify(&format!(
            "{direction} produced more than {limit} bytes of output, killed"
        ));
        Err(Error::OutputOverflow {
            direction: direction.to_string(),
            limit,
        })
    }
}

/// Best-effort progress delivery: a panicking callback must never
/// break the process-output path.
fn emit(progress: Option<&ProgressCallback>, direction: Direction, percentage: u8) {
    if let Some(cb) = progress {
        let event = ProgressEvent {
            direction,
            percentage,
        };
        if std::panic::catch_unwind(AssertUnwindSafe(|| cb(event))).is_err() {
            warn!("progress callback panicked; continuing");
        }
    }
}

/// Releases the run slot when a cycle ends, however it ends.
struct RunGuard<'a> {
    active: &'a Mutex<Option<CancellationToken>>,
    token: CancellationToken,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            *active = None;
        }
    }
}
