//! Interval-based background sync
//!
//! Runs a full sync cycle on a fixed interval until stopped. Ticks go
//! through the shared [`SyncExecutor`], so a manual sync in flight at
//! tick time makes the tick fail with `Busy`, which the scheduler
//! treats as a skip rather than an error.

use crate::executor::SyncExecutor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vaultsync_core::{Error, SyncSettings};

/// Convert a configured interval in minutes into a tick duration.
///
/// Zero or negative means scheduling is disabled.
pub fn interval_from_minutes(minutes: i64) -> Option<Duration> {
    let minutes = u64::try_from(minutes).ok()?;
    if minutes == 0 {
        return None;
    }
    Some(Duration::from_secs(minutes * 60))
}

/// Drives periodic sync cycles on a background task.
pub struct SyncScheduler {
    executor: Arc<SyncExecutor>,
    task: Mutex<Option<ScheduledTask>>,
}

struct ScheduledTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    pub fn new(executor: Arc<SyncExecutor>) -> Self {
        Self {
            executor,
            task: Mutex::new(None),
        }
    }

    /// Start ticking with the given settings and interval, replacing
    /// any previously scheduled task.
    ///
    /// The first cycle runs after one full interval, not immediately.
    pub fn start(&self, settings: SyncSettings, interval: Duration) {
        self.stop();

        let token = CancellationToken::new();
        let tick_token = token.clone();
        let executor = Arc::clone(&self.executor);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = tick_token.cancelled() => break,
                    () = tokio::time::sleep(interval) => {}
                }
                tokio::select! {
                    () = tick_token.cancelled() => break,
                    result = executor.execute_sync(&settings, None) => match result {
                        Ok(()) => debug!("scheduled sync completed"),
                        Err(Error::Busy) => {
                            debug!("scheduled sync skipped, another sync is running");
                        }
                        Err(e) => warn!("scheduled sync failed: {e}"),
                    }
                }
            }
        });

        if let Ok(mut task) = self.task.lock() {
            *task = Some(ScheduledTask { token, handle });
        }
    }

    /// Stop the scheduled task. An in-flight tick is interrupted,
    /// which kills its child process. No-op when nothing is scheduled.
    pub fn stop(&self) {
        let task = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(task) = task {
            task.token.cancel();
            task.handle.abort();
        }
    }

    /// True while a scheduled task exists.
    pub fn is_active(&self) -> bool {
        self.task.lock().map(|t| t.is_some()).unwrap_or(false)
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultsync_core::Notifier;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn completed_cycles(&self) -> usize {
            self.messages
                .lock()
                .map(|m| m.iter().filter(|msg| *msg == "push completed").count())
                .unwrap_or(0)
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            if let Ok(mut m) = self.messages.lock() {
                m.push(message.to_string());
            }
        }
    }

    fn quick_settings() -> SyncSettings {
        SyncSettings {
            // `true` ignores its arguments and exits 0
            binary_path: "true".to_string(),
            remote_host: "127.0.0.1".to_string(),
            ssh_username: "test".to_string(),
            local_dir_path: "/tmp/src".to_string(),
            remote_dir_path: "/tmp/dst".to_string(),
            ..SyncSettings::default()
        }
    }

    #[test]
    fn interval_conversion_rejects_non_positive_minutes() {
        assert_eq!(interval_from_minutes(0), None);
        assert_eq!(interval_from_minutes(-5), None);
        assert_eq!(interval_from_minutes(2), Some(Duration::from_secs(120)));
    }

    #[tokio::test]
    async fn scheduler_runs_cycles_until_stopped() {
        let notifier = Arc::new(RecordingNotifier::default());
        let executor = Arc::new(SyncExecutor::new(
            Arc::clone(&notifier) as Arc<dyn Notifier>
        ));
        let scheduler = SyncScheduler::new(executor);

        scheduler.start(quick_settings(), Duration::from_millis(50));
        assert!(scheduler.is_active());

        tokio::time::sleep(Duration::from_millis(400)).await;
        scheduler.stop();
        assert!(!scheduler.is_active());

        let ran = notifier.completed_cycles();
        assert!(ran >= 2, "expected at least two cycles, got {ran}");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(notifier.completed_cycles(), ran);
    }

    #[tokio::test]
    async fn restart_replaces_the_previous_task() {
        let notifier = Arc::new(RecordingNotifier::default());
        let executor = Arc::new(SyncExecutor::new(
            Arc::clone(&notifier) as Arc<dyn Notifier>
        ));
        let scheduler = SyncScheduler::new(executor);

        scheduler.start(quick_settings(), Duration::from_secs(3600));
        scheduler.start(quick_settings(), Duration::from_millis(50));
        assert!(scheduler.is_active());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(notifier.completed_cycles() >= 1);
        scheduler.stop();
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let executor = Arc::new(SyncExecutor::default());
        let scheduler = SyncScheduler::new(executor);
        scheduler.stop();
        assert!(!scheduler.is_active());
    }
}
