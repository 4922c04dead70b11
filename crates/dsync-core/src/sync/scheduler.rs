//! Interval-based auto-sync.
//!
//! Each scheduled source owns one [`AutoSyncHandle`]. Dropping the handle
//! aborts its timer task, so replacing or removing a map entry is all it
//! takes to cancel. The task only holds a weak reference to the
//! orchestrator and stops on its own once the orchestrator is gone.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::model::SyncSource;
use super::SyncOrchestrator;

/// A live auto-sync timer. Aborted on drop.
#[derive(Debug)]
pub struct AutoSyncHandle {
    source_id: String,
    period: Duration,
    task: JoinHandle<()>,
}

impl AutoSyncHandle {
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AutoSyncHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!(source_id = %self.source_id, "Auto-sync timer cancelled");
    }
}

pub struct AutoSyncScheduler {
    orchestrator: Weak<SyncOrchestrator>,
    handles: Mutex<HashMap<String, AutoSyncHandle>>,
}

impl AutoSyncScheduler {
    pub fn new(orchestrator: Weak<SyncOrchestrator>) -> Self {
        Self {
            orchestrator,
            handles: Mutex::new(HashMap::new()),
        }
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<String, AutoSyncHandle>> {
        self.handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// (Re)start the timer for `source`. Any previous timer is cancelled
    /// first. Returns whether a timer is now running.
    pub fn schedule(&self, source: &SyncSource) -> bool {
        let previous = self.handles().remove(&source.id);
        drop(previous);

        let Some(period) = source.auto_sync_interval() else {
            return false;
        };

        let orchestrator = self.orchestrator.clone();
        let source_id = source.id.clone();
        let task = tokio::spawn(run_timer(orchestrator, source_id.clone(), period));

        info!(source_id = %source.id, minutes = period.as_secs() / 60, "Auto-sync scheduled");
        self.handles().insert(
            source_id.clone(),
            AutoSyncHandle {
                source_id,
                period,
                task,
            },
        );
        true
    }

    /// Cancel the timer for `source_id`. Returns whether one was running.
    pub fn cancel(&self, source_id: &str) -> bool {
        let handle = self.handles().remove(source_id);
        handle.is_some()
    }

    pub fn cancel_all(&self) {
        let handles: Vec<AutoSyncHandle> = self.handles().drain().map(|(_, h)| h).collect();
        drop(handles);
    }

    pub fn is_scheduled(&self, source_id: &str) -> bool {
        self.handles().get(source_id).is_some_and(|h| !h.is_finished())
    }

    /// Ids of sources with a live timer, sorted.
    pub fn scheduled(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .handles()
            .values()
            .filter(|h| !h.is_finished())
            .map(|h| h.source_id.clone())
            .collect();
        ids.sort();
        ids
    }
}

async fn run_timer(orchestrator: Weak<SyncOrchestrator>, source_id: String, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(orchestrator) = orchestrator.upgrade() else {
            debug!(source_id = %source_id, "Orchestrator dropped, stopping auto-sync");
            return;
        };
        let result = orchestrator.sync(&source_id).await;
        if result.success {
            debug!(source_id = %source_id, changes = result.changes, "Auto-sync finished");
        } else {
            warn!(source_id = %source_id, errors = ?result.errors, "Auto-sync failed");
        }
    }
}
