//! The cron scheduler (C6): keeps one in-memory schedule entry per
//! automation and fires each one's dispatcher callback when it comes due,
//! skipping a fire that would overlap one still in flight rather than
//! queueing it up.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cron_expr::CronExpr;
use crate::error::QueueError;

/// Host-supplied callback that actually runs a workflow when its
/// automation comes due. The scheduler knows nothing about `engine` or
/// `db` — it only knows when to call this.
#[async_trait]
pub trait AutomationDispatcher: Send + Sync {
    async fn dispatch(&self, automation_id: Uuid, workflow_id: String);
}

struct Entry {
    workflow_id: String,
    expr: CronExpr,
    next_run_at: DateTime<Utc>,
    enabled: bool,
}

/// Polls its in-memory schedule on a fixed tick and fires due automations
/// through an [`AutomationDispatcher`]. One instance per process; cheap to
/// clone (it's a handle around shared state).
#[derive(Clone)]
pub struct CronScheduler {
    entries: Arc<RwLock<HashMap<Uuid, Entry>>>,
    running: Arc<tokio::sync::Mutex<HashSet<Uuid>>>,
    dispatcher: Arc<dyn AutomationDispatcher>,
    tick: Duration,
}

impl CronScheduler {
    pub fn new(dispatcher: Arc<dyn AutomationDispatcher>) -> Self {
        Self::with_tick(dispatcher, Duration::from_secs(1))
    }

    pub fn with_tick(dispatcher: Arc<dyn AutomationDispatcher>, tick: Duration) -> Self {
        Self { entries: Arc::default(), running: Arc::default(), dispatcher, tick }
    }

    pub async fn schedule(
        &self,
        automation_id: Uuid,
        workflow_id: String,
        expression: &str,
        timezone: &str,
    ) -> Result<(), QueueError> {
        let expr = CronExpr::parse(expression, timezone)?;
        let next_run_at = expr.next_after(Utc::now())?;
        self.entries.write().await.insert(automation_id, Entry { workflow_id, expr, next_run_at, enabled: true });
        Ok(())
    }

    pub async fn reschedule(&self, automation_id: Uuid, expression: &str, timezone: &str) -> Result<(), QueueError> {
        let expr = CronExpr::parse(expression, timezone)?;
        let next_run_at = expr.next_after(Utc::now())?;
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&automation_id).ok_or(QueueError::NotScheduled(automation_id))?;
        entry.expr = expr;
        entry.next_run_at = next_run_at;
        Ok(())
    }

    pub async fn set_enabled(&self, automation_id: Uuid, enabled: bool) -> Result<(), QueueError> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&automation_id).ok_or(QueueError::NotScheduled(automation_id))?;
        entry.enabled = enabled;
        Ok(())
    }

    pub async fn unschedule(&self, automation_id: Uuid) {
        self.entries.write().await.remove(&automation_id);
    }

    pub async fn next_run_at(&self, automation_id: Uuid) -> Option<DateTime<Utc>> {
        self.entries.read().await.get(&automation_id).map(|e| e.next_run_at)
    }

    /// How many automations are currently scheduled, for a status endpoint.
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// How many fires are in flight right now, skipped on overlap rather
    /// than queued.
    pub async fn running_count(&self) -> usize {
        self.running.lock().await.len()
    }

    /// Fire an automation immediately, regardless of its schedule —
    /// respects the run-lock like a normal tick would.
    pub async fn fire(&self, automation_id: Uuid, workflow_id: String) {
        self.try_dispatch(automation_id, workflow_id).await;
    }

    /// Spawn the polling loop. Returns a handle the caller can abort for a
    /// graceful shutdown.
    pub fn start(&self) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.tick);
            loop {
                interval.tick().await;
                scheduler.tick_once().await;
            }
        })
    }

    async fn tick_once(&self) {
        let now = Utc::now();
        let due: Vec<(Uuid, String)> = {
            let mut entries = self.entries.write().await;
            let mut due = Vec::new();
            for (id, entry) in entries.iter_mut() {
                if entry.enabled && entry.next_run_at <= now {
                    due.push((*id, entry.workflow_id.clone()));
                    if let Ok(next) = entry.expr.next_after(now) {
                        entry.next_run_at = next;
                    } else {
                        entry.enabled = false;
                        warn!(automation_id = %id, "cron schedule exhausted, disabling automation");
                    }
                }
            }
            due
        };

        for (id, workflow_id) in due {
            let scheduler = self.clone();
            tokio::spawn(async move {
                scheduler.try_dispatch(id, workflow_id).await;
            });
        }
    }

    async fn try_dispatch(&self, automation_id: Uuid, workflow_id: String) {
        {
            let mut running = self.running.lock().await;
            if running.contains(&automation_id) {
                warn!(automation_id = %automation_id, "overlap_skipped: previous run still in flight");
                return;
            }
            running.insert(automation_id);
        }

        info!(automation_id = %automation_id, %workflow_id, "firing automation");
        self.dispatcher.dispatch(automation_id, workflow_id).await;

        self.running.lock().await.remove(&automation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    struct CountingDispatcher {
        count: AtomicUsize,
    }

    #[async_trait]
    impl AutomationDispatcher for CountingDispatcher {
        async fn dispatch(&self, _automation_id: Uuid, _workflow_id: String) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn schedule_computes_a_future_next_run() {
        let dispatcher = Arc::new(CountingDispatcher { count: AtomicUsize::new(0) });
        let scheduler = CronScheduler::new(dispatcher);
        let id = Uuid::new_v4();
        scheduler.schedule(id, "wf".to_string(), "* * * * *", "UTC").await.unwrap();
        assert!(scheduler.next_run_at(id).await.is_some());
    }

    #[tokio::test]
    async fn fire_invokes_the_dispatcher_once() {
        let dispatcher = Arc::new(CountingDispatcher { count: AtomicUsize::new(0) });
        let scheduler = CronScheduler::new(dispatcher.clone());
        scheduler.fire(Uuid::new_v4(), "wf".to_string()).await;
        assert_eq!(dispatcher.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unschedule_removes_the_entry() {
        let dispatcher = Arc::new(CountingDispatcher { count: AtomicUsize::new(0) });
        let scheduler = CronScheduler::new(dispatcher);
        let id = Uuid::new_v4();
        scheduler.schedule(id, "wf".to_string(), "* * * * *", "UTC").await.unwrap();
        scheduler.unschedule(id).await;
        assert!(scheduler.next_run_at(id).await.is_none());
        let _ = StdDuration::from_millis(0);
    }
}
