use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::models::{FailureSummary, ItemState, QueueItem, ReportReceipt, WorkReportPayload};
use crate::store::ReportStore;

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Persistence attempts before an item fails for good.
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub history_max_age: Duration,
    pub history_max_items: usize,
    pub store_timeout: Duration,
    pub max_pending_age: Duration,
    pub max_failure_ratio: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
            history_max_age: Duration::from_secs(60 * 60),
            history_max_items: 10_000,
            store_timeout: Duration::from_secs(10),
            max_pending_age: Duration::from_secs(60),
            max_failure_ratio: 0.2,
        }
    }
}

impl QueueConfig {
    /// Delay before the re-drive that follows the `retries`-th failure: base * 2^(retries - 1).
    pub fn backoff(&self, retries: u32) -> Duration {
        let factor = 2u32.saturating_pow(retries.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }
}

/// Terminal items needed before the failure ratio affects health.
const MIN_TERMINAL_FOR_RATIO: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total_processed: u64,
    pub avg_processing_ms: Option<f64>,
    pub oldest_pending_age_ms: Option<i64>,
    pub healthy: bool,
}

/// In-memory submission queue for daily work reports.
///
/// Request handlers append through [`SubmissionQueue::enqueue`] and read through the
/// status methods. After insertion an item is only mutated by the processor task
/// in [`crate::worker`], which drains `pending` front to back.
pub struct SubmissionQueue {
    store: Arc<dyn ReportStore>,
    config: QueueConfig,
    items: DashMap<Uuid, QueueItem>,
    pending: Mutex<VecDeque<Uuid>>,
    wake: Notify,
    next_seq: AtomicU64,
    processed: AtomicU64,
}

impl SubmissionQueue {
    pub fn new(store: Arc<dyn ReportStore>, config: QueueConfig) -> Self {
        Self {
            store,
            config,
            items: DashMap::new(),
            pending: Mutex::new(VecDeque::new()),
            wake: Notify::new(),
            next_seq: AtomicU64::new(0),
            processed: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Append a validated payload and return its tracking id. Never blocks on persistence.
    pub fn enqueue(&self, payload: WorkReportPayload) -> Uuid {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let item = QueueItem::new(seq, payload);
        let id = item.id;

        tracing::debug!(
            "Enqueued work report {id} (employee={}, date={})",
            item.payload.employee_id,
            item.payload.date
        );

        self.items.insert(id, item);
        self.push_back(id);
        id
    }

    pub fn get_status(&self, id: Uuid) -> Option<QueueItem> {
        self.items.get(&id).map(|item| item.value().clone())
    }

    pub fn queue_status(&self) -> QueueStatus {
        let now = Utc::now();
        let mut status = QueueStatus {
            pending: 0,
            processing: 0,
            completed: 0,
            failed: 0,
            total_processed: self.processed.load(Ordering::Relaxed),
            avg_processing_ms: None,
            oldest_pending_age_ms: None,
            healthy: true,
        };
        let mut latency_sum = 0i64;
        let mut oldest_pending = None;

        for item in self.items.iter() {
            match item.state {
                ItemState::Pending => {
                    status.pending += 1;
                    if oldest_pending.is_none_or(|oldest| item.enqueued_at < oldest) {
                        oldest_pending = Some(item.enqueued_at);
                    }
                }
                ItemState::Processing => status.processing += 1,
                ItemState::Completed => {
                    status.completed += 1;
                    latency_sum += item.latency_ms().unwrap_or(0);
                }
                ItemState::Failed => status.failed += 1,
            }
        }

        if status.completed > 0 {
            status.avg_processing_ms = Some(latency_sum as f64 / status.completed as f64);
        }
        status.oldest_pending_age_ms =
            oldest_pending.map(|at| (now - at).num_milliseconds().max(0));

        let terminal = status.completed + status.failed;
        if terminal >= MIN_TERMINAL_FOR_RATIO
            && status.failed as f64 / terminal as f64 > self.config.max_failure_ratio
        {
            status.healthy = false;
        }
        if status
            .oldest_pending_age_ms
            .is_some_and(|age| age as u128 > self.config.max_pending_age.as_millis())
        {
            status.healthy = false;
        }

        status
    }

    /// Most recently enqueued failures first.
    pub fn recent_failures(&self, limit: usize) -> Vec<FailureSummary> {
        let mut failed: Vec<(u64, FailureSummary)> = self
            .items
            .iter()
            .filter(|item| item.state == ItemState::Failed)
            .map(|item| (item.seq, FailureSummary::from(item.value())))
            .collect();
        failed.sort_by(|a, b| b.0.cmp(&a.0));
        failed.into_iter().take(limit).map(|(_, f)| f).collect()
    }

    /// Drop every completed and failed item. Returns how many were removed.
    pub fn clear_history(&self) -> usize {
        let before = self.items.len();
        self.items.retain(|_, item| !item.state.is_terminal());
        let removed = before.saturating_sub(self.items.len());
        tracing::info!("Cleared {removed} finished items from queue history");
        removed
    }

    /// Apply the retention policy: evict terminal items older than `history_max_age`,
    /// then the oldest terminal items beyond `history_max_items`.
    pub fn prune_history(&self) -> usize {
        let now = Utc::now();
        let max_age = chrono::Duration::from_std(self.config.history_max_age)
            .unwrap_or(chrono::Duration::MAX);
        let before = self.items.len();

        self.items.retain(|_, item| match item.finished_at {
            Some(done) if item.state.is_terminal() => now - done < max_age,
            _ => true,
        });

        let mut terminal: Vec<(u64, Uuid)> = self
            .items
            .iter()
            .filter(|item| item.state.is_terminal())
            .map(|item| (item.seq, item.id))
            .collect();

        if terminal.len() > self.config.history_max_items {
            terminal.sort_unstable();
            let excess = terminal.len() - self.config.history_max_items;
            for (_, id) in terminal.into_iter().take(excess) {
                self.items.remove_if(&id, |_, item| item.state.is_terminal());
            }
        }

        let removed = before.saturating_sub(self.items.len());
        if removed > 0 {
            tracing::debug!("Pruned {removed} items from queue history");
        }
        removed
    }

    // Processor side. Only the worker task calls these.

    pub(crate) fn next_pending(&self) -> Option<Uuid> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    pub(crate) async fn notified(&self) {
        self.wake.notified().await
    }

    /// Put a retried item back at the tail.
    pub(crate) fn requeue(&self, id: Uuid) {
        if self.items.contains_key(&id) {
            self.push_back(id);
        }
    }

    /// Move a pending item to `processing` and hand out its payload.
    pub(crate) fn begin(&self, id: Uuid) -> Option<WorkReportPayload> {
        let mut item = self.items.get_mut(&id)?;
        if item.state != ItemState::Pending {
            return None;
        }
        item.state = ItemState::Processing;
        if item.started_at.is_none() {
            item.started_at = Some(Utc::now());
        }
        Some(item.payload.clone())
    }

    pub(crate) fn complete(&self, id: Uuid, receipt: ReportReceipt) {
        if let Some(mut item) = self.items.get_mut(&id) {
            item.state = ItemState::Completed;
            item.error = None;
            item.result = Some(receipt);
            item.finished_at = Some(Utc::now());
        }
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fail(&self, id: Uuid, error: String) {
        if let Some(mut item) = self.items.get_mut(&id) {
            item.state = ItemState::Failed;
            item.error = Some(error);
            item.finished_at = Some(Utc::now());
        }
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a transient failure. Returns the backoff before the item may be
    /// requeued, or `None` once retries are exhausted and the item has failed.
    pub(crate) fn retry(&self, id: Uuid, error: String) -> Option<Duration> {
        let retries = {
            let mut item = self.items.get_mut(&id)?;
            item.retries += 1;
            item.error = Some(error.clone());
            if item.retries < self.config.max_retries {
                item.state = ItemState::Pending;
                return Some(self.config.backoff(item.retries));
            }
            item.retries
        };
        tracing::debug!("Item {id} exhausted {retries} retries");
        self.fail(id, error);
        None
    }

    fn push_back(&self, id: Uuid) {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(id);
        self.wake.notify_one();
    }
}
