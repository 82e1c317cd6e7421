use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::{ReportReceipt, WorkReportPayload};
use crate::queue::SubmissionQueue;
use crate::store::StoreError;

const MIN_JANITOR_INTERVAL: Duration = Duration::from_millis(1);

/// Start the single submission processor. Runs until shutdown is signaled.
pub fn spawn(queue: Arc<SubmissionQueue>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(run(queue, shutdown))
}

/// Start the history janitor, applying the retention policy every `interval`.
pub fn spawn_janitor(
    queue: Arc<SubmissionQueue>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(MIN_JANITOR_INTERVAL));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    queue.prune_history();
                }
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Queue janitor stopped");
    })
}

async fn run(queue: Arc<SubmissionQueue>, mut shutdown: watch::Receiver<bool>) {
    tracing::info!("Submission processor started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        if let Some(id) = queue.next_pending() {
            process_item(&queue, id).await;
            continue;
        }

        tokio::select! {
            _ = queue.notified() => {}
            res = shutdown.changed() => {
                if res.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!("Submission processor stopped");
}

async fn process_item(queue: &Arc<SubmissionQueue>, id: Uuid) {
    let Some(payload) = queue.begin(id) else {
        tracing::warn!("Queue item {id} is no longer pending, skipping");
        return;
    };

    tracing::debug!(
        "Processing work report {id} (employee={}, date={})",
        payload.employee_id,
        payload.date
    );

    match persist(queue, &payload).await {
        Ok(receipt) => {
            if receipt.created {
                tracing::info!("Work report {id} stored as {}", receipt.report_id);
            } else {
                tracing::info!(
                    "Work report {id} matched existing report {}, nothing written",
                    receipt.report_id
                );
            }
            queue.complete(id, receipt);
        }
        Err(e) if e.is_transient() => match queue.retry(id, e.to_string()) {
            Some(delay) => {
                tracing::warn!(
                    "Work report {id} hit a transient failure, retrying in {}ms: {e}",
                    delay.as_millis()
                );
                let queue = Arc::clone(queue);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    queue.requeue(id);
                });
            }
            None => {
                tracing::error!("Work report {id} failed after exhausting retries: {e}");
            }
        },
        Err(e) => {
            tracing::error!("Work report {id} failed: {e}");
            queue.fail(id, e.to_string());
        }
    }
}

/// Idempotent write: an existing row for the same (tenant, employee, date) counts as success.
async fn persist(
    queue: &SubmissionQueue,
    payload: &WorkReportPayload,
) -> Result<ReportReceipt, StoreError> {
    let store = queue.store();
    let limit = queue.config().store_timeout;

    let lookup = store.find_by_key(payload.tenant_id, &payload.employee_id, payload.date);
    if let Some(existing) = with_timeout(limit, lookup).await? {
        return Ok(ReportReceipt::existing(&existing));
    }

    let report = with_timeout(limit, store.create(payload)).await?;
    Ok(ReportReceipt::created(&report))
}

async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    tokio::time::timeout(limit, call).await.map_err(|_| {
        StoreError::Transient(format!("Store call timed out after {}ms", limit.as_millis()))
    })?
}
