use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{WorkReport, WorkReportPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ItemState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Completed | ItemState::Failed)
    }
}

/// Identifying data of the stored report a queue item resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportReceipt {
    pub report_id: Uuid,
    pub employee_id: String,
    pub date: NaiveDate,
    /// False when the row already existed and nothing was written.
    pub created: bool,
}

impl ReportReceipt {
    pub fn created(report: &WorkReport) -> Self {
        Self::from_report(report, true)
    }

    pub fn existing(report: &WorkReport) -> Self {
        Self::from_report(report, false)
    }

    fn from_report(report: &WorkReport, created: bool) -> Self {
        Self {
            report_id: report.id,
            employee_id: report.employee_id.clone(),
            date: report.report_date,
            created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    pub id: Uuid,
    /// Enqueue order, used to rank failures.
    #[serde(skip)]
    pub seq: u64,
    pub payload: WorkReportPayload,
    pub state: ItemState,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub retries: u32,
    pub error: Option<String>,
    pub result: Option<ReportReceipt>,
}

impl QueueItem {
    pub fn new(seq: u64, payload: WorkReportPayload) -> Self {
        Self {
            id: Uuid::now_v7(),
            seq,
            payload,
            state: ItemState::Pending,
            enqueued_at: Utc::now(),
            started_at: None,
            finished_at: None,
            retries: 0,
            error: None,
            result: None,
        }
    }

    /// Milliseconds from enqueue to the terminal transition.
    pub fn latency_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|done| (done - self.enqueued_at).num_milliseconds())
    }
}

/// Operator-facing view of a failed item.
#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub id: Uuid,
    pub employee_id: String,
    pub date: NaiveDate,
    pub error: String,
    pub enqueued_at: DateTime<Utc>,
    pub failed_at: Option<DateTime<Utc>>,
    pub retries: u32,
}

impl From<&QueueItem> for FailureSummary {
    fn from(item: &QueueItem) -> Self {
        Self {
            id: item.id,
            employee_id: item.payload.employee_id.clone(),
            date: item.payload.date,
            error: item.error.clone().unwrap_or_default(),
            enqueued_at: item.enqueued_at,
            failed_at: item.finished_at,
            retries: item.retries,
        }
    }
}
