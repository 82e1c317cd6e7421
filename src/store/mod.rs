pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{WorkReport, WorkReportPayload};

pub use memory::MemoryReportStore;
pub use postgres::PgReportStore;

/// Failure of a store call, split by whether retrying can help.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Connection drop, timeout or similar. Expected to succeed on retry.
    Transient(String),
    /// A report for the same (employee, date) already exists.
    Conflict(String),
    Permanent(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Transient(msg) => write!(f, "Transient store error: {msg}"),
            StoreError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            StoreError::Permanent(msg) => write!(f, "Store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistence for daily work reports. One row per (tenant, employee, date).
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn find_by_key(
        &self,
        tenant_id: Uuid,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WorkReport>, StoreError>;

    async fn create(&self, payload: &WorkReportPayload) -> Result<WorkReport, StoreError>;

    async fn list_by_employee(
        &self,
        tenant_id: Uuid,
        employee_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<WorkReport>, StoreError>;
}
