use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ReportStore, StoreError};
use crate::db;
use crate::models::{WorkReport, WorkReportPayload};

pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn find_by_key(
        &self,
        tenant_id: Uuid,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WorkReport>, StoreError> {
        db::work_reports::find_by_key(&self.pool, tenant_id, employee_id, date)
            .await
            .map_err(classify)
    }

    async fn create(&self, payload: &WorkReportPayload) -> Result<WorkReport, StoreError> {
        db::work_reports::create(&self.pool, payload)
            .await
            .map_err(classify)
    }

    async fn list_by_employee(
        &self,
        tenant_id: Uuid,
        employee_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<WorkReport>, StoreError> {
        db::work_reports::list_by_employee(&self.pool, tenant_id, employee_id, from, to)
            .await
            .map_err(classify)
    }
}

/// Map a sqlx error onto the retry taxonomy.
pub fn classify(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Transient(err.to_string()),
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(db_err.message().to_string())
        }
        other => StoreError::Permanent(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn connection_level_errors_are_transient() {
        let errors = [
            sqlx::Error::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")),
            sqlx::Error::Protocol("unexpected message".to_string()),
            sqlx::Error::PoolTimedOut,
            sqlx::Error::PoolClosed,
            sqlx::Error::WorkerCrashed,
        ];

        for err in errors {
            let label = err.to_string();
            assert!(classify(err).is_transient(), "{label} should be transient");
        }
    }

    #[test]
    fn query_errors_are_permanent() {
        assert!(matches!(
            classify(sqlx::Error::RowNotFound),
            StoreError::Permanent(_)
        ));
        assert!(matches!(
            classify(sqlx::Error::ColumnNotFound("report_date".to_string())),
            StoreError::Permanent(msg) if msg.contains("report_date")
        ));
    }
}
