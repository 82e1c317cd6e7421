use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{ReportStore, StoreError};
use crate::models::{WorkReport, WorkReportPayload};

/// Process-local report store. Used for local runs without PostgreSQL.
#[derive(Default)]
pub struct MemoryReportStore {
    rows: DashMap<(Uuid, String, NaiveDate), WorkReport>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn find_by_key(
        &self,
        tenant_id: Uuid,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WorkReport>, StoreError> {
        Ok(self
            .rows
            .get(&(tenant_id, employee_id.to_string(), date))
            .map(|row| row.value().clone()))
    }

    async fn create(&self, payload: &WorkReportPayload) -> Result<WorkReport, StoreError> {
        match self
            .rows
            .entry((payload.tenant_id, payload.employee_id.clone(), payload.date))
        {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "A work report for {} on {} already exists",
                payload.employee_id, payload.date
            ))),
            Entry::Vacant(slot) => {
                let report = WorkReport {
                    id: Uuid::now_v7(),
                    tenant_id: payload.tenant_id,
                    employee_id: payload.employee_id.clone(),
                    report_date: payload.date,
                    name: payload.name.clone(),
                    email: payload.email.clone(),
                    department: payload.department.clone(),
                    status: payload.status.as_str().to_string(),
                    work_report: payload.work_report.clone(),
                    on_duty: payload.on_duty,
                    created_at: Utc::now(),
                };
                slot.insert(report.clone());
                Ok(report)
            }
        }
    }

    async fn list_by_employee(
        &self,
        tenant_id: Uuid,
        employee_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<WorkReport>, StoreError> {
        let mut reports: Vec<WorkReport> = self
            .rows
            .iter()
            .filter(|row| row.tenant_id == tenant_id && row.employee_id == employee_id)
            .filter(|row| from.is_none_or(|f| row.report_date >= f))
            .filter(|row| to.is_none_or(|t| row.report_date <= t))
            .map(|row| row.value().clone())
            .collect();
        reports.sort_by(|a, b| b.report_date.cmp(&a.report_date));
        Ok(reports)
    }
}
