use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Working,
    Leave,
}

impl ReportStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "working" => Some(ReportStatus::Working),
            "leave" => Some(ReportStatus::Leave),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Working => "working",
            ReportStatus::Leave => "leave",
        }
    }
}

/// Validated work-report fields as accepted by the submission queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkReportPayload {
    pub tenant_id: Uuid,
    pub employee_id: String,
    pub date: NaiveDate,
    pub name: String,
    pub email: String,
    pub department: String,
    pub status: ReportStatus,
    pub work_report: Option<String>,
    pub on_duty: bool,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct WorkReport {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: String,
    pub report_date: NaiveDate,
    pub name: String,
    pub email: String,
    pub department: String,
    pub status: String,
    pub work_report: Option<String>,
    pub on_duty: bool,
    pub created_at: DateTime<Utc>,
}
