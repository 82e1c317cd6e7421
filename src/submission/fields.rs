use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{ReportStatus, WorkReportPayload};

/// Raw submission body. Everything is optional so that missing fields surface
/// as validation messages rather than deserialization rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitReport {
    pub employee_id: Option<String>,
    pub date: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub work_report: Option<String>,
    pub on_duty: Option<bool>,
}

/// Validate a submission and turn it into a queue payload.
///
/// `employee_id` defaults to the caller. Dates after `today` are rejected.
/// Every problem found is reported, not just the first.
pub fn validate(
    req: &SubmitReport,
    caller_id: &str,
    tenant_id: Uuid,
    today: NaiveDate,
) -> Result<WorkReportPayload, Vec<String>> {
    let mut errors = Vec::new();

    let employee_id = match non_empty(req.employee_id.as_deref()) {
        Some(id) => id,
        None if req.employee_id.is_none() => caller_id.trim().to_string(),
        None => {
            errors.push("Required field is empty: employee_id".to_string());
            String::new()
        }
    };

    let name = required(&mut errors, "name", req.name.as_deref());
    let email = required(&mut errors, "email", req.email.as_deref());
    let department = required(&mut errors, "department", req.department.as_deref());

    if !email.is_empty() && !email.contains('@') {
        errors.push("Invalid email format: email".to_string());
    }

    let date = match non_empty(req.date.as_deref()) {
        None => {
            errors.push("Missing required field: date".to_string());
            None
        }
        Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(d) if d > today => {
                errors.push("Date cannot be in the future".to_string());
                None
            }
            Ok(d) => Some(d),
            Err(_) => {
                errors.push("Invalid date format, expected YYYY-MM-DD: date".to_string());
                None
            }
        },
    };

    let status = match non_empty(req.status.as_deref()) {
        None => {
            errors.push("Missing required field: status".to_string());
            None
        }
        Some(raw) => {
            let parsed = ReportStatus::parse(&raw.to_lowercase());
            if parsed.is_none() {
                errors.push("Status must be 'working' or 'leave'".to_string());
            }
            parsed
        }
    };

    let work_report = non_empty(req.work_report.as_deref());
    if status == Some(ReportStatus::Working) && work_report.is_none() {
        errors.push("Work report is required when status is 'working'".to_string());
    }

    match (date, status) {
        (Some(date), Some(status)) if errors.is_empty() => Ok(WorkReportPayload {
            tenant_id,
            employee_id,
            date,
            name,
            email,
            department,
            status,
            work_report,
            on_duty: req.on_duty.unwrap_or(false),
        }),
        _ => Err(errors),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn required(errors: &mut Vec<String>, field: &str, value: Option<&str>) -> String {
    match (value, non_empty(value)) {
        (_, Some(v)) => v,
        (None, None) => {
            errors.push(format!("Missing required field: {field}"));
            String::new()
        }
        (Some(_), None) => {
            errors.push(format!("Required field is empty: {field}"));
            String::new()
        }
    }
}
