use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{WorkReport, WorkReportPayload};

pub async fn create(pool: &PgPool, payload: &WorkReportPayload) -> Result<WorkReport, sqlx::Error> {
    sqlx::query_as::<_, WorkReport>(
        "INSERT INTO work_reports
             (tenant_id, employee_id, report_date, name, email, department, status, work_report, on_duty)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(payload.tenant_id)
    .bind(&payload.employee_id)
    .bind(payload.date)
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.department)
    .bind(payload.status.as_str())
    .bind(payload.work_report.as_deref())
    .bind(payload.on_duty)
    .fetch_one(pool)
    .await
}

pub async fn find_by_key(
    pool: &PgPool,
    tenant_id: Uuid,
    employee_id: &str,
    date: NaiveDate,
) -> Result<Option<WorkReport>, sqlx::Error> {
    sqlx::query_as::<_, WorkReport>(
        "SELECT * FROM work_reports
         WHERE tenant_id = $1 AND employee_id = $2 AND report_date = $3",
    )
    .bind(tenant_id)
    .bind(employee_id)
    .bind(date)
    .fetch_optional(pool)
    .await
}

pub async fn list_by_employee(
    pool: &PgPool,
    tenant_id: Uuid,
    employee_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<WorkReport>, sqlx::Error> {
    sqlx::query_as::<_, WorkReport>(
        "SELECT * FROM work_reports
         WHERE tenant_id = $1 AND employee_id = $2
           AND ($3::date IS NULL OR report_date >= $3)
           AND ($4::date IS NULL OR report_date <= $4)
         ORDER BY report_date DESC",
    )
    .bind(tenant_id)
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}
