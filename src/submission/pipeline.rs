use chrono::Utc;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::state::SharedState;

use super::fields::{self, SubmitReport};

pub struct PipelineResult {
    pub tracking_id: Uuid,
    pub employee_id: String,
}

/// Validate, authorize, pre-check for an existing report, then enqueue.
///
/// The duplicate pre-check here only saves a queue round trip. The processor
/// repeats the check serially and is what actually guarantees one row per
/// (tenant, employee, date).
pub async fn run(
    state: &SharedState,
    auth: &AuthUser,
    req: &SubmitReport,
) -> Result<PipelineResult, AppError> {
    let today = Utc::now().date_naive();
    let payload = fields::validate(req, &auth.employee_id, auth.tenant_id, today)
        .map_err(|errors| AppError::BadRequest(errors.join("; ")))?;

    if !auth.can_act_for(&payload.employee_id) {
        return Err(AppError::Forbidden(
            "You can only submit reports for yourself".to_string(),
        ));
    }

    let precheck = tokio::time::timeout(
        state.queue.config().store_timeout,
        state
            .store
            .find_by_key(payload.tenant_id, &payload.employee_id, payload.date),
    )
    .await;

    match precheck {
        Ok(Ok(Some(existing))) => {
            return Err(AppError::Conflict(format!(
                "A work report for {} already exists (report {})",
                payload.date, existing.id
            )));
        }
        Ok(Ok(None)) => {}
        Ok(Err(e)) => {
            tracing::warn!("Duplicate pre-check failed, deferring to processor: {e}");
        }
        Err(_) => {
            tracing::warn!("Duplicate pre-check timed out, deferring to processor");
        }
    }

    let employee_id = payload.employee_id.clone();
    let tracking_id = state.queue.enqueue(payload);

    Ok(PipelineResult {
        tracking_id,
        employee_id,
    })
}
