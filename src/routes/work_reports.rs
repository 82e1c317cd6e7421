use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::{QueueItem, WorkReport};
use crate::state::SharedState;
use crate::submission::fields::SubmitReport;
use crate::submission::pipeline;

#[derive(Deserialize)]
pub struct ListParams {
    pub employee_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Accept a daily report for asynchronous persistence. Responds 202 with a tracking id.
pub async fn submit(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<SubmitReport>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let result = pipeline::run(&state, &auth, &req).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "accepted",
            "tracking_id": result.tracking_id,
            "employee_id": result.employee_id,
        })),
    ))
}

/// Poll a submission. Unknown ids may simply have been cleaned from history.
pub async fn status(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QueueItem>, AppError> {
    let item = state
        .queue
        .get_status(id)
        .filter(|item| item.payload.tenant_id == auth.tenant_id)
        .filter(|item| auth.can_act_for(&item.payload.employee_id))
        .ok_or_else(|| {
            AppError::NotFound("Unknown tracking id (it may have been cleaned up)".to_string())
        })?;
    Ok(Json(item))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<WorkReport>>, AppError> {
    let employee_id = params
        .employee_id
        .unwrap_or_else(|| auth.employee_id.clone());

    if !auth.can_act_for(&employee_id) {
        return Err(AppError::Forbidden(
            "You can only view your own reports".to_string(),
        ));
    }

    if let (Some(from), Some(to)) = (params.from, params.to) {
        if from > to {
            return Err(AppError::BadRequest(
                "'from' must not be after 'to'".to_string(),
            ));
        }
    }

    let reports = state
        .store
        .list_by_employee(auth.tenant_id, &employee_id, params.from, params.to)
        .await?;
    Ok(Json(reports))
}
