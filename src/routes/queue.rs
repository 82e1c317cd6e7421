use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::state::SharedState;

const DEFAULT_FAILURES: usize = 10;
const MAX_FAILURES: usize = 100;

#[derive(Deserialize)]
pub struct OverviewParams {
    pub failures: Option<usize>,
}

pub async fn overview(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<OverviewParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    let limit = params.failures.unwrap_or(DEFAULT_FAILURES).min(MAX_FAILURES);

    Ok(Json(json!({
        "status": state.queue.queue_status(),
        "recent_failures": state.queue.recent_failures(limit),
    })))
}

pub async fn clear_history(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    let cleared = state.queue.clear_history();
    tracing::info!("Queue history cleared by {} ({cleared} items)", auth.employee_id);

    Ok(Json(json!({ "cleared": cleared })))
}
