pub mod queue;
pub mod work_reports;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Work reports
        .route(
            "/api/v1/work-reports",
            get(work_reports::list).post(work_reports::submit),
        )
        .route("/api/v1/work-reports/queue/{id}", get(work_reports::status))
        // Queue monitoring and maintenance
        .route("/api/v1/admin/queue", get(queue::overview))
        .route("/api/v1/admin/queue/clear-history", post(queue::clear_history))
}
