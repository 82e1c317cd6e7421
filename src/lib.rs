pub mod config;
pub mod error;
pub mod state;
pub mod auth;
pub mod db;
pub mod models;
pub mod routes;
pub mod store;
pub mod submission;
pub mod queue;
pub mod worker;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::queue::SubmissionQueue;
use crate::state::{AppState, SharedState};
use crate::store::ReportStore;

/// Submission bodies are small JSON documents.
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Build the router and start the submission processor and history janitor.
/// Must be called from within a Tokio runtime.
pub fn build_app(store: Arc<dyn ReportStore>, config: Config) -> (Router, SharedState) {
    let queue = Arc::new(SubmissionQueue::new(store.clone(), config.queue.clone()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    worker::spawn(queue.clone(), shutdown_rx.clone());
    worker::spawn_janitor(queue.clone(), config.janitor_interval, shutdown_rx);

    let state: SharedState = Arc::new(AppState {
        config,
        store,
        queue,
        shutdown: shutdown_tx,
    });

    let app = Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE)),
        )
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state.clone());

    (app, state)
}

async fn health() -> &'static str {
    "ok"
}
