use std::sync::Arc;

use tokio::sync::watch;

use crate::config::Config;
use crate::queue::SubmissionQueue;
use crate::store::ReportStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ReportStore>,
    pub queue: Arc<SubmissionQueue>,
    pub shutdown: watch::Sender<bool>,
}

impl AppState {
    /// Stop the processor and janitor tasks.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
