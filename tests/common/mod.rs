#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use workreport::auth::jwt::{self, Claims};
use workreport::config::{Config, StoreBackend};
use workreport::models::{QueueItem, ReportStatus, WorkReport, WorkReportPayload};
use workreport::queue::{QueueConfig, SubmissionQueue};
use workreport::store::{MemoryReportStore, ReportStore, StoreError};
use workreport::worker;

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";

/// In-memory store with scripted failures for `create`.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryReportStore,
    scripted: Mutex<HashMap<String, VecDeque<StoreError>>>,
    always: Mutex<HashMap<String, StoreError>>,
    delay: Mutex<Option<Duration>>,
    create_calls: Mutex<Vec<String>>,
    created: Mutex<Vec<String>>,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next `times` creates for this employee with `err`.
    pub fn fail_next(&self, employee_id: &str, times: usize, err: StoreError) {
        let mut scripted = self.scripted.lock().unwrap();
        let queue = scripted.entry(employee_id.to_string()).or_default();
        for _ in 0..times {
            queue.push_back(err.clone());
        }
    }

    pub fn fail_always(&self, employee_id: &str, err: StoreError) {
        self.always
            .lock()
            .unwrap()
            .insert(employee_id.to_string(), err);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Number of `create` calls made for an employee, failed ones included.
    pub fn create_attempts(&self, employee_id: &str) -> usize {
        self.create_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == employee_id)
            .count()
    }

    /// Employees whose rows were written, in write order.
    pub fn created_order(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn row_count(&self) -> usize {
        self.inner.len()
    }

    pub async fn rows_for(&self, tenant_id: Uuid, employee_id: &str) -> Vec<WorkReport> {
        self.inner
            .list_by_employee(tenant_id, employee_id, None, None)
            .await
            .unwrap()
    }

    /// Write a row directly, bypassing the queue.
    pub async fn insert_direct(&self, payload: &WorkReportPayload) -> WorkReport {
        self.inner.create(payload).await.unwrap()
    }

    fn scripted_failure(&self, employee_id: &str) -> Option<StoreError> {
        if let Some(err) = self.always.lock().unwrap().get(employee_id) {
            return Some(err.clone());
        }
        self.scripted
            .lock()
            .unwrap()
            .get_mut(employee_id)
            .and_then(|q| q.pop_front())
    }
}

#[async_trait]
impl ReportStore for FlakyStore {
    async fn find_by_key(
        &self,
        tenant_id: Uuid,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WorkReport>, StoreError> {
        self.inner.find_by_key(tenant_id, employee_id, date).await
    }

    async fn create(&self, payload: &WorkReportPayload) -> Result<WorkReport, StoreError> {
        self.create_calls
            .lock()
            .unwrap()
            .push(payload.employee_id.clone());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.scripted_failure(&payload.employee_id) {
            return Err(err);
        }

        let report = self.inner.create(payload).await?;
        self.created
            .lock()
            .unwrap()
            .push(payload.employee_id.clone());
        Ok(report)
    }

    async fn list_by_employee(
        &self,
        tenant_id: Uuid,
        employee_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<WorkReport>, StoreError> {
        self.inner
            .list_by_employee(tenant_id, employee_id, from, to)
            .await
    }
}

// ── Queue helpers ───────────────────────────────────────────────

/// Default policy with short backoff so retries finish quickly.
pub fn fast_config() -> QueueConfig {
    QueueConfig {
        backoff_base: Duration::from_millis(10),
        ..QueueConfig::default()
    }
}

pub fn payload(employee_id: &str, date: &str) -> WorkReportPayload {
    tenant_payload(Uuid::nil(), employee_id, date)
}

pub fn tenant_payload(tenant_id: Uuid, employee_id: &str, date: &str) -> WorkReportPayload {
    WorkReportPayload {
        tenant_id,
        employee_id: employee_id.to_string(),
        date: date.parse().unwrap(),
        name: format!("Employee {employee_id}"),
        email: format!("{}@example.com", employee_id.to_lowercase()),
        department: "Engineering".to_string(),
        status: ReportStatus::Working,
        work_report: Some("did X".to_string()),
        on_duty: false,
    }
}

pub fn new_queue(store: Arc<FlakyStore>, config: QueueConfig) -> Arc<SubmissionQueue> {
    Arc::new(SubmissionQueue::new(store, config))
}

/// A running processor. Dropping the sender also stops it.
pub struct Processor {
    pub shutdown: watch::Sender<bool>,
    pub handle: JoinHandle<()>,
}

impl Processor {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("processor did not stop")
            .unwrap();
    }
}

pub fn start_processor(queue: &Arc<SubmissionQueue>) -> Processor {
    let (shutdown, rx) = watch::channel(false);
    let handle = worker::spawn(queue.clone(), rx);
    Processor { shutdown, handle }
}

/// Poll until the item reaches `completed` or `failed`.
pub async fn wait_for_terminal(queue: &SubmissionQueue, id: Uuid) -> QueueItem {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let item = queue.get_status(id).expect("queue item disappeared");
        if item.state.is_terminal() {
            return item;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "item {id} stuck in {:?}",
            item.state
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// ── HTTP test app ───────────────────────────────────────────────

/// A running test server backed by a scriptable in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<FlakyStore>,
    pub tenant_id: Uuid,
    pub state: workreport::state::SharedState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn token(&self, employee_id: &str, role: &str) -> String {
        self.token_in(self.tenant_id, employee_id, role)
    }

    pub fn token_in(&self, tenant_id: Uuid, employee_id: &str, role: &str) -> String {
        jwt::encode_token(&Claims::new(employee_id, tenant_id, role), JWT_SECRET).unwrap()
    }

    pub async fn submit(&self, token: &str, body: &Value) -> (Value, StatusCode) {
        self.post_auth("/api/v1/work-reports", token, body).await
    }

    /// Poll a tracking id until its state is terminal.
    pub async fn wait_for_terminal(&self, token: &str, tracking_id: &str) -> Value {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let (body, status) = self
                .get_auth(&format!("/api/v1/work-reports/queue/{tracking_id}"), token)
                .await;
            assert_eq!(status, StatusCode::OK, "status poll failed: {body}");
            if matches!(body["state"].as_str(), Some("completed") | Some("failed")) {
                return body;
            }
            assert!(tokio::time::Instant::now() < deadline, "submission stuck: {body}");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn report_body(employee_id: &str, date: &str) -> Value {
    json!({
        "employee_id": employee_id,
        "date": date,
        "name": format!("Employee {employee_id}"),
        "email": format!("{}@example.com", employee_id.to_lowercase()),
        "department": "Engineering",
        "status": "working",
        "work_report": "did X",
    })
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        jwt_secret: JWT_SECRET.to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        log_level: "warn".to_string(),
        store: StoreBackend::Memory,
        queue: fast_config(),
        janitor_interval: Duration::from_secs(60),
    }
}

/// Spawn a test server on a random port.
pub async fn spawn_app() -> TestApp {
    let store = FlakyStore::new();
    let (app, state) = workreport::build_app(store.clone(), test_config());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        store,
        tenant_id: Uuid::now_v7(),
        state,
    }
}
