#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use jobflow::api::{self, ApiState};
use jobflow::jobs::{JobRunner, JobsRepo, RunnerConfig};
use jobflow::notify::WebhookNotifier;

/// Completion delay used across tests. Short enough to wait out, long
/// enough that "immediately after run" assertions land before it fires.
pub const TEST_DELAY: Duration = Duration::from_millis(50);

pub fn build_app(pool: SqlitePool) -> Router {
    build_app_with(pool, None, TEST_DELAY)
}

/// Build the full application router the way `main` does, with a
/// test-controlled webhook target and completion delay.
pub fn build_app_with(pool: SqlitePool, webhook_url: Option<String>, delay: Duration) -> Router {
    let jobs = JobsRepo::new(pool);
    let runner = JobRunner::new(
        jobs.clone(),
        WebhookNotifier::new(webhook_url),
        RunnerConfig {
            completion_delay: delay,
        },
    );
    api::router(ApiState { jobs, runner })
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_empty(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

// ---------------------------------------------------------------------------
// Webhook sink
// ---------------------------------------------------------------------------

pub type Received = Arc<Mutex<Vec<Value>>>;

async fn hook(State(sink): State<Received>, Json(body): Json<Value>) -> StatusCode {
    sink.lock().unwrap().push(body);
    StatusCode::OK
}

/// Serve a one-route webhook receiver on an ephemeral local port. Returns
/// the URL to configure and the shared vec of received bodies.
pub async fn start_webhook_sink() -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/hook", post(hook))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}/hook"), received)
}

/// Poll until the sink has at least `count` deliveries or `timeout` passes.
pub async fn wait_for_deliveries(received: &Received, count: usize, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if received.lock().unwrap().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
