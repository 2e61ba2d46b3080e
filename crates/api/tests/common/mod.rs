#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aether_api::config::{ServerConfig, SonautoSettings};
use aether_api::router::build_app_router;
use aether_api::state::AppState;
use aether_sonauto::api::SonautoApi;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, Response, StatusCode};
use axum::routing::{self, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const TEST_ORIGIN: &str = "http://localhost:5173";

// ---------------------------------------------------------------------------
// Fake Sonauto server
// ---------------------------------------------------------------------------

/// How the fake remote task ends.
#[derive(Clone)]
pub enum FakeOutcome {
    Success { songs: usize, lyrics: &'static str },
    Failure(&'static str),
    /// Reports `GENERATING` forever.
    Never,
}

#[derive(Clone)]
struct FakeState {
    base_url: String,
    outcome: FakeOutcome,
    statuses: Arc<Mutex<VecDeque<&'static str>>>,
    submissions: Arc<Mutex<Vec<serde_json::Value>>>,
    polls: Arc<AtomicUsize>,
}

/// Handle to a running fake Sonauto API.
pub struct FakeSonauto {
    pub base_url: String,
    pub submissions: Arc<Mutex<Vec<serde_json::Value>>>,
    polls: Arc<AtomicUsize>,
}

impl FakeSonauto {
    pub fn submissions(&self) -> Vec<serde_json::Value> {
        self.submissions.lock().unwrap().clone()
    }

    /// Number of status requests served so far.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

/// Bytes served for the fake song at `index`.
pub fn fake_song_bytes(index: usize) -> Vec<u8> {
    format!("fake-mp3-{index}").into_bytes()
}

async fn submit(
    State(state): State<FakeState>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    state.submissions.lock().unwrap().push(body);
    Json(serde_json::json!({ "task_id": "fake-task" }))
}

async fn status(
    State(state): State<FakeState>,
    Path(_task_id): Path<String>,
) -> Json<serde_json::Value> {
    state.polls.fetch_add(1, Ordering::SeqCst);
    let next = state.statuses.lock().unwrap().pop_front();
    if let Some(status) = next {
        return Json(serde_json::json!({ "status": status }));
    }
    match &state.outcome {
        FakeOutcome::Success { songs, lyrics } => {
            let song_paths: Vec<String> = (0..*songs)
                .map(|i| format!("{}/files/{i}", state.base_url))
                .collect();
            Json(serde_json::json!({
                "status": "SUCCESS",
                "song_paths": song_paths,
                "lyrics": lyrics,
                "tags": ["test"],
            }))
        }
        FakeOutcome::Failure(message) => Json(serde_json::json!({
            "status": "FAILURE",
            "error_message": message,
        })),
        FakeOutcome::Never => Json(serde_json::json!({ "status": "GENERATING" })),
    }
}

async fn file(Path(index): Path<usize>) -> Result<Vec<u8>, StatusCode> {
    Ok(fake_song_bytes(index))
}

/// Serve a fake Sonauto API on an ephemeral port.
///
/// Each task reports `PROMPT`, `GENERATING`, then the given outcome.
/// The script is shared, so use one fake per generation.
pub async fn spawn_fake_sonauto(outcome: FakeOutcome) -> FakeSonauto {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let submissions = Arc::new(Mutex::new(Vec::new()));
    let polls = Arc::new(AtomicUsize::new(0));

    let state = FakeState {
        base_url: base_url.clone(),
        outcome,
        statuses: Arc::new(Mutex::new(VecDeque::from(["PROMPT", "GENERATING"]))),
        submissions: Arc::clone(&submissions),
        polls: Arc::clone(&polls),
    };

    let app = Router::new()
        .route("/v1/generations", post(submit))
        .route("/v1/generations/{task_id}", routing::get(status))
        .route("/files/{index}", routing::get(file))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeSonauto {
        base_url,
        submissions,
        polls,
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` pointing at `sonauto_url` with fast polling.
pub fn test_config(media_dir: &std::path::Path, sonauto_url: &str, api_key: Option<&str>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![TEST_ORIGIN.to_string()],
        request_timeout_secs: 30,
        media_dir: media_dir.to_string_lossy().into_owned(),
        sonauto: SonautoSettings {
            api_key: api_key.map(str::to_string),
            base_url: sonauto_url.to_string(),
            poll_interval_secs: 0,
            max_wait_secs: 30,
            max_retries: 1,
        },
    }
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(config: ServerConfig) -> Router {
    let api = SonautoApi::new(config.sonauto.base_url.clone()).unwrap();
    let state = AppState::from_config(config.clone(), api);
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Read an SSE response to the end and parse every `data:` frame as JSON.
pub async fn sse_records(response: Response<Body>) -> Vec<serde_json::Value> {
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    text.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim_start()).unwrap())
        .collect()
}
