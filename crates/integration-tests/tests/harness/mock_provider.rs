//! Mock image provider server for integration tests
//!
//! Serves the `OpenAI` images API and the Stability v1 text-to-image API
//! with canned images. Prompts containing "fail" are rejected with a 429,
//! and the bearer token `bad-key` with a 401.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Base64 of `hello`, returned as every inline image
pub const IMAGE_B64: &str = "aGVsbG8=";

/// Bytes served for hosted image URLs
pub const HOSTED_IMAGE: &[u8] = b"hosted png bytes";

/// Bearer token the mock rejects as invalid
pub const BAD_KEY: &str = "bad-key";

/// Mock provider backend recording every generation request
pub struct MockProvider {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    origin: String,
    openai_count: AtomicU32,
    stability_count: AtomicU32,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// A generation request as the mock received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

impl MockProvider {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(MockState {
            origin: format!("http://{addr}"),
            openai_count: AtomicU32::new(0),
            stability_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/images/generations", routing::post(handle_openai))
            .route("/v1/generation/{engine}/text-to-image", routing::post(handle_stability))
            .route("/files/{name}", routing::get(handle_file))
            .with_state(Arc::clone(&state));

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    ///
    /// Includes `/v1` since both providers append their API paths to it
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// URL of a hosted image served by the mock
    pub fn file_url(&self, name: &str) -> String {
        format!("http://{}/files/{name}", self.addr)
    }

    /// Number of `OpenAI` image generation requests received
    pub fn openai_count(&self) -> u32 {
        self.state.openai_count.load(Ordering::Relaxed)
    }

    /// Number of Stability text-to-image requests received
    pub fn stability_count(&self) -> u32 {
        self.state.stability_count.load(Ordering::Relaxed)
    }

    /// Every generation request received, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// The most recent generation request
    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request received")
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl MockState {
    fn record(&self, path: String, headers: &HeaderMap, body: &Value) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        self.requests.lock().unwrap().push(RecordedRequest {
            path,
            authorization,
            body: body.clone(),
        });
    }
}

/// Canned rejection for bad credentials and prompts asking to fail
fn rejection(headers: &HeaderMap, prompt: &str) -> Option<Response> {
    let bad_key = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {BAD_KEY}"));

    if bad_key {
        let body = json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}});
        return Some((StatusCode::UNAUTHORIZED, Json(body)).into_response());
    }

    if prompt.contains("fail") {
        let body = json!({"error": {"message": "Rate limit reached for images per minute", "type": "requests"}});
        return Some((StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response());
    }

    None
}

async fn handle_openai(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.openai_count.fetch_add(1, Ordering::Relaxed);
    state.record("/v1/images/generations".to_owned(), &headers, &body);

    let prompt = body["prompt"].as_str().unwrap_or_default();
    if let Some(response) = rejection(&headers, prompt) {
        return response;
    }

    let data = if body["response_format"] == "url" {
        json!({
            "url": format!("{}/files/mock.png", state.origin),
            "revised_prompt": format!("A detailed rendering of {prompt}"),
        })
    } else {
        json!({"b64_json": IMAGE_B64})
    };

    Json(json!({"created": 1_700_000_000, "data": [data]})).into_response()
}

async fn handle_stability(
    State(state): State<Arc<MockState>>,
    Path(engine): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.stability_count.fetch_add(1, Ordering::Relaxed);
    state.record(format!("/v1/generation/{engine}/text-to-image"), &headers, &body);

    let prompt = body["text_prompts"][0]["text"].as_str().unwrap_or_default();
    if let Some(response) = rejection(&headers, prompt) {
        return response;
    }

    let artifact = json!({
        "base64": IMAGE_B64,
        "seed": 42,
        "finishReason": "SUCCESS",
        "width": body["width"],
        "height": body["height"],
    });

    Json(json!({"artifacts": [artifact]})).into_response()
}

/// Hosted image; names starting with `slow` stall long enough to time out
async fn handle_file(Path(name): Path<String>) -> impl IntoResponse {
    if name.starts_with("slow") {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    }

    ([(header::CONTENT_TYPE, "image/png")], HOSTED_IMAGE)
}
