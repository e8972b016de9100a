//! Mock OpenAI-compatible upstream for integration tests
//!
//! Serves `/v1/chat/completions` with canned replies, both JSON and SSE,
//! and records every request body it receives.

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Upstream API key the gateway is configured with
pub const UPSTREAM_KEY: &str = "upstream-key";

/// Canned behaviour of the mock
#[derive(Debug, Clone)]
pub enum Reply {
    /// Plain assistant text; streamed one word per chunk
    Text(String),
    /// One `get_weather` call for Paris
    ToolCall,
    /// 500 on every request
    Fail,
}

/// Running mock upstream
pub struct MockUpstream {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    reply: Reply,
    requests: Mutex<Vec<Value>>,
    authorizations: Mutex<Vec<Option<String>>>,
}

impl MockUpstream {
    /// Start a mock answering with `Hello from upstream`
    pub async fn start() -> anyhow::Result<Self> {
        Self::with_reply(Reply::Text("Hello from upstream".to_owned())).await
    }

    /// Start a mock with the given canned reply
    pub async fn with_reply(reply: Reply) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            reply,
            requests: Mutex::new(Vec::new()),
            authorizations: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let shutdown = CancellationToken::new();
        let stopped = shutdown.clone().cancelled_owned();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).with_graceful_shutdown(stopped).await;
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL including the `/v1` segment
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Request bodies received so far
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Last request body received
    pub fn last_request(&self) -> Value {
        self.requests().pop().expect("upstream received no request")
    }

    /// `Authorization` headers received so far
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.state.authorizations.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    state.authorizations.lock().unwrap().push(authorization);
    state.requests.lock().unwrap().push(body.clone());

    let model = body["model"].as_str().unwrap_or_default().to_owned();
    let stream = body["stream"].as_bool().unwrap_or(false);

    match (&state.reply, stream) {
        (Reply::Fail, _) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"message": "mock upstream failure", "type": "server_error"}})),
        )
            .into_response(),
        (reply, false) => Json(completion(reply, &model)).into_response(),
        (reply, true) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/event-stream")],
            sse_body(reply, &model),
        )
            .into_response(),
    }
}

fn completion(reply: &Reply, model: &str) -> Value {
    let (message, finish_reason) = match reply {
        Reply::Text(text) => (json!({"role": "assistant", "content": text}), "stop"),
        _ => (
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_upstream_1",
                    "type": "function",
                    "function": {"name": "get_weather", "arguments": "{\"city\":\"Paris\"}"}
                }]
            }),
            "tool_calls",
        ),
    };

    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{"index": 0, "message": message, "finish_reason": finish_reason}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
    })
}

fn chunk(model: &str, delta: &Value, finish_reason: Option<&str>) -> Value {
    json!({
        "id": "chatcmpl-mock-stream",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
    })
}

fn sse_body(reply: &Reply, model: &str) -> String {
    let mut chunks = vec![chunk(model, &json!({"role": "assistant", "content": ""}), None)];

    let finish_reason = match reply {
        Reply::Text(text) => {
            let words: Vec<&str> = text.split(' ').collect();
            for (i, word) in words.iter().enumerate() {
                let piece = if i + 1 < words.len() { format!("{word} ") } else { (*word).to_owned() };
                chunks.push(chunk(model, &json!({"content": piece}), None));
            }
            "stop"
        }
        _ => {
            let opening = json!({"tool_calls": [{
                "index": 0,
                "id": "call_upstream_1",
                "type": "function",
                "function": {"name": "get_weather", "arguments": ""}
            }]});
            chunks.push(chunk(model, &opening, None));
            for piece in ["{\"city\":", "\"Paris\"}"] {
                let delta = json!({"tool_calls": [{"index": 0, "function": {"arguments": piece}}]});
                chunks.push(chunk(model, &delta, None));
            }
            "tool_calls"
        }
    };

    chunks.push(chunk(model, &json!({}), Some(finish_reason)));

    let mut body = String::new();
    for chunk in chunks {
        let _ = write!(body, "data: {chunk}\n\n");
    }
    body.push_str("data: [DONE]\n\n");
    body
}
