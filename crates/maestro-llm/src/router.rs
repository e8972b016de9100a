//! Axum routes for every protocol surface
//!
//! Each protocol group sits behind its own credential check. Handlers read
//! the raw body so malformed JSON is reported in the protocol's own error
//! shape, convert to the unified model, call the backend and render the
//! result (or an SSE stream driven by the protocol's sequencer).

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use bytes::Bytes;
use futures_util::{StreamExt, future, stream};
use maestro_config::{AuthConfig, LlmConfig, ProtocolsConfig};
use maestro_core::HttpError;
use secrecy::SecretString;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::AuthMatcher;
use crate::backend::{ChatBackend, FragmentStream, OpenAiBackend};
use crate::convert::{anthropic, google, openai, responses, unix_now};
use crate::error::LlmError;
use crate::protocol::Protocol;
use crate::protocol::anthropic::{AnthropicCountTokensRequest, AnthropicCountTokensResponse, AnthropicRequest};
use crate::protocol::google::{
    CountTokensRequest, CountTokensResponse, GeminiModel, GeminiModelList, GenerateContentRequest,
};
use crate::protocol::openai::{ChatCompletionRequest, ChatModel, ChatModelList};
use crate::protocol::responses::ResponsesRequest;
use crate::routing::ModelResolver;
use crate::stream::{AnthropicSequencer, ChatSequencer, GeminiSequencer, ResponsesSequencer, Sequencer, drive};
use crate::tokens;
use crate::types::{ChatRequest, CompletionResult, StreamFragment};

/// Gemini methods advertised in the model list
const GEMINI_METHODS: [&str; 3] = ["generateContent", "streamGenerateContent", "countTokens"];

/// Shared state for the protocol handlers
#[derive(Clone)]
pub struct LlmState {
    inner: Arc<LlmStateInner>,
}

struct LlmStateInner {
    resolver: ModelResolver,
    backend: Arc<dyn ChatBackend>,
    secret: Option<SecretString>,
    protocols: ProtocolsConfig,
}

/// A unified request bound to its upstream model
struct Prepared {
    request: ChatRequest,
    /// Client-facing model name, echoed in responses
    model: String,
    prompt_tokens: u32,
}

impl LlmState {
    /// Build the state from configuration, constructing the upstream backend
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &LlmConfig, auth: &AuthConfig) -> Result<Self, LlmError> {
        let backend = OpenAiBackend::new(&config.backend)?;

        Ok(Self::new(
            ModelResolver::from_config(config),
            Arc::new(backend),
            auth.secret().cloned(),
            config.protocols,
        ))
    }

    /// Build the state from its parts
    pub fn new(
        resolver: ModelResolver,
        backend: Arc<dyn ChatBackend>,
        secret: Option<SecretString>,
        protocols: ProtocolsConfig,
    ) -> Self {
        Self {
            inner: Arc::new(LlmStateInner {
                resolver,
                backend,
                secret,
                protocols,
            }),
        }
    }

    fn matcher(&self, protocol: Protocol) -> AuthMatcher {
        AuthMatcher::new(protocol, self.inner.secret.as_ref())
    }

    /// Resolve the model and estimate prompt usage
    fn prepare(&self, mut request: ChatRequest) -> Result<Prepared, LlmError> {
        let resolved = self.inner.resolver.resolve(&request.model)?;
        request.model = resolved.upstream;
        let prompt_tokens = tokens::estimate_prompt(&request.messages, &request.tools);

        Ok(Prepared {
            request,
            model: resolved.requested,
            prompt_tokens,
        })
    }

    async fn complete(&self, prepared: &Prepared) -> Result<CompletionResult, LlmError> {
        tracing::debug!(model = %prepared.request.model, messages = prepared.request.messages.len(), "completing");
        self.inner.backend.complete(&prepared.request).await
    }

    /// Start a stream; a backend that fails to start yields one `Failed` fragment
    ///
    /// Once a client asked for a stream it gets the protocol's own failure
    /// event rather than a JSON error.
    async fn complete_stream(&self, prepared: &Prepared) -> FragmentStream {
        tracing::debug!(model = %prepared.request.model, messages = prepared.request.messages.len(), "streaming");
        match self.inner.backend.complete_stream(&prepared.request).await {
            Ok(fragments) => fragments,
            Err(e) => {
                tracing::warn!(error = %e, "upstream stream failed to start");
                Box::pin(stream::iter([StreamFragment::Failed(e.client_message())]))
            }
        }
    }
}

/// Build the router with every enabled protocol group
pub fn llm_router(state: LlmState) -> Router {
    let protocols = state.inner.protocols;
    let mut router = Router::new();

    if protocols.openai {
        let chat = Router::new()
            .route("/api/openai/v1/chat/completions", routing::post(chat_completions))
            .route("/api/openai/v1/models", routing::get(openai_models));
        let responses_api = Router::new().route("/api/openai/v1/responses", routing::post(create_response));

        router = router
            .merge(guarded(chat, state.matcher(Protocol::OpenAiChat)))
            .merge(guarded(responses_api, state.matcher(Protocol::OpenAiResponses)));
    }

    if protocols.anthropic {
        let messages = Router::new()
            .route("/api/anthropic/v1/messages", routing::post(anthropic_messages))
            .route("/api/anthropic/v1/messages/count_tokens", routing::post(anthropic_count_tokens));

        router = router.merge(guarded(messages, state.matcher(Protocol::Anthropic)));
    }

    if protocols.gemini {
        let gemini = Router::new()
            .route("/api/gemini/v1beta/models", routing::get(gemini_models))
            .route(
                "/api/gemini/v1beta/models/{model_action}",
                routing::get(gemini_model).post(gemini_action),
            );

        router = router.merge(guarded(gemini, state.matcher(Protocol::Gemini)));
    }

    router.with_state(state)
}

/// Reject requests without valid credentials before any handler runs
fn guarded(router: Router<LlmState>, matcher: AuthMatcher) -> Router<LlmState> {
    router.route_layer(middleware::from_fn(move |request: Request, next: Next| {
        let matcher = matcher.clone();
        async move { authenticate(matcher, request, next).await }
    }))
}

async fn authenticate(matcher: AuthMatcher, request: Request, next: Next) -> Response {
    if let Err(e) = matcher.authorize(request.headers(), request.uri().query()) {
        tracing::warn!(
            protocol = matcher.protocol().as_str(),
            path = %request.uri().path(),
            "rejected request without valid credentials"
        );
        return error_response(matcher.protocol(), &e);
    }

    next.run(request).await
}

/// Render an error in the protocol's native shape
pub fn error_response(protocol: Protocol, error: &LlmError) -> Response {
    let status = error.status_code();

    if status.is_server_error() {
        tracing::error!(protocol = protocol.as_str(), error = %error, "request failed");
    } else {
        tracing::debug!(protocol = protocol.as_str(), error = %error, "request rejected");
    }

    (status, Json(error.to_wire_body(protocol))).into_response()
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, LlmError> {
    serde_json::from_slice(body).map_err(|e| LlmError::InvalidRequest(format!("malformed request body: {e}")))
}

/// Stream the sequencer's frames as server-sent events
fn sse_response<S: Sequencer + 'static>(sequencer: S, fragments: FragmentStream) -> Response {
    let events = drive(sequencer, fragments).map(|frame| {
        let event = Event::default().data(frame.data);
        Ok::<Event, Infallible>(match frame.event {
            Some(name) => event.event(name),
            None => event,
        })
    });

    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}

// -- OpenAI Chat Completions --

/// Handle `POST /api/openai/v1/chat/completions`
async fn chat_completions(State(state): State<LlmState>, body: Bytes) -> Response {
    handle_chat(&state, &body)
        .await
        .unwrap_or_else(|e| error_response(Protocol::OpenAiChat, &e))
}

async fn handle_chat(state: &LlmState, body: &Bytes) -> Result<Response, LlmError> {
    let wire: ChatCompletionRequest = parse_body(body)?;
    let stream = wire.stream.unwrap_or(false);
    let include_usage = wire.stream_options.as_ref().is_some_and(|options| options.include_usage);
    let prepared = state.prepare(wire.into())?;

    if stream {
        let fragments = state.complete_stream(&prepared).await;
        let sequencer = ChatSequencer::new(&prepared.model, prepared.prompt_tokens, include_usage);
        return Ok(sse_response(sequencer, fragments));
    }

    let result = state.complete(&prepared).await?;
    Ok(Json(openai::to_chat_response(&result, &prepared.model, prepared.prompt_tokens)).into_response())
}

/// Handle `GET /api/openai/v1/models`
async fn openai_models(State(state): State<LlmState>) -> Json<ChatModelList> {
    let created = unix_now();
    let data = state
        .inner
        .resolver
        .list()
        .into_iter()
        .map(|id| ChatModel {
            id,
            object: "model".to_owned(),
            created,
            owned_by: "maestro".to_owned(),
        })
        .collect();

    Json(ChatModelList {
        object: "list".to_owned(),
        data,
    })
}

// -- OpenAI Responses --

/// Handle `POST /api/openai/v1/responses`
async fn create_response(State(state): State<LlmState>, body: Bytes) -> Response {
    handle_responses(&state, &body)
        .await
        .unwrap_or_else(|e| error_response(Protocol::OpenAiResponses, &e))
}

async fn handle_responses(state: &LlmState, body: &Bytes) -> Result<Response, LlmError> {
    let wire: ResponsesRequest = parse_body(body)?;
    let stream = wire.stream.unwrap_or(false);
    let envelope = responses::ResponseEnvelope::new(&wire);
    let prepared = state.prepare(ChatRequest::try_from(wire)?)?;

    if stream {
        let fragments = state.complete_stream(&prepared).await;
        let sequencer = ResponsesSequencer::new(envelope, prepared.prompt_tokens);
        return Ok(sse_response(sequencer, fragments));
    }

    let result = state.complete(&prepared).await?;
    Ok(Json(responses::to_responses_response(&result, &envelope, prepared.prompt_tokens)).into_response())
}

// -- Anthropic Messages --

/// Handle `POST /api/anthropic/v1/messages`
async fn anthropic_messages(State(state): State<LlmState>, body: Bytes) -> Response {
    handle_anthropic(&state, &body)
        .await
        .unwrap_or_else(|e| error_response(Protocol::Anthropic, &e))
}

async fn handle_anthropic(state: &LlmState, body: &Bytes) -> Result<Response, LlmError> {
    let wire: AnthropicRequest = parse_body(body)?;
    let stream = wire.stream.unwrap_or(false);
    let prepared = state.prepare(wire.into())?;

    if stream {
        let fragments = state.complete_stream(&prepared).await;
        let sequencer = AnthropicSequencer::new(&prepared.model, prepared.prompt_tokens);
        return Ok(sse_response(sequencer, fragments));
    }

    let result = state.complete(&prepared).await?;
    Ok(Json(anthropic::to_anthropic_response(&result, &prepared.model, prepared.prompt_tokens)).into_response())
}

/// Handle `POST /api/anthropic/v1/messages/count_tokens`
async fn anthropic_count_tokens(State(state): State<LlmState>, body: Bytes) -> Response {
    let counted = parse_body::<AnthropicCountTokensRequest>(&body)
        .and_then(|wire| state.prepare(wire.into()))
        .map(|prepared| AnthropicCountTokensResponse {
            input_tokens: prepared.prompt_tokens,
        });

    match counted {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(Protocol::Anthropic, &e),
    }
}

// -- Gemini --

#[derive(Debug, Default, Deserialize)]
struct GeminiParams {
    /// `sse` selects server-sent events for streaming
    #[serde(default)]
    alt: Option<String>,
}

/// Handle `GET /api/gemini/v1beta/models`
async fn gemini_models(State(state): State<LlmState>) -> Json<GeminiModelList> {
    let models = state
        .inner
        .resolver
        .list()
        .iter()
        .map(String::as_str)
        .map(gemini_model_entry)
        .collect();
    Json(GeminiModelList { models })
}

/// Handle `GET /api/gemini/v1beta/models/{model}`
async fn gemini_model(State(state): State<LlmState>, Path(model): Path<String>) -> Response {
    match state.inner.resolver.resolve(&model) {
        Ok(resolved) => Json(gemini_model_entry(&resolved.requested)).into_response(),
        Err(e) => error_response(Protocol::Gemini, &e),
    }
}

fn gemini_model_entry(name: &str) -> GeminiModel {
    GeminiModel {
        name: format!("models/{name}"),
        display_name: name.to_owned(),
        supported_generation_methods: GEMINI_METHODS.iter().map(|&method| method.to_owned()).collect(),
    }
}

/// Handle `POST /api/gemini/v1beta/models/{model}:{method}`
async fn gemini_action(
    State(state): State<LlmState>,
    Path(model_action): Path<String>,
    Query(params): Query<GeminiParams>,
    body: Bytes,
) -> Response {
    handle_gemini(&state, &model_action, &params, &body)
        .await
        .unwrap_or_else(|e| error_response(Protocol::Gemini, &e))
}

async fn handle_gemini(
    state: &LlmState,
    model_action: &str,
    params: &GeminiParams,
    body: &Bytes,
) -> Result<Response, LlmError> {
    let (model, method) = model_action
        .rsplit_once(':')
        .ok_or_else(|| LlmError::InvalidRequest(format!("missing method in `{model_action}`")))?;

    match method {
        "generateContent" => {
            let prepared = state.prepare(google::to_chat_request(model.to_owned(), parse_body(body)?))?;
            let result = state.complete(&prepared).await?;
            let response = google::to_generate_content_response(&result, &prepared.model, prepared.prompt_tokens);
            Ok(Json(response).into_response())
        }
        "streamGenerateContent" => {
            let wire: GenerateContentRequest = parse_body(body)?;
            let prepared = state.prepare(google::to_chat_request(model.to_owned(), wire))?;
            let fragments = state.complete_stream(&prepared).await;
            let sequencer = GeminiSequencer::new(&prepared.model, prepared.prompt_tokens);

            if params.alt.as_deref() == Some("sse") {
                return Ok(sse_response(sequencer, fragments));
            }

            // Without `alt=sse` Gemini answers with one JSON array of chunks
            let chunks: Vec<Value> = drive(sequencer, fragments)
                .filter_map(|frame| future::ready(serde_json::from_str(&frame.data).ok()))
                .collect()
                .await;
            Ok(Json(chunks).into_response())
        }
        "countTokens" => {
            let wire: CountTokensRequest = parse_body(body)?;
            let prepared = state.prepare(google::count_tokens_request(model.to_owned(), wire))?;
            Ok(Json(CountTokensResponse {
                total_tokens: prepared.prompt_tokens,
            })
            .into_response())
        }
        other => Err(LlmError::InvalidRequest(format!("unsupported method `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::BodyExt;
    use indexmap::IndexMap;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::types::CompletedToolCall;

    /// Backend answering every call with canned output
    #[derive(Default)]
    struct FakeBackend {
        result: CompletionResult,
        fragments: Vec<StreamFragment>,
        models: Mutex<Vec<String>>,
        /// Refuse to start streams with this upstream error
        stream_error: Option<String>,
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn complete(&self, request: &ChatRequest) -> Result<CompletionResult, LlmError> {
            self.models.lock().unwrap().push(request.model.clone());
            Ok(self.result.clone())
        }

        async fn complete_stream(&self, request: &ChatRequest) -> Result<FragmentStream, LlmError> {
            self.models.lock().unwrap().push(request.model.clone());
            if let Some(message) = &self.stream_error {
                return Err(LlmError::Upstream(message.clone()));
            }
            Ok(Box::pin(stream::iter(self.fragments.clone())))
        }
    }

    fn backend() -> Arc<FakeBackend> {
        Arc::new(FakeBackend {
            result: CompletionResult {
                text: "Hello there".to_owned(),
                tool_calls: Vec::new(),
            },
            fragments: vec![
                StreamFragment::TextDelta("Hel".to_owned()),
                StreamFragment::TextDelta("lo".to_owned()),
                StreamFragment::End,
            ],
            models: Mutex::default(),
            stream_error: None,
        })
    }

    fn state_with(backend: Arc<FakeBackend>, secret: Option<&str>, protocols: ProtocolsConfig) -> LlmState {
        let mut aliases = IndexMap::new();
        aliases.insert("claude-sonnet-4".to_owned(), "gpt-4o".to_owned());
        LlmState::new(
            ModelResolver::new("gpt-4o-mini".to_owned(), aliases, false),
            backend,
            secret.map(SecretString::from),
            protocols,
        )
    }

    fn router(secret: Option<&str>) -> Router {
        llm_router(state_with(backend(), secret, ProtocolsConfig::default()))
    }

    fn post(uri: &str, body: &Value) -> HttpRequest<axum::body::Body> {
        HttpRequest::post(uri)
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(router: Router, request: HttpRequest<axum::body::Body>) -> (StatusCode, String) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn chat_body() -> Value {
        json!({"model": "gpt-4o", "messages": [{"role": "user", "content": "Hi"}]})
    }

    #[tokio::test]
    async fn chat_completion_round_trip() {
        let (status, body) = send(router(None), post("/api/openai/v1/chat/completions", &chat_body())).await;
        assert_eq!(status, StatusCode::OK);

        let body: Value = serde_json::from_str(&body).unwrap();
        assert!(body["id"].as_str().unwrap().starts_with("chatcmpl_AM-"));
        assert_eq!(body["choices"][0]["message"]["content"], "Hello there");
        assert_eq!(body["choices"][0]["finish_reason"], "stop");
    }

    #[tokio::test]
    async fn aliases_reach_the_backend_resolved() {
        let backend = backend();
        let router = llm_router(state_with(Arc::clone(&backend), None, ProtocolsConfig::default()));
        let request = json!({
            "model": "claude-sonnet-4",
            "max_tokens": 100,
            "messages": [{"role": "user", "content": "Hi"}]
        });

        let (status, body) = send(router, post("/api/anthropic/v1/messages", &request)).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["model"], "claude-sonnet-4");
        assert_eq!(backend.models.lock().unwrap().as_slice(), ["gpt-4o"]);
    }

    #[tokio::test]
    async fn credentials_are_checked_per_protocol() {
        let request = json!({"model": "x", "max_tokens": 1, "messages": [{"role": "user", "content": "Hi"}]});

        let (status, body) = send(router(Some("k")), post("/api/anthropic/v1/messages", &request)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"]["type"], "authentication_error");

        let mut authorized = post("/api/anthropic/v1/messages", &request);
        authorized.headers_mut().insert("x-api-key", "k".parse().unwrap());
        let (status, _) = send(router(Some("k")), authorized).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn gemini_accepts_key_query_parameter() {
        let request = json!({"contents": [{"role": "user", "parts": [{"text": "Hi"}]}]});

        let uri = "/api/gemini/v1beta/models/gemini-2.5-pro:generateContent";
        let (status, body) = send(router(Some("k")), post(uri, &request)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"]["status"], "UNAUTHENTICATED");

        let (status, body) = send(router(Some("k")), post(&format!("{uri}?key=k"), &request)).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["candidates"][0]["content"]["parts"][0]["text"], "Hello there");
    }

    #[tokio::test]
    async fn malformed_json_uses_native_error_shape() {
        let request = HttpRequest::post("/api/gemini/v1beta/models/m:generateContent")
            .body(axum::body::Body::from("{not json"))
            .unwrap();

        let (status, body) = send(router(None), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"]["status"], "INVALID_ARGUMENT");
        assert_eq!(body["error"]["code"], 400);
    }

    #[tokio::test]
    async fn stateful_responses_are_rejected() {
        let request = json!({"model": "gpt-4o", "input": "Hi", "previous_response_id": "resp_1"});

        let (status, body) = send(router(None), post("/api/openai/v1/responses", &request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"]["param"], "previous_response_id");
    }

    #[tokio::test]
    async fn chat_stream_ends_with_done() {
        let mut request = chat_body();
        request["stream"] = json!(true);

        let (status, body) = send(router(None), post("/api/openai/v1/chat/completions", &request)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"content\":\"Hel\""));
        assert!(body.trim_end().ends_with("data: [DONE]"));
    }

    fn refusing_router() -> Router {
        let backend = Arc::new(FakeBackend {
            stream_error: Some("upstream returned 503".to_owned()),
            ..FakeBackend::default()
        });
        llm_router(state_with(backend, None, ProtocolsConfig::default()))
    }

    #[tokio::test]
    async fn responses_stream_reports_upstream_start_failure_as_event() {
        let request = json!({"model": "gpt-4o", "input": "Hi", "stream": true});

        let (status, body) = send(refusing_router(), post("/api/openai/v1/responses", &request)).await;
        assert_eq!(status, StatusCode::OK);
        let events: Vec<&str> = body
            .lines()
            .filter_map(|line| line.strip_prefix("event: "))
            .collect();
        insta::assert_debug_snapshot!(events, @r#"
        [
            "response.created",
            "response.in_progress",
            "response.failed",
        ]
        "#);
        assert!(body.contains("upstream returned 503"));
    }

    #[tokio::test]
    async fn chat_stream_reports_upstream_start_failure_in_band() {
        let mut request = chat_body();
        request["stream"] = json!(true);

        let (status, body) = send(refusing_router(), post("/api/openai/v1/chat/completions", &request)).await;
        assert_eq!(status, StatusCode::OK);
        let last = body.lines().filter_map(|line| line.strip_prefix("data: ")).last().unwrap();
        let error: Value = serde_json::from_str(last).unwrap();
        assert_eq!(error["error"]["type"], "server_error");
        assert!(error["error"]["message"].as_str().unwrap().contains("upstream returned 503"));
        assert!(!body.contains("[DONE]"));
    }

    #[tokio::test]
    async fn unknown_model_on_stream_stays_json() {
        let backend = Arc::new(FakeBackend::default());
        let state = LlmState::new(
            ModelResolver::new("gpt-4o-mini".to_owned(), IndexMap::new(), true),
            backend,
            None,
            ProtocolsConfig::default(),
        );
        let request = json!({"model": "nope", "input": "Hi", "stream": true});

        let (status, body) = send(llm_router(state), post("/api/openai/v1/responses", &request)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"]["code"], "model_not_found");
    }

    #[tokio::test]
    async fn gemini_stream_without_sse_is_a_json_array() {
        let request = json!({"contents": [{"role": "user", "parts": [{"text": "Hi"}]}]});
        let uri = "/api/gemini/v1beta/models/gemini-2.5-pro:streamGenerateContent";

        let (status, body) = send(router(None), post(uri, &request)).await;
        assert_eq!(status, StatusCode::OK);
        let chunks: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2]["candidates"][0]["finishReason"], "STOP");
    }

    #[tokio::test]
    async fn count_tokens_endpoints() {
        let request = json!({"model": "claude-sonnet-4", "messages": [{"role": "user", "content": "Hello world"}]});
        let (status, body) = send(router(None), post("/api/anthropic/v1/messages/count_tokens", &request)).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert!(body["input_tokens"].as_u64().unwrap() > 0);

        let request = json!({"contents": [{"parts": [{"text": "Hello world"}]}]});
        let uri = "/api/gemini/v1beta/models/gemini-2.5-pro:countTokens";
        let (status, body) = send(router(None), post(uri, &request)).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert!(body["totalTokens"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn responses_with_tool_calls() {
        let backend = Arc::new(FakeBackend {
            result: CompletionResult {
                text: String::new(),
                tool_calls: vec![CompletedToolCall {
                    call_id: "up_1".to_owned(),
                    name: "get_weather".to_owned(),
                    input: Value::Null,
                }],
            },
            ..FakeBackend::default()
        });
        let router = llm_router(state_with(backend, None, ProtocolsConfig::default()));

        let request = json!({"model": "gpt-4o", "input": "Weather?"});
        let (status, body) = send(router, post("/api/openai/v1/responses", &request)).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["status"], "completed");
        assert_eq!(body["output"].as_array().unwrap().len(), 1);
        assert_eq!(body["output"][0]["type"], "function_call");
        assert_eq!(body["output"][0]["arguments"], "{}");
    }

    #[tokio::test]
    async fn disabled_protocols_are_not_routed() {
        let protocols = ProtocolsConfig {
            openai: true,
            anthropic: false,
            gemini: false,
        };
        let router = llm_router(state_with(backend(), None, protocols));

        let request = HttpRequest::get("/api/gemini/v1beta/models")
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, _) = send(router.clone(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = HttpRequest::get("/api/openai/v1/models")
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["data"][0]["id"], "claude-sonnet-4");
        assert_eq!(body["data"][1]["id"], "gpt-4o-mini");
    }
}
