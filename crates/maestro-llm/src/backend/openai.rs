//! OpenAI-compatible upstream backend

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::{StreamExt, future, stream};
use maestro_config::BackendConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{ChatBackend, FragmentStream};
use crate::convert::openai::ChunkDecoder;
use crate::error::LlmError;
use crate::protocol::openai::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
use crate::types::{ChatRequest, CompletionResult, StreamFragment};

/// Connection establishment limit, independent of the request timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend forwarding every call to one `/chat/completions` endpoint
pub struct OpenAiBackend {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl OpenAiBackend {
    /// Create from backend configuration
    pub fn new(config: &BackendConfig) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(config.timeout_seconds);

        // Streams may legitimately outlive the request timeout, so the
        // client only bounds idle reads; `complete` adds a total limit.
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(timeout)
            .build()
            .map_err(|e| LlmError::Internal(anyhow::anyhow!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout,
        })
    }

    /// Build the chat completions URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    fn post(&self, body: &ChatCompletionRequest) -> reqwest::RequestBuilder {
        let builder = self.client.post(self.completions_url()).json(body);

        match &self.api_key {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<CompletionResult, LlmError> {
        let wire_request = ChatCompletionRequest::from(request);

        let response = self.post(&wire_request).timeout(self.timeout).send().await.map_err(|e| {
            tracing::error!(model = %request.model, error = %e, "upstream request failed");
            LlmError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model = %request.model, status = %status, "upstream returned error");
            return Err(LlmError::Upstream(format!("upstream returned {status}: {body}")));
        }

        let wire_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("failed to parse response: {e}")))?;

        Ok(wire_response.into())
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<FragmentStream, LlmError> {
        let mut wire_request = ChatCompletionRequest::from(request);
        wire_request.stream = Some(true);

        let response = self.post(&wire_request).send().await.map_err(|e| {
            tracing::error!(model = %request.model, error = %e, "upstream stream request failed");
            LlmError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model = %request.model, status = %status, "upstream returned error");
            return Err(LlmError::Upstream(format!("upstream returned {status}: {body}")));
        }

        let mut decoder = ChunkDecoder::new();

        let fragments = response
            .bytes_stream()
            .eventsource()
            .map(move |result| match result {
                Ok(event) => {
                    let data = event.data.trim();
                    if data == "[DONE]" {
                        return vec![StreamFragment::End];
                    }

                    match serde_json::from_str::<ChatCompletionChunk>(data) {
                        Ok(chunk) => decoder.decode(chunk),
                        Err(e) => {
                            tracing::debug!(error = %e, data = %data, "skipping unparseable SSE chunk");
                            Vec::new()
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "upstream stream broke");
                    vec![StreamFragment::Failed(e.to_string())]
                }
            })
            .flat_map(stream::iter)
            // Some compatible servers close the stream without `[DONE]`
            .chain(stream::iter([StreamFragment::End]))
            .scan(false, |finished, fragment| {
                if *finished {
                    return future::ready(None);
                }
                *finished = fragment.is_terminal();
                future::ready(Some(fragment))
            });

        Ok(Box::pin(fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> BackendConfig {
        BackendConfig {
            base_url: Url::parse(base_url).unwrap(),
            api_key: None,
            model: "gpt-4o".to_owned(),
            timeout_seconds: 30,
        }
    }

    #[test]
    fn completions_url_joins_base() {
        let backend = OpenAiBackend::new(&config("http://localhost:8080/v1")).unwrap();
        assert_eq!(backend.completions_url(), "http://localhost:8080/v1/chat/completions");

        let backend = OpenAiBackend::new(&config("http://localhost:8080/v1/")).unwrap();
        assert_eq!(backend.completions_url(), "http://localhost:8080/v1/chat/completions");
    }
}
