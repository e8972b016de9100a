use http::StatusCode;
use maestro_core::HttpError;
use serde_json::{Value, json};
use thiserror::Error;

use crate::protocol::Protocol;

/// Errors that can occur while serving a chat request
#[derive(Debug, Error)]
pub enum LlmError {
    /// Requested model is not served by this gateway
    #[error("model not found: {model}")]
    ModelNotFound { model: String },

    /// Client sent a malformed or invalid request
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Client asked for server-side conversation state
    #[error(
        "stateful continuation is not supported: resend the full conversation history in `input` \
         instead of using `previous_response_id` or `conversation`"
    )]
    StatefulContinuation,

    /// Request lacks valid credentials
    #[error("invalid or missing API key")]
    Unauthorized,

    /// Upstream model endpoint failed
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Upstream stream broke mid-response
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ModelNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) | Self::StatefulContinuation => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Upstream(_) | Self::Streaming(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::ModelNotFound { .. } => "not_found_error",
            Self::InvalidRequest(_) | Self::StatefulContinuation => "invalid_request_error",
            Self::Unauthorized => "authentication_error",
            Self::Upstream(_) | Self::Streaming(_) | Self::Internal(_) => "api_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }
}

impl LlmError {
    /// Error body in the native shape of the given protocol
    pub fn to_wire_body(&self, protocol: Protocol) -> Value {
        let message = self.client_message();

        match protocol {
            Protocol::OpenAiChat | Protocol::OpenAiResponses => json!({
                "error": {
                    "message": message,
                    "type": self.openai_error_type(),
                    "param": self.openai_param(),
                    "code": self.openai_code(),
                }
            }),
            Protocol::Anthropic => json!({
                "type": "error",
                "error": {
                    "type": self.error_type(),
                    "message": message,
                }
            }),
            Protocol::Gemini => json!({
                "error": {
                    "code": self.status_code().as_u16(),
                    "message": message,
                    "status": self.gemini_status(),
                }
            }),
        }
    }

    const fn openai_error_type(&self) -> &'static str {
        match self {
            Self::ModelNotFound { .. } | Self::InvalidRequest(_) | Self::StatefulContinuation | Self::Unauthorized => {
                "invalid_request_error"
            }
            Self::Upstream(_) | Self::Streaming(_) | Self::Internal(_) => "server_error",
        }
    }

    const fn openai_code(&self) -> Option<&'static str> {
        match self {
            Self::ModelNotFound { .. } => Some("model_not_found"),
            Self::StatefulContinuation => Some("previous_response_not_supported"),
            Self::Unauthorized => Some("invalid_api_key"),
            Self::InvalidRequest(_) | Self::Upstream(_) | Self::Streaming(_) | Self::Internal(_) => None,
        }
    }

    const fn openai_param(&self) -> Option<&'static str> {
        match self {
            Self::ModelNotFound { .. } => Some("model"),
            Self::StatefulContinuation => Some("previous_response_id"),
            _ => None,
        }
    }

    const fn gemini_status(&self) -> &'static str {
        match self {
            Self::ModelNotFound { .. } => "NOT_FOUND",
            Self::InvalidRequest(_) | Self::StatefulContinuation => "INVALID_ARGUMENT",
            Self::Unauthorized => "UNAUTHENTICATED",
            Self::Upstream(_) | Self::Streaming(_) | Self::Internal(_) => "INTERNAL",
        }
    }
}
