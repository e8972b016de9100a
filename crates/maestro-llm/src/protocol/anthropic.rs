//! Anthropic Messages API wire format types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Lenient;

// -- Request types --

/// Messages API request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicRequest {
    /// Model identifier
    pub model: String,
    /// Maximum tokens to generate (accepted, not forwarded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// System prompt (top-level, not in messages)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<AnthropicSystem>,
    /// Conversation messages
    pub messages: Vec<AnthropicMessage>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Tool definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<AnthropicTool>>,
    /// Tool choice configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<AnthropicToolChoice>,
}

/// Token counting request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicCountTokensRequest {
    /// Model identifier
    pub model: String,
    /// System prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<AnthropicSystem>,
    /// Conversation messages
    pub messages: Vec<AnthropicMessage>,
    /// Tool definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<AnthropicTool>>,
}

/// Token counting response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicCountTokensResponse {
    /// Estimated input tokens
    pub input_tokens: u32,
}

/// System prompt: a string or text blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnthropicSystem {
    /// Plain text
    Text(String),
    /// Content blocks
    Blocks(Vec<Lenient<AnthropicContentBlock>>),
}

/// Conversation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role (`user` or `assistant`)
    pub role: String,
    /// Content
    pub content: AnthropicContent,
}

/// Message content: a string or content blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnthropicContent {
    /// Plain text (shorthand)
    Text(String),
    /// Content blocks
    Blocks(Vec<Lenient<AnthropicContentBlock>>),
}

/// Content block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicContentBlock {
    /// Text content
    Text {
        /// The text
        text: String,
    },
    /// Image content
    Image {
        /// Image source
        source: AnthropicImageSource,
    },
    /// Tool invocation by the assistant
    ToolUse {
        /// Tool use identifier
        id: String,
        /// Tool name
        name: String,
        /// Tool input
        #[serde(default)]
        input: Value,
    },
    /// Tool result from the user
    ToolResult {
        /// Tool use this result answers
        tool_use_id: String,
        /// Result: a string or content blocks
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Value>,
        /// Whether the tool failed
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    /// Extended thinking from an earlier turn (dropped)
    Thinking {
        /// Thinking text
        #[serde(default)]
        thinking: String,
    },
    /// Redacted thinking from an earlier turn (dropped)
    RedactedThinking {
        /// Opaque payload
        #[serde(default)]
        data: String,
    },
}

/// Image source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicImageSource {
    /// Source type (`base64`, `url`, `file`)
    #[serde(rename = "type")]
    pub source_type: String,
    /// Media type (e.g. `image/png`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Base64 payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Remote URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Tool definition
///
/// Client tools have no `type` (or `custom`); server tools carry a
/// versioned type such as `web_search_20250305`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicTool {
    /// Tool type, absent for client tools
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tool_type: Option<String>,
    /// Tool name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// Tool choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicToolChoice {
    /// `auto`, `any`, `tool` or `none`
    #[serde(rename = "type")]
    pub choice_type: String,
    /// Tool to force when `choice_type` is `tool`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// -- Response types --

/// Messages API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicResponse {
    /// Message identifier
    pub id: String,
    /// Object type (always `message`)
    #[serde(rename = "type")]
    pub response_type: String,
    /// Role (always `assistant`)
    pub role: String,
    /// Content blocks
    pub content: Vec<AnthropicResponseBlock>,
    /// Model used
    pub model: String,
    /// `end_turn` or `tool_use`
    pub stop_reason: Option<String>,
    /// Stop sequence that ended generation
    pub stop_sequence: Option<String>,
    /// Token usage
    pub usage: AnthropicUsage,
}

/// Response content block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicResponseBlock {
    /// Generated text
    Text {
        /// The text
        text: String,
    },
    /// Tool invocation
    ToolUse {
        /// Tool use identifier
        id: String,
        /// Tool name
        name: String,
        /// Tool input
        input: Value,
    },
}

/// Token usage
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnthropicUsage {
    /// Input tokens
    pub input_tokens: u32,
    /// Output tokens
    pub output_tokens: u32,
}

// -- Streaming types --

/// Messages SSE event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicStreamEvent {
    /// Stream started
    MessageStart {
        /// Message shell
        message: AnthropicResponse,
    },
    /// Keep-alive
    Ping,
    /// Content block opened
    ContentBlockStart {
        /// Block index
        index: usize,
        /// Block in its initial state
        content_block: AnthropicResponseBlock,
    },
    /// Content block grew
    ContentBlockDelta {
        /// Block index
        index: usize,
        /// The increment
        delta: AnthropicStreamDelta,
    },
    /// Content block finished
    ContentBlockStop {
        /// Block index
        index: usize,
    },
    /// Top-level message fields changed
    MessageDelta {
        /// Changed fields
        delta: AnthropicMessageDelta,
        /// Cumulative output usage
        usage: AnthropicDeltaUsage,
    },
    /// Stream finished
    MessageStop,
}

impl AnthropicStreamEvent {
    /// SSE event name for this event
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::MessageStart { .. } => "message_start",
            Self::Ping => "ping",
            Self::ContentBlockStart { .. } => "content_block_start",
            Self::ContentBlockDelta { .. } => "content_block_delta",
            Self::ContentBlockStop { .. } => "content_block_stop",
            Self::MessageDelta { .. } => "message_delta",
            Self::MessageStop => "message_stop",
        }
    }
}

/// Content block increment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicStreamDelta {
    /// Text fragment
    TextDelta {
        /// The fragment
        text: String,
    },
    /// Tool input JSON fragment
    InputJsonDelta {
        /// The fragment
        partial_json: String,
    },
}

/// Top-level message changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessageDelta {
    /// Why generation stopped
    pub stop_reason: Option<String>,
    /// Stop sequence that ended generation
    pub stop_sequence: Option<String>,
}

/// Usage reported in `message_delta`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnthropicDeltaUsage {
    /// Output tokens so far
    pub output_tokens: u32,
}
