//! `OpenAI` Chat Completions wire format types
//!
//! Shared by the inbound `/chat/completions` surface and the upstream
//! OpenAI-compatible backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Lenient;

// -- Request types --

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Streaming options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<ChatStreamOptions>,
    /// Tool definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ChatTool>>,
    /// Tool choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ChatToolChoice>,
}

/// Streaming options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatStreamOptions {
    /// Emit a trailing usage chunk
    #[serde(default)]
    pub include_usage: bool,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role (`system`, `developer`, `user`, `assistant`, `tool`)
    pub role: String,
    /// Message content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ChatContent>,
    /// Optional participant name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool calls made by the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ChatToolCall>>,
    /// Call this tool message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Message content: a string or an array of typed parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatContent {
    /// Plain text
    Text(String),
    /// Typed parts
    Parts(Vec<Lenient<ChatContentPart>>),
}

/// Typed content part
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatContentPart {
    /// Text
    Text {
        /// The text
        text: String,
    },
    /// Image by URL or data URI
    ImageUrl {
        /// Image reference
        image_url: ChatImageUrl,
    },
    /// Refusal text from an earlier assistant turn
    Refusal {
        /// The refusal
        refusal: String,
    },
}

/// Image reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatImageUrl {
    /// `https://` URL or `data:` URI
    pub url: String,
    /// Detail hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Tool call in an assistant message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatToolCall {
    /// Call identifier
    pub id: String,
    /// Call type (always `function`)
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    /// Function invocation
    pub function: ChatFunctionCall,
}

/// Function invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFunctionCall {
    /// Function name
    pub name: String,
    /// Arguments as JSON text
    #[serde(default)]
    pub arguments: String,
}

/// Tool declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTool {
    /// Tool type (`function`, `custom`, ...)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function definition when `tool_type` is `function`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<ChatFunctionDefinition>,
}

/// Function definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFunctionDefinition {
    /// Function name
    pub name: String,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// Tool choice: a mode string or a named function
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatToolChoice {
    /// `none`, `auto` or `required`
    Mode(String),
    /// Force a specific tool
    Named(ChatNamedToolChoice),
}

/// Named tool choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatNamedToolChoice {
    /// Choice type (`function`, `allowed_tools`, ...)
    #[serde(rename = "type")]
    pub choice_type: String,
    /// Function to force
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<ChatFunctionName>,
    /// Restricted tool set, for `allowed_tools`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<ChatAllowedTools>,
}

/// Allowed tools constraint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAllowedTools {
    /// `auto` or `required`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Tool references the model may pick from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
}

/// Function reference by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFunctionName {
    /// Function name
    pub name: String,
}

// -- Response types --

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    /// Completion identifier
    #[serde(default)]
    pub id: String,
    /// Object type (always `chat.completion`)
    #[serde(default)]
    pub object: String,
    /// Creation time (Unix seconds)
    #[serde(default)]
    pub created: u64,
    /// Model used
    #[serde(default)]
    pub model: String,
    /// Completion choices
    pub choices: Vec<ChatChoice>,
    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChatUsage>,
}

/// Completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Generated message
    pub message: ChatResponseMessage,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Generated message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponseMessage {
    /// Role (always `assistant`)
    #[serde(default = "assistant_role")]
    pub role: String,
    /// Generated text, `null` when only tools were called
    #[serde(default)]
    pub content: Option<String>,
    /// Tool calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ChatToolCall>>,
}

/// Token usage
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChatUsage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

impl ChatUsage {
    /// Build usage from prompt and completion counts
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

// -- Streaming types --

/// Streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    /// Completion identifier
    #[serde(default)]
    pub id: String,
    /// Object type (always `chat.completion.chunk`)
    #[serde(default)]
    pub object: String,
    /// Creation time (Unix seconds)
    #[serde(default)]
    pub created: u64,
    /// Model used
    #[serde(default)]
    pub model: String,
    /// Delta choices
    #[serde(default)]
    pub choices: Vec<ChatChunkChoice>,
    /// Usage, only on the trailing usage chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChatUsage>,
}

/// Streaming choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChunkChoice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Incremental content
    #[serde(default)]
    pub delta: ChatDelta,
    /// Why generation stopped, on the final chunk
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental message content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatDelta {
    /// Role, on the first chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Text fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool call fragments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ChatToolCallDelta>>,
}

/// Tool call fragment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatToolCallDelta {
    /// Position of the call in the message
    pub index: u32,
    /// Call identifier, on the first fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Call type, on the first fragment
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    /// Function fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<ChatFunctionDelta>,
}

/// Function fragment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatFunctionDelta {
    /// Function name, on the first fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Arguments fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

// -- Model listing --

/// Model list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatModelList {
    /// Object type (always `list`)
    pub object: String,
    /// Available models
    pub data: Vec<ChatModel>,
}

/// Model entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatModel {
    /// Model identifier
    pub id: String,
    /// Object type (always `model`)
    pub object: String,
    /// Creation time (Unix seconds)
    pub created: u64,
    /// Owner
    pub owned_by: String,
}

fn function_type() -> String {
    "function".to_owned()
}

fn assistant_role() -> String {
    "assistant".to_owned()
}
