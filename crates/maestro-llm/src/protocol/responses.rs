//! `OpenAI` Responses API wire format types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Lenient;

// -- Request types --

/// Create-response request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesRequest {
    /// Model identifier
    pub model: String,
    /// Conversation input: a string or a list of items
    #[serde(default)]
    pub input: ResponsesInput,
    /// System-level instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Tool definitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ResponsesTool>>,
    /// Tool choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ResponsesToolChoice>,
    /// Server-side continuation (not supported)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    /// Server-side conversation (not supported)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<Value>,
    /// Whether tool calls may run in parallel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    /// Caller metadata, echoed back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Request input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsesInput {
    /// Single user text
    Text(String),
    /// Conversation items
    Items(Vec<ResponsesInputItem>),
}

impl Default for ResponsesInput {
    fn default() -> Self {
        Self::Items(Vec::new())
    }
}

/// Input item
///
/// Message items may omit `type`, so typed items are tried first, then a
/// bare message, then anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsesInputItem {
    /// Item with a recognised `type`
    Typed(ResponsesTypedItem),
    /// Message without a `type` field
    Message(ResponsesMessageItem),
    /// Unrecognised item, kept verbatim
    Unknown(Value),
}

/// Input item with a `type` tag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesTypedItem {
    /// Conversation message
    Message(ResponsesMessageItem),
    /// Earlier function call by the model
    FunctionCall {
        /// Call identifier shared with the output
        call_id: String,
        /// Function name
        name: String,
        /// Arguments as JSON text
        #[serde(default)]
        arguments: String,
        /// Item identifier
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// Output of an earlier function call
    FunctionCallOutput {
        /// Call this output answers
        call_id: String,
        /// Output: a string or a list of content parts
        output: Value,
    },
    /// Reference to a stored item (stateful, dropped)
    ItemReference {
        /// Referenced item
        #[serde(default)]
        id: Option<String>,
    },
    /// Reasoning summary from an earlier turn (dropped)
    Reasoning {
        /// Item identifier
        #[serde(default)]
        id: Option<String>,
    },
}

/// Message item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesMessageItem {
    /// Role (`user`, `assistant`, `system`, `developer`)
    pub role: String,
    /// Message content
    pub content: ResponsesMessageContent,
}

/// Message content: a string or typed parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsesMessageContent {
    /// Plain text
    Text(String),
    /// Typed parts
    Parts(Vec<Lenient<ResponsesContentPart>>),
}

/// Typed content part
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesContentPart {
    /// Text from the user
    InputText {
        /// The text
        text: String,
    },
    /// Text from an earlier assistant turn
    OutputText {
        /// The text
        text: String,
    },
    /// Refusal from an earlier assistant turn
    Refusal {
        /// The refusal
        refusal: String,
    },
    /// Image by URL, data URI or file id
    InputImage {
        /// `https://` URL or `data:` URI
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_url: Option<String>,
        /// Uploaded file id
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_id: Option<String>,
        /// Detail hint
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

/// Tool declaration
///
/// Hosted tools carry arbitrary configuration, so everything besides the
/// function fields is kept in `extra` for echoing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesTool {
    /// Tool type (`function`, `file_search`, `web_search_preview`, ...)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Function description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// Remaining tool configuration
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tool choice: a mode string or an object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsesToolChoice {
    /// `none`, `auto` or `required`
    Mode(String),
    /// Forced function, forced hosted tool or `allowed_tools`
    Object(ResponsesToolChoiceObject),
}

/// Tool choice object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesToolChoiceObject {
    /// Choice type (`function`, `allowed_tools`, hosted tool type)
    #[serde(rename = "type")]
    pub choice_type: String,
    /// Forced function name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Mode of an `allowed_tools` choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Remaining fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// -- Response types --

/// Response object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesResponse {
    /// Response identifier
    pub id: String,
    /// Object type (always `response`)
    pub object: String,
    /// Creation time (Unix seconds)
    pub created_at: u64,
    /// `in_progress`, `completed` or `failed`
    pub status: String,
    /// Error details when failed
    pub error: Option<ResponsesError>,
    /// Why the response is incomplete
    pub incomplete_details: Option<Value>,
    /// Echoed instructions
    pub instructions: Option<String>,
    /// Model used
    pub model: String,
    /// Output items in order
    pub output: Vec<ResponsesOutputItem>,
    /// Whether tool calls may run in parallel
    pub parallel_tool_calls: bool,
    /// Echoed tool choice
    pub tool_choice: Value,
    /// Echoed tools
    pub tools: Vec<ResponsesTool>,
    /// Echoed metadata
    pub metadata: Value,
    /// Token usage, once finished
    pub usage: Option<ResponsesUsage>,
}

/// Response error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesError {
    /// Error code
    pub code: String,
    /// Error message
    pub message: String,
}

/// Output item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesOutputItem {
    /// Assistant message
    Message {
        /// Item identifier
        id: String,
        /// `in_progress` or `completed`
        status: String,
        /// Role (always `assistant`)
        role: String,
        /// Content parts
        content: Vec<ResponsesOutputContent>,
    },
    /// Function call
    FunctionCall {
        /// Item identifier
        id: String,
        /// Call identifier the client echoes in `function_call_output`
        call_id: String,
        /// Function name
        name: String,
        /// Arguments as JSON text
        arguments: String,
        /// `in_progress` or `completed`
        status: String,
    },
}

/// Output content part
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesOutputContent {
    /// Generated text
    OutputText {
        /// The text
        text: String,
        /// Citations (always empty)
        annotations: Vec<Value>,
    },
}

impl ResponsesOutputContent {
    /// Text part with no annotations
    pub fn text(text: impl Into<String>) -> Self {
        Self::OutputText {
            text: text.into(),
            annotations: Vec::new(),
        }
    }
}

/// Token usage
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResponsesUsage {
    /// Input tokens
    pub input_tokens: u32,
    /// Input token breakdown
    pub input_tokens_details: ResponsesInputTokensDetails,
    /// Output tokens
    pub output_tokens: u32,
    /// Output token breakdown
    pub output_tokens_details: ResponsesOutputTokensDetails,
    /// Total tokens
    pub total_tokens: u32,
}

impl ResponsesUsage {
    /// Build usage from input and output counts
    pub const fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            input_tokens_details: ResponsesInputTokensDetails { cached_tokens: 0 },
            output_tokens,
            output_tokens_details: ResponsesOutputTokensDetails { reasoning_tokens: 0 },
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }
}

/// Input token breakdown
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResponsesInputTokensDetails {
    /// Tokens served from cache
    pub cached_tokens: u32,
}

/// Output token breakdown
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResponsesOutputTokensDetails {
    /// Reasoning tokens
    pub reasoning_tokens: u32,
}

// -- Streaming types --

/// Responses SSE event
///
/// The SSE `event:` line carries the same name as the `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponsesStreamEvent {
    /// Response object created
    #[serde(rename = "response.created")]
    Created {
        /// Position in the stream
        sequence_number: u64,
        /// Snapshot of the response
        response: ResponsesResponse,
    },
    /// Generation started
    #[serde(rename = "response.in_progress")]
    InProgress {
        /// Position in the stream
        sequence_number: u64,
        /// Snapshot of the response
        response: ResponsesResponse,
    },
    /// Output item opened
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded {
        /// Position in the stream
        sequence_number: u64,
        /// Index in `output`
        output_index: usize,
        /// The item in its initial state
        item: ResponsesOutputItem,
    },
    /// Content part opened inside a message item
    #[serde(rename = "response.content_part.added")]
    ContentPartAdded {
        /// Position in the stream
        sequence_number: u64,
        /// Owning item
        item_id: String,
        /// Index of the owning item in `output`
        output_index: usize,
        /// Index of the part in the item
        content_index: usize,
        /// The part in its initial state
        part: ResponsesOutputContent,
    },
    /// Text appended to a content part
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        /// Position in the stream
        sequence_number: u64,
        /// Owning item
        item_id: String,
        /// Index of the owning item in `output`
        output_index: usize,
        /// Index of the part in the item
        content_index: usize,
        /// Text fragment
        delta: String,
    },
    /// Arguments appended to a function call
    #[serde(rename = "response.function_call_arguments.delta")]
    FunctionCallArgumentsDelta {
        /// Position in the stream
        sequence_number: u64,
        /// Owning item
        item_id: String,
        /// Index of the owning item in `output`
        output_index: usize,
        /// Arguments fragment
        delta: String,
    },
    /// Text part finished
    #[serde(rename = "response.output_text.done")]
    OutputTextDone {
        /// Position in the stream
        sequence_number: u64,
        /// Owning item
        item_id: String,
        /// Index of the owning item in `output`
        output_index: usize,
        /// Index of the part in the item
        content_index: usize,
        /// Full text
        text: String,
    },
    /// Content part finished
    #[serde(rename = "response.content_part.done")]
    ContentPartDone {
        /// Position in the stream
        sequence_number: u64,
        /// Owning item
        item_id: String,
        /// Index of the owning item in `output`
        output_index: usize,
        /// Index of the part in the item
        content_index: usize,
        /// The finished part
        part: ResponsesOutputContent,
    },
    /// Function call arguments finished
    #[serde(rename = "response.function_call_arguments.done")]
    FunctionCallArgumentsDone {
        /// Position in the stream
        sequence_number: u64,
        /// Owning item
        item_id: String,
        /// Index of the owning item in `output`
        output_index: usize,
        /// Full arguments
        arguments: String,
    },
    /// Output item finished
    #[serde(rename = "response.output_item.done")]
    OutputItemDone {
        /// Position in the stream
        sequence_number: u64,
        /// Index in `output`
        output_index: usize,
        /// The finished item
        item: ResponsesOutputItem,
    },
    /// Response finished
    #[serde(rename = "response.completed")]
    Completed {
        /// Position in the stream
        sequence_number: u64,
        /// Final response
        response: ResponsesResponse,
    },
    /// Response failed
    #[serde(rename = "response.failed")]
    Failed {
        /// Position in the stream
        sequence_number: u64,
        /// Response carrying the error
        response: ResponsesResponse,
    },
}

impl ResponsesStreamEvent {
    /// SSE event name, identical to the `type` field
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Created { .. } => "response.created",
            Self::InProgress { .. } => "response.in_progress",
            Self::OutputItemAdded { .. } => "response.output_item.added",
            Self::ContentPartAdded { .. } => "response.content_part.added",
            Self::OutputTextDelta { .. } => "response.output_text.delta",
            Self::FunctionCallArgumentsDelta { .. } => "response.function_call_arguments.delta",
            Self::OutputTextDone { .. } => "response.output_text.done",
            Self::ContentPartDone { .. } => "response.content_part.done",
            Self::FunctionCallArgumentsDone { .. } => "response.function_call_arguments.done",
            Self::OutputItemDone { .. } => "response.output_item.done",
            Self::Completed { .. } => "response.completed",
            Self::Failed { .. } => "response.failed",
        }
    }
}
