use serde_json::Value;

use super::{ToolChoicePolicy, ToolSpec, UnifiedMessage};

/// The single call contract of the underlying chat capability
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Model name; the client-facing name until resolved to an upstream id
    pub model: String,
    /// Conversation in order
    pub messages: Vec<UnifiedMessage>,
    /// Declared tools
    pub tools: Vec<ToolSpec>,
    /// Tool usage policy
    pub tool_choice: ToolChoicePolicy,
}

/// Tool invocation in a finished completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedToolCall {
    /// Upstream call identifier
    pub call_id: String,
    /// Tool name
    pub name: String,
    /// Parsed arguments; `Null` when absent, a string when malformed
    pub input: Value,
}

impl CompletedToolCall {
    /// Arguments as JSON text
    ///
    /// Absent arguments become `"{}"`; arguments the upstream sent as
    /// malformed JSON are carried as a string and returned verbatim.
    pub fn arguments_json(&self) -> String {
        match &self.input {
            Value::Null => "{}".to_owned(),
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        }
    }

    /// Arguments as a JSON object, empty when absent or not an object
    pub fn input_object(&self) -> Value {
        match &self.input {
            Value::Object(_) => self.input.clone(),
            _ => Value::Object(serde_json::Map::new()),
        }
    }
}

/// Result of a non-streaming completion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResult {
    /// Generated text, possibly empty
    pub text: String,
    /// Tool invocations in upstream order
    pub tool_calls: Vec<CompletedToolCall>,
}

impl CompletionResult {
    /// Whether nothing was generated at all
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tool_calls.is_empty()
    }
}
