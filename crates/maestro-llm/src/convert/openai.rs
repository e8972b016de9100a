//! Conversion between the unified model and `OpenAI` Chat Completions
//!
//! Chat Completions is spoken in both directions: by clients calling
//! `/chat/completions`, and by the gateway itself towards the upstream.

use std::collections::HashMap;

use maestro_core::{IdNamespace, generate_id};
use serde_json::Value;

use super::content::{fallback_part, image_url_part, to_data_uri, tool_output_text};
use super::{mode_to_policy, unix_now};
use crate::protocol::Lenient;
use crate::protocol::openai::{
    ChatChoice, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatContent, ChatContentPart,
    ChatFunctionCall, ChatFunctionDefinition, ChatImageUrl, ChatMessage, ChatResponseMessage, ChatTool,
    ChatToolCall, ChatToolChoice, ChatUsage,
};
use crate::tokens;
use crate::types::{
    ChatRequest, CompletedToolCall, CompletionResult, Part, Role, StreamFragment, ToolChoicePolicy, ToolSpec,
    UnifiedMessage,
};

// -- Inbound: OpenAI Chat request -> unified --

impl From<ChatCompletionRequest> for ChatRequest {
    fn from(req: ChatCompletionRequest) -> Self {
        Self {
            model: req.model,
            messages: messages_to_unified(req.messages),
            tools: tools_to_unified(req.tools.unwrap_or_default()),
            tool_choice: tool_choice_to_unified(req.tool_choice.as_ref()),
        }
    }
}

/// Convert chat messages, folding `system`, `developer` and `tool` into user turns
pub fn messages_to_unified(messages: Vec<ChatMessage>) -> Vec<UnifiedMessage> {
    messages.into_iter().map(message_to_unified).collect()
}

fn message_to_unified(message: ChatMessage) -> UnifiedMessage {
    match message.role.as_str() {
        "assistant" => {
            let mut parts = message.content.map(content_to_parts).unwrap_or_default();
            parts.extend(message.tool_calls.unwrap_or_default().into_iter().map(|call| Part::ToolCall {
                call_id: call.id,
                name: call.function.name,
                arguments_json: call.function.arguments,
            }));
            UnifiedMessage::assistant(parts)
        }
        "tool" | "function" => UnifiedMessage::user(vec![Part::ToolResult {
            call_id: message.tool_call_id.or(message.name).unwrap_or_default(),
            content_json: message.content.as_ref().map(tool_content_text).unwrap_or_default(),
        }]),
        _ => UnifiedMessage::user(message.content.map(content_to_parts).unwrap_or_default()),
    }
}

fn content_to_parts(content: ChatContent) -> Vec<Part> {
    match content {
        ChatContent::Text(text) if text.is_empty() => Vec::new(),
        ChatContent::Text(text) => vec![Part::text(text)],
        ChatContent::Parts(parts) => parts.into_iter().map(content_part_to_unified).collect(),
    }
}

fn content_part_to_unified(part: Lenient<ChatContentPart>) -> Part {
    match part {
        Lenient::Known(ChatContentPart::Text { text }) => Part::text(text),
        Lenient::Known(ChatContentPart::Refusal { refusal }) => Part::text(refusal),
        Lenient::Known(ChatContentPart::ImageUrl { ref image_url }) => image_url_part(&image_url.url, &part),
        Lenient::Unknown(original) => fallback_part(&original),
    }
}

/// Tool message content: strings verbatim, text parts joined, anything else as JSON
fn tool_content_text(content: &ChatContent) -> String {
    match content {
        ChatContent::Text(text) => text.clone(),
        ChatContent::Parts(parts) => {
            let texts: Option<Vec<&str>> = parts
                .iter()
                .map(|part| match part {
                    Lenient::Known(ChatContentPart::Text { text }) => Some(text.as_str()),
                    _ => None,
                })
                .collect();

            match texts {
                Some(texts) => texts.concat(),
                None => serde_json::to_value(parts).map_or_else(|_| String::new(), |v| tool_output_text(&v)),
            }
        }
    }
}

/// Keep `function` tools, skipping every other kind with a warning
pub fn tools_to_unified(tools: Vec<ChatTool>) -> Vec<ToolSpec> {
    tools
        .into_iter()
        .filter_map(|tool| match (tool.tool_type.as_str(), tool.function) {
            ("function", Some(function)) => {
                Some(ToolSpec::new(function.name, function.description, function.parameters))
            }
            (tool_type, _) => {
                tracing::warn!(tool_type, "skipping unsupported tool");
                None
            }
        })
        .collect()
}

/// Map `tool_choice`; forcing a named function becomes `Required` and
/// `allowed_tools` follows its mode
pub fn tool_choice_to_unified(choice: Option<&ChatToolChoice>) -> ToolChoicePolicy {
    match choice {
        None => ToolChoicePolicy::None,
        Some(ChatToolChoice::Mode(mode)) => mode_to_policy(mode),
        Some(ChatToolChoice::Named(named)) if named.choice_type == "allowed_tools" => named
            .allowed_tools
            .as_ref()
            .and_then(|allowed| allowed.mode.as_deref())
            .map_or(ToolChoicePolicy::Auto, mode_to_policy),
        Some(ChatToolChoice::Named(_)) => ToolChoicePolicy::Required,
    }
}

// -- Outbound: unified completion -> OpenAI Chat response --

/// Build a `chat.completion` body for a finished completion
pub fn to_chat_response(result: &CompletionResult, model: &str, prompt_tokens: u32) -> ChatCompletionResponse {
    let tool_calls: Vec<ChatToolCall> = result
        .tool_calls
        .iter()
        .map(|call| ChatToolCall {
            id: generate_id(IdNamespace::Call),
            call_type: "function".to_owned(),
            function: ChatFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments_json(),
            },
        })
        .collect();

    ChatCompletionResponse {
        id: generate_id(IdNamespace::ChatCompletion),
        object: "chat.completion".to_owned(),
        created: unix_now(),
        model: model.to_owned(),
        choices: vec![ChatChoice {
            index: 0,
            message: ChatResponseMessage {
                role: "assistant".to_owned(),
                content: (!result.text.is_empty()).then(|| result.text.clone()),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            },
            finish_reason: Some(finish_reason(result).to_owned()),
        }],
        usage: Some(ChatUsage::new(prompt_tokens, tokens::estimate_completion(result))),
    }
}

/// `tool_calls` when any tool was called, `stop` otherwise
pub fn finish_reason(result: &CompletionResult) -> &'static str {
    if result.tool_calls.is_empty() { "stop" } else { "tool_calls" }
}

// -- Upstream: unified request -> OpenAI Chat request --

impl From<&ChatRequest> for ChatCompletionRequest {
    fn from(req: &ChatRequest) -> Self {
        Self {
            model: req.model.clone(),
            messages: merge_assistant_turns(req.messages.iter().flat_map(message_to_upstream)),
            stream: None,
            stream_options: None,
            tools: (!req.tools.is_empty()).then(|| req.tools.iter().map(tool_to_upstream).collect()),
            tool_choice: req
                .tool_choice
                .is_required()
                .then(|| ChatToolChoice::Mode("required".to_owned())),
        }
    }
}

/// One unified message may expand to several chat messages: tool results
/// travel as separate `tool` messages ahead of the remaining user content.
fn message_to_upstream(message: &UnifiedMessage) -> Vec<ChatMessage> {
    match message.role {
        Role::Assistant => vec![assistant_to_upstream(&message.parts)],
        Role::User => {
            let mut out: Vec<ChatMessage> = message
                .parts
                .iter()
                .filter_map(|part| match part {
                    Part::ToolResult { call_id, content_json } => Some(ChatMessage {
                        role: "tool".to_owned(),
                        content: Some(ChatContent::Text(content_json.clone())),
                        name: None,
                        tool_calls: None,
                        tool_call_id: Some(call_id.clone()),
                    }),
                    _ => None,
                })
                .collect();

            let content: Vec<&Part> = message
                .parts
                .iter()
                .filter(|part| !matches!(part, Part::ToolResult { .. }))
                .collect();

            if out.is_empty() || !content.is_empty() {
                out.push(ChatMessage {
                    role: "user".to_owned(),
                    content: Some(user_content_to_upstream(&content)),
                    name: None,
                    tool_calls: None,
                    tool_call_id: None,
                });
            }
            out
        }
    }
}

/// Join adjacent assistant messages
///
/// Protocols that carry one tool call per item produce a run of assistant
/// turns; the upstream expects all calls answered by the following `tool`
/// messages to sit in a single assistant message. Texts are joined by a
/// newline.
fn merge_assistant_turns(messages: impl Iterator<Item = ChatMessage>) -> Vec<ChatMessage> {
    let mut merged: Vec<ChatMessage> = Vec::new();

    for message in messages {
        match merged.last_mut() {
            Some(last) if last.role == "assistant" && message.role == "assistant" => {
                let text = [&last.content, &message.content]
                    .into_iter()
                    .filter_map(|content| match content {
                        Some(ChatContent::Text(text)) if !text.is_empty() => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                let mut calls = last.tool_calls.take().unwrap_or_default();
                calls.extend(message.tool_calls.unwrap_or_default());

                last.content = (!text.is_empty() || calls.is_empty()).then_some(ChatContent::Text(text));
                last.tool_calls = (!calls.is_empty()).then_some(calls);
            }
            _ => merged.push(message),
        }
    }

    merged
}

fn user_content_to_upstream(parts: &[&Part]) -> ChatContent {
    if let [Part::Text { value }] = parts {
        return ChatContent::Text(value.clone());
    }
    if parts.is_empty() {
        return ChatContent::Text(String::new());
    }

    ChatContent::Parts(
        parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { value } => Some(ChatContentPart::Text { text: value.clone() }),
                Part::Data { mime_type, bytes } => Some(ChatContentPart::ImageUrl {
                    image_url: ChatImageUrl {
                        url: to_data_uri(mime_type, bytes),
                        detail: None,
                    },
                }),
                Part::ToolCall { .. } | Part::ToolResult { .. } => None,
            })
            .map(Lenient::Known)
            .collect(),
    )
}

fn assistant_to_upstream(parts: &[Part]) -> ChatMessage {
    let text: String = parts.iter().filter_map(Part::as_text).collect();
    let tool_calls: Vec<ChatToolCall> = parts
        .iter()
        .filter_map(|part| match part {
            Part::ToolCall {
                call_id,
                name,
                arguments_json,
            } => Some(ChatToolCall {
                id: call_id.clone(),
                call_type: "function".to_owned(),
                function: ChatFunctionCall {
                    name: name.clone(),
                    arguments: arguments_json.clone(),
                },
            }),
            _ => None,
        })
        .collect();

    ChatMessage {
        role: "assistant".to_owned(),
        content: (!text.is_empty() || tool_calls.is_empty()).then_some(ChatContent::Text(text)),
        name: None,
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        tool_call_id: None,
    }
}

fn tool_to_upstream(tool: &ToolSpec) -> ChatTool {
    ChatTool {
        tool_type: "function".to_owned(),
        function: Some(ChatFunctionDefinition {
            name: tool.name.clone(),
            description: (!tool.description.is_empty()).then(|| tool.description.clone()),
            parameters: Some(tool.input_schema.clone()),
        }),
    }
}

// -- Upstream: OpenAI Chat response -> unified --

impl From<ChatCompletionResponse> for CompletionResult {
    fn from(resp: ChatCompletionResponse) -> Self {
        let Some(choice) = resp.choices.into_iter().next() else {
            return Self::default();
        };

        Self {
            text: choice.message.content.unwrap_or_default(),
            tool_calls: choice
                .message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|call| CompletedToolCall {
                    call_id: call.id,
                    name: call.function.name,
                    input: parse_arguments(&call.function.arguments),
                })
                .collect(),
        }
    }
}

/// Parse tool arguments, keeping malformed JSON as a raw string
pub fn parse_arguments(arguments: &str) -> Value {
    if arguments.trim().is_empty() {
        return Value::Null;
    }

    serde_json::from_str(arguments).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "tool arguments are not valid JSON, keeping them verbatim");
        Value::String(arguments.to_owned())
    })
}

/// Turns upstream stream chunks into unified fragments
///
/// Upstream tool call fragments are keyed by position; only the first one
/// carries the id and name, so they are remembered here.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    calls: HashMap<u32, (String, String)>,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragments carried by one chunk, in order
    pub fn decode(&mut self, chunk: ChatCompletionChunk) -> Vec<StreamFragment> {
        let mut fragments = Vec::new();

        for choice in chunk.choices.into_iter().filter(|choice| choice.index == 0) {
            if let Some(text) = choice.delta.content.filter(|text| !text.is_empty()) {
                fragments.push(StreamFragment::TextDelta(text));
            }

            for call in choice.delta.tool_calls.unwrap_or_default() {
                let function = call.function.unwrap_or_default();
                let (call_id, name) = self.calls.entry(call.index).or_insert_with(|| {
                    (
                        call.id.unwrap_or_else(|| generate_id(IdNamespace::Call)),
                        function.name.unwrap_or_default(),
                    )
                });

                fragments.push(StreamFragment::ToolCallDelta {
                    call_id: call_id.clone(),
                    name: name.clone(),
                    arguments_delta: function.arguments.unwrap_or_default(),
                });
            }
        }

        fragments
    }
}
