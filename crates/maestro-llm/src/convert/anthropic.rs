//! Conversion between the unified model and Anthropic Messages

use maestro_core::{IdNamespace, generate_id};
use serde_json::Value;

use super::content::{base64_part, fallback_part, tool_output_text};
use crate::protocol::Lenient;
use crate::protocol::anthropic::{
    AnthropicContent, AnthropicContentBlock, AnthropicCountTokensRequest, AnthropicMessage, AnthropicRequest,
    AnthropicResponse, AnthropicResponseBlock, AnthropicSystem, AnthropicTool, AnthropicToolChoice, AnthropicUsage,
};
use crate::tokens;
use crate::types::{ChatRequest, CompletionResult, Part, ToolChoicePolicy, ToolSpec, UnifiedMessage};

// -- Inbound: Anthropic request -> unified --

impl From<AnthropicRequest> for ChatRequest {
    fn from(req: AnthropicRequest) -> Self {
        Self {
            model: req.model,
            messages: messages_to_unified(req.system, req.messages),
            tools: tools_to_unified(req.tools.unwrap_or_default()),
            tool_choice: tool_choice_to_unified(req.tool_choice.as_ref()),
        }
    }
}

impl From<AnthropicCountTokensRequest> for ChatRequest {
    fn from(req: AnthropicCountTokensRequest) -> Self {
        Self {
            model: req.model,
            messages: messages_to_unified(req.system, req.messages),
            tools: tools_to_unified(req.tools.unwrap_or_default()),
            tool_choice: ToolChoicePolicy::None,
        }
    }
}

/// Convert the conversation, prepending `system` as a user message
pub fn messages_to_unified(system: Option<AnthropicSystem>, messages: Vec<AnthropicMessage>) -> Vec<UnifiedMessage> {
    let system = system.and_then(|system| {
        let text = match system {
            AnthropicSystem::Text(text) => text,
            AnthropicSystem::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    Lenient::Known(AnthropicContentBlock::Text { text }) => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        };
        (!text.is_empty()).then(|| UnifiedMessage::user_text(text))
    });

    system
        .into_iter()
        .chain(messages.into_iter().map(message_to_unified))
        .collect()
}

fn message_to_unified(message: AnthropicMessage) -> UnifiedMessage {
    let parts = match message.content {
        AnthropicContent::Text(text) if text.is_empty() => Vec::new(),
        AnthropicContent::Text(text) => vec![Part::text(text)],
        AnthropicContent::Blocks(blocks) => blocks.into_iter().filter_map(block_to_unified).collect(),
    };

    if message.role == "assistant" {
        UnifiedMessage::assistant(parts)
    } else {
        UnifiedMessage::user(parts)
    }
}

/// Convert one content block; thinking blocks yield nothing
fn block_to_unified(block: Lenient<AnthropicContentBlock>) -> Option<Part> {
    let part = match block {
        Lenient::Known(AnthropicContentBlock::Text { text }) => Part::text(text),
        Lenient::Known(AnthropicContentBlock::Image { ref source }) => match (&source.data, &source.media_type) {
            (Some(data), Some(media_type)) if source.source_type == "base64" => base64_part(media_type, data, &block),
            _ => fallback_part(&block),
        },
        Lenient::Known(AnthropicContentBlock::ToolUse { id, name, input }) => Part::ToolCall {
            call_id: id,
            name,
            arguments_json: if input.is_null() { "{}".to_owned() } else { input.to_string() },
        },
        Lenient::Known(AnthropicContentBlock::ToolResult {
            tool_use_id, content, ..
        }) => Part::ToolResult {
            call_id: tool_use_id,
            content_json: content.as_ref().map(tool_result_text).unwrap_or_default(),
        },
        Lenient::Known(AnthropicContentBlock::Thinking { .. } | AnthropicContentBlock::RedactedThinking { .. }) => {
            return None;
        }
        Lenient::Unknown(original) => fallback_part(&original),
    };

    Some(part)
}

/// Tool result content: strings verbatim, text-only blocks joined, anything else as JSON
fn tool_result_text(content: &Value) -> String {
    if let Value::Array(blocks) = content {
        let texts: Option<Vec<&str>> = blocks
            .iter()
            .map(|block| match (block.get("type").and_then(Value::as_str), block.get("text")) {
                (Some("text"), Some(Value::String(text))) => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if let Some(texts) = texts {
            return texts.concat();
        }
    }

    tool_output_text(content)
}

/// Keep client tools, skipping versioned server tools with a warning
pub fn tools_to_unified(tools: Vec<AnthropicTool>) -> Vec<ToolSpec> {
    tools
        .into_iter()
        .filter_map(|tool| match tool.tool_type.as_deref() {
            None | Some("custom") => Some(ToolSpec::new(tool.name, tool.description, tool.input_schema)),
            Some(tool_type) => {
                tracing::warn!(tool_type, tool = %tool.name, "skipping unsupported tool");
                None
            }
        })
        .collect()
}

/// Map `tool_choice`; forcing one tool becomes `Required`
pub fn tool_choice_to_unified(choice: Option<&AnthropicToolChoice>) -> ToolChoicePolicy {
    match choice.map(|choice| choice.choice_type.as_str()) {
        Some("auto") => ToolChoicePolicy::Auto,
        Some("any" | "tool") => ToolChoicePolicy::Required,
        _ => ToolChoicePolicy::None,
    }
}

// -- Outbound: unified completion -> Anthropic response --

/// Build a `message` body for a finished completion
pub fn to_anthropic_response(result: &CompletionResult, model: &str, input_tokens: u32) -> AnthropicResponse {
    let text = (!result.text.is_empty()).then(|| AnthropicResponseBlock::Text {
        text: result.text.clone(),
    });
    let content = text
        .into_iter()
        .chain(result.tool_calls.iter().map(|call| AnthropicResponseBlock::ToolUse {
            id: generate_id(IdNamespace::ToolUse),
            name: call.name.clone(),
            input: call.input_object(),
        }))
        .collect();

    AnthropicResponse {
        content,
        stop_reason: Some(stop_reason(result).to_owned()),
        usage: AnthropicUsage {
            input_tokens,
            output_tokens: tokens::estimate_completion(result),
        },
        ..message_shell(generate_id(IdNamespace::Message), model, input_tokens)
    }
}

/// Empty assistant message, as sent in `message_start`
pub fn message_shell(id: String, model: &str, input_tokens: u32) -> AnthropicResponse {
    AnthropicResponse {
        id,
        response_type: "message".to_owned(),
        role: "assistant".to_owned(),
        content: Vec::new(),
        model: model.to_owned(),
        stop_reason: None,
        stop_sequence: None,
        usage: AnthropicUsage {
            input_tokens,
            output_tokens: 0,
        },
    }
}

/// `tool_use` when any tool was called, `end_turn` otherwise
pub fn stop_reason(result: &CompletionResult) -> &'static str {
    if result.tool_calls.is_empty() { "end_turn" } else { "tool_use" }
}
