//! Token estimation for usage fields and token-counting endpoints
//!
//! The upstream reports no usage the gateway could rely on for every
//! protocol, so counts are estimated locally with the `o200k_base` encoding.

use std::sync::LazyLock;

use tiktoken_rs::{CoreBPE, o200k_base};

use crate::types::{CompletionResult, Part, ToolSpec, UnifiedMessage};

/// Per-message framing overhead
const TOKENS_PER_MESSAGE: u32 = 3;

/// Reply priming overhead added once per prompt
const TOKENS_PER_REPLY: u32 = 3;

/// Flat cost of an inline image
const TOKENS_PER_IMAGE: u32 = 85;

static ENCODER: LazyLock<Option<CoreBPE>> = LazyLock::new(|| match o200k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        tracing::warn!(error = %e, "failed to load tokenizer, falling back to length heuristic");
        None
    }
});

/// Estimate the tokens in a piece of text
pub fn count_text(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }

    let count = ENCODER
        .as_ref()
        .map_or_else(|| text.len().div_ceil(4), |bpe| bpe.encode_with_special_tokens(text).len());

    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Estimate the prompt size of a conversation and its tools
pub fn estimate_prompt(messages: &[UnifiedMessage], tools: &[ToolSpec]) -> u32 {
    let message_tokens = messages
        .iter()
        .map(|message| TOKENS_PER_MESSAGE.saturating_add(message.parts.iter().map(count_part).sum::<u32>()))
        .fold(0u32, u32::saturating_add);

    let tool_tokens = tools
        .iter()
        .map(|tool| {
            count_text(&tool.name)
                .saturating_add(count_text(&tool.description))
                .saturating_add(count_text(&tool.input_schema.to_string()))
        })
        .fold(0u32, u32::saturating_add);

    if messages.is_empty() && tools.is_empty() {
        return 0;
    }

    message_tokens.saturating_add(tool_tokens).saturating_add(TOKENS_PER_REPLY)
}

/// Estimate the size of a finished completion
pub fn estimate_completion(result: &CompletionResult) -> u32 {
    result
        .tool_calls
        .iter()
        .map(|call| count_text(&call.name).saturating_add(count_text(&call.arguments_json())))
        .fold(count_text(&result.text), u32::saturating_add)
}

fn count_part(part: &Part) -> u32 {
    match part {
        Part::Text { value } => count_text(value),
        Part::Data { .. } => TOKENS_PER_IMAGE,
        Part::ToolCall {
            name, arguments_json, ..
        } => count_text(name).saturating_add(count_text(arguments_json)),
        Part::ToolResult { content_json, .. } => count_text(content_json),
    }
}
