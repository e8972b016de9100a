//! Conversion between the unified model and the `OpenAI` Responses API

use maestro_core::{IdNamespace, generate_id};
use serde_json::Value;

use super::content::{fallback_part, image_url_part, tool_output_text};
use super::{mode_to_policy, unix_now};
use crate::error::LlmError;
use crate::protocol::Lenient;
use crate::protocol::responses::{
    ResponsesContentPart, ResponsesError, ResponsesInput, ResponsesInputItem, ResponsesMessageContent,
    ResponsesMessageItem, ResponsesOutputContent, ResponsesOutputItem, ResponsesRequest, ResponsesResponse,
    ResponsesTool, ResponsesToolChoice, ResponsesTypedItem, ResponsesUsage,
};
use crate::tokens;
use crate::types::{ChatRequest, CompletionResult, Part, ToolChoicePolicy, ToolSpec, UnifiedMessage};

// -- Inbound: Responses request -> unified --

impl TryFrom<ResponsesRequest> for ChatRequest {
    type Error = LlmError;

    fn try_from(req: ResponsesRequest) -> Result<Self, Self::Error> {
        if req.previous_response_id.is_some() || req.conversation.is_some() {
            return Err(LlmError::StatefulContinuation);
        }

        Ok(Self {
            model: req.model,
            messages: input_to_unified(req.input, req.instructions),
            tools: tools_to_unified(req.tools.unwrap_or_default()),
            tool_choice: tool_choice_to_unified(req.tool_choice.as_ref()),
        })
    }
}

/// Convert `input`, prepending `instructions` as a user message
pub fn input_to_unified(input: ResponsesInput, instructions: Option<String>) -> Vec<UnifiedMessage> {
    let mut messages: Vec<UnifiedMessage> = instructions
        .filter(|text| !text.is_empty())
        .map(UnifiedMessage::user_text)
        .into_iter()
        .collect();

    match input {
        ResponsesInput::Text(text) => messages.push(UnifiedMessage::user_text(text)),
        ResponsesInput::Items(items) => messages.extend(items.into_iter().filter_map(item_to_unified)),
    }

    messages
}

/// Convert one input item; stateful markers yield nothing
fn item_to_unified(item: ResponsesInputItem) -> Option<UnifiedMessage> {
    match item {
        ResponsesInputItem::Typed(ResponsesTypedItem::Message(message)) | ResponsesInputItem::Message(message) => {
            Some(message_to_unified(message))
        }
        ResponsesInputItem::Typed(ResponsesTypedItem::FunctionCall {
            call_id, name, arguments, ..
        }) => Some(UnifiedMessage::assistant(vec![Part::ToolCall {
            call_id,
            name,
            arguments_json: arguments,
        }])),
        ResponsesInputItem::Typed(ResponsesTypedItem::FunctionCallOutput { call_id, output }) => {
            Some(UnifiedMessage::user(vec![Part::ToolResult {
                call_id,
                content_json: tool_output_text(&output),
            }]))
        }
        ResponsesInputItem::Typed(ResponsesTypedItem::ItemReference { id } | ResponsesTypedItem::Reasoning { id }) => {
            tracing::debug!(item_id = ?id, "dropping stateful input item");
            None
        }
        ResponsesInputItem::Unknown(original) => Some(UnifiedMessage::user(vec![fallback_part(&original)])),
    }
}

fn message_to_unified(message: ResponsesMessageItem) -> UnifiedMessage {
    let parts = match message.content {
        ResponsesMessageContent::Text(text) if text.is_empty() => Vec::new(),
        ResponsesMessageContent::Text(text) => vec![Part::text(text)],
        ResponsesMessageContent::Parts(parts) => parts.into_iter().map(content_part_to_unified).collect(),
    };

    if message.role == "assistant" {
        UnifiedMessage::assistant(parts)
    } else {
        UnifiedMessage::user(parts)
    }
}

fn content_part_to_unified(part: Lenient<ResponsesContentPart>) -> Part {
    match part {
        Lenient::Known(
            ResponsesContentPart::InputText { text }
            | ResponsesContentPart::OutputText { text }
            | ResponsesContentPart::Refusal { refusal: text },
        ) => Part::text(text),
        Lenient::Known(ResponsesContentPart::InputImage {
            image_url: Some(ref url), ..
        }) => image_url_part(url, &part),
        Lenient::Known(ResponsesContentPart::InputImage { .. }) => fallback_part(&part),
        Lenient::Unknown(original) => fallback_part(&original),
    }
}

/// Keep `function` tools, skipping hosted tools with a warning
pub fn tools_to_unified(tools: Vec<ResponsesTool>) -> Vec<ToolSpec> {
    tools
        .into_iter()
        .filter_map(|tool| match (tool.tool_type.as_str(), tool.name) {
            ("function", Some(name)) => Some(ToolSpec::new(name, tool.description, tool.parameters)),
            (tool_type, _) => {
                tracing::warn!(tool_type, "skipping unsupported tool");
                None
            }
        })
        .collect()
}

/// Map `tool_choice`
///
/// A forced function becomes `Required`; `allowed_tools` follows its mode;
/// forcing a hosted tool, which was dropped, leaves the model free.
pub fn tool_choice_to_unified(choice: Option<&ResponsesToolChoice>) -> ToolChoicePolicy {
    match choice {
        None => ToolChoicePolicy::None,
        Some(ResponsesToolChoice::Mode(mode)) => mode_to_policy(mode),
        Some(ResponsesToolChoice::Object(object)) => match object.choice_type.as_str() {
            "function" => ToolChoicePolicy::Required,
            "allowed_tools" => object.mode.as_deref().map_or(ToolChoicePolicy::Auto, mode_to_policy),
            _ => ToolChoicePolicy::Auto,
        },
    }
}

// -- Outbound: unified completion -> Responses response --

/// Request fields a response echoes back, captured before the request is consumed
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    id: String,
    created_at: u64,
    model: String,
    instructions: Option<String>,
    tools: Vec<ResponsesTool>,
    tool_choice: Value,
    parallel_tool_calls: bool,
    metadata: Value,
}

impl ResponseEnvelope {
    /// Capture the echoed fields and mint the response id
    pub fn new(req: &ResponsesRequest) -> Self {
        Self {
            id: generate_id(IdNamespace::Response),
            created_at: unix_now(),
            model: req.model.clone(),
            instructions: req.instructions.clone(),
            tools: req.tools.clone().unwrap_or_default(),
            tool_choice: req
                .tool_choice
                .as_ref()
                .and_then(|choice| serde_json::to_value(choice).ok())
                .unwrap_or_else(|| Value::String("auto".to_owned())),
            parallel_tool_calls: req.parallel_tool_calls.unwrap_or(true),
            metadata: req
                .metadata
                .clone()
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        }
    }

    /// Response identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Response object in the given state
    pub fn snapshot(
        &self,
        status: &str,
        output: Vec<ResponsesOutputItem>,
        usage: Option<ResponsesUsage>,
    ) -> ResponsesResponse {
        ResponsesResponse {
            id: self.id.clone(),
            object: "response".to_owned(),
            created_at: self.created_at,
            status: status.to_owned(),
            error: None,
            incomplete_details: None,
            instructions: self.instructions.clone(),
            model: self.model.clone(),
            output,
            parallel_tool_calls: self.parallel_tool_calls,
            tool_choice: self.tool_choice.clone(),
            tools: self.tools.clone(),
            metadata: self.metadata.clone(),
            usage,
        }
    }

    /// Failed response carrying the error message
    pub fn failed(&self, output: Vec<ResponsesOutputItem>, message: &str) -> ResponsesResponse {
        ResponsesResponse {
            error: Some(ResponsesError {
                code: "server_error".to_owned(),
                message: message.to_owned(),
            }),
            ..self.snapshot("failed", output, None)
        }
    }
}

/// Build the completed response for a finished completion
pub fn to_responses_response(
    result: &CompletionResult,
    envelope: &ResponseEnvelope,
    prompt_tokens: u32,
) -> ResponsesResponse {
    let usage = ResponsesUsage::new(prompt_tokens, tokens::estimate_completion(result));
    envelope.snapshot("completed", output_items(result), Some(usage))
}

/// Output items: the text message first, then one function call per tool call
pub fn output_items(result: &CompletionResult) -> Vec<ResponsesOutputItem> {
    let message = (!result.text.is_empty()).then(|| {
        message_item(
            generate_id(IdNamespace::Message),
            vec![ResponsesOutputContent::text(&result.text)],
            "completed",
        )
    });

    message
        .into_iter()
        .chain(result.tool_calls.iter().map(|call| {
            function_call_item(
                generate_id(IdNamespace::FunctionCall),
                generate_id(IdNamespace::Call),
                &call.name,
                call.arguments_json(),
                "completed",
            )
        }))
        .collect()
}

/// Assistant message item
pub fn message_item(id: String, content: Vec<ResponsesOutputContent>, status: &str) -> ResponsesOutputItem {
    ResponsesOutputItem::Message {
        id,
        status: status.to_owned(),
        role: "assistant".to_owned(),
        content,
    }
}

/// Function call item
pub fn function_call_item(
    id: String,
    call_id: String,
    name: &str,
    arguments: String,
    status: &str,
) -> ResponsesOutputItem {
    ResponsesOutputItem::FunctionCall {
        id,
        call_id,
        name: name.to_owned(),
        arguments,
        status: status.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{CompletedToolCall, Role};

    fn request(body: Value) -> ResponsesRequest {
        serde_json::from_value(body).unwrap()
    }

    fn convert(body: Value) -> ChatRequest {
        ChatRequest::try_from(request(body)).unwrap()
    }

    #[test]
    fn plain_string_input_is_one_user_message() {
        let req = convert(json!({"model": "gpt-4o", "input": "Hello"}));
        assert_eq!(req.messages, vec![UnifiedMessage::user_text("Hello")]);
    }

    #[test]
    fn instructions_lead_the_conversation() {
        let req = convert(json!({"model": "gpt-4o", "instructions": "Be brief", "input": "Hello"}));
        assert_eq!(
            req.messages,
            vec![UnifiedMessage::user_text("Be brief"), UnifiedMessage::user_text("Hello")]
        );
    }

    #[test]
    fn item_list_keeps_order_and_drops_stateful_items() {
        let req = convert(json!({
            "model": "gpt-4o",
            "input": [
                {"role": "system", "content": "sys"},
                {"type": "message", "role": "user", "content": [{"type": "input_text", "text": "weather?"}]},
                {"type": "reasoning", "id": "rs_1", "summary": []},
                {"type": "function_call", "call_id": "call_1", "name": "get_weather", "arguments": "{\"city\":\"Paris\"}"},
                {"type": "function_call_output", "call_id": "call_1", "output": "72F"},
                {"type": "item_reference", "id": "msg_1"},
                {"role": "assistant", "content": [{"type": "output_text", "text": "It is 72F"}]},
            ]
        }));

        let roles: Vec<Role> = req.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::User, Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(
            req.messages[2].parts,
            vec![Part::ToolCall {
                call_id: "call_1".to_owned(),
                name: "get_weather".to_owned(),
                arguments_json: "{\"city\":\"Paris\"}".to_owned(),
            }]
        );
        assert_eq!(
            req.messages[3].parts,
            vec![Part::ToolResult {
                call_id: "call_1".to_owned(),
                content_json: "72F".to_owned(),
            }]
        );
    }

    #[test]
    fn unknown_items_and_remote_images_fall_back() {
        let req = convert(json!({
            "model": "gpt-4o",
            "input": [
                {"type": "computer_call_output", "call_id": "c", "output": {}},
                {"role": "user", "content": [
                    {"type": "input_image", "image_url": "https://example.com/cat.png"},
                    {"type": "input_image", "file_id": "file_123"},
                    {"type": "input_file", "file_id": "file_456"},
                ]},
            ]
        }));

        assert!(req.messages[0].parts[0].as_text().unwrap().contains("computer_call_output"));
        let parts = &req.messages[1].parts;
        assert!(parts[0].as_text().unwrap().contains("https://example.com/cat.png"));
        assert!(parts[1].as_text().unwrap().contains("file_123"));
        assert!(parts[2].as_text().unwrap().contains("input_file"));
    }

    #[test]
    fn stateful_continuation_is_rejected() {
        let err = ChatRequest::try_from(request(json!({
            "model": "gpt-4o",
            "input": "more",
            "previous_response_id": "resp_123"
        })))
        .unwrap_err();
        assert!(matches!(err, LlmError::StatefulContinuation));

        let err = ChatRequest::try_from(request(json!({
            "model": "gpt-4o",
            "input": "more",
            "conversation": "conv_123"
        })))
        .unwrap_err();
        assert!(matches!(err, LlmError::StatefulContinuation));
    }

    #[test]
    fn hosted_tools_are_dropped() {
        let req = convert(json!({
            "model": "gpt-4o",
            "input": "hi",
            "tools": [
                {"type": "function", "name": "a", "parameters": {"type": "object"}},
                {"type": "file_search", "vector_store_ids": ["vs_1"]},
                {"type": "web_search_preview"},
            ]
        }));

        let names: Vec<&str> = req.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn tool_choice_mapping() {
        let choice = |v: Value| serde_json::from_value::<ResponsesToolChoice>(v).unwrap();

        assert_eq!(tool_choice_to_unified(None), ToolChoicePolicy::None);
        assert_eq!(tool_choice_to_unified(Some(&choice(json!("required")))), ToolChoicePolicy::Required);
        assert_eq!(
            tool_choice_to_unified(Some(&choice(json!({"type": "function", "name": "a"})))),
            ToolChoicePolicy::Required
        );
        assert_eq!(
            tool_choice_to_unified(Some(&choice(json!({"type": "allowed_tools", "mode": "required", "tools": []})))),
            ToolChoicePolicy::Required
        );
        assert_eq!(
            tool_choice_to_unified(Some(&choice(json!({"type": "file_search"})))),
            ToolChoicePolicy::Auto
        );
    }

    #[test]
    fn empty_completion_has_empty_output() {
        let envelope = ResponseEnvelope::new(&request(json!({"model": "gpt-4o", "input": "hi"})));
        let resp = to_responses_response(&CompletionResult::default(), &envelope, 5);

        assert!(resp.output.is_empty());
        assert_eq!(resp.status, "completed");
        assert!(resp.id.starts_with("resp_AM-"));
    }

    #[test]
    fn text_precedes_tool_calls() {
        let envelope = ResponseEnvelope::new(&request(json!({
            "model": "gpt-4o",
            "input": "hi",
            "instructions": "Be brief",
            "metadata": {"k": "v"}
        })));
        let result = CompletionResult {
            text: "Let me check".to_owned(),
            tool_calls: vec![
                CompletedToolCall {
                    call_id: "up_1".to_owned(),
                    name: "f".to_owned(),
                    input: Value::Null,
                },
                CompletedToolCall {
                    call_id: "up_2".to_owned(),
                    name: "g".to_owned(),
                    input: json!({"x": 1}),
                },
            ],
        };

        let body = serde_json::to_value(to_responses_response(&result, &envelope, 5)).unwrap();
        let output = body["output"].as_array().unwrap();

        assert_eq!(output.len(), 3);
        assert_eq!(output[0]["type"], "message");
        assert!(output[0]["id"].as_str().unwrap().starts_with("msg_AM-"));
        assert_eq!(output[0]["content"][0]["text"], "Let me check");
        assert_eq!(output[1]["type"], "function_call");
        assert_eq!(output[1]["arguments"], "{}");
        assert!(output[1]["id"].as_str().unwrap().starts_with("fc_AM-"));
        assert!(output[1]["call_id"].as_str().unwrap().starts_with("call_AM-"));
        assert_eq!(output[2]["name"], "g");
        assert_eq!(output[2]["arguments"], r#"{"x":1}"#);
        assert_eq!(body["instructions"], "Be brief");
        assert_eq!(body["metadata"]["k"], "v");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn failed_snapshot_carries_error() {
        let envelope = ResponseEnvelope::new(&request(json!({"model": "gpt-4o", "input": "hi"})));
        let resp = envelope.failed(Vec::new(), "upstream went away");

        assert_eq!(resp.status, "failed");
        let error = resp.error.unwrap();
        assert_eq!(error.code, "server_error");
        assert_eq!(error.message, "upstream went away");
    }
}
