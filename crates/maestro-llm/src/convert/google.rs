//! Conversion between the unified model and Google Gemini `generateContent`

use maestro_core::{IdNamespace, generate_id};
use serde_json::Value;

use super::content::{base64_part, fallback_part};
use super::mode_to_policy;
use crate::protocol::google::{
    CountTokensRequest, GeminiCandidate, GeminiContent, GeminiFunctionCall, GeminiPart, GeminiTool,
    GeminiToolConfig, GeminiUsageMetadata, GenerateContentRequest, GenerateContentResponse,
};
use crate::tokens;
use crate::types::{ChatRequest, CompletionResult, Part, ToolChoicePolicy, ToolSpec, UnifiedMessage};

// -- Inbound: Gemini request -> unified --

/// Build a unified request; the model comes from the URL path
pub fn to_chat_request(model: String, req: GenerateContentRequest) -> ChatRequest {
    ChatRequest {
        model,
        messages: contents_to_unified(req.system_instruction, req.contents),
        tools: tools_to_unified(req.tools.unwrap_or_default()),
        tool_choice: tool_config_to_unified(req.tool_config.as_ref()),
    }
}

/// Build the request a `countTokens` call measures
pub fn count_tokens_request(model: String, req: CountTokensRequest) -> ChatRequest {
    match req.generate_content_request {
        Some(inner) => to_chat_request(model, inner),
        None => to_chat_request(
            model,
            GenerateContentRequest {
                contents: req.contents,
                ..GenerateContentRequest::default()
            },
        ),
    }
}

/// Convert the conversation, prepending `systemInstruction` as a user message
///
/// Function responses usually carry no id, so they are paired with the
/// earliest unanswered call of the same name.
pub fn contents_to_unified(system: Option<GeminiContent>, contents: Vec<GeminiContent>) -> Vec<UnifiedMessage> {
    let mut pending: Vec<(String, String)> = Vec::new();

    let system = system.and_then(|content| {
        let text: String = content.parts.iter().filter_map(|part| part.text.as_deref()).collect::<Vec<_>>().join("\n");
        (!text.is_empty()).then(|| UnifiedMessage::user_text(text))
    });

    let messages = contents.into_iter().map(|content| {
        let parts = content
            .parts
            .into_iter()
            .filter_map(|part| part_to_unified(part, &mut pending))
            .collect();

        if content.role.as_deref() == Some("model") {
            UnifiedMessage::assistant(parts)
        } else {
            UnifiedMessage::user(parts)
        }
    });

    system.into_iter().chain(messages).collect()
}

fn part_to_unified(mut part: GeminiPart, pending: &mut Vec<(String, String)>) -> Option<Part> {
    if part.thought == Some(true) {
        return None;
    }

    if let Some(call) = part.function_call.take() {
        let call_id = call.id.unwrap_or_else(|| generate_id(IdNamespace::Call));
        pending.push((call_id.clone(), call.name.clone()));
        return Some(Part::ToolCall {
            call_id,
            name: call.name,
            arguments_json: if call.args.is_null() { "{}".to_owned() } else { call.args.to_string() },
        });
    }

    if let Some(response) = part.function_response.take() {
        let position = match &response.id {
            Some(id) => pending.iter().position(|(call_id, _)| call_id == id),
            None => pending.iter().position(|(_, name)| *name == response.name),
        };
        let call_id = match (position, response.id) {
            (Some(position), _) => pending.remove(position).0,
            (None, Some(id)) => id,
            (None, None) => generate_id(IdNamespace::Call),
        };
        return Some(Part::ToolResult {
            call_id,
            content_json: response.response.to_string(),
        });
    }

    if let Some(blob) = &part.inline_data {
        return Some(base64_part(&blob.mime_type, &blob.data, &part));
    }

    match part.text.take() {
        Some(text) => Some(Part::text(text)),
        None => Some(fallback_part(&part)),
    }
}

/// Keep function declarations, skipping built-in tools with a warning
pub fn tools_to_unified(tools: Vec<GeminiTool>) -> Vec<ToolSpec> {
    let mut specs = Vec::new();

    for tool in tools {
        for kind in tool.extra.keys() {
            tracing::warn!(tool_type = %kind, "skipping unsupported tool");
        }

        specs.extend(tool.function_declarations.unwrap_or_default().into_iter().map(|declaration| {
            let schema = declaration
                .parameters_json_schema
                .or_else(|| declaration.parameters.map(normalize_schema));
            ToolSpec::new(declaration.name, declaration.description, schema)
        }));
    }

    specs
}

/// Lower-case `OpenAPI` type names (`OBJECT`, `STRING`) into JSON Schema ones
fn normalize_schema(schema: Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| match (key.as_str(), value) {
                    ("type", Value::String(kind)) => (key, Value::String(kind.to_ascii_lowercase())),
                    (_, value) => (key, normalize_schema(value)),
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_schema).collect()),
        other => other,
    }
}

/// Map `toolConfig.functionCallingConfig.mode`
pub fn tool_config_to_unified(config: Option<&GeminiToolConfig>) -> ToolChoicePolicy {
    config
        .and_then(|config| config.function_calling_config.as_ref())
        .and_then(|calling| calling.mode.as_deref())
        .map_or(ToolChoicePolicy::None, mode_to_policy)
}

// -- Outbound: unified completion -> Gemini response --

/// Build a `generateContent` body for a finished completion
pub fn to_generate_content_response(
    result: &CompletionResult,
    model: &str,
    prompt_tokens: u32,
) -> GenerateContentResponse {
    let text = (!result.text.is_empty()).then(|| GeminiPart::text(&result.text));
    let parts = text
        .into_iter()
        .chain(result.tool_calls.iter().map(|call| {
            GeminiPart::function_call(GeminiFunctionCall {
                id: Some(generate_id(IdNamespace::Call)),
                name: call.name.clone(),
                args: call.input_object(),
            })
        }))
        .collect();

    let usage = GeminiUsageMetadata::new(prompt_tokens, tokens::estimate_completion(result));
    response_chunk(parts, Some("STOP"), Some(usage), model, &generate_id(IdNamespace::Response))
}

/// One response object; streaming sends several sharing a `responseId`
pub fn response_chunk(
    parts: Vec<GeminiPart>,
    finish_reason: Option<&str>,
    usage: Option<GeminiUsageMetadata>,
    model: &str,
    response_id: &str,
) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![GeminiCandidate {
            content: GeminiContent {
                role: Some("model".to_owned()),
                parts,
            },
            finish_reason: finish_reason.map(str::to_owned),
            index: 0,
        }],
        usage_metadata: usage,
        model_version: model.to_owned(),
        response_id: response_id.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{CompletedToolCall, Role};

    fn convert(body: Value) -> ChatRequest {
        to_chat_request("gemini-2.5-pro".to_owned(), serde_json::from_value(body).unwrap())
    }

    #[test]
    fn roles_and_system_instruction() {
        let req = convert(json!({
            "systemInstruction": {"parts": [{"text": "Be brief"}]},
            "contents": [
                {"role": "user", "parts": [{"text": "Hi"}]},
                {"role": "model", "parts": [{"text": "Hello", "thoughtSignature": "abc"}, {"text": "pondering", "thought": true}]}
            ]
        }));

        assert_eq!(req.model, "gemini-2.5-pro");
        assert_eq!(req.messages[0], UnifiedMessage::user_text("Be brief"));
        assert_eq!(req.messages[1], UnifiedMessage::user_text("Hi"));
        assert_eq!(req.messages[2].role, Role::Assistant);
        assert_eq!(req.messages[2].parts.len(), 1);
    }

    #[test]
    fn snake_case_fields_are_accepted() {
        let req = convert(json!({
            "system_instruction": {"parts": [{"text": "sys"}]},
            "contents": [{"role": "user", "parts": [{"inline_data": {"mime_type": "image/png", "data": "aGk="}}]}]
        }));

        assert_eq!(req.messages[0], UnifiedMessage::user_text("sys"));
        assert_eq!(
            req.messages[1].parts[0],
            Part::Data {
                mime_type: "image/png".to_owned(),
                bytes: b"hi".to_vec(),
            }
        );
    }

    #[test]
    fn function_responses_pair_with_earliest_call() {
        let req = convert(json!({
            "contents": [
                {"role": "model", "parts": [
                    {"functionCall": {"name": "get_weather", "args": {"city": "Paris"}}},
                    {"functionCall": {"name": "get_weather", "args": {"city": "Oslo"}}}
                ]},
                {"role": "user", "parts": [
                    {"functionResponse": {"name": "get_weather", "response": {"temp": 18}}},
                    {"functionResponse": {"name": "get_weather", "response": {"temp": 4}}}
                ]}
            ]
        }));

        let call_ids: Vec<&str> = req.messages[0]
            .parts
            .iter()
            .map(|part| match part {
                Part::ToolCall { call_id, .. } => call_id.as_str(),
                other => panic!("unexpected part {other:?}"),
            })
            .collect();
        let result_ids: Vec<&str> = req.messages[1]
            .parts
            .iter()
            .map(|part| match part {
                Part::ToolResult { call_id, .. } => call_id.as_str(),
                other => panic!("unexpected part {other:?}"),
            })
            .collect();

        assert!(call_ids[0].starts_with("call_AM-"));
        assert_ne!(call_ids[0], call_ids[1]);
        assert_eq!(call_ids, result_ids);
        assert_eq!(
            req.messages[1].parts[0],
            Part::ToolResult {
                call_id: call_ids[0].to_owned(),
                content_json: r#"{"temp":18}"#.to_owned(),
            }
        );
    }

    #[test]
    fn explicit_ids_are_kept() {
        let req = convert(json!({
            "contents": [
                {"role": "model", "parts": [{"functionCall": {"id": "c1", "name": "f", "args": {}}}]},
                {"role": "user", "parts": [{"functionResponse": {"id": "c1", "name": "f", "response": {}}}]}
            ]
        }));

        assert!(matches!(&req.messages[0].parts[0], Part::ToolCall { call_id, .. } if call_id == "c1"));
        assert!(matches!(&req.messages[1].parts[0], Part::ToolResult { call_id, .. } if call_id == "c1"));
    }

    #[test]
    fn file_data_falls_back() {
        let req = convert(json!({
            "contents": [{"role": "user", "parts": [
                {"fileData": {"mimeType": "video/mp4", "fileUri": "gs://bucket/clip.mp4"}},
                {"executableCode": {"language": "PYTHON", "code": "print(1)"}}
            ]}]
        }));

        let parts = &req.messages[0].parts;
        assert!(parts[0].as_text().unwrap().contains("gs://bucket/clip.mp4"));
        assert!(parts[1].as_text().unwrap().contains("executableCode"));
    }

    #[test]
    fn declarations_kept_and_builtins_skipped() {
        let req = convert(json!({
            "contents": [],
            "tools": [
                {"functionDeclarations": [
                    {"name": "a", "parameters": {"type": "OBJECT", "properties": {"city": {"type": "STRING"}}}},
                    {"name": "b", "parametersJsonSchema": {"type": "object"}}
                ]},
                {"googleSearch": {}},
                {"codeExecution": {}}
            ]
        }));

        let names: Vec<&str> = req.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(
            req.tools[0].input_schema,
            json!({"type": "object", "properties": {"city": {"type": "string"}}})
        );
    }

    #[test]
    fn calling_modes() {
        let config = |mode: &str| -> GeminiToolConfig {
            serde_json::from_value(json!({"functionCallingConfig": {"mode": mode}})).unwrap()
        };

        assert_eq!(tool_config_to_unified(Some(&config("AUTO"))), ToolChoicePolicy::Auto);
        assert_eq!(tool_config_to_unified(Some(&config("VALIDATED"))), ToolChoicePolicy::Auto);
        assert_eq!(tool_config_to_unified(Some(&config("ANY"))), ToolChoicePolicy::Required);
        assert_eq!(tool_config_to_unified(Some(&config("NONE"))), ToolChoicePolicy::None);
        assert_eq!(tool_config_to_unified(None), ToolChoicePolicy::None);
    }

    #[test]
    fn response_parts_and_usage() {
        let result = CompletionResult {
            text: "Sunny".to_owned(),
            tool_calls: vec![CompletedToolCall {
                call_id: "up".to_owned(),
                name: "f".to_owned(),
                input: Value::Null,
            }],
        };

        let body = serde_json::to_value(to_generate_content_response(&result, "gemini-2.5-pro", 7)).unwrap();
        let candidate = &body["candidates"][0];

        assert_eq!(candidate["content"]["role"], "model");
        assert_eq!(candidate["content"]["parts"][0]["text"], "Sunny");
        assert_eq!(candidate["content"]["parts"][1]["functionCall"]["args"], json!({}));
        assert!(
            candidate["content"]["parts"][1]["functionCall"]["id"]
                .as_str()
                .unwrap()
                .starts_with("call_AM-")
        );
        assert_eq!(candidate["finishReason"], "STOP");
        assert_eq!(body["usageMetadata"]["promptTokenCount"], 7);
        assert_eq!(body["modelVersion"], "gemini-2.5-pro");
    }
}
