//! `OpenAI` Chat Completions chunk grammar

use maestro_core::{IdNamespace, generate_id};

use super::{Accumulator, Sequencer, SseFrame};
use crate::convert::openai::finish_reason;
use crate::convert::unix_now;
use crate::error::LlmError;
use crate::protocol::Protocol;
use crate::protocol::openai::{
    ChatChunkChoice, ChatCompletionChunk, ChatDelta, ChatFunctionDelta, ChatToolCallDelta, ChatUsage,
};
use crate::tokens;
use crate::types::StreamFragment;

/// Terminates a successful chat stream
const DONE: &str = "[DONE]";

/// Sequencer for `/chat/completions` streams
pub struct ChatSequencer {
    id: String,
    created: u64,
    model: String,
    prompt_tokens: u32,
    include_usage: bool,
    acc: Accumulator,
    finished: bool,
}

impl ChatSequencer {
    /// `include_usage` mirrors `stream_options.include_usage`
    pub fn new(model: &str, prompt_tokens: u32, include_usage: bool) -> Self {
        Self {
            id: generate_id(IdNamespace::ChatCompletion),
            created: unix_now(),
            model: model.to_owned(),
            prompt_tokens,
            include_usage,
            acc: Accumulator::default(),
            finished: false,
        }
    }

    fn chunk(&self, delta: ChatDelta, finish_reason: Option<&str>) -> SseFrame {
        let chunk = ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".to_owned(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChatChunkChoice {
                index: 0,
                delta,
                finish_reason: finish_reason.map(str::to_owned),
            }],
            usage: None,
        };
        SseFrame::json(None, &chunk)
    }

    fn tool_call_chunk(&self, delta: ChatToolCallDelta) -> SseFrame {
        let delta = ChatDelta {
            tool_calls: Some(vec![delta]),
            ..ChatDelta::default()
        };
        self.chunk(delta, None)
    }

    fn on_tool_call(&mut self, call_id: &str, name: &str, arguments: String) -> Vec<SseFrame> {
        let (call, opened) = self
            .acc
            .push_call(call_id, name, &arguments, || generate_id(IdNamespace::Call));
        let index = u32::try_from(call.ordinal).unwrap_or(u32::MAX);
        let mut frames = Vec::new();

        if opened {
            let (id, name) = (call.id.clone(), call.name.clone());
            frames.push(self.tool_call_chunk(ChatToolCallDelta {
                index,
                id: Some(id),
                call_type: Some("function".to_owned()),
                function: Some(ChatFunctionDelta {
                    name: Some(name),
                    arguments: Some(String::new()),
                }),
            }));
        }

        if !arguments.is_empty() {
            frames.push(self.tool_call_chunk(ChatToolCallDelta {
                index,
                id: None,
                call_type: None,
                function: Some(ChatFunctionDelta {
                    name: None,
                    arguments: Some(arguments),
                }),
            }));
        }
        frames
    }

    fn on_end(&self) -> Vec<SseFrame> {
        let result = self.acc.result();
        let mut frames = vec![self.chunk(ChatDelta::default(), Some(finish_reason(&result)))];

        if self.include_usage {
            let chunk = ChatCompletionChunk {
                id: self.id.clone(),
                object: "chat.completion.chunk".to_owned(),
                created: self.created,
                model: self.model.clone(),
                choices: Vec::new(),
                usage: Some(ChatUsage::new(self.prompt_tokens, tokens::estimate_completion(&result))),
            };
            frames.push(SseFrame::json(None, &chunk));
        }

        frames.push(SseFrame::raw(DONE));
        frames
    }
}

impl Sequencer for ChatSequencer {
    fn start(&mut self) -> Vec<SseFrame> {
        let delta = ChatDelta {
            role: Some("assistant".to_owned()),
            content: Some(String::new()),
            tool_calls: None,
        };
        vec![self.chunk(delta, None)]
    }

    fn push(&mut self, fragment: StreamFragment) -> Vec<SseFrame> {
        if self.finished {
            return Vec::new();
        }

        match fragment {
            StreamFragment::TextDelta(text) => {
                self.acc.push_text(&text);
                let delta = ChatDelta {
                    content: Some(text),
                    ..ChatDelta::default()
                };
                vec![self.chunk(delta, None)]
            }
            StreamFragment::ToolCallDelta {
                call_id,
                name,
                arguments_delta,
            } => self.on_tool_call(&call_id, &name, arguments_delta),
            StreamFragment::End => {
                self.finished = true;
                self.on_end()
            }
            StreamFragment::Failed(message) => {
                self.finished = true;
                tracing::warn!(completion_id = %self.id, error = %message, "chat stream failed");
                let body = LlmError::Streaming(message).to_wire_body(Protocol::OpenAiChat);
                vec![SseFrame::json(None, &body)]
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::stream::test_support::{call, run, text};

    fn payloads(frames: &[SseFrame]) -> Vec<Value> {
        frames
            .iter()
            .filter(|frame| frame.data != DONE)
            .map(|frame| serde_json::from_str(&frame.data).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn text_stream_ends_with_done() {
        let frames = run(
            ChatSequencer::new("gpt-4o", 3, false),
            vec![text("Hel"), text("lo"), StreamFragment::End],
        )
        .await;

        assert!(frames.iter().all(|frame| frame.event.is_none()));
        assert_eq!(frames.last().unwrap().data, DONE);

        let payloads = payloads(&frames);
        assert_eq!(payloads.len(), 4);
        assert_eq!(payloads[0]["choices"][0]["delta"], json!({"role": "assistant", "content": ""}));
        assert_eq!(payloads[1]["choices"][0]["delta"]["content"], "Hel");
        assert_eq!(payloads[3]["choices"][0]["finish_reason"], "stop");
        assert!(payloads[0]["id"].as_str().unwrap().starts_with("chatcmpl_AM-"));
        assert!(payloads.iter().all(|p| p["id"] == payloads[0]["id"]));
    }

    #[tokio::test]
    async fn tool_calls_are_indexed() {
        let frames = run(
            ChatSequencer::new("gpt-4o", 3, true),
            vec![
                call("up_a", "f", ""),
                call("up_a", "f", "{\"x\":1}"),
                call("up_b", "g", "{}"),
                StreamFragment::End,
            ],
        )
        .await;

        let payloads = payloads(&frames);
        let opening = &payloads[1]["choices"][0]["delta"]["tool_calls"][0];
        assert_eq!(opening["index"], 0);
        assert_eq!(opening["type"], "function");
        assert_eq!(opening["function"], json!({"name": "f", "arguments": ""}));
        assert!(opening["id"].as_str().unwrap().starts_with("call_AM-"));

        let next = &payloads[2]["choices"][0]["delta"]["tool_calls"][0];
        assert_eq!(next, &json!({"index": 0, "function": {"arguments": "{\"x\":1}"}}));
        assert_eq!(payloads[3]["choices"][0]["delta"]["tool_calls"][0]["index"], 1);
        assert_eq!(payloads[4]["choices"][0]["delta"]["tool_calls"][0]["function"]["arguments"], "{}");

        assert_eq!(payloads[5]["choices"][0]["finish_reason"], "tool_calls");
        assert_eq!(payloads[6]["choices"], json!([]));
        assert_eq!(payloads[6]["usage"]["prompt_tokens"], 3);
    }

    #[tokio::test]
    async fn failure_is_a_single_error_line() {
        let frames = run(
            ChatSequencer::new("gpt-4o", 0, false),
            vec![StreamFragment::Failed("boom".to_owned())],
        )
        .await;

        assert_eq!(frames.len(), 2);
        let error: Value = serde_json::from_str(&frames[1].data).unwrap();
        assert_eq!(error["error"]["type"], "server_error");
        assert!(frames.iter().all(|frame| frame.data != DONE));
    }
}
