//! Gemini `streamGenerateContent` chunk grammar
//!
//! Gemini has no partial-argument event, so function calls are held back and
//! sent whole in the final chunk.

use maestro_core::{IdNamespace, generate_id};
use serde_json::{Map, Value};

use super::{AccumulatedCall, Accumulator, Sequencer, SseFrame};
use crate::convert::google::response_chunk;
use crate::error::LlmError;
use crate::protocol::Protocol;
use crate::protocol::google::{GeminiFunctionCall, GeminiPart, GeminiUsageMetadata};
use crate::tokens;
use crate::types::StreamFragment;

/// Sequencer for `:streamGenerateContent?alt=sse`
pub struct GeminiSequencer {
    response_id: String,
    model: String,
    prompt_tokens: u32,
    acc: Accumulator,
    finished: bool,
}

impl GeminiSequencer {
    pub fn new(model: &str, prompt_tokens: u32) -> Self {
        Self {
            response_id: generate_id(IdNamespace::Response),
            model: model.to_owned(),
            prompt_tokens,
            acc: Accumulator::default(),
            finished: false,
        }
    }

    fn chunk(
        &self,
        parts: Vec<GeminiPart>,
        finish_reason: Option<&str>,
        usage: Option<GeminiUsageMetadata>,
    ) -> SseFrame {
        let chunk = response_chunk(parts, finish_reason, usage, &self.model, &self.response_id);
        SseFrame::json(None, &chunk)
    }

    fn on_end(&self) -> SseFrame {
        let parts = self.acc.calls().map(function_call_part).collect();
        let usage = GeminiUsageMetadata::new(self.prompt_tokens, tokens::estimate_completion(&self.acc.result()));
        self.chunk(parts, Some("STOP"), Some(usage))
    }
}

/// Complete `functionCall` part; arguments that are not a JSON object become `{}`
fn function_call_part(call: &AccumulatedCall) -> GeminiPart {
    let args = match serde_json::from_str::<Value>(&call.final_arguments()) {
        Ok(Value::Object(args)) => Value::Object(args),
        Ok(_) | Err(_) => {
            tracing::warn!(tool = %call.name, call_id = %call.id, "function call arguments are not a JSON object");
            Value::Object(Map::new())
        }
    };

    GeminiPart::function_call(GeminiFunctionCall {
        id: Some(call.id.clone()),
        name: call.name.clone(),
        args,
    })
}

impl Sequencer for GeminiSequencer {
    fn start(&mut self) -> Vec<SseFrame> {
        Vec::new()
    }

    fn push(&mut self, fragment: StreamFragment) -> Vec<SseFrame> {
        if self.finished {
            return Vec::new();
        }

        match fragment {
            StreamFragment::TextDelta(text) => {
                self.acc.push_text(&text);
                vec![self.chunk(vec![GeminiPart::text(text)], None, None)]
            }
            StreamFragment::ToolCallDelta {
                call_id,
                name,
                arguments_delta,
            } => {
                self.acc
                    .push_call(&call_id, &name, &arguments_delta, || generate_id(IdNamespace::Call));
                Vec::new()
            }
            StreamFragment::End => {
                self.finished = true;
                vec![self.on_end()]
            }
            StreamFragment::Failed(message) => {
                self.finished = true;
                tracing::warn!(response_id = %self.response_id, error = %message, "content stream failed");
                let body = LlmError::Streaming(message).to_wire_body(Protocol::Gemini);
                vec![SseFrame::json(None, &body)]
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
