//! Anthropic Messages event grammar

use maestro_core::{IdNamespace, generate_id};
use serde_json::{Map, Value};

use super::{Accumulator, Sequencer, SseFrame};
use crate::convert::anthropic::{message_shell, stop_reason};
use crate::error::LlmError;
use crate::protocol::Protocol;
use crate::protocol::anthropic::{
    AnthropicDeltaUsage, AnthropicMessageDelta, AnthropicResponseBlock, AnthropicStreamDelta, AnthropicStreamEvent,
};
use crate::tokens;
use crate::types::StreamFragment;

/// Sequencer for `/messages` streams
pub struct AnthropicSequencer {
    message_id: String,
    model: String,
    input_tokens: u32,
    acc: Accumulator,
    finished: bool,
}

impl AnthropicSequencer {
    pub fn new(model: &str, input_tokens: u32) -> Self {
        Self {
            message_id: generate_id(IdNamespace::Message),
            model: model.to_owned(),
            input_tokens,
            acc: Accumulator::default(),
            finished: false,
        }
    }

    fn frame(event: &AnthropicStreamEvent) -> SseFrame {
        SseFrame::json(Some(event.event_type()), event)
    }

    fn on_text(&mut self, text: String) -> Vec<SseFrame> {
        let (index, opened) = self.acc.push_text(&text);
        let mut frames = Vec::new();

        if opened {
            frames.push(Self::frame(&AnthropicStreamEvent::ContentBlockStart {
                index,
                content_block: AnthropicResponseBlock::Text { text: String::new() },
            }));
        }

        frames.push(Self::frame(&AnthropicStreamEvent::ContentBlockDelta {
            index,
            delta: AnthropicStreamDelta::TextDelta { text },
        }));
        frames
    }

    fn on_tool_call(&mut self, call_id: &str, name: &str, partial_json: String) -> Vec<SseFrame> {
        let (call, opened) = self
            .acc
            .push_call(call_id, name, &partial_json, || generate_id(IdNamespace::ToolUse));
        let mut frames = Vec::new();

        if opened {
            frames.push(Self::frame(&AnthropicStreamEvent::ContentBlockStart {
                index: call.slot,
                content_block: AnthropicResponseBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: Value::Object(Map::new()),
                },
            }));
        }

        frames.push(Self::frame(&AnthropicStreamEvent::ContentBlockDelta {
            index: call.slot,
            delta: AnthropicStreamDelta::InputJsonDelta { partial_json },
        }));
        frames
    }

    fn on_end(&self) -> Vec<SseFrame> {
        let mut frames: Vec<SseFrame> = (0..self.acc.items().len())
            .map(|index| Self::frame(&AnthropicStreamEvent::ContentBlockStop { index }))
            .collect();

        let result = self.acc.result();
        frames.push(Self::frame(&AnthropicStreamEvent::MessageDelta {
            delta: AnthropicMessageDelta {
                stop_reason: Some(stop_reason(&result).to_owned()),
                stop_sequence: None,
            },
            usage: AnthropicDeltaUsage {
                output_tokens: tokens::estimate_completion(&result),
            },
        }));
        frames.push(Self::frame(&AnthropicStreamEvent::MessageStop));

        frames
    }
}

impl Sequencer for AnthropicSequencer {
    fn start(&mut self) -> Vec<SseFrame> {
        let message = message_shell(self.message_id.clone(), &self.model, self.input_tokens);
        vec![
            Self::frame(&AnthropicStreamEvent::MessageStart { message }),
            Self::frame(&AnthropicStreamEvent::Ping),
        ]
    }

    fn push(&mut self, fragment: StreamFragment) -> Vec<SseFrame> {
        if self.finished {
            return Vec::new();
        }

        match fragment {
            StreamFragment::TextDelta(text) => self.on_text(text),
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
                tracing::warn!(message_id = %self.message_id, error = %message, "message stream failed");
                let body = LlmError::Streaming(message).to_wire_body(Protocol::Anthropic);
                vec![SseFrame::json(Some("error"), &body)]
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
