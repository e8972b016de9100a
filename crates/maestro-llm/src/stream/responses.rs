//! `OpenAI` Responses event grammar

use maestro_core::{IdNamespace, generate_id};

use super::{AccumulatedItem, Accumulator, Sequencer, SseFrame};
use crate::convert::responses::{ResponseEnvelope, function_call_item, message_item};
use crate::protocol::responses::{ResponsesOutputContent, ResponsesStreamEvent, ResponsesUsage};
use crate::tokens;
use crate::types::StreamFragment;

/// Sequencer for `/responses` streams
pub struct ResponsesSequencer {
    envelope: ResponseEnvelope,
    prompt_tokens: u32,
    sequence: u64,
    acc: Accumulator,
    message_id: String,
    item_ids: Vec<String>,
    finished: bool,
}

impl ResponsesSequencer {
    pub fn new(envelope: ResponseEnvelope, prompt_tokens: u32) -> Self {
        Self {
            envelope,
            prompt_tokens,
            sequence: 0,
            acc: Accumulator::default(),
            message_id: generate_id(IdNamespace::Message),
            item_ids: Vec::new(),
            finished: false,
        }
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.sequence;
        self.sequence += 1;
        sequence
    }

    fn frame(event: &ResponsesStreamEvent) -> SseFrame {
        SseFrame::json(Some(event.event_type()), event)
    }

    fn on_text(&mut self, delta: String) -> Vec<SseFrame> {
        let (output_index, opened) = self.acc.push_text(&delta);
        let mut frames = Vec::new();

        if opened {
            let added = ResponsesStreamEvent::OutputItemAdded {
                sequence_number: self.next_sequence(),
                output_index,
                item: message_item(self.message_id.clone(), Vec::new(), "in_progress"),
            };
            let part = ResponsesStreamEvent::ContentPartAdded {
                sequence_number: self.next_sequence(),
                item_id: self.message_id.clone(),
                output_index,
                content_index: 0,
                part: ResponsesOutputContent::text(""),
            };
            frames.push(Self::frame(&added));
            frames.push(Self::frame(&part));
        }

        let event = ResponsesStreamEvent::OutputTextDelta {
            sequence_number: self.next_sequence(),
            item_id: self.message_id.clone(),
            output_index,
            content_index: 0,
            delta,
        };
        frames.push(Self::frame(&event));
        frames
    }

    fn on_tool_call(&mut self, call_id: &str, name: &str, delta: String) -> Vec<SseFrame> {
        let (call, opened) = self
            .acc
            .push_call(call_id, name, &delta, || generate_id(IdNamespace::Call));
        let (output_index, ordinal, client_id, name) = (call.slot, call.ordinal, call.id.clone(), call.name.clone());
        let mut frames = Vec::new();

        if opened {
            self.item_ids.push(generate_id(IdNamespace::FunctionCall));
            let added = ResponsesStreamEvent::OutputItemAdded {
                sequence_number: self.next_sequence(),
                output_index,
                item: function_call_item(
                    self.item_ids[ordinal].clone(),
                    client_id,
                    &name,
                    String::new(),
                    "in_progress",
                ),
            };
            frames.push(Self::frame(&added));
        }

        let event = ResponsesStreamEvent::FunctionCallArgumentsDelta {
            sequence_number: self.next_sequence(),
            item_id: self.item_ids[ordinal].clone(),
            output_index,
            delta,
        };
        frames.push(Self::frame(&event));
        frames
    }

    fn on_end(&mut self) -> Vec<SseFrame> {
        let mut events = Vec::new();
        let mut output = Vec::new();

        for item in self.acc.items() {
            match item {
                AccumulatedItem::Text(text) => {
                    let output_index = output.len();
                    let part = ResponsesOutputContent::text(text);
                    events.push(ResponsesStreamEvent::OutputTextDone {
                        sequence_number: 0,
                        item_id: self.message_id.clone(),
                        output_index,
                        content_index: 0,
                        text: text.to_owned(),
                    });
                    events.push(ResponsesStreamEvent::ContentPartDone {
                        sequence_number: 0,
                        item_id: self.message_id.clone(),
                        output_index,
                        content_index: 0,
                        part: part.clone(),
                    });
                    output.push(message_item(self.message_id.clone(), vec![part], "completed"));
                }
                AccumulatedItem::Call(call) => {
                    let item_id = self.item_ids[call.ordinal].clone();
                    events.push(ResponsesStreamEvent::FunctionCallArgumentsDone {
                        sequence_number: 0,
                        item_id: item_id.clone(),
                        output_index: output.len(),
                        arguments: call.final_arguments(),
                    });
                    output.push(function_call_item(
                        item_id,
                        call.id.clone(),
                        &call.name,
                        call.final_arguments(),
                        "completed",
                    ));
                }
            }

            if let Some(item) = output.last() {
                events.push(ResponsesStreamEvent::OutputItemDone {
                    sequence_number: 0,
                    output_index: output.len() - 1,
                    item: item.clone(),
                });
            }
        }

        let result = self.acc.result();
        let usage = ResponsesUsage::new(self.prompt_tokens, tokens::estimate_completion(&result));
        events.push(ResponsesStreamEvent::Completed {
            sequence_number: 0,
            response: self.envelope.snapshot("completed", output, Some(usage)),
        });

        events
            .into_iter()
            .map(|event| {
                let event = self.numbered(event);
                Self::frame(&event)
            })
            .collect()
    }

    fn on_failed(&mut self, message: &str) -> Vec<SseFrame> {
        let event = ResponsesStreamEvent::Failed {
            sequence_number: self.next_sequence(),
            response: self.envelope.failed(Vec::new(), message),
        };
        vec![Self::frame(&event)]
    }

    /// Stamp the next sequence number onto a closing event
    fn numbered(&mut self, mut event: ResponsesStreamEvent) -> ResponsesStreamEvent {
        let next = self.next_sequence();
        match &mut event {
            ResponsesStreamEvent::Created { sequence_number, .. }
            | ResponsesStreamEvent::InProgress { sequence_number, .. }
            | ResponsesStreamEvent::OutputItemAdded { sequence_number, .. }
            | ResponsesStreamEvent::ContentPartAdded { sequence_number, .. }
            | ResponsesStreamEvent::OutputTextDelta { sequence_number, .. }
            | ResponsesStreamEvent::FunctionCallArgumentsDelta { sequence_number, .. }
            | ResponsesStreamEvent::OutputTextDone { sequence_number, .. }
            | ResponsesStreamEvent::ContentPartDone { sequence_number, .. }
            | ResponsesStreamEvent::FunctionCallArgumentsDone { sequence_number, .. }
            | ResponsesStreamEvent::OutputItemDone { sequence_number, .. }
            | ResponsesStreamEvent::Completed { sequence_number, .. }
            | ResponsesStreamEvent::Failed { sequence_number, .. } => *sequence_number = next,
        }
        event
    }
}

impl Sequencer for ResponsesSequencer {
    fn start(&mut self) -> Vec<SseFrame> {
        let created = ResponsesStreamEvent::Created {
            sequence_number: self.next_sequence(),
            response: self.envelope.snapshot("in_progress", Vec::new(), None),
        };
        let in_progress = ResponsesStreamEvent::InProgress {
            sequence_number: self.next_sequence(),
            response: self.envelope.snapshot("in_progress", Vec::new(), None),
        };
        vec![Self::frame(&created), Self::frame(&in_progress)]
    }

    fn push(&mut self, fragment: StreamFragment) -> Vec<SseFrame> {
        if self.finished {
            return Vec::new();
        }

        match fragment {
            StreamFragment::TextDelta(delta) => self.on_text(delta),
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
                tracing::warn!(response_id = %self.envelope.id(), error = %message, "response stream failed");
                self.on_failed(&message)
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
    use crate::protocol::responses::{ResponsesOutputItem, ResponsesRequest};
    use crate::stream::test_support::{call, names, run, text};

    fn sequencer() -> ResponsesSequencer {
        let request: ResponsesRequest = serde_json::from_value(json!({"model": "gpt-4o", "input": "hi"})).unwrap();
        ResponsesSequencer::new(ResponseEnvelope::new(&request), 5)
    }

    fn payloads(frames: &[SseFrame]) -> Vec<Value> {
        frames.iter().map(|frame| serde_json::from_str(&frame.data).unwrap()).collect()
    }

    /// Items as they look in the final `response.completed` snapshot
    fn completed_output(frames: &[SseFrame]) -> Vec<ResponsesOutputItem> {
        let last = frames.last().map(|frame| frame.data.as_str()).unwrap_or_default();
        let event: ResponsesStreamEvent = serde_json::from_str(last).unwrap();
        match event {
            ResponsesStreamEvent::Completed { response, .. } => response.output,
            other => panic!("expected completed, got {}", other.event_type()),
        }
    }

    #[tokio::test]
    async fn text_stream_grammar() {
        let frames = run(sequencer(), vec![text("Hel"), text("lo"), StreamFragment::End]).await;

        insta::assert_snapshot!(names(&frames), @r"
        response.created
        response.in_progress
        response.output_item.added
        response.content_part.added
        response.output_text.delta
        response.output_text.delta
        response.output_text.done
        response.content_part.done
        response.output_item.done
        response.completed
        ");

        let payloads = payloads(&frames);
        let sequence: Vec<u64> = payloads
            .iter()
            .map(|p| p["sequence_number"].as_u64().unwrap())
            .collect();
        assert_eq!(sequence, (0..10).collect::<Vec<u64>>());
        assert_eq!(payloads[6]["text"], "Hello");
        assert_eq!(payloads[2]["item"]["id"], payloads[8]["item"]["id"]);
        assert_eq!(payloads[9]["response"]["status"], "completed");
        assert_eq!(payloads[9]["response"]["output"][0]["content"][0]["text"], "Hello");
        assert_eq!(payloads[9]["response"]["usage"]["input_tokens"], 5);
    }

    #[tokio::test]
    async fn tool_call_stream_grammar() {
        let frames = run(
            sequencer(),
            vec![
                text("Checking"),
                call("up_1", "get_weather", "{\"city\":"),
                call("up_1", "get_weather", "\"Paris\"}"),
                call("up_2", "get_time", ""),
                StreamFragment::End,
            ],
        )
        .await;

        insta::assert_snapshot!(names(&frames), @r"
        response.created
        response.in_progress
        response.output_item.added
        response.content_part.added
        response.output_text.delta
        response.output_item.added
        response.function_call_arguments.delta
        response.function_call_arguments.delta
        response.output_item.added
        response.function_call_arguments.delta
        response.output_text.done
        response.content_part.done
        response.output_item.done
        response.function_call_arguments.done
        response.output_item.done
        response.function_call_arguments.done
        response.output_item.done
        response.completed
        ");

        let payloads = payloads(&frames);
        let added = &payloads[5]["item"];
        assert_eq!(added["type"], "function_call");
        assert!(added["id"].as_str().unwrap().starts_with("fc_AM-"));
        assert!(added["call_id"].as_str().unwrap().starts_with("call_AM-"));
        assert_eq!(payloads[13]["arguments"], "{\"city\":\"Paris\"}");
        assert_eq!(payloads[13]["item_id"], added["id"]);
        assert_eq!(payloads[15]["arguments"], "{}");

        let output = completed_output(&frames);
        assert_eq!(output.len(), 3);
        assert!(matches!(&output[1], ResponsesOutputItem::FunctionCall { call_id, .. } if *call_id == added["call_id"]));
    }

    #[tokio::test]
    async fn failure_before_any_item_is_one_event() {
        let frames = run(sequencer(), vec![StreamFragment::Failed("boom".to_owned())]).await;

        insta::assert_snapshot!(names(&frames), @r"
        response.created
        response.in_progress
        response.failed
        ");
        let payloads = payloads(&frames);
        assert_eq!(payloads[2]["response"]["status"], "failed");
        assert_eq!(payloads[2]["response"]["error"]["message"], "boom");
    }

    #[tokio::test]
    async fn empty_completion_has_empty_output() {
        let frames = run(sequencer(), vec![StreamFragment::End]).await;
        assert!(completed_output(&frames).is_empty());
        assert_eq!(frames.len(), 3);
    }
}
