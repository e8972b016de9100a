//! Streaming event sequencers
//!
//! The backend produces one flat sequence of text and tool-call fragments.
//! Each protocol expects its own event grammar on top of that: lifecycle
//! events, items opened before they are written to, and a closing summary.
//! A [`Sequencer`] is a per-request state machine turning fragments into
//! SSE frames; [`drive`] pumps a backend stream through one.

pub mod anthropic;
pub mod chat;
pub mod gemini;
pub mod responses;

use futures_util::{Stream, StreamExt, stream};
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;

pub use self::anthropic::AnthropicSequencer;
pub use self::chat::ChatSequencer;
pub use self::gemini::GeminiSequencer;
pub use self::responses::ResponsesSequencer;
use crate::backend::FragmentStream;
use crate::convert::openai::parse_arguments;
use crate::types::{CompletedToolCall, CompletionResult, StreamFragment};

/// Message used when the backend stream closes without a terminal fragment
const UNEXPECTED_END: &str = "upstream stream ended unexpectedly";

/// One server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// `event:` line, when the protocol names its events
    pub event: Option<&'static str>,
    /// `data:` payload
    pub data: String,
}

impl SseFrame {
    /// Frame holding a serialized JSON payload
    pub fn json<T: Serialize>(event: Option<&'static str>, payload: &T) -> Self {
        Self {
            event,
            data: serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_owned()),
        }
    }

    /// Frame holding raw text, such as the `[DONE]` sentinel
    pub fn raw(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
        }
    }
}

/// Per-request protocol state machine
///
/// `push` must be called with fragments in backend order. Once a terminal
/// fragment was pushed the sequencer is finished and ignores further input.
pub trait Sequencer: Send {
    /// Frames sent before any fragment arrives
    fn start(&mut self) -> Vec<SseFrame>;

    /// Frames produced by one fragment
    fn push(&mut self, fragment: StreamFragment) -> Vec<SseFrame>;

    /// Whether a terminal fragment was processed
    fn is_finished(&self) -> bool;
}

/// Pump a backend stream through a sequencer
///
/// The backend is not polled again once the sequencer finished. A backend
/// stream that closes early is treated as a failure.
pub fn drive<S>(mut sequencer: S, fragments: FragmentStream) -> impl Stream<Item = SseFrame> + Send
where
    S: Sequencer + 'static,
{
    let opening = sequencer.start();

    let rest = stream::unfold(Some((sequencer, fragments)), |state| async move {
        let (mut sequencer, mut fragments) = state?;
        if sequencer.is_finished() {
            return None;
        }

        let fragment = fragments
            .next()
            .await
            .unwrap_or_else(|| StreamFragment::Failed(UNEXPECTED_END.to_owned()));
        let frames = sequencer.push(fragment);
        let next = (!sequencer.is_finished()).then_some((sequencer, fragments));

        Some((stream::iter(frames), next))
    })
    .flatten();

    stream::iter(opening).chain(rest)
}

/// Text and tool calls received so far, with their opening order
///
/// Every sequencer keeps one of these; items are numbered in the order they
/// were opened, which is the order their closing events must follow.
#[derive(Debug, Default)]
pub struct Accumulator {
    text: String,
    text_slot: Option<usize>,
    calls: IndexMap<String, AccumulatedCall>,
    slots: usize,
}

/// Tool call being streamed
#[derive(Debug, Clone)]
pub struct AccumulatedCall {
    /// Position among all opened items
    pub slot: usize,
    /// Position among tool calls only
    pub ordinal: usize,
    /// Client-facing call identifier
    pub id: String,
    /// Tool name
    pub name: String,
    /// Arguments received so far
    pub arguments: String,
}

impl AccumulatedCall {
    /// Arguments as sent on completion; empty arguments become `{}`
    pub fn final_arguments(&self) -> String {
        if self.arguments.trim().is_empty() {
            "{}".to_owned()
        } else {
            self.arguments.clone()
        }
    }
}

/// An opened item, in opening order
#[derive(Debug)]
pub enum AccumulatedItem<'a> {
    /// The assistant text
    Text(&'a str),
    /// A tool call
    Call(&'a AccumulatedCall),
}

impl Accumulator {
    /// Append text; returns the text slot and whether it was just opened
    pub fn push_text(&mut self, delta: &str) -> (usize, bool) {
        self.text.push_str(delta);

        match self.text_slot {
            Some(slot) => (slot, false),
            None => {
                let slot = self.next_slot();
                self.text_slot = Some(slot);
                (slot, true)
            }
        }
    }

    /// Append tool arguments; `mint` names a call seen for the first time
    ///
    /// Returns the call and whether it was just opened.
    pub fn push_call(
        &mut self,
        upstream_id: &str,
        name: &str,
        delta: &str,
        mint: impl FnOnce() -> String,
    ) -> (&AccumulatedCall, bool) {
        let slot = self.slots;
        let ordinal = self.calls.len();
        let entry = self.calls.entry(upstream_id.to_owned());
        let opened = matches!(entry, Entry::Vacant(_));

        let call = entry.or_insert_with(|| AccumulatedCall {
            slot,
            ordinal,
            id: mint(),
            name: name.to_owned(),
            arguments: String::new(),
        });
        call.arguments.push_str(delta);

        if opened {
            self.slots += 1;
        }
        (&*call, opened)
    }

    /// Text received so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Tool calls in opening order
    pub fn calls(&self) -> impl Iterator<Item = &AccumulatedCall> {
        self.calls.values()
    }

    /// All opened items in opening order
    pub fn items(&self) -> Vec<AccumulatedItem<'_>> {
        let mut items: Vec<(usize, AccumulatedItem<'_>)> = self
            .calls
            .values()
            .map(|call| (call.slot, AccumulatedItem::Call(call)))
            .collect();
        if let Some(slot) = self.text_slot {
            items.push((slot, AccumulatedItem::Text(&self.text)));
        }
        items.sort_by_key(|(slot, _)| *slot);
        items.into_iter().map(|(_, item)| item).collect()
    }

    /// The aggregate completion, as a non-streaming call would have returned it
    pub fn result(&self) -> CompletionResult {
        CompletionResult {
            text: self.text.clone(),
            tool_calls: self
                .calls
                .values()
                .map(|call| CompletedToolCall {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    input: parse_arguments(&call.arguments),
                })
                .collect(),
        }
    }

    const fn next_slot(&mut self) -> usize {
        let slot = self.slots;
        self.slots += 1;
        slot
    }
}
