//! Wire format types for the protocols the gateway speaks
//!
//! Each module contains pure serde structs matching the respective client
//! ecosystem's JSON format. They are only used at the boundary; handlers
//! convert them to the unified model immediately.

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod responses;

use serde::{Deserialize, Serialize};

/// Wire protocols exposed by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// `OpenAI` Chat Completions
    OpenAiChat,
    /// `OpenAI` Responses
    OpenAiResponses,
    /// Anthropic Messages
    Anthropic,
    /// Google Gemini `generateContent`
    Gemini,
}

impl Protocol {
    /// Short name used in logs
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAiChat => "openai_chat",
            Self::OpenAiResponses => "openai_responses",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
        }
    }
}

/// A value of a known shape, or whatever the client actually sent
///
/// Content and item kinds the gateway does not model land in `Unknown`
/// instead of failing the whole request; adapters turn them into
/// diagnostic text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    /// Recognised shape
    Known(T),
    /// Anything else, kept verbatim
    Unknown(serde_json::Value),
}
