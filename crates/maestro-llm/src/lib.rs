//! Multi-protocol chat-completion surface for Maestro
//!
//! Exposes one upstream chat capability through the `OpenAI` Chat
//! Completions, `OpenAI` Responses, Anthropic Messages and Gemini
//! `generateContent` protocols. Requests are translated into a small unified
//! model, sent to an OpenAI-compatible backend, and translated back, with
//! each protocol's streaming grammar synthesized from one fragment stream.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod auth;
pub mod backend;
pub mod convert;
pub mod error;
pub mod protocol;
#[cfg(feature = "http")]
pub mod router;
pub mod routing;
pub mod stream;
pub mod tokens;
pub mod types;

pub use auth::AuthMatcher;
pub use backend::{ChatBackend, FragmentStream, OpenAiBackend};
pub use error::LlmError;
pub use protocol::Protocol;
#[cfg(feature = "http")]
pub use router::{LlmState, llm_router};
pub use routing::{ModelResolver, ResolvedModel};
pub use stream::{Sequencer, SseFrame, drive};
pub use types::{ChatRequest, CompletionResult, StreamFragment, UnifiedMessage};
