//! The underlying chat capability every protocol is served from

pub mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

pub use self::openai::OpenAiBackend;
use crate::error::LlmError;
use crate::types::{ChatRequest, CompletionResult, StreamFragment};

/// Fragments of a streaming completion, ending with `End` or `Failed`
pub type FragmentStream = Pin<Box<dyn Stream<Item = StreamFragment> + Send>>;

/// Chat completion backend
///
/// One call contract: ordered messages and optional tools in, text and tool
/// invocations out, either at once or as a fragment stream.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run a completion to the end
    async fn complete(&self, request: &ChatRequest) -> Result<CompletionResult, LlmError>;

    /// Start a streaming completion
    ///
    /// Errors before the first fragment are returned directly; failures
    /// after that arrive as a `Failed` fragment. The router turns both into
    /// the protocol's stream failure event.
    async fn complete_stream(&self, request: &ChatRequest) -> Result<FragmentStream, LlmError>;
}
