//! Unified chat model shared by every wire protocol
//!
//! Adapters translate each protocol into these types and back. The model is
//! deliberately narrower than any single protocol: two roles, four part kinds
//! and a three-way tool choice.

pub mod completion;
pub mod message;
pub mod stream;
pub mod tool;

pub use completion::{ChatRequest, CompletedToolCall, CompletionResult};
pub use message::{Part, Role, UnifiedMessage};
pub use stream::StreamFragment;
pub use tool::{ToolChoicePolicy, ToolSpec};
