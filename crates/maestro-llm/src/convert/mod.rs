//! Adapters between the wire protocols and the unified chat model
//!
//! Each submodule handles one protocol in both directions: requests into
//! [`ChatRequest`](crate::types::ChatRequest), finished completions back into
//! the protocol's response body. `openai` additionally carries the upstream
//! direction used by the backend.

pub mod anthropic;
pub mod content;
pub mod google;
pub mod openai;
pub mod responses;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::ToolChoicePolicy;

/// Map a textual tool choice mode to the unified policy
///
/// Unknown modes fall back to `None`, matching an absent choice.
pub fn mode_to_policy(mode: &str) -> ToolChoicePolicy {
    match mode.to_ascii_lowercase().as_str() {
        "auto" | "validated" => ToolChoicePolicy::Auto,
        "required" | "any" => ToolChoicePolicy::Required,
        _ => ToolChoicePolicy::None,
    }
}

/// Current Unix time in seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
