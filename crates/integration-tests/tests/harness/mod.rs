#![allow(dead_code)]

pub mod config;
pub mod mock_upstream;
pub mod server;

/// Collect the `data:` payloads of an SSE body
pub fn sse_data(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(str::to_owned)
        .collect()
}

/// Collect the `event:` names of an SSE body
pub fn sse_events(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix("event: "))
        .map(str::to_owned)
        .collect()
}
