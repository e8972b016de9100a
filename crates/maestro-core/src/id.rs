//! Namespaced identifiers for protocol objects
//!
//! Every identifier minted by the gateway has the shape
//! `<prefix>_AM-<uniqueness>`, so clients can tell gateway-issued ids apart
//! from ids issued by a real provider. Uniqueness combines a process-wide
//! sequence with random alphanumerics, so ids minted in the same millisecond
//! never collide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of the random component of an identifier
const RANDOM_LEN: usize = 16;

/// Process-wide sequence shared by every namespace
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Kind of object an identifier is minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdNamespace {
    /// `OpenAI` Responses object
    Response,
    /// Message item or Anthropic message
    Message,
    /// Responses function-call item
    FunctionCall,
    /// Tool call id shared with the client (`call_id`)
    Call,
    /// Anthropic `tool_use` block
    ToolUse,
    /// `OpenAI` chat completion
    ChatCompletion,
}

impl IdNamespace {
    /// Wire prefix for this namespace
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Response => "resp",
            Self::Message => "msg",
            Self::FunctionCall => "fc",
            Self::Call => "call",
            Self::ToolUse => "toolu",
            Self::ChatCompletion => "chatcmpl",
        }
    }
}

/// Mint a new identifier in the given namespace
pub fn generate_id(namespace: IdNamespace) -> String {
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let random: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(RANDOM_LEN)
        .map(char::from)
        .collect();
    let prefix = namespace.prefix();

    match namespace {
        IdNamespace::Response => {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0);
            format!("{prefix}_AM-{millis}-{sequence:06x}{random}")
        }
        _ => format!("{prefix}_AM-{sequence:06x}{random}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const ALL: [IdNamespace; 6] = [
        IdNamespace::Response,
        IdNamespace::Message,
        IdNamespace::FunctionCall,
        IdNamespace::Call,
        IdNamespace::ToolUse,
        IdNamespace::ChatCompletion,
    ];

    #[test]
    fn ids_carry_prefix_and_marker() {
        for namespace in ALL {
            let id = generate_id(namespace);
            let expected = format!("{}_AM-", namespace.prefix());
            assert!(id.starts_with(&expected), "{id} should start with {expected}");
            assert!(id.len() > expected.len() + RANDOM_LEN);
        }
    }

    #[test]
    fn repeated_generation_never_collides() {
        let ids: HashSet<String> = (0..10_000).map(|_| generate_id(IdNamespace::Call)).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn response_ids_embed_timestamp() {
        let id = generate_id(IdNamespace::Response);
        let rest = id.strip_prefix("resp_AM-").unwrap();
        let (timestamp, suffix) = rest.split_once('-').unwrap();
        assert!(timestamp.parse::<u128>().unwrap() > 0);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..1_000).map(|_| generate_id(IdNamespace::ToolUse)).collect::<Vec<_>>()))
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 4_000);
    }
}
