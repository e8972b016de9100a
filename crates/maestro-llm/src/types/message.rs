/// Speaker of a unified message
///
/// System, developer and tool roles of the wire protocols are folded into
/// these two by the input adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// End user (also carries system prompts and tool results)
    User,
    /// Model output (text and tool calls)
    Assistant,
}

/// A single unit of message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Plain text
    Text {
        /// The text
        value: String,
    },
    /// Inline binary payload (images)
    Data {
        /// Media type (e.g. `image/png`)
        mime_type: String,
        /// Decoded bytes
        bytes: Vec<u8>,
    },
    /// Tool invocation requested by the assistant
    ToolCall {
        /// Call identifier echoed by the matching result
        call_id: String,
        /// Tool name
        name: String,
        /// Arguments as JSON text, kept verbatim even when malformed
        arguments_json: String,
    },
    /// Result of a previous tool invocation
    ToolResult {
        /// Identifier of the call this answers
        call_id: String,
        /// Tool output: plain strings verbatim, structured output as JSON text
        content_json: String,
    },
}

impl Part {
    /// Build a text part
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text { value: value.into() }
    }

    /// Text content of this part, if it is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { value } => Some(value),
            _ => None,
        }
    }
}

/// Ordered, role-tagged message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedMessage {
    /// Speaker
    pub role: Role,
    /// Content in wire order
    pub parts: Vec<Part>,
}

impl UnifiedMessage {
    /// Build a user message
    pub const fn user(parts: Vec<Part>) -> Self {
        Self { role: Role::User, parts }
    }

    /// Build an assistant message
    pub const fn assistant(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Assistant,
            parts,
        }
    }

    /// Build a user message holding a single text part
    pub fn user_text(value: impl Into<String>) -> Self {
        Self::user(vec![Part::text(value)])
    }
}
