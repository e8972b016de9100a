/// Incremental output of a streaming completion
///
/// A fragment sequence ends with exactly one [`StreamFragment::End`] or
/// [`StreamFragment::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFragment {
    /// More generated text
    TextDelta(String),
    /// More arguments for a tool call, keyed by the upstream call id
    ToolCallDelta {
        /// Upstream call identifier, stable across deltas of one call
        call_id: String,
        /// Tool name
        name: String,
        /// Next slice of the arguments JSON text
        arguments_delta: String,
    },
    /// Generation finished normally
    End,
    /// Generation failed
    Failed(String),
}

impl StreamFragment {
    /// Whether this fragment terminates the sequence
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::Failed(_))
    }
}
