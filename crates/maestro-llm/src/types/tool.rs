use serde_json::Value;

/// Callable tool declared by the client
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    /// Function name
    pub name: String,
    /// Human-readable description, empty when the client gave none
    pub description: String,
    /// JSON Schema of the arguments
    pub input_schema: Value,
}

impl ToolSpec {
    /// Build a tool, substituting an empty object schema when none is given
    pub fn new(name: impl Into<String>, description: Option<String>, input_schema: Option<Value>) -> Self {
        Self {
            name: name.into(),
            description: description.unwrap_or_default(),
            input_schema: input_schema
                .filter(|schema| !schema.is_null())
                .unwrap_or_else(empty_object_schema),
        }
    }
}

/// Schema used for tools declared without parameters
pub fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// How the model may use the declared tools
///
/// Forcing a specific named function is not expressible upstream and is
/// folded into [`ToolChoicePolicy::Required`]. Only `Required` is forwarded;
/// the other policies leave the choice to the upstream default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolChoicePolicy {
    /// No choice requested, absent or `none`; tools are still declared
    #[default]
    None,
    /// The model decides
    Auto,
    /// At least one tool call is required
    Required,
}

impl ToolChoicePolicy {
    /// Whether the upstream call must force tool use
    pub const fn is_required(self) -> bool {
        matches!(self, Self::Required)
    }
}
