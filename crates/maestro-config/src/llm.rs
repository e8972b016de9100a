use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Chat-completion configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// The single upstream model every protocol is served by
    pub backend: BackendConfig,
    /// Client-facing model names mapped to upstream model ids
    #[serde(default)]
    pub models: IndexMap<String, String>,
    /// Reject unknown model names with 404 instead of using the default model
    #[serde(default)]
    pub strict_models: bool,
    /// Protocol surfaces to expose
    #[serde(default)]
    pub protocols: ProtocolsConfig,
}

/// OpenAI-compatible upstream endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL, including the version segment (e.g. `https://api.openai.com/v1`)
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Bearer token sent upstream
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Upstream model id used when a request does not name a known alias
    pub model: String,
    /// Upstream request timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Per-protocol switches
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolsConfig {
    /// `OpenAI` Chat Completions and Responses
    #[serde(default = "enabled")]
    pub openai: bool,
    /// Anthropic Messages
    #[serde(default = "enabled")]
    pub anthropic: bool,
    /// Gemini `generateContent`
    #[serde(default = "enabled")]
    pub gemini: bool,
}

impl Default for ProtocolsConfig {
    fn default() -> Self {
        Self {
            openai: true,
            anthropic: true,
            gemini: true,
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("https://api.openai.com/v1").expect("valid default URL")
}

const fn default_timeout_seconds() -> u64 {
    300
}

const fn enabled() -> bool {
    true
}
