//! Configuration builder for integration tests

use maestro_config::{Config, CorsConfig};
use secrecy::SecretString;

use super::mock_upstream::UPSTREAM_KEY;

/// Client key used by tests that enable inbound auth
pub const CLIENT_KEY: &str = "client-secret";

/// Builder for test configurations pointed at a mock upstream
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal config: default model `gpt-4o-mini`, every protocol on, no inbound auth
    pub fn new(base_url: &str) -> Self {
        let raw = format!(
            r#"
            [server]
            listen_address = "127.0.0.1:0"

            [llm.backend]
            base_url = "{base_url}"
            api_key = "{UPSTREAM_KEY}"
            model = "gpt-4o-mini"
            timeout_seconds = 5
            "#
        );

        Self {
            config: Config::parse(&raw).expect("test config must parse"),
        }
    }

    /// Map a client-facing model name to an upstream id
    pub fn with_alias(mut self, alias: &str, upstream: &str) -> Self {
        self.config.llm.models.insert(alias.to_owned(), upstream.to_owned());
        self
    }

    /// Reject unknown model names
    pub fn strict_models(mut self) -> Self {
        self.config.llm.strict_models = true;
        self
    }

    /// Require [`CLIENT_KEY`] on every protocol
    pub fn with_client_key(mut self) -> Self {
        self.config.auth.api_key = Some(SecretString::from(CLIENT_KEY));
        self
    }

    /// Turn individual protocol surfaces off
    pub fn with_protocols(mut self, openai: bool, anthropic: bool, gemini: bool) -> Self {
        self.config.llm.protocols.openai = openai;
        self.config.llm.protocols.anthropic = anthropic;
        self.config.llm.protocols.gemini = gemini;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
