use std::path::Path;

use anyhow::Context;

use crate::{AnyOrList, Config};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if [`Config::parse`] fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse configuration text
    ///
    /// Expands `{{ env.VAR }}` placeholders, deserializes and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if variable expansion, TOML parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw).context("config variable expansion failed")?;
        let config: Self = toml::from_str(&expanded).context("failed to parse config")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_backend()?;
        self.validate_models()?;
        self.validate_protocols()?;
        self.validate_cors()?;
        Ok(())
    }

    fn validate_backend(&self) -> anyhow::Result<()> {
        let backend = &self.llm.backend;

        if !matches!(backend.base_url.scheme(), "http" | "https") {
            anyhow::bail!("llm.backend.base_url must use http or https, got `{}`", backend.base_url);
        }

        if backend.model.trim().is_empty() {
            anyhow::bail!("llm.backend.model must not be empty");
        }

        if backend.timeout_seconds == 0 {
            anyhow::bail!("llm.backend.timeout_seconds must be greater than 0");
        }

        Ok(())
    }

    fn validate_models(&self) -> anyhow::Result<()> {
        for (alias, target) in &self.llm.models {
            if alias.trim().is_empty() {
                anyhow::bail!("llm.models contains an empty model name");
            }
            if target.trim().is_empty() {
                anyhow::bail!("llm.models.\"{alias}\" must map to a non-empty upstream model");
            }
        }

        Ok(())
    }

    fn validate_protocols(&self) -> anyhow::Result<()> {
        let protocols = &self.llm.protocols;
        if !protocols.openai && !protocols.anthropic && !protocols.gemini {
            anyhow::bail!("at least one protocol must be enabled in llm.protocols");
        }

        Ok(())
    }

    fn validate_cors(&self) -> anyhow::Result<()> {
        let Some(cors) = &self.server.cors else {
            return Ok(());
        };

        let wildcard = [&cors.origins, &cors.methods, &cors.headers]
            .into_iter()
            .any(|value| *value == AnyOrList::Any);
        if cors.credentials && wildcard {
            anyhow::bail!("server.cors.credentials requires explicit origins, methods and headers");
        }

        Ok(())
    }
}
