//! Model name resolution
//!
//! Clients name models in their own ecosystem (`claude-sonnet-4`,
//! `models/gemini-2.5-pro`). Every name resolves to an upstream model id
//! through the alias table, falling back to the default upstream model.

use indexmap::IndexMap;
use maestro_config::LlmConfig;

use crate::error::LlmError;

/// Prefix Gemini clients put in front of model names
const GEMINI_MODEL_PREFIX: &str = "models/";

/// A requested model resolved to the upstream id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    /// Name as the client sent it, prefix stripped; echoed in responses
    pub requested: String,
    /// Upstream model id sent to the backend
    pub upstream: String,
}

/// Maps client model names to upstream model ids
#[derive(Debug, Clone)]
pub struct ModelResolver {
    default_model: String,
    aliases: IndexMap<String, String>,
    strict: bool,
}

impl ModelResolver {
    /// Create from explicit parts
    pub const fn new(default_model: String, aliases: IndexMap<String, String>, strict: bool) -> Self {
        Self {
            default_model,
            aliases,
            strict,
        }
    }

    /// Create from the LLM configuration section
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.backend.model.clone(), config.models.clone(), config.strict_models)
    }

    /// Resolve a requested model name
    ///
    /// An empty name selects the default model.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::ModelNotFound` for unknown names when strict
    /// resolution is enabled.
    pub fn resolve(&self, requested: &str) -> Result<ResolvedModel, LlmError> {
        let name = requested.strip_prefix(GEMINI_MODEL_PREFIX).unwrap_or(requested).trim();

        if name.is_empty() {
            return Ok(ResolvedModel {
                requested: self.default_model.clone(),
                upstream: self.default_model.clone(),
            });
        }

        if let Some(upstream) = self.aliases.get(name) {
            return Ok(ResolvedModel {
                requested: name.to_owned(),
                upstream: upstream.clone(),
            });
        }

        if name == self.default_model || self.aliases.values().any(|upstream| upstream == name) {
            return Ok(ResolvedModel {
                requested: name.to_owned(),
                upstream: name.to_owned(),
            });
        }

        if self.strict {
            return Err(LlmError::ModelNotFound { model: name.to_owned() });
        }

        tracing::debug!(model = name, upstream = %self.default_model, "unknown model, using default");
        Ok(ResolvedModel {
            requested: name.to_owned(),
            upstream: self.default_model.clone(),
        })
    }

    /// Client-facing model names: the aliases, then the default model
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.aliases.keys().cloned().collect();
        if !names.contains(&self.default_model) {
            names.push(self.default_model.clone());
        }
        names
    }
}
