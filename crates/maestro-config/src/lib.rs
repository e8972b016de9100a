//! Configuration for the Maestro gateway
//!
//! Loaded from a TOML file whose `{{ env.VAR }}` placeholders are expanded
//! before parsing.

#![allow(clippy::must_use_candidate)]

pub mod auth;
pub mod cors;
mod env;
pub mod health;
pub mod llm;
mod loader;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use auth::*;
pub use cors::*;
pub use health::*;
pub use llm::*;
pub use server::*;
pub use telemetry::*;

/// Top-level gateway configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Inbound authentication
    #[serde(default)]
    pub auth: AuthConfig,
    /// Upstream model and protocol configuration
    pub llm: LlmConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
