use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Maestro protocol gateway
#[derive(Debug, Parser)]
#[command(
    name = "maestro",
    about = "Serve one chat model over the OpenAI, Anthropic and Gemini APIs"
)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "maestro.toml", env = "MAESTRO_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "MAESTRO_LISTEN")]
    pub listen: Option<SocketAddr>,
}
