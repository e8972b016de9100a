//! HTTP server assembly for the Maestro gateway

#![allow(clippy::must_use_candidate)]

mod cors;
mod health;

use std::net::SocketAddr;

use axum::Router;
use maestro_config::Config;
use maestro_llm::LlmState;
use tower_http::trace::TraceLayer;

/// Gateway HTTP server: protocol routes plus health, tracing and CORS
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Assemble routes and layers from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream backend cannot be initialized
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config.server.listen_address();
        let llm_state = LlmState::from_config(&config.llm, &config.auth)?;

        if config.auth.secret().is_none() {
            tracing::warn!("no auth.api_key configured, accepting requests without credentials");
        }

        let health_config = &config.server.health;
        let mut app = maestro_llm::llm_router(llm_state);
        if health_config.enabled {
            app = app.route(&health_config.path, axum::routing::get(health::health_handler));
        }

        let protocols = config.llm.protocols;
        tracing::debug!(
            openai = protocols.openai,
            anthropic = protocols.anthropic,
            gemini = protocols.gemini,
            "protocol surfaces assembled"
        );

        app = app.layer(TraceLayer::new_for_http());
        if let Some(cors_config) = &config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Address [`Server::serve`] binds
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Replace the configured listen address
    #[must_use]
    pub fn with_listen_address(mut self, listen_address: SocketAddr) -> Self {
        self.listen_address = listen_address;
        self
    }

    /// The assembled router, for callers that bind their own listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Bind and serve until `shutdown` is cancelled
    ///
    /// # Errors
    ///
    /// Fails when the address cannot be bound or the accept loop errors
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let bound = listener.local_addr()?;
        tracing::info!(address = %bound, "maestro listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("draining connections");
            })
            .await?;

        Ok(())
    }
}
