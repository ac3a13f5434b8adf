//! The gateway's HTTP server: binds a listener, builds the router, and
//! serves until a shutdown signal arrives.

use crate::routes::create_router;
use crate::shutdown::{shutdown_signal, ShutdownConfig, ShutdownCoordinator};
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Server bind and shutdown options.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Graceful shutdown timing.
    pub shutdown: ShutdownConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown: ShutdownConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Start from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the bind host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Override the bind port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Owns the bound listener and the app state it serves.
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Build a server for the given config and state. Binding happens in
    /// [`Server::run`].
    #[must_use]
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until a SIGINT/SIGTERM triggers graceful shutdown.
    ///
    /// # Errors
    /// Returns an error if the address can't be parsed or bound, or if
    /// the underlying hyper server reports an I/O error.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.config.socket_addr()?;
        let coordinator = Arc::new(ShutdownCoordinator::new(self.config.shutdown.clone()));
        let app = create_router(self.state);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "gateway listening");

        let shutdown_coordinator = Arc::clone(&coordinator);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                shutdown_coordinator.trigger_shutdown("signal received").await;
            })
            .await?;

        info!("gateway stopped");
        Ok(())
    }
}
