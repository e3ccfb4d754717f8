use tokio::net::TcpListener;

use crate::config::{ConfigError, ServerConfig};
use crate::router::build_router;
use crate::state::AppState;

/// The chart registry server.
pub struct RegistryServer {
    config: ServerConfig,
}

impl RegistryServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router with a freshly configured manager (useful for tests).
    pub fn router(&self) -> Result<axum::Router, ConfigError> {
        let manager = self.config.build_manager()?;
        Ok(build_router(AppState::new(manager)))
    }

    /// Start serving requests.
    pub async fn serve(self) -> Result<(), ServeError> {
        let app = self.router()?;
        let listener = TcpListener::bind(&self.config.listen).await?;
        tracing::info!(
            listen = %self.config.listen,
            driver = %self.config.manager.parameters.storagedriver,
            "chart registry listening"
        );
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Errors raised while starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
