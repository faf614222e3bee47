//! Dihadi Web Server
//!
//! Main web server implementation using Axum.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main Dihadi web server
pub struct DihadiServer {
    config: WebConfig,
    state: AppState,
}

impl DihadiServer {
    /// Create a new server, opening its stores
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();
        info!("Starting Dihadi Web Server");

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        self.run(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> WebResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = create_app(self.state);

        if let Ok(address) = listener.local_addr() {
            info!("Server listening on http://{}", address);
        }

        if let Err(e) = serve(listener, app).with_graceful_shutdown(shutdown).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for DihadiServer
pub struct DihadiServerBuilder {
    config: WebConfig,
}

impl DihadiServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn with_config(config: WebConfig) -> Self {
        Self { config }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set database URL
    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database_url = Some(database_url.into());
        self
    }

    pub fn jwt_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    /// Seed an admin account at start-up
    pub fn admin<S: Into<String>>(mut self, email: S, password: S) -> Self {
        self.config.admin_email = Some(email.into());
        self.config.admin_password = Some(password.into());
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<DihadiServer> {
        DihadiServer::new(self.config).await
    }
}

impl Default for DihadiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_creation() {
        let server = DihadiServer::new(WebConfig::default()).await;
        assert!(server.is_ok());
    }

    #[tokio::test]
    async fn test_builder_seeds_admin() {
        let server = DihadiServerBuilder::new()
            .admin("Admin@Dihadi.test", "admin-pass")
            .build()
            .await
            .unwrap();

        let admin = server
            .state()
            .user_service
            .store()
            .find_by_email("admin@dihadi.test")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.profile.role, dihadi_core::Role::Admin);
    }

    #[test]
    fn test_server_builder() {
        let builder = DihadiServerBuilder::new().host("localhost").port(3000);

        assert_eq!(builder.config.host, "localhost");
        assert_eq!(builder.config.port, 3000);
        assert!(builder.config.database_url.is_none());
    }
}
