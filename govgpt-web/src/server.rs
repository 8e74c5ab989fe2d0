//! GovGPT Web Server
//!
//! Binds the listener, serves the router and runs the periodic cleanup task.

use crate::{create_app, AppState, WebConfig, WebError, WebResult};
use axum::serve;
use govgpt_core::GovGptConfig;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(600);

pub struct GovGptServer {
    config: WebConfig,
    state: AppState,
}

impl GovGptServer {
    pub async fn new(config: WebConfig, settings: GovGptConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone(), settings).await?;

        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting GovGPT web server");
        info!("Server address: http://{}", address);
        info!("Development mode: {}", self.config.dev_mode);

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        let cleanup_state = self.state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                cleanup_state.cleanup_old_data().await;
            }
        });

        if let Err(e) = serve(listener, app).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Builder for GovGptServer
pub struct GovGptServerBuilder {
    config: WebConfig,
    settings: GovGptConfig,
}

impl GovGptServerBuilder {
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
            settings: GovGptConfig::default(),
        }
    }

    /// Start from an existing server configuration
    pub fn config(mut self, config: WebConfig) -> Self {
        self.config = config;
        self
    }

    pub fn settings(mut self, settings: GovGptConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.dev_mode = dev_mode;
        self
    }

    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database_url = Some(database_url.into());
        self
    }

    pub async fn build(self) -> WebResult<GovGptServer> {
        GovGptServer::new(self.config, self.settings).await
    }
}

impl Default for GovGptServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Start a server configured from the environment and the default config file
pub async fn start_server() -> WebResult<()> {
    let settings = GovGptConfig::load(None)?;
    let server = GovGptServer::new(WebConfig::from_env(), settings).await?;
    server.start().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_creation() {
        let server = GovGptServer::new(WebConfig::default(), GovGptConfig::default()).await;
        assert!(server.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let mut settings = GovGptConfig::default();
        settings.qa.timeout_secs = 0;

        let result = GovGptServerBuilder::new().settings(settings).build().await;
        assert!(result.is_err());
    }

    #[test]
    fn test_server_builder() {
        let builder = GovGptServerBuilder::new()
            .host("localhost")
            .port(3000)
            .dev_mode(true)
            .database_url("sqlite:data/govgpt.db");

        assert_eq!(builder.config.host, "localhost");
        assert_eq!(builder.config.port, 3000);
        assert!(builder.config.dev_mode);
        assert_eq!(builder.config.database_url.as_deref(), Some("sqlite:data/govgpt.db"));
    }
}
