//! API module for the catalog
//!
//! Serves the catalog document to the presentation layer.

use anyhow::Result;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;

pub mod handlers;
pub mod models;
pub mod server;

/// API server for the catalog document
#[derive(Debug, Clone)]
pub struct ApiServer {
    document_path: PathBuf,
    static_dir: Option<PathBuf>,
    host: String,
    port: u16,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(document_path: PathBuf, host: impl Into<String>, port: u16) -> Self {
        Self {
            document_path,
            static_dir: None,
            host: host.into(),
            port,
        }
    }

    /// Server for the configured document, address and static directory
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output.path.clone(), config.server.host.clone(), config.server.port)
            .with_static_dir(config.server.static_dir.clone())
    }

    pub fn with_static_dir(mut self, static_dir: Option<PathBuf>) -> Self {
        self.static_dir = static_dir;
        self
    }

    pub fn with_document(mut self, document_path: PathBuf) -> Self {
        self.document_path = document_path;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Start the API server in the background
    pub fn start_background(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.start().await })
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        info!("🚀 Serving {} on port {}", self.document_path.display(), self.port);
        let state = server::AppState {
            document_path: self.document_path,
        };
        server::start_http_server(state, self.static_dir, &self.host, self.port).await
    }
}
