use std::future::Future;

use mds_core::{MetadataFactory, MetadataService};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// Metadata store HTTP server.
pub struct MetadataServer {
    config: ServerConfig,
    service: MetadataService,
}

impl MetadataServer {
    pub fn new(config: ServerConfig, service: MetadataService) -> Self {
        Self { config, service }
    }

    /// Open and migrate the configured store, then build the server on it.
    pub fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let factory = MetadataFactory::from_config(&config.store)?;
        let service = factory.create_service();
        Ok(Self::new(config, service))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.service.clone())
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve_with_shutdown(listener, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = build_router(self.service);
        tracing::info!("metadata server listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        tracing::info!("metadata server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
