//! HTTP server wiring.
//!
//! Holds the shared application state (resolver, proxy, model catalog) and
//! runs the axum router until shutdown.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::catalog::MetadataResolver;
use crate::config::Config;
use crate::llm::{CompletionProxy, ModelCatalog};

/// Shared per-process state. Everything inside is either immutable or
/// internally synchronized (the model-list cache); request handlers only
/// ever take an `Arc` of this.
pub struct AppState {
    /// Catalog fallback chain.
    pub resolver: MetadataResolver,

    /// Completion backend proxy.
    pub proxy: CompletionProxy,

    /// Model list with TTL cache.
    pub models: ModelCatalog,
}

impl AppState {
    /// Build the full service stack from one configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Ok(Self {
            resolver: MetadataResolver::new(&config)?,
            models: ModelCatalog::new(&config)?,
            proxy: CompletionProxy::new(config)?,
        })
    }
}

/// Run the HTTP server until ctrl-c.
pub async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config)?);
    let router = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTTP server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("HTTP server shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("Failed to install CTRL+C handler");
    tracing::info!("Received shutdown signal");
}
