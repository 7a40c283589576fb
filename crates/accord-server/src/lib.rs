//!
//! Accord Server - Main application server for the Accord contract-management backend
//!
//! This module exports all the components of the Accord Server.

// External dependencies
use std::sync::Arc;
use std::time::Duration;

/// API module
pub mod api;

/// Server module
pub mod server;

/// Workflow engine client module
pub mod engine;

/// Synchronization core module
pub mod sync;

/// Configuration module
pub mod config;

/// Error module
pub mod error;

// Re-export key types
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::AccordServer;
pub use sync::{SyncManager, SyncReport};

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    // Initialize logging
    init_logging(&config);

    // Create dependencies
    let store = create_record_store(&config).await?;
    let engine = create_process_engine(&config)?;

    // Create server
    let server = AccordServer::new(config, store, engine);

    // Run server
    server.run().await
}

/// Initialize logging
fn init_logging(config: &ServerConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    // Create filter based on config
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Initialize subscriber
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Create the record store client
pub async fn create_record_store(
    config: &ServerConfig,
) -> ServerResult<Arc<dyn accord_record_store::RecordStore>> {
    if config.record_store_url.starts_with("memory://") {
        // Use the in-memory record store for development and testing
        tracing::info!("Using in-memory record store");
        let store = accord_record_store::memory::InMemoryRecordStore::new();
        return Ok(Arc::new(store));
    }

    #[cfg(feature = "postgres")]
    if config.record_store_url.starts_with("postgres://")
        || config.record_store_url.starts_with("postgresql://")
    {
        tracing::info!("Using PostgreSQL record store");
        let store =
            accord_record_store::postgres::PostgresRecordStore::connect(&config.record_store_url)
                .await
                .map_err(|e| ServerError::StoreError(e.to_string()))?;
        return Ok(Arc::new(store));
    }

    Err(ServerError::ConfigurationError(format!(
        "Unsupported record store URL: {}",
        config.record_store_url
    )))
}

/// Create the workflow engine client
pub fn create_process_engine(
    config: &ServerConfig,
) -> ServerResult<Arc<dyn engine::ProcessEngine>> {
    if config.engine_rest_url.is_empty() {
        return Err(ServerError::ConfigurationError(
            "Workflow engine REST URL is required".to_string(),
        ));
    }

    tracing::info!(url = %config.engine_rest_url, "Using Camunda workflow engine");
    let engine = engine::camunda::CamundaEngine::new(
        config.engine_rest_url.clone(),
        Duration::from_secs(config.engine_timeout_seconds),
    );

    Ok(Arc::new(engine))
}
