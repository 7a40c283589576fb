//! Main Accord Server implementation
//!
//! This module contains the AccordServer implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use accord_record_store::{
    ContractId, ContractRecord, ContractStatus, ProviderFieldUpdate, RecordStore, StatusCounts,
};

use crate::config::ServerConfig;
use crate::engine::{ProcessEngine, VariableUpdate, VariableValue};
use crate::error::{ServerError, ServerResult};
use crate::sync::{CorrelationResolver, SyncExecutor, SyncManager, SyncReport};

/// Main server implementation
#[derive(Clone)]
pub struct AccordServer {
    /// Configuration
    pub config: ServerConfig,

    /// Record store client
    store: Arc<dyn RecordStore>,

    /// Workflow engine client
    engine: Arc<dyn ProcessEngine>,

    /// Synchronization orchestrator
    sync_manager: Arc<SyncManager>,
}

/// Manual Debug implementation that doesn't try to debug the trait objects
impl std::fmt::Debug for AccordServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccordServer")
            .field("config", &self.config)
            .finish()
    }
}

impl AccordServer {
    /// Create a new AccordServer
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn RecordStore>,
        engine: Arc<dyn ProcessEngine>,
    ) -> Self {
        let resolver =
            CorrelationResolver::new(engine.clone(), config.correlation_variable.clone());
        let executor = SyncExecutor::new(engine.clone());
        let sync_manager = Arc::new(SyncManager::new(store.clone(), resolver, executor));

        Self {
            config,
            store,
            engine,
            sync_manager,
        }
    }

    /// Run the HTTP server
    pub async fn run(self) -> ServerResult<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| {
                ServerError::ConfigurationError(format!("Invalid bind address: {}", e))
            })?;

        let router = crate::api::build_router(Arc::new(self));

        info!(%addr, "Starting Accord server");
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }

    /// Apply a provider-field update and synchronize the workflow engine
    pub async fn synchronize(
        &self,
        key: &ContractId,
        update: &ProviderFieldUpdate,
    ) -> ServerResult<SyncReport> {
        self.sync_manager.synchronize(key, update).await
    }

    /// Look up a single contract by business key
    pub async fn get_contract(&self, key: &ContractId) -> ServerResult<ContractRecord> {
        Ok(self.store.find_by_key(key).await?)
    }

    /// List contracts, optionally filtered by status
    pub async fn list_contracts(
        &self,
        status: Option<ContractStatus>,
    ) -> ServerResult<Vec<ContractRecord>> {
        let records = match status {
            Some(status) => self.store.list_by_status(status).await?,
            None => self.store.list_all().await?,
        };

        Ok(records)
    }

    /// Count contracts per status
    pub async fn contract_stats(&self) -> ServerResult<StatusCounts> {
        Ok(self.store.status_counts().await?)
    }

    /// Start the business process for a new contract request
    pub async fn start_process(&self, title: &str, requested_by: &str) -> ServerResult<String> {
        let mut variables = VariableUpdate::new();
        variables.push("contractTitle", VariableValue::String(title.to_string()));
        variables.push(
            "requestedBy",
            VariableValue::String(requested_by.to_string()),
        );

        self.engine
            .start_process(&self.config.process_definition_key, &variables)
            .await
    }

    /// Check record store health
    pub async fn check_record_store_health(&self) -> ServerResult<bool> {
        Ok(self.store.health_check().await?)
    }

    /// Check workflow engine health
    pub async fn check_engine_health(&self) -> ServerResult<bool> {
        self.engine.health_check().await
    }
}
