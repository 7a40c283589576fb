//! Configuration for the Accord Server
//!
//! This module contains the configuration types and loading functionality.
//! Engine and store endpoints are explicit configuration values injected into
//! the components at construction; nothing reads them from ambient process
//! state later.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// URL of the record store (memory:// or postgres://)
    pub record_store_url: String,

    /// Base URL of the workflow engine REST API
    pub engine_rest_url: String,

    /// Per-call timeout for workflow engine requests, in seconds
    #[serde(default = "default_engine_timeout")]
    pub engine_timeout_seconds: u64,

    /// Name of the process variable carrying the contract business key
    #[serde(default = "default_correlation_variable")]
    pub correlation_variable: String,

    /// Process definition key used when starting the business process
    #[serde(default = "default_process_definition_key")]
    pub process_definition_key: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_engine_timeout() -> u64 {
    10
}

fn default_correlation_variable() -> String {
    "contractId".to_string()
}

fn default_process_definition_key() -> String {
    "Contract_Management_Process".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn load() -> ServerResult<Self> {
        // Start with defaults
        let mut config = Self::default();

        // Override from environment variables
        if let Ok(port) = env::var("SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.port = port;
            } else {
                warn!("Invalid SERVER_PORT value: {}", port);
            }
        }

        if let Ok(host) = env::var("SERVER_HOST") {
            config.bind_address = host;
        }

        if let Ok(record_store_url) = env::var("RECORD_STORE_URL") {
            config.record_store_url = record_store_url;
        }

        if let Ok(engine_rest_url) = env::var("ENGINE_REST_URL") {
            config.engine_rest_url = engine_rest_url;
        }

        if let Ok(timeout) = env::var("ENGINE_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                config.engine_timeout_seconds = timeout;
            } else {
                warn!("Invalid ENGINE_TIMEOUT_SECONDS value: {}", timeout);
            }
        }

        if let Ok(variable) = env::var("CORRELATION_VARIABLE") {
            config.correlation_variable = variable;
        }

        if let Ok(definition_key) = env::var("PROCESS_DEFINITION_KEY") {
            config.process_definition_key = definition_key;
        }

        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.log_level = log_level;
        }

        // Validate required fields
        if config.record_store_url.is_empty() {
            return Err(ServerError::ConfigurationError(
                "Record store URL is required".to_string(),
            ));
        }

        if config.engine_rest_url.is_empty() {
            return Err(ServerError::ConfigurationError(
                "Workflow engine REST URL is required".to_string(),
            ));
        }

        if config.engine_timeout_seconds == 0 {
            return Err(ServerError::ConfigurationError(
                "Engine timeout must be at least one second".to_string(),
            ));
        }

        info!("Loaded server configuration");
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_host(),
            record_store_url: String::new(),
            engine_rest_url: String::new(),
            engine_timeout_seconds: default_engine_timeout(),
            correlation_variable: default_correlation_variable(),
            process_definition_key: default_process_definition_key(),
            log_level: default_log_level(),
        }
    }
}
