//! API module for the Accord Server
//!
//! This module contains the API routes and handlers for the Accord Server.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod contracts;
pub mod errors;
pub mod health;
pub mod process;

use crate::server::AccordServer;

/// Build the router for API endpoints
pub fn build_router(server: Arc<AccordServer>) -> Router {
    Router::new()
        // Dashboard
        .route("/api/stats", get(contracts::stats_handler))
        .route("/api/contracts/:status", get(contracts::list_by_status_handler))
        // Provider surface
        .route(
            "/api/providers/contracts",
            get(contracts::list_contracts_handler),
        )
        .route(
            "/api/providers/contracts/:contract_id",
            get(contracts::get_contract_handler).patch(contracts::update_contract_handler),
        )
        // Process management
        .route("/api/process/start", post(process::start_process_handler))
        // Health check
        .route("/health", get(health::health_check))
        // Request tracing
        .layer(TraceLayer::new_for_http())
        // Shared state
        .with_state(server)
}
