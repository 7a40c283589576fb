//! Health check endpoint for the Accord Server
//!
//! This module contains the health check handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::server::AccordServer;

/// Health check handler
///
/// This endpoint provides basic health information about the server and its
/// dependent services. The workflow engine is a best-effort subscriber, so an
/// unreachable engine degrades the report without taking the service down.
pub async fn health_check(State(server): State<Arc<AccordServer>>) -> impl IntoResponse {
    info!("Health check requested");

    let mut response = json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {},
    });

    // Check record store
    let record_store_status = match server.check_record_store_health().await {
        Ok(true) => "UP",
        Ok(false) => "DEGRADED",
        Err(_) => "DOWN",
    };
    response["dependencies"]["recordStore"] = json!({
        "status": record_store_status,
    });

    // Check workflow engine
    let engine_status = match server.check_engine_health().await {
        Ok(true) => "UP",
        Ok(false) => "DEGRADED",
        Err(_) => "DOWN",
    };
    response["dependencies"]["workflowEngine"] = json!({
        "status": engine_status,
    });

    // The record store is authoritative; without it the service is down. The
    // engine only degrades the report.
    let status_code = if record_store_status == "UP" {
        if engine_status != "UP" {
            response["status"] = json!("DEGRADED");
        }
        StatusCode::OK
    } else {
        response["status"] = json!("DOWN");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
