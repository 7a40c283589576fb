//! Contract endpoints
//!
//! Thin I/O over the record store and the synchronization core.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use accord_record_store::{ContractId, ContractStatus, ProviderFieldUpdate};

use super::errors::{api_error_response, ApiError};
use crate::server::AccordServer;

/// Handler for GET /api/stats
pub async fn stats_handler(State(server): State<Arc<AccordServer>>) -> impl IntoResponse {
    match server.contract_stats().await {
        Ok(counts) => Json(counts).into_response(),
        Err(err) => api_error_response(&err),
    }
}

/// Handler for GET /api/contracts/:status
pub async fn list_by_status_handler(
    State(server): State<Arc<AccordServer>>,
    Path(status): Path<String>,
) -> impl IntoResponse {
    let status = match ContractStatus::parse(&status) {
        Some(status) => status,
        None => {
            return ApiError::BadRequest(format!(
                "Invalid status `{}`. Must be submitted, running, approved, or rejected.",
                status
            ))
            .into_response()
        }
    };

    match server.list_contracts(Some(status)).await {
        Ok(records) => Json(records).into_response(),
        Err(err) => api_error_response(&err),
    }
}

/// Handler for GET /api/providers/contracts
pub async fn list_contracts_handler(State(server): State<Arc<AccordServer>>) -> impl IntoResponse {
    match server.list_contracts(None).await {
        Ok(records) => Json(records).into_response(),
        Err(err) => api_error_response(&err),
    }
}

/// Handler for GET /api/providers/contracts/:contract_id
pub async fn get_contract_handler(
    State(server): State<Arc<AccordServer>>,
    Path(contract_id): Path<String>,
) -> impl IntoResponse {
    let key = ContractId::new(contract_id);

    match server.get_contract(&key).await {
        Ok(record) => Json(record).into_response(),
        Err(err) => api_error_response(&err),
    }
}

/// Handler for PATCH /api/providers/contracts/:contract_id
///
/// Commits the provider-field update and reports the informational
/// synchronization outcomes. A failed synchronization never turns a
/// committed mutation into an HTTP error.
pub async fn update_contract_handler(
    State(server): State<Arc<AccordServer>>,
    Path(contract_id): Path<String>,
    Json(update): Json<ProviderFieldUpdate>,
) -> impl IntoResponse {
    let key = ContractId::new(contract_id);

    match server.synchronize(&key, &update).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => api_error_response(&err),
    }
}
