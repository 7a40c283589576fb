//! Process management endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::errors::api_error_response;
use crate::server::AccordServer;

/// Request body for starting the business process
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartProcessRequest {
    pub contract_title: String,
    pub requested_by: String,
}

/// Response body carrying the new process instance id
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartProcessResponse {
    pub process_instance_id: String,
}

/// Handler for POST /api/process/start
pub async fn start_process_handler(
    State(server): State<Arc<AccordServer>>,
    Json(request): Json<StartProcessRequest>,
) -> impl IntoResponse {
    match server
        .start_process(&request.contract_title, &request.requested_by)
        .await
    {
        Ok(process_instance_id) => (
            StatusCode::CREATED,
            Json(StartProcessResponse {
                process_instance_id,
            }),
        )
            .into_response(),
        Err(err) => api_error_response(&err),
    }
}
