//! Fan-out delivery of variable updates to process instances
//!
//! Each delivery is independent: no retries, no shared accumulator, and one
//! instance's failure never prevents attempting the others.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::resolver::ProcessInstanceRef;
use crate::engine::{ProcessEngine, VariableUpdate};
use crate::error::ServerError;

/// Per-instance delivery result.
///
/// Exists for logging and the informational outcome report of one
/// synchronization attempt only; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    /// Process instance the delivery targeted
    pub instance_id: String,

    /// Whether the engine accepted the update
    pub success: bool,

    /// Failure detail, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SyncOutcome {
    fn success(instance_id: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            success: true,
            detail: None,
        }
    }

    fn failure(instance_id: &str, detail: String) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            success: false,
            detail: Some(detail),
        }
    }
}

/// Delivers a variable update to each resolved instance independently
#[derive(Debug, Clone)]
pub struct SyncExecutor {
    /// Workflow engine client
    engine: Arc<dyn ProcessEngine>,
}

impl SyncExecutor {
    /// Create a new sync executor
    pub fn new(engine: Arc<dyn ProcessEngine>) -> Self {
        Self { engine }
    }

    /// Attempt delivery to every instance, one outcome per instance in input
    /// order. An empty instance list yields an empty outcome list and is not
    /// itself a failure.
    pub async fn deliver(
        &self,
        update: &VariableUpdate,
        instances: &[ProcessInstanceRef],
    ) -> Vec<SyncOutcome> {
        if instances.is_empty() {
            return Vec::new();
        }

        // One future per instance; join_all keeps the outcome order aligned
        // with the input order, and each future writes its own outcome slot.
        let mut deliveries = Vec::with_capacity(instances.len());
        for instance in instances {
            let engine = self.engine.clone();
            deliveries.push(async move {
                match engine.submit_variables(&instance.instance_id, update).await {
                    Ok(()) => {
                        debug!(
                            instance_id = %instance.instance_id,
                            active = instance.active,
                            "Variables delivered"
                        );
                        SyncOutcome::success(&instance.instance_id)
                    }
                    Err(err) => {
                        let failure = ServerError::DeliveryFailure {
                            instance_id: instance.instance_id.clone(),
                            detail: err.to_string(),
                        };
                        warn!(%failure, "Variable delivery failed");
                        SyncOutcome::failure(&instance.instance_id, failure.to_string())
                    }
                }
            });
        }

        join_all(deliveries).await
    }
}
