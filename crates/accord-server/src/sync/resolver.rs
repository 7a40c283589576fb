//! Correlation resolution between contract records and process instances
//!
//! Instances are correlated by business key, carried in a process variable,
//! not by any storage-internal identifier.

use std::sync::Arc;
use tracing::{debug, warn};

use accord_record_store::ContractId;

use crate::engine::ProcessEngine;
use crate::error::{ServerError, ServerResult};

/// A transient, non-owned reference to a workflow-engine process instance.
///
/// Produced fresh on every synchronization attempt; never cached or
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInstanceRef {
    /// Opaque instance identifier
    pub instance_id: String,

    /// True for a running instance, false for a historical best-effort target
    pub active: bool,
}

impl ProcessInstanceRef {
    /// Reference a running instance
    pub fn active(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            active: true,
        }
    }

    /// Reference a historical instance
    pub fn historical(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            active: false,
        }
    }
}

/// Resolves the process instances that should receive a contract update.
///
/// Two-tier fallback, evaluated short-circuit: every active match first; if
/// none, the single most relevant historical match; otherwise nothing. An
/// empty result is a valid "no instance to notify" outcome, distinct from a
/// ResolutionFailure.
#[derive(Debug, Clone)]
pub struct CorrelationResolver {
    /// Workflow engine client
    engine: Arc<dyn ProcessEngine>,

    /// Name of the process variable carrying the business key
    correlation_variable: String,
}

impl CorrelationResolver {
    /// Create a new correlation resolver
    pub fn new(engine: Arc<dyn ProcessEngine>, correlation_variable: String) -> Self {
        Self {
            engine,
            correlation_variable,
        }
    }

    /// Resolve the instances correlated with a business key
    pub async fn resolve(&self, key: &ContractId) -> ServerResult<Vec<ProcessInstanceRef>> {
        // Tier one: active instances. A search error falls through to the
        // history tier so delivery stays best-effort.
        let active_failure = match self
            .engine
            .search_active_instances(&self.correlation_variable, key.as_str())
            .await
        {
            Ok(instances) if !instances.is_empty() => {
                if instances.len() > 1 {
                    // Legal but unusual. The system cannot know which instance
                    // is authoritative, so all of them are notified.
                    warn!(
                        contract_id = %key,
                        count = instances.len(),
                        "Multiple active process instances share one business key"
                    );
                }
                return Ok(instances
                    .into_iter()
                    .map(ProcessInstanceRef::active)
                    .collect());
            }
            Ok(_) => None,
            Err(err) => {
                warn!(contract_id = %key, %err, "Active instance search failed, falling back to history");
                Some(err)
            }
        };

        // Tier two: the engine's history store. Only the first match is a
        // meaningful best-effort target; the rest are discarded.
        match self
            .engine
            .search_historic_instances(&self.correlation_variable, key.as_str())
            .await
        {
            Ok(instances) => {
                if instances.len() > 1 {
                    debug!(
                        contract_id = %key,
                        discarded = instances.len() - 1,
                        "Discarding historical matches beyond the first"
                    );
                }

                match instances.into_iter().next() {
                    Some(instance_id) => Ok(vec![ProcessInstanceRef::historical(instance_id)]),
                    None => match active_failure {
                        // Both tiers came up empty but the active search never
                        // answered; this is a degraded condition, not a clean
                        // "no instance to notify".
                        Some(err) => Err(ServerError::ResolutionFailure(err.to_string())),
                        None => Ok(Vec::new()),
                    },
                }
            }
            Err(err) => Err(ServerError::ResolutionFailure(err.to_string())),
        }
    }
}
