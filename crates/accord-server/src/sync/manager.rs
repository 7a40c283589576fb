//! Synchronization orchestration
//!
//! Sequences the authoritative record mutation and the best-effort engine
//! notification, and guarantees their independence: once the mutation has
//! committed, no synchronization outcome can fail the caller's request or
//! roll the mutation back.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

use accord_record_store::{ContractId, ContractRecord, ProviderFieldUpdate, RecordStore};

use super::executor::{SyncExecutor, SyncOutcome};
use super::payload::build_variable_update;
use super::resolver::CorrelationResolver;
use crate::error::{ServerError, ServerResult};

/// Result of one synchronize call: the committed record mutation plus purely
/// informational delivery outcomes. The outcome list never causes the call to
/// fail on its own.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// The record after the committed mutation
    pub record: ContractRecord,

    /// Per-instance delivery outcomes, input order
    pub outcomes: Vec<SyncOutcome>,

    /// True when correlation or payload construction failed and the engine
    /// was therefore not notified
    pub degraded: bool,
}

/// Orchestrates record mutation and workflow-engine notification
#[derive(Debug, Clone)]
pub struct SyncManager {
    /// Authoritative record store
    store: Arc<dyn RecordStore>,

    /// Correlation resolver
    resolver: CorrelationResolver,

    /// Fan-out executor
    executor: SyncExecutor,
}

impl SyncManager {
    /// Create a new sync manager
    pub fn new(
        store: Arc<dyn RecordStore>,
        resolver: CorrelationResolver,
        executor: SyncExecutor,
    ) -> Self {
        Self {
            store,
            resolver,
            executor,
        }
    }

    /// Apply a provider-field update and propagate it to the correlated
    /// process instance(s).
    ///
    /// The record mutation is authoritative: its errors are the errors of
    /// this call. Everything after the commit is best-effort; failures there
    /// are logged and reported through the SyncReport, never raised.
    pub async fn synchronize(
        &self,
        key: &ContractId,
        update: &ProviderFieldUpdate,
    ) -> ServerResult<SyncReport> {
        let span = info_span!("synchronize", contract_id = %key);
        async move {
            if update.is_empty() {
                return Err(ServerError::ValidationError(
                    "Update contains no recognized contract field".to_string(),
                ));
            }

            // Authoritative commit; errors propagate to the caller and no
            // synchronization is attempted.
            let record = self.store.update_provider_fields(key, update).await?;
            info!(status = %record.status, "Record mutation committed");

            // Best-effort tail: nothing below may fail the call.
            let (outcomes, degraded) = self.notify_engine(key, update).await;

            Ok(SyncReport {
                record,
                outcomes,
                degraded,
            })
        }
        .instrument(span)
        .await
    }

    /// Resolve, build and deliver. Every failure here is contained: it is
    /// logged and folded into the informational report.
    async fn notify_engine(
        &self,
        key: &ContractId,
        update: &ProviderFieldUpdate,
    ) -> (Vec<SyncOutcome>, bool) {
        let instances = match self.resolver.resolve(key).await {
            Ok(instances) => instances,
            Err(err) => {
                // Degraded, not "zero instances": the searches never answered.
                warn!(%err, "Synchronization degraded: correlation resolution failed");
                return (Vec::new(), true);
            }
        };

        if instances.is_empty() {
            info!("No process instance correlates with this contract; nothing to notify");
            return (Vec::new(), false);
        }

        let variables = match build_variable_update(update) {
            Ok(variables) => variables,
            Err(err) => {
                warn!(%err, "Synchronization skipped: variable payload could not be built");
                return (Vec::new(), true);
            }
        };

        if variables.is_empty() {
            // Nothing engine-relevant in this update.
            return (Vec::new(), false);
        }

        let outcomes = self.executor.deliver(&variables, &instances).await;
        let failures = outcomes.iter().filter(|outcome| !outcome.success).count();
        if failures > 0 {
            warn!(
                total = outcomes.len(),
                failures, "Synchronization completed with delivery failures"
            );
        } else {
            info!(total = outcomes.len(), "Synchronization completed");
        }

        (outcomes, false)
    }
}
