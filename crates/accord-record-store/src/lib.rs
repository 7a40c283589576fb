//! Accord Record Store
//!
//! Provides the abstraction and implementations for the authoritative contract
//! record store. The RecordStore trait defines a contract for reading contract
//! records by business key and applying partial provider-field updates as a
//! single atomic check-and-update per key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Debug, Display};
use thiserror::Error;

/// Business key of a contract, assigned upstream before any record reaches
/// this system. Distinct from any storage-internal identifier; the same key
/// correlates the record with process instances in the workflow engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(String);

impl ContractId {
    /// Create a ContractId from an externally assigned key
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation of the key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a contract record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    Submitted,
    Running,
    Approved,
    Rejected,
}

impl ContractStatus {
    /// Parse a status from its (case-insensitive) string form
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "submitted" => Some(ContractStatus::Submitted),
            "running" => Some(ContractStatus::Running),
            "approved" => Some(ContractStatus::Approved),
            "rejected" => Some(ContractStatus::Rejected),
            _ => None,
        }
    }

    /// Canonical string form, as stored and as returned by the API
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Submitted => "Submitted",
            ContractStatus::Running => "Running",
            ContractStatus::Approved => "Approved",
            ContractStatus::Rejected => "Rejected",
        }
    }
}

impl Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authoritative contract record.
///
/// Created by an upstream process, mutated through provider-field updates,
/// never deleted by this system. Serialized field names follow the contract
/// table's column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContractRecord {
    pub contract_id: ContractId,
    pub contract_title: String,
    pub contract_type: Option<String>,
    pub request_type: Option<String>,
    #[serde(rename = "ContractStatus")]
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
    pub providers_budget: Option<i64>,
    pub providers_comment: Option<String>,
    pub meet_requirement: Option<String>,
    pub providers_name: Option<String>,
}

impl ContractRecord {
    /// Apply the present fields of an update in place.
    ///
    /// Absent fields leave the corresponding record state untouched. A budget
    /// value that does not coerce to an integer is skipped; the remaining
    /// present fields still apply. A record still in `Submitted` moves to
    /// `Running` on its first provider update.
    pub fn apply_update(&mut self, update: &ProviderFieldUpdate) {
        match update.budget() {
            Ok(Some(budget)) => self.providers_budget = Some(budget),
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(contract_id = %self.contract_id, %err, "Skipping non-coercible budget value");
            }
        }
        if let Some(comment) = &update.providers_comment {
            self.providers_comment = Some(comment.clone());
        }
        if let Some(assessment) = &update.meet_requirement {
            self.meet_requirement = Some(assessment.clone());
        }
        if let Some(name) = &update.providers_name {
            self.providers_name = Some(name.clone());
        }
        if self.status == ContractStatus::Submitted {
            self.status = ContractStatus::Running;
        }
    }
}

/// Partial, provider-submitted field update.
///
/// Wire form is the camelCase PATCH body. A field not present in the request
/// must not overwrite existing record state, so every field is optional and
/// `null` deserializes to absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFieldUpdate {
    /// Raw as submitted: an integer or a numeric string. Kept untyped so a
    /// non-coercible value is detectable after the record mutation committed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers_budget: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meet_requirement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers_name: Option<String>,
}

impl ProviderFieldUpdate {
    /// True when no recognized field is present
    pub fn is_empty(&self) -> bool {
        self.providers_budget.is_none()
            && self.providers_comment.is_none()
            && self.meet_requirement.is_none()
            && self.providers_name.is_none()
    }

    /// Coerce the submitted budget to an integer.
    ///
    /// Returns `Ok(None)` when the field is absent. Accepts a JSON integer or
    /// a string holding one; everything else is a coercion error. The store
    /// and the payload builder both rely on this so they agree on what is
    /// coercible.
    pub fn budget(&self) -> Result<Option<i64>, BudgetCoercionError> {
        let value = match &self.providers_budget {
            Some(value) => value,
            None => return Ok(None),
        };

        match value {
            Value::Number(number) => number
                .as_i64()
                .map(Some)
                .ok_or_else(|| BudgetCoercionError(value.to_string())),
            Value::String(text) => text
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| BudgetCoercionError(text.clone())),
            other => Err(BudgetCoercionError(other.to_string())),
        }
    }
}

/// A submitted budget value that does not represent an integer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("providersBudget value `{0}` is not an integer")]
pub struct BudgetCoercionError(pub String);

/// Aggregate record counts per status, for the dashboard stats endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub submitted: u64,
    pub running: u64,
    pub approved: u64,
    pub rejected: u64,
}

/// Record store error types
#[derive(Error, Debug)]
pub enum RecordStoreError {
    /// No record exists for the business key
    #[error("contract {0} not found")]
    NotFound(ContractId),

    /// Underlying storage failure, transient or permanent
    #[error("record store backend error: {0}")]
    Backend(String),

    /// (De)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for record store operations
pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for RecordStoreError {
    fn from(err: sqlx::Error) -> Self {
        RecordStoreError::Backend(err.to_string())
    }
}

/// Interface for the authoritative contract record store.
///
/// `find_by_key` and `update_provider_fields` are atomic per key: the
/// existence check and the write happen as one operation against the store,
/// not as two round trips racing each other.
#[async_trait]
pub trait RecordStore: Send + Sync + Debug {
    /// Look up a record by business key
    async fn find_by_key(&self, key: &ContractId) -> RecordStoreResult<ContractRecord>;

    /// Apply the present fields of an update as a single atomic
    /// check-and-update, returning the updated record
    async fn update_provider_fields(
        &self,
        key: &ContractId,
        update: &ProviderFieldUpdate,
    ) -> RecordStoreResult<ContractRecord>;

    /// List records in a given status, most recently created first
    async fn list_by_status(&self, status: ContractStatus)
        -> RecordStoreResult<Vec<ContractRecord>>;

    /// List all records, most recently created first
    async fn list_all(&self) -> RecordStoreResult<Vec<ContractRecord>>;

    /// Count records per status
    async fn status_counts(&self) -> RecordStoreResult<StatusCounts>;

    /// Insert a newly created record (upstream creation path and seeding)
    async fn insert(&self, record: ContractRecord) -> RecordStoreResult<()>;

    /// Get health status
    async fn health_check(&self) -> RecordStoreResult<bool>;
}

/// Re-export specific implementations
pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;
