//! PostgreSQL implementation of RecordStore
//!
//! Backed by a sqlx connection pool. The partial update is a single
//! conditional UPDATE statement, so the key-existence check and the write are
//! one atomic round trip.

use crate::{
    ContractId, ContractRecord, ContractStatus, ProviderFieldUpdate, RecordStore,
    RecordStoreError, RecordStoreResult, StatusCounts,
};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

const RECORD_COLUMNS: &str = "contract_id, contract_title, contract_type, request_type, \
     status, created_at, providers_budget, providers_comment, meet_requirement, providers_name";

/// PostgreSQL implementation of RecordStore
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Connect to the database and create the store
    pub async fn connect(database_url: &str) -> RecordStoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create the store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn record_from_row(row: &PgRow) -> RecordStoreResult<ContractRecord> {
        let status_text: String = row.try_get("status")?;
        let status = ContractStatus::parse(&status_text).ok_or_else(|| {
            RecordStoreError::Backend(format!("unknown contract status `{}`", status_text))
        })?;

        Ok(ContractRecord {
            contract_id: ContractId::new(row.try_get::<String, _>("contract_id")?),
            contract_title: row.try_get("contract_title")?,
            contract_type: row.try_get("contract_type")?,
            request_type: row.try_get("request_type")?,
            status,
            created_at: row.try_get("created_at")?,
            providers_budget: row.try_get("providers_budget")?,
            providers_comment: row.try_get("providers_comment")?,
            meet_requirement: row.try_get("meet_requirement")?,
            providers_name: row.try_get("providers_name")?,
        })
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn find_by_key(&self, key: &ContractId) -> RecordStoreResult<ContractRecord> {
        let query = format!(
            "SELECT {} FROM contracts WHERE contract_id = $1",
            RECORD_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::record_from_row(&row),
            None => Err(RecordStoreError::NotFound(key.clone())),
        }
    }

    async fn update_provider_fields(
        &self,
        key: &ContractId,
        update: &ProviderFieldUpdate,
    ) -> RecordStoreResult<ContractRecord> {
        // A non-coercible budget value binds as NULL and leaves the column
        // untouched; the other present fields still apply.
        let budget = update.budget().ok().flatten();

        let query = format!(
            "UPDATE contracts SET \
                 providers_budget = COALESCE($2, providers_budget), \
                 providers_comment = COALESCE($3, providers_comment), \
                 meet_requirement = COALESCE($4, meet_requirement), \
                 providers_name = COALESCE($5, providers_name), \
                 status = CASE WHEN status = 'Submitted' THEN 'Running' ELSE status END \
             WHERE contract_id = $1 \
             RETURNING {}",
            RECORD_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(key.as_str())
            .bind(budget)
            .bind(update.providers_comment.as_deref())
            .bind(update.meet_requirement.as_deref())
            .bind(update.providers_name.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::record_from_row(&row),
            None => Err(RecordStoreError::NotFound(key.clone())),
        }
    }

    async fn list_by_status(
        &self,
        status: ContractStatus,
    ) -> RecordStoreResult<Vec<ContractRecord>> {
        let query = format!(
            "SELECT {} FROM contracts WHERE status = $1 ORDER BY created_at DESC",
            RECORD_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::record_from_row).collect()
    }

    async fn list_all(&self) -> RecordStoreResult<Vec<ContractRecord>> {
        let query = format!(
            "SELECT {} FROM contracts ORDER BY created_at DESC",
            RECORD_COLUMNS
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(Self::record_from_row).collect()
    }

    async fn status_counts(&self) -> RecordStoreResult<StatusCounts> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS total FROM contracts GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let status_text: String = row.try_get("status")?;
            let total: i64 = row.try_get("total")?;
            let total = total.max(0) as u64;

            match ContractStatus::parse(&status_text) {
                Some(ContractStatus::Submitted) => counts.submitted = total,
                Some(ContractStatus::Running) => counts.running = total,
                Some(ContractStatus::Approved) => counts.approved = total,
                Some(ContractStatus::Rejected) => counts.rejected = total,
                None => {
                    tracing::warn!(status = %status_text, "Ignoring rows with unknown contract status");
                }
            }
        }

        Ok(counts)
    }

    async fn insert(&self, record: ContractRecord) -> RecordStoreResult<()> {
        let query = format!(
            "INSERT INTO contracts ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            RECORD_COLUMNS
        );

        sqlx::query(&query)
            .bind(record.contract_id.as_str())
            .bind(&record.contract_title)
            .bind(record.contract_type.as_deref())
            .bind(record.request_type.as_deref())
            .bind(record.status.as_str())
            .bind(record.created_at)
            .bind(record.providers_budget)
            .bind(record.providers_comment.as_deref())
            .bind(record.meet_requirement.as_deref())
            .bind(record.providers_name.as_deref())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn health_check(&self) -> RecordStoreResult<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;

        Ok(true)
    }
}
