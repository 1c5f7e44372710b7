//! Traits for the external collaborators the reconciliation engine drives

use async_trait::async_trait;

use crate::types::*;

/// Storage abstraction for tracked debts and upload history
///
/// This trait lets the reconciliation engine work with any backend
/// (a hosted database, SQLite, in-memory, etc.). Every write is a single call
/// so a failed write leaves nothing half-applied.
#[async_trait]
pub trait DebtStore: Send + Sync {
    /// List all debts belonging to an owner
    async fn list_debts(&self, owner_id: &str) -> ReconcileResult<Vec<TrackedRecord>>;

    /// Get a debt by ID
    async fn get_debt(&self, debt_id: &str) -> ReconcileResult<Option<TrackedRecord>>;

    /// Write a partial field set onto an existing debt
    async fn update_debt(&mut self, debt_id: &str, update: &DebtUpdate) -> ReconcileResult<()>;

    /// Create a new debt, returning the stored record
    async fn create_debt(&mut self, debt: &NewDebt) -> ReconcileResult<TrackedRecord>;

    /// Append an upload history record
    async fn save_upload(&mut self, upload: &NewUploadRecord) -> ReconcileResult<UploadRecord>;

    /// Get an upload history record by ID
    async fn get_upload(&self, upload_id: &str) -> ReconcileResult<Option<UploadRecord>>;

    /// Add to the "updates applied" counter of an upload history record.
    ///
    /// This is an increment, so retrying after an ambiguous failure may
    /// double-count.
    async fn increment_updates_applied(&mut self, upload_id: &str, by: u32)
        -> ReconcileResult<()>;
}

/// Document extraction provider: turns one uploaded file into report entries
#[async_trait]
pub trait ReportExtractor: Send + Sync {
    async fn analyze(&self, file: &UploadFile) -> ReconcileResult<ExtractionResult>;
}

/// Trait for implementing custom upload validation rules
pub trait UploadValidator: Send + Sync {
    /// Validate a whole batch before any provider call
    fn validate_upload(&self, files: &[UploadFile]) -> ReconcileResult<()>;
}
