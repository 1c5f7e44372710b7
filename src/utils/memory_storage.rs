//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

/// In-memory debt store for testing and development
///
/// Clones share the same underlying maps, so a test can keep a handle and
/// inspect what a session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    debts: Arc<RwLock<HashMap<String, TrackedRecord>>>,
    uploads: Arc<RwLock<HashMap<String, UploadRecord>>>,
    fail_writes: Arc<AtomicBool>,
    fail_counter: Arc<AtomicBool>,
}

fn read<T>(lock: &RwLock<T>) -> ReconcileResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| ReconcileError::Storage("memory store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> ReconcileResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| ReconcileError::Storage("memory store lock poisoned".to_string()))
}

impl MemoryStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a debt directly, bypassing write failure injection
    pub fn insert_debt(&self, record: TrackedRecord) -> ReconcileResult<()> {
        write(&self.debts)?.insert(record.id.clone(), record);
        Ok(())
    }

    /// Make every subsequent write fail with a storage error
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make only `increment_updates_applied` fail, leaving debt writes working
    pub fn set_fail_counter(&self, fail: bool) {
        self.fail_counter.store(fail, Ordering::SeqCst);
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ReconcileResult<()> {
        write(&self.debts)?.clear();
        write(&self.uploads)?.clear();
        Ok(())
    }

    fn check_writable(&self) -> ReconcileResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(ReconcileError::Storage("write rejected by store".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DebtStore for MemoryStore {
    async fn list_debts(&self, owner_id: &str) -> ReconcileResult<Vec<TrackedRecord>> {
        let debts = read(&self.debts)?;
        let mut owned: Vec<TrackedRecord> = debts
            .values()
            .filter(|debt| debt.owner_id == owner_id)
            .cloned()
            .collect();
        // Matching is order-dependent, so hand out a stable order
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn get_debt(&self, debt_id: &str) -> ReconcileResult<Option<TrackedRecord>> {
        Ok(read(&self.debts)?.get(debt_id).cloned())
    }

    async fn update_debt(&mut self, debt_id: &str, update: &DebtUpdate) -> ReconcileResult<()> {
        self.check_writable()?;
        let mut debts = write(&self.debts)?;
        match debts.get_mut(debt_id) {
            Some(record) => {
                update.apply_to(record);
                Ok(())
            }
            None => Err(ReconcileError::RecordNotFound(debt_id.to_string())),
        }
    }

    async fn create_debt(&mut self, debt: &NewDebt) -> ReconcileResult<TrackedRecord> {
        self.check_writable()?;
        let mut record = TrackedRecord::new(
            uuid::Uuid::new_v4().to_string(),
            debt.owner_id.clone(),
            debt.name.clone(),
            debt.kind,
            debt.lender.clone(),
            debt.balance.clone(),
        );
        record.starting_balance = debt.starting_balance.clone();
        record.minimum_payment = debt.minimum_payment.clone();

        write(&self.debts)?.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn save_upload(&mut self, upload: &NewUploadRecord) -> ReconcileResult<UploadRecord> {
        self.check_writable()?;
        let record = UploadRecord::from_new(uuid::Uuid::new_v4().to_string(), upload);
        write(&self.uploads)?.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_upload(&self, upload_id: &str) -> ReconcileResult<Option<UploadRecord>> {
        Ok(read(&self.uploads)?.get(upload_id).cloned())
    }

    async fn increment_updates_applied(
        &mut self,
        upload_id: &str,
        by: u32,
    ) -> ReconcileResult<()> {
        self.check_writable()?;
        if self.fail_counter.load(Ordering::SeqCst) {
            return Err(ReconcileError::Storage(
                "counter update rejected by store".to_string(),
            ));
        }
        let mut uploads = write(&self.uploads)?;
        match uploads.get_mut(upload_id) {
            Some(upload) => {
                upload.updates_applied += by;
                Ok(())
            }
            None => Err(ReconcileError::UploadNotFound(upload_id.to_string())),
        }
    }
}
