//! Reconciliation session: drives discrepancy transitions against a store

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::diff::DiffField;
use super::discrepancy::{Discrepancy, DiscrepancyStatus};
use super::matcher::match_all;
use super::scoring::score;
use crate::config::ReconcileConfig;
use crate::traits::*;
use crate::types::*;

/// Successful result of a session action, including informational no-ops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// Manually linked; the new record differs in this many fields
    Linked { record_id: String, differences: usize },
    /// Selected fields were written to the record
    Applied { record_id: String, fields: Vec<DiffField> },
    /// The matched record already agreed with the report; nothing was written
    AlreadyInSync { record_id: String },
    /// The entry was created as a new record
    Added { record_id: String },
    Dismissed,
    /// Apply was requested with no fields selected; nothing was written
    NothingSelected,
    /// The record is already matched by another discrepancy; nothing changed
    RecordInUse { record_id: String, held_by: usize },
}

impl Outcome {
    /// True when the action changed nothing
    pub fn is_noop(&self) -> bool {
        matches!(
            self,
            Outcome::NothingSelected | Outcome::RecordInUse { .. }
        )
    }

    /// User-facing description of what happened
    pub fn message(&self) -> String {
        match self {
            Outcome::Linked { differences, .. } => match differences {
                0 => "Linked. The record already matches the report".to_string(),
                1 => "Linked. 1 difference to review".to_string(),
                n => format!("Linked. {} differences to review", n),
            },
            Outcome::Applied { fields, .. } => {
                let labels: Vec<&str> = fields.iter().map(|f| f.label()).collect();
                format!("Updated {}", labels.join(", "))
            }
            Outcome::AlreadyInSync { .. } => "Already up to date".to_string(),
            Outcome::Added { .. } => "Added as a new debt".to_string(),
            Outcome::Dismissed => "Dismissed".to_string(),
            Outcome::NothingSelected => "No fields selected to update".to_string(),
            Outcome::RecordInUse { .. } => {
                "That debt is already linked to another report entry".to_string()
            }
        }
    }
}

/// Count of discrepancies per status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total: usize,
    pub pending: usize,
    pub linked: usize,
    pub dismissed: usize,
    pub added: usize,
    /// Discrepancies currently holding a matched record
    pub matched: usize,
    /// Discrepancies with at least one open difference
    pub with_differences: usize,
    /// Discrepancies whose decision is final: applied, added, or dismissed
    pub committed: usize,
}

impl SessionSummary {
    /// True when every discrepancy has been committed. A manual link that
    /// has not been applied yet keeps the session open.
    pub fn is_complete(&self) -> bool {
        self.committed == self.total
    }
}

/// Review session over one batch of report entries
///
/// Holds a snapshot of the owner's tracked debts taken at start. Pure
/// transitions (`link_to`, `toggle_field`, `dismiss`) never touch the store;
/// `apply_selected` and `add_as_new` write first and only advance state once
/// every write has succeeded.
pub struct ReconciliationSession<S: DebtStore> {
    store: S,
    owner_id: String,
    upload_id: Option<String>,
    records: Vec<TrackedRecord>,
    discrepancies: Vec<Discrepancy>,
    config: ReconcileConfig,
}

impl<S: DebtStore> ReconciliationSession<S> {
    /// Load the owner's debts from the store and match `entries` against them
    pub async fn start(
        store: S,
        owner_id: &str,
        entries: Vec<ReportEntry>,
        upload_id: Option<String>,
        config: ReconcileConfig,
    ) -> ReconcileResult<Self> {
        let records = store.list_debts(owner_id).await?;
        Ok(Self::from_snapshot(
            store, owner_id, entries, records, upload_id, config,
        ))
    }

    /// Build a session from an already loaded snapshot
    pub fn from_snapshot(
        store: S,
        owner_id: &str,
        entries: Vec<ReportEntry>,
        records: Vec<TrackedRecord>,
        upload_id: Option<String>,
        config: ReconcileConfig,
    ) -> Self {
        let discrepancies = match_all(&entries, &records, &config);
        Self {
            store,
            owner_id: owner_id.to_string(),
            upload_id,
            records,
            discrepancies,
            config,
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    pub fn discrepancies(&self) -> &[Discrepancy] {
        &self.discrepancies
    }

    /// Snapshot of tracked debts, with applied updates merged in
    pub fn records(&self) -> &[TrackedRecord] {
        &self.records
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, index: usize) -> ReconcileResult<&Discrepancy> {
        self.discrepancies
            .get(index)
            .ok_or(ReconcileError::DiscrepancyNotFound(index))
    }

    fn get_mut(&mut self, index: usize) -> ReconcileResult<&mut Discrepancy> {
        self.discrepancies
            .get_mut(index)
            .ok_or(ReconcileError::DiscrepancyNotFound(index))
    }

    /// Index of another discrepancy holding `record_id`, if any
    fn holder_of(&self, record_id: &str, except: usize) -> Option<usize> {
        self.discrepancies
            .iter()
            .enumerate()
            .find(|(i, d)| *i != except && d.holds_record(record_id))
            .map(|(i, _)| i)
    }

    /// Records that discrepancy `index` could be manually linked to
    pub fn available_records(&self, index: usize) -> ReconcileResult<Vec<&TrackedRecord>> {
        self.get(index)?;
        Ok(self
            .records
            .iter()
            .filter(|r| self.holder_of(&r.id, index).is_none())
            .collect())
    }

    /// Manually link discrepancy `index` to the snapshot record `record_id`
    pub fn link_to(&mut self, index: usize, record_id: &str) -> ReconcileResult<Outcome> {
        self.get(index)?;
        let record = self
            .records
            .iter()
            .find(|r| r.id == record_id)
            .cloned()
            .ok_or_else(|| ReconcileError::RecordNotFound(record_id.to_string()))?;

        if let Some(held_by) = self.holder_of(record_id, index) {
            info!(
                "Record {} already held by discrepancy {}, not linking {}",
                record_id, held_by, index
            );
            return Ok(Outcome::RecordInUse {
                record_id: record_id.to_string(),
                held_by,
            });
        }

        let record_score = score(
            self.discrepancies[index].report_entry(),
            &record,
            &self.config,
        );
        let tolerance = self.config.amount_tolerance.clone();
        let discrepancy = self.get_mut(index)?;
        discrepancy.link_to(record, record_score, &tolerance)?;

        info!("Linked discrepancy {} to record {}", index, record_id);
        Ok(Outcome::Linked {
            record_id: record_id.to_string(),
            differences: discrepancy.differences().len(),
        })
    }

    /// Flip selection of `field` on discrepancy `index`. Returns `false` when
    /// `field` is not one of its differences.
    pub fn toggle_field(&mut self, index: usize, field: DiffField) -> ReconcileResult<bool> {
        self.get_mut(index)?.toggle_field(field)
    }

    /// Write the selected fields of discrepancy `index` to its matched record
    pub async fn apply_selected(&mut self, index: usize) -> ReconcileResult<Outcome> {
        let discrepancy = self.get(index)?;
        let record_id = discrepancy.ensure_applicable()?.id.clone();

        if discrepancy.differences().is_empty() {
            self.get_mut(index)?.mark_applied(&DebtUpdate::default())?;
            info!("Discrepancy {} already in sync with {}", index, record_id);
            return Ok(Outcome::AlreadyInSync { record_id });
        }

        let update = discrepancy.pending_update();
        if update.is_empty() {
            return Ok(Outcome::NothingSelected);
        }
        let fields: Vec<DiffField> = discrepancy
            .differences()
            .iter()
            .map(|d| d.field)
            .filter(|f| discrepancy.is_selected(*f))
            .collect();

        if let Err(e) = self.store.update_debt(&record_id, &update).await {
            warn!("Failed to update record {}: {}", record_id, e);
            return Err(e);
        }

        if let Some(upload_id) = self.upload_id.as_deref() {
            // Not idempotent: a retry after a lost response double-counts
            if let Err(e) = self
                .store
                .increment_updates_applied(upload_id, fields.len() as u32)
                .await
            {
                warn!("Failed to count updates on upload {}: {}", upload_id, e);
                return Err(e);
            }
        }

        if let Some(record) = self.records.iter_mut().find(|r| r.id == record_id) {
            update.apply_to(record);
        }
        self.get_mut(index)?.mark_applied(&update)?;

        info!(
            "Applied {} field(s) from discrepancy {} to record {}",
            fields.len(),
            index,
            record_id
        );
        Ok(Outcome::Applied { record_id, fields })
    }

    /// Create a new tracked debt from the report entry of an unmatched
    /// discrepancy
    pub async fn add_as_new(&mut self, index: usize) -> ReconcileResult<Outcome> {
        let discrepancy = self.get(index)?;
        discrepancy.ensure_addable()?;

        let new_debt = NewDebt::from_entry(&self.owner_id, discrepancy.report_entry());
        let created = match self.store.create_debt(&new_debt).await {
            Ok(created) => created,
            Err(e) => {
                warn!("Failed to add '{}' as a new debt: {}", new_debt.name, e);
                return Err(e);
            }
        };

        self.get_mut(index)?.mark_added(created.id.clone())?;
        info!("Added discrepancy {} as new record {}", index, created.id);
        Ok(Outcome::Added {
            record_id: created.id,
        })
    }

    /// Dismiss discrepancy `index`, releasing any matched record
    pub fn dismiss(&mut self, index: usize) -> ReconcileResult<Outcome> {
        self.get_mut(index)?.dismiss()?;
        info!("Dismissed discrepancy {}", index);
        Ok(Outcome::Dismissed)
    }

    pub fn summary(&self) -> SessionSummary {
        let mut summary = SessionSummary {
            total: self.discrepancies.len(),
            ..SessionSummary::default()
        };
        for discrepancy in &self.discrepancies {
            match discrepancy.status() {
                DiscrepancyStatus::Pending => summary.pending += 1,
                DiscrepancyStatus::Linked => summary.linked += 1,
                DiscrepancyStatus::Dismissed => summary.dismissed += 1,
                DiscrepancyStatus::Added => summary.added += 1,
            }
            if discrepancy.status() != DiscrepancyStatus::Dismissed
                && discrepancy.matched_record().is_some()
            {
                summary.matched += 1;
            }
            if !discrepancy.differences().is_empty() {
                summary.with_differences += 1;
            }
            if discrepancy.is_committed() {
                summary.committed += 1;
            }
        }
        summary
    }

    /// Give back the store, ending the session
    pub fn into_store(self) -> S {
        self.store
    }
}
