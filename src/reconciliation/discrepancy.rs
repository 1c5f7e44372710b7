//! A unit of reconciliation work and its state transitions

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::diff::{diff, DiffField, FieldDifference, FieldValue};
use super::scoring::MatchCandidate;
use crate::types::*;

/// Review state of a discrepancy
///
/// `Pending` moves to `Linked`, `Dismissed` or `Added`. A `Linked`
/// discrepancy can still be re-linked or applied until it is committed;
/// `Dismissed` and `Added` are always committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyStatus {
    Pending,
    Linked,
    Dismissed,
    Added,
}

impl DiscrepancyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyStatus::Pending => "pending",
            DiscrepancyStatus::Linked => "linked",
            DiscrepancyStatus::Dismissed => "dismissed",
            DiscrepancyStatus::Added => "added",
        }
    }
}

impl fmt::Display for DiscrepancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One report entry, its matched record (if any), and where they disagree
///
/// `differences` is always computed against the current `matched_record`;
/// the only way to change the match is [`Discrepancy::link_to`], which
/// recomputes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    report_entry: ReportEntry,
    matched_record: Option<TrackedRecord>,
    differences: Vec<FieldDifference>,
    match_score: u8,
    status: DiscrepancyStatus,
    manually_linked_id: Option<String>,
    created_record_id: Option<String>,
    selected_fields: BTreeSet<DiffField>,
    committed: bool,
}

impl Discrepancy {
    /// Build a discrepancy for an accepted match, selecting every difference
    pub fn matched(candidate: MatchCandidate, tolerance: &BigDecimal) -> Self {
        let differences = diff(&candidate.entry, &candidate.record, tolerance);
        let selected_fields = differences.iter().map(|d| d.field).collect();
        Self {
            report_entry: candidate.entry,
            matched_record: Some(candidate.record),
            differences,
            match_score: candidate.score,
            status: DiscrepancyStatus::Pending,
            manually_linked_id: None,
            created_record_id: None,
            selected_fields,
            committed: false,
        }
    }

    /// Build a discrepancy for an entry nothing matched well enough
    pub fn unmatched(entry: ReportEntry, best_score: u8) -> Self {
        Self {
            report_entry: entry,
            matched_record: None,
            differences: Vec::new(),
            match_score: best_score,
            status: DiscrepancyStatus::Pending,
            manually_linked_id: None,
            created_record_id: None,
            selected_fields: BTreeSet::new(),
            committed: false,
        }
    }

    pub fn report_entry(&self) -> &ReportEntry {
        &self.report_entry
    }

    pub fn matched_record(&self) -> Option<&TrackedRecord> {
        self.matched_record.as_ref()
    }

    pub fn differences(&self) -> &[FieldDifference] {
        &self.differences
    }

    pub fn match_score(&self) -> u8 {
        self.match_score
    }

    pub fn status(&self) -> DiscrepancyStatus {
        self.status
    }

    pub fn manually_linked_id(&self) -> Option<&str> {
        self.manually_linked_id.as_deref()
    }

    /// ID of the record created by `add as new`
    pub fn created_record_id(&self) -> Option<&str> {
        self.created_record_id.as_deref()
    }

    pub fn selected_fields(&self) -> &BTreeSet<DiffField> {
        &self.selected_fields
    }

    pub fn is_selected(&self, field: DiffField) -> bool {
        self.selected_fields.contains(&field)
    }

    /// True once a terminal transition has been committed
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// True when the discrepancy holds its matched record for the session:
    /// dismissed discrepancies release theirs.
    pub fn holds_record(&self, record_id: &str) -> bool {
        self.status != DiscrepancyStatus::Dismissed
            && self
                .matched_record
                .as_ref()
                .is_some_and(|record| record.id == record_id)
    }

    fn ensure_open(&self, action: &'static str) -> ReconcileResult<()> {
        let open = !self.committed
            && matches!(
                self.status,
                DiscrepancyStatus::Pending | DiscrepancyStatus::Linked
            );
        if open {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> ReconcileError {
        let status = if self.committed && self.status == DiscrepancyStatus::Linked {
            "already applied".to_string()
        } else {
            self.status.to_string()
        };
        ReconcileError::InvalidTransition { action, status }
    }

    /// Manually link to `record`, replacing any previous match.
    ///
    /// Differences are recomputed against the new record only and every
    /// emitted field is selected again.
    pub fn link_to(
        &mut self,
        record: TrackedRecord,
        score: u8,
        tolerance: &BigDecimal,
    ) -> ReconcileResult<()> {
        self.ensure_open("link")?;

        self.differences = diff(&self.report_entry, &record, tolerance);
        self.selected_fields = self.differences.iter().map(|d| d.field).collect();
        self.manually_linked_id = Some(record.id.clone());
        self.matched_record = Some(record);
        self.match_score = score;
        self.status = DiscrepancyStatus::Linked;
        Ok(())
    }

    /// Flip whether `field` will be applied. Returns `false` without changing
    /// anything when `field` is not one of the current differences.
    pub fn toggle_field(&mut self, field: DiffField) -> ReconcileResult<bool> {
        self.ensure_open("toggle a field of")?;

        if !self.differences.iter().any(|d| d.field == field) {
            return Ok(false);
        }
        if !self.selected_fields.remove(&field) {
            self.selected_fields.insert(field);
        }
        Ok(true)
    }

    /// The update that applying the current selection would write
    pub fn pending_update(&self) -> DebtUpdate {
        let mut update = DebtUpdate::default();
        for difference in &self.differences {
            if !self.selected_fields.contains(&difference.field) {
                continue;
            }
            match (difference.field, &difference.report_value) {
                (DiffField::Balance, FieldValue::Amount(amount)) => {
                    update.balance = Some(amount.clone());
                }
                (DiffField::Lender, FieldValue::Text(lender)) => {
                    update.lender = Some(lender.clone());
                }
                (DiffField::OriginalAmount, FieldValue::Amount(amount)) => {
                    update.starting_balance = Some(amount.clone());
                }
                (DiffField::MonthlyPayment, FieldValue::Amount(amount)) => {
                    update.minimum_payment = Some(amount.clone());
                    update.planned_payment = Some(amount.clone());
                }
                _ => {}
            }
        }
        update
    }

    /// Check that the selection may be applied, returning the target record
    pub fn ensure_applicable(&self) -> ReconcileResult<&TrackedRecord> {
        self.ensure_open("apply")?;
        self.matched_record
            .as_ref()
            .ok_or(ReconcileError::NoMatchedRecord)
    }

    /// Record a successful apply: differences are cleared and the match is
    /// frozen as linked. `update` is merged into the held record copy.
    pub fn mark_applied(&mut self, update: &DebtUpdate) -> ReconcileResult<()> {
        self.ensure_applicable()?;
        if let Some(record) = self.matched_record.as_mut() {
            update.apply_to(record);
        }
        self.differences.clear();
        self.selected_fields.clear();
        self.status = DiscrepancyStatus::Linked;
        self.committed = true;
        Ok(())
    }

    /// Check that the entry may be added as a new record
    pub fn ensure_addable(&self) -> ReconcileResult<()> {
        if self.committed || self.status != DiscrepancyStatus::Pending {
            return Err(self.invalid("add"));
        }
        match &self.matched_record {
            Some(record) => Err(ReconcileError::AlreadyMatched(record.id.clone())),
            None => Ok(()),
        }
    }

    /// Record that the entry was created as `record_id` in the store
    pub fn mark_added(&mut self, record_id: String) -> ReconcileResult<()> {
        self.ensure_addable()?;
        self.created_record_id = Some(record_id);
        self.status = DiscrepancyStatus::Added;
        self.committed = true;
        Ok(())
    }

    /// Dismiss a pending discrepancy. There is no undo.
    pub fn dismiss(&mut self) -> ReconcileResult<()> {
        if self.committed || self.status != DiscrepancyStatus::Pending {
            return Err(self.invalid("dismiss"));
        }
        self.differences.clear();
        self.selected_fields.clear();
        self.status = DiscrepancyStatus::Dismissed;
        self.committed = true;
        Ok(())
    }
}
