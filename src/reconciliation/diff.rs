//! Field-level differences between a report entry and its matched record

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::normalize::normalize;
use crate::types::*;

/// A tracked-record field that a report entry can disagree with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffField {
    Balance,
    Lender,
    OriginalAmount,
    MonthlyPayment,
}

impl DiffField {
    /// Label shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            DiffField::Balance => "Balance",
            DiffField::Lender => "Lender",
            DiffField::OriginalAmount => "Original Amount",
            DiffField::MonthlyPayment => "Monthly Payment",
        }
    }
}

impl fmt::Display for DiffField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Value of one side of a difference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Amount(BigDecimal),
    Text(String),
    Missing,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Amount(amount) => write!(f, "{}", amount),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Missing => f.write_str("-"),
        }
    }
}

/// One field where the report and the tracked record disagree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDifference {
    pub field: DiffField,
    pub report_value: FieldValue,
    pub tracked_value: FieldValue,
}

impl FieldDifference {
    fn amounts(field: DiffField, report: &BigDecimal, tracked: &BigDecimal) -> Self {
        Self {
            field,
            report_value: FieldValue::Amount(report.clone()),
            tracked_value: FieldValue::Amount(tracked.clone()),
        }
    }
}

fn differs(a: &BigDecimal, b: &BigDecimal, tolerance: &BigDecimal) -> bool {
    &(a - b).abs() > tolerance
}

/// Compute the differences between a report entry and a tracked record.
///
/// Every rule is independent, so several differences can coexist. The output
/// order is fixed: balance, lender, original amount, monthly payment.
pub fn diff(
    entry: &ReportEntry,
    record: &TrackedRecord,
    tolerance: &BigDecimal,
) -> Vec<FieldDifference> {
    let mut differences = Vec::new();

    if differs(&entry.balance, &record.balance, tolerance) {
        differences.push(FieldDifference::amounts(
            DiffField::Balance,
            &entry.balance,
            &record.balance,
        ));
    }

    let report_lender = entry.lender.trim();
    if !report_lender.is_empty() {
        let tracked_lender = record
            .lender
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());
        let mismatched = match tracked_lender {
            None => true,
            Some(tracked) => normalize(report_lender) != normalize(tracked),
        };
        if mismatched {
            differences.push(FieldDifference {
                field: DiffField::Lender,
                report_value: FieldValue::Text(report_lender.to_string()),
                tracked_value: tracked_lender
                    .map(|l| FieldValue::Text(l.to_string()))
                    .unwrap_or(FieldValue::Missing),
            });
        }
    }

    if let Some(original) = &entry.original_borrowed {
        if differs(original, &record.starting_balance, tolerance) {
            differences.push(FieldDifference::amounts(
                DiffField::OriginalAmount,
                original,
                &record.starting_balance,
            ));
        }
    }

    if let Some(payment) = &entry.monthly_payment {
        let effective = record.effective_payment();
        if differs(payment, effective, tolerance) {
            differences.push(FieldDifference::amounts(
                DiffField::MonthlyPayment,
                payment,
                effective,
            ));
        }
    }

    differences
}
