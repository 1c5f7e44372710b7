//! Match scoring between a report entry and a tracked record

use bigdecimal::{BigDecimal, One};
use serde::{Deserialize, Serialize};

use super::normalize::{cross_match, normalize};
use crate::config::ReconcileConfig;
use crate::types::*;

/// Highest possible score
pub const MAX_SCORE: u8 = 100;

const NAME_POINTS: u32 = 40;
const LENDER_POINTS: u32 = 30;
const CROSS_POINTS: u32 = 20;
const KIND_POINTS: u32 = 20;
const BALANCE_POINTS: u32 = 10;

/// A scored pairing of a report entry with a tracked record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub entry: ReportEntry,
    pub record: TrackedRecord,
    pub score: u8,
}

/// Normalized names of one side of a comparison
#[derive(Debug, Clone)]
pub(crate) struct Names {
    name: String,
    lender: String,
}

impl Names {
    pub(crate) fn of_entry(entry: &ReportEntry) -> Self {
        Self {
            name: normalize(&entry.name),
            lender: normalize(&entry.lender),
        }
    }

    pub(crate) fn of_record(record: &TrackedRecord) -> Self {
        Self {
            name: normalize(&record.name),
            lender: normalize(record.lender.as_deref().unwrap_or("")),
        }
    }
}

/// Score how likely `record` is the tracked debt behind `entry`, in `[0, 100]`.
///
/// The sum of all bonuses can reach 140; clamping happens last.
pub fn score(entry: &ReportEntry, record: &TrackedRecord, config: &ReconcileConfig) -> u8 {
    score_names(
        entry,
        &Names::of_entry(entry),
        record,
        &Names::of_record(record),
        config,
    )
}

/// `score` with both sides already normalized
pub(crate) fn score_names(
    entry: &ReportEntry,
    left: &Names,
    record: &TrackedRecord,
    right: &Names,
    config: &ReconcileConfig,
) -> u8 {
    let mut total = 0u32;

    if cross_match(&left.name, &right.name) {
        total += NAME_POINTS;
    }

    let both_lenders_missing = left.lender.is_empty() && right.lender.is_empty();
    if cross_match(&left.lender, &right.lender)
        || (both_lenders_missing && config.score_empty_lenders)
    {
        total += LENDER_POINTS;
    }

    if cross_match(&left.name, &right.lender) {
        total += CROSS_POINTS;
    }

    if cross_match(&left.lender, &right.name) {
        total += CROSS_POINTS;
    }

    if entry.kind.is_compatible_with(record.kind) {
        total += KIND_POINTS;
    }

    if balances_close(
        &entry.balance,
        &record.balance,
        config.balance_proximity_percent,
    ) {
        total += BALANCE_POINTS;
    }

    total.min(u32::from(MAX_SCORE)) as u8
}

/// `|a - b| / max(a, b, 1) < percent / 100`, evaluated without division
pub fn balances_close(a: &BigDecimal, b: &BigDecimal, percent: u32) -> bool {
    let one = BigDecimal::one();
    let mut denominator = if a > b { a } else { b };
    if denominator < &one {
        denominator = &one;
    }
    let distance = (a - b).abs() * BigDecimal::from(100);
    distance < denominator * BigDecimal::from(percent)
}
