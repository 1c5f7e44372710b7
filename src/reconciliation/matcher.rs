//! Greedy assignment of report entries to tracked records

use std::collections::HashSet;
use tracing::{debug, info};

use super::discrepancy::Discrepancy;
use super::scoring::{score_names, MatchCandidate, Names};
use crate::config::ReconcileConfig;
use crate::types::*;

/// Find the highest-scoring record not in `used`.
///
/// Ties go to the record seen first, so the result depends on the order of
/// `records`.
pub fn best_candidate<'a>(
    entry: &ReportEntry,
    records: &'a [TrackedRecord],
    used: &HashSet<String>,
    config: &ReconcileConfig,
) -> Option<(&'a TrackedRecord, u8)> {
    let names: Vec<Names> = records.iter().map(Names::of_record).collect();
    best_among(entry, records, &names, used, config)
}

/// `best_candidate` over records whose names are already normalized
fn best_among<'a>(
    entry: &ReportEntry,
    records: &'a [TrackedRecord],
    record_names: &[Names],
    used: &HashSet<String>,
    config: &ReconcileConfig,
) -> Option<(&'a TrackedRecord, u8)> {
    let entry_names = Names::of_entry(entry);
    let mut best: Option<(&TrackedRecord, u8)> = None;
    for (record, names) in records
        .iter()
        .zip(record_names)
        .filter(|(r, _)| !used.contains(&r.id))
    {
        let candidate_score = score_names(entry, &entry_names, record, names, config);
        debug!(
            "Scored '{}' against '{}' ({}): {}",
            entry.name, record.name, record.id, candidate_score
        );
        if best.is_none_or(|(_, best_score)| candidate_score > best_score) {
            best = Some((record, candidate_score));
        }
    }
    best
}

/// Match one entry, marking the chosen record as used when accepted
pub fn match_entry(
    entry: &ReportEntry,
    records: &[TrackedRecord],
    used: &mut HashSet<String>,
    config: &ReconcileConfig,
) -> Discrepancy {
    let names: Vec<Names> = records.iter().map(Names::of_record).collect();
    match_among(entry, records, &names, used, config)
}

fn match_among(
    entry: &ReportEntry,
    records: &[TrackedRecord],
    record_names: &[Names],
    used: &mut HashSet<String>,
    config: &ReconcileConfig,
) -> Discrepancy {
    match best_among(entry, records, record_names, used, config) {
        Some((record, best_score)) if best_score >= config.match_threshold => {
            used.insert(record.id.clone());
            Discrepancy::matched(
                MatchCandidate {
                    entry: entry.clone(),
                    record: record.clone(),
                    score: best_score,
                },
                &config.amount_tolerance,
            )
        }
        best => Discrepancy::unmatched(entry.clone(), best.map_or(0, |(_, s)| s)),
    }
}

/// Build one discrepancy per entry, in input order.
///
/// Each entry takes its best remaining record, and an accepted record is
/// unavailable to every later entry. This is greedy: earlier entries win
/// contested records even when a later entry would have scored higher, and
/// the overall assignment is not a maximum-weight matching.
pub fn match_all(
    entries: &[ReportEntry],
    records: &[TrackedRecord],
    config: &ReconcileConfig,
) -> Vec<Discrepancy> {
    // Record names are normalized once for the whole batch
    let record_names: Vec<Names> = records.iter().map(Names::of_record).collect();
    let mut used = HashSet::new();
    let discrepancies: Vec<Discrepancy> = entries
        .iter()
        .map(|entry| match_among(entry, records, &record_names, &mut used, config))
        .collect();

    info!(
        "Matched {} of {} report entries against {} tracked debts",
        used.len(),
        entries.len(),
        records.len()
    );

    discrepancies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::discrepancy::DiscrepancyStatus;
    use bigdecimal::BigDecimal;

    fn entry(name: &str, lender: &str, kind: ReportKind, balance: i64) -> ReportEntry {
        ReportEntry::new(
            name.to_string(),
            kind,
            lender.to_string(),
            BigDecimal::from(balance),
        )
    }

    fn record(id: &str, name: &str, lender: &str, kind: DebtKind, balance: i64) -> TrackedRecord {
        TrackedRecord::new(
            id.to_string(),
            "u1".to_string(),
            name.to_string(),
            kind,
            Some(lender.to_string()),
            BigDecimal::from(balance),
        )
    }

    #[test]
    fn test_matches_best_record() {
        let config = ReconcileConfig::default();
        let entries = vec![entry("Chase credit card", "Chase", ReportKind::CreditCard, 500)];
        let records = vec![
            record("amex", "Gold", "Amex", DebtKind::CreditCard, 500),
            record("chase", "Chase CC", "Chase Bank", DebtKind::CreditCard, 505),
        ];

        let result = match_all(&entries, &records, &config);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].matched_record().unwrap().id, "chase");
        assert_eq!(result[0].match_score(), 100);
        assert_eq!(result[0].status(), DiscrepancyStatus::Pending);
    }

    #[test]
    fn test_below_threshold_is_unmatched() {
        let config = ReconcileConfig::default();
        let entries = vec![entry("Zopa", "Zopa", ReportKind::Loan, 5000)];
        // Kind (20) + balance (10) only
        let records = vec![record("p1", "Wedding", "Ratesetter", DebtKind::PersonalLoan, 5100)];

        let result = match_all(&entries, &records, &config);
        assert!(result[0].matched_record().is_none());
        assert_eq!(result[0].match_score(), 30);
        assert!(result[0].differences().is_empty());
    }

    #[test]
    fn test_record_used_once() {
        let config = ReconcileConfig::default();
        let entries = vec![
            entry("Barclaycard", "Barclays", ReportKind::CreditCard, 100),
            entry("Barclaycard Platinum", "Barclays", ReportKind::CreditCard, 900),
        ];
        let records = vec![record(
            "b1",
            "Barclaycard",
            "Barclays",
            DebtKind::CreditCard,
            800,
        )];

        let result = match_all(&entries, &records, &config);
        // Greedy: the first entry takes the record even though the second is closer
        assert_eq!(result[0].matched_record().unwrap().id, "b1");
        assert!(result[1].matched_record().is_none());
    }

    #[test]
    fn test_ties_go_to_first_record() {
        let config = ReconcileConfig::default();
        let entries = vec![entry("Visa", "HSBC", ReportKind::CreditCard, 200)];
        let records = vec![
            record("first", "Visa", "HSBC", DebtKind::CreditCard, 200),
            record("second", "Visa", "HSBC", DebtKind::CreditCard, 200),
        ];

        let result = match_all(&entries, &records, &config);
        assert_eq!(result[0].matched_record().unwrap().id, "first");
    }

    #[test]
    fn test_no_record_assigned_twice() {
        let config = ReconcileConfig::default();
        let entries: Vec<ReportEntry> = (0..4)
            .map(|i| entry("Card", "Bank", ReportKind::CreditCard, 100 + i))
            .collect();
        let records: Vec<TrackedRecord> = (0..3)
            .map(|i| {
                record(
                    &format!("r{}", i),
                    "Card",
                    "Bank",
                    DebtKind::CreditCard,
                    100,
                )
            })
            .collect();

        let result = match_all(&entries, &records, &config);
        let mut seen = HashSet::new();
        for discrepancy in &result {
            if let Some(record) = discrepancy.matched_record() {
                assert!(seen.insert(record.id.clone()), "{} assigned twice", record.id);
            }
        }
        assert_eq!(seen.len(), 3);
        assert!(result[3].matched_record().is_none());
    }

    #[test]
    fn test_empty_inputs() {
        let config = ReconcileConfig::default();
        assert!(match_all(&[], &[], &config).is_empty());

        let entries = vec![entry("Card", "Bank", ReportKind::CreditCard, 1)];
        let result = match_all(&entries, &[], &config);
        assert!(result[0].matched_record().is_none());
        assert_eq!(result[0].match_score(), 0);
    }
}
