//! Integration tests for reconcile-core

use reconcile_core::{
    normalize, score,
    utils::{MemoryStore, StaticExtractor},
    DebtKind, DebtStore, DiffField, DiscrepancyStatus, ErrorKind, Outcome, ReconcileConfig,
    ReconcileError, ReconciliationSession, ReportEntry, ReportKind, TrackedRecord, UploadFile,
    UploadProcessor,
};
use bigdecimal::BigDecimal;
use std::collections::HashSet;

fn debt(
    id: &str,
    name: &str,
    kind: DebtKind,
    lender: Option<&str>,
    balance: i64,
) -> TrackedRecord {
    TrackedRecord::new(
        id.to_string(),
        "alice".to_string(),
        name.to_string(),
        kind,
        lender.map(str::to_string),
        BigDecimal::from(balance),
    )
}

fn entry(name: &str, kind: ReportKind, lender: &str, balance: i64) -> ReportEntry {
    ReportEntry::new(
        name.to_string(),
        kind,
        lender.to_string(),
        BigDecimal::from(balance),
    )
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    let mut chase = debt("chase", "Chase CC", DebtKind::CreditCard, Some("Chase Bank"), 505);
    chase.minimum_payment = BigDecimal::from(25);
    store.insert_debt(chase).unwrap();

    let mut mortgage = debt(
        "home",
        "Home mortgage",
        DebtKind::Mortgage,
        Some("Nationwide"),
        182_000,
    );
    mortgage.starting_balance = BigDecimal::from(200_000);
    mortgage.minimum_payment = BigDecimal::from(950);
    store.insert_debt(mortgage).unwrap();

    let mut bobs = debt("bob-card", "Chase CC", DebtKind::CreditCard, Some("Chase"), 500);
    bobs.owner_id = "bob".to_string();
    store.insert_debt(bobs).unwrap();
    store
}

fn report_entries() -> Vec<ReportEntry> {
    vec![
        entry("Chase credit card", ReportKind::CreditCard, "Chase", 500)
            .with_monthly_payment(BigDecimal::from(25)),
        entry("Nationwide Mortgage", ReportKind::Mortgage, "Nationwide", 181_500)
            .with_original_borrowed(BigDecimal::from(200_000))
            .with_monthly_payment(BigDecimal::from(975)),
        entry("Argos Card", ReportKind::CreditCard, "NewDay", 120),
    ]
}

#[tokio::test]
async fn test_complete_reconciliation_workflow() {
    let store = seeded_store();
    let extractor = StaticExtractor::new().with_entries("report.pdf", report_entries());
    let mut processor = UploadProcessor::new(extractor, store, ReconcileConfig::default());

    let file = UploadFile::new("report.pdf", "application/pdf", vec![0x25, 0x50, 0x44, 0x46]);
    let upload = processor.process("alice", &[file], None).await.unwrap();
    assert_eq!(upload.entries.len(), 3);

    let (_, store) = processor.into_parts();
    let mut session = ReconciliationSession::start(
        store,
        "alice",
        upload.entries,
        Some(upload.upload.id.clone()),
        ReconcileConfig::default(),
    )
    .await
    .unwrap();

    // Only alice's debts are in the snapshot
    assert_eq!(session.records().len(), 2);

    let chase = session.get(0).unwrap();
    assert_eq!(chase.matched_record().unwrap().id, "chase");
    let fields: Vec<DiffField> = chase.differences().iter().map(|d| d.field).collect();
    assert_eq!(fields, vec![DiffField::Balance, DiffField::Lender]);

    let mortgage = session.get(1).unwrap();
    assert_eq!(mortgage.matched_record().unwrap().id, "home");
    let fields: Vec<DiffField> = mortgage.differences().iter().map(|d| d.field).collect();
    assert_eq!(fields, vec![DiffField::Balance, DiffField::MonthlyPayment]);

    assert!(session.get(2).unwrap().matched_record().is_none());

    // Keep the tracked lender name, take the reported balance
    session.toggle_field(0, DiffField::Lender).unwrap();
    let outcome = session.apply_selected(0).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Applied {
            record_id: "chase".to_string(),
            fields: vec![DiffField::Balance],
        }
    );

    let outcome = session.apply_selected(1).await.unwrap();
    assert!(matches!(outcome, Outcome::Applied { ref fields, .. } if fields.len() == 2));

    let outcome = session.add_as_new(2).await.unwrap();
    assert!(matches!(outcome, Outcome::Added { .. }));

    let summary = session.summary();
    assert_eq!(summary.linked, 2);
    assert_eq!(summary.added, 1);
    assert!(summary.is_complete());

    let store = session.into_store();
    let chase = store.get_debt("chase").await.unwrap().unwrap();
    assert_eq!(chase.balance, BigDecimal::from(500));
    assert_eq!(chase.lender.as_deref(), Some("Chase Bank"));

    let home = store.get_debt("home").await.unwrap().unwrap();
    assert_eq!(home.balance, BigDecimal::from(181_500));
    assert_eq!(home.minimum_payment, BigDecimal::from(975));
    assert_eq!(home.planned_payment, Some(BigDecimal::from(975)));

    let debts = store.list_debts("alice").await.unwrap();
    assert_eq!(debts.len(), 3);
    assert!(debts
        .iter()
        .any(|d| d.name == "Argos Card" && d.lender.as_deref() == Some("NewDay")));

    let history = store.get_upload(&upload.upload.id).await.unwrap().unwrap();
    assert_eq!(history.entry_count, 3);
    assert_eq!(history.updates_applied, 3);
}

#[tokio::test]
async fn test_illegal_transitions_are_rejected() {
    let mut session = ReconciliationSession::start(
        seeded_store(),
        "alice",
        report_entries(),
        None,
        ReconcileConfig::default(),
    )
    .await
    .unwrap();

    session.dismiss(0).unwrap();
    let err = session.apply_selected(0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transition);
    assert!(err.to_string().contains("dismissed"));

    let err = session.apply_selected(2).await.unwrap_err();
    assert!(matches!(err, ReconcileError::NoMatchedRecord));

    session.add_as_new(2).await.unwrap();
    assert!(session.dismiss(2).is_err());
    assert!(session.add_as_new(2).await.is_err());
    assert_eq!(session.get(2).unwrap().status(), DiscrepancyStatus::Added);
}

#[tokio::test]
async fn test_manual_relink_reflects_only_latest_record() {
    let mut session = ReconciliationSession::start(
        seeded_store(),
        "alice",
        vec![entry("Mystery card", ReportKind::CreditCard, "Nationwide", 300)],
        None,
        ReconcileConfig::default(),
    )
    .await
    .unwrap();
    assert!(session.get(0).unwrap().matched_record().is_none());

    session.link_to(0, "chase").unwrap();
    let fields: Vec<DiffField> = session
        .get(0)
        .unwrap()
        .differences()
        .iter()
        .map(|d| d.field)
        .collect();
    assert_eq!(fields, vec![DiffField::Balance, DiffField::Lender]);

    session.link_to(0, "home").unwrap();
    let discrepancy = session.get(0).unwrap();
    let fields: Vec<DiffField> = discrepancy.differences().iter().map(|d| d.field).collect();
    assert_eq!(fields, vec![DiffField::Balance]);
    assert_eq!(discrepancy.manually_linked_id(), Some("home"));
    assert_eq!(
        discrepancy.differences()[0].tracked_value.to_string(),
        "182000"
    );
}

#[tokio::test]
async fn test_counter_not_incremented_when_update_fails() {
    let store = seeded_store();
    let extractor = StaticExtractor::new().with_entries("report.pdf", report_entries());
    let mut processor = UploadProcessor::new(extractor, store, ReconcileConfig::default());
    let upload = processor
        .process(
            "alice",
            &[UploadFile::new("report.pdf", "image/png", vec![1])],
            None,
        )
        .await
        .unwrap();

    let (_, store) = processor.into_parts();
    let mut session = ReconciliationSession::start(
        store.clone(),
        "alice",
        upload.entries,
        Some(upload.upload.id.clone()),
        ReconcileConfig::default(),
    )
    .await
    .unwrap();

    store.set_fail_writes(true);
    let err = session.apply_selected(0).await.unwrap_err();
    assert!(err.is_persistence());

    store.set_fail_writes(false);
    session.apply_selected(0).await.unwrap();

    let history = store.get_upload(&upload.upload.id).await.unwrap().unwrap();
    assert_eq!(history.updates_applied, 2);
}

#[tokio::test]
async fn test_retry_after_counter_failure_reapplies_update() {
    let store = seeded_store();
    let extractor = StaticExtractor::new().with_entries("report.pdf", report_entries());
    let mut processor = UploadProcessor::new(extractor, store, ReconcileConfig::default());
    let upload = processor
        .process(
            "alice",
            &[UploadFile::new("report.pdf", "application/pdf", vec![1])],
            None,
        )
        .await
        .unwrap();

    let (_, store) = processor.into_parts();
    let mut session = ReconciliationSession::start(
        store.clone(),
        "alice",
        upload.entries,
        Some(upload.upload.id.clone()),
        ReconcileConfig::default(),
    )
    .await
    .unwrap();

    // The debt write lands, then the counter write fails
    store.set_fail_counter(true);
    let err = session.apply_selected(0).await.unwrap_err();
    assert!(err.is_persistence());

    let discrepancy = session.get(0).unwrap();
    assert!(!discrepancy.is_committed());
    assert_eq!(discrepancy.status(), DiscrepancyStatus::Pending);
    assert_eq!(discrepancy.differences().len(), 2);

    let chase = store.get_debt("chase").await.unwrap().unwrap();
    assert_eq!(chase.balance, BigDecimal::from(500));
    assert_eq!(chase.lender.as_deref(), Some("Chase"));

    let history = store.get_upload(&upload.upload.id).await.unwrap().unwrap();
    assert_eq!(history.updates_applied, 0);

    // Retrying writes the same values again and counts both fields once
    store.set_fail_counter(false);
    let outcome = session.apply_selected(0).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Applied {
            record_id: "chase".to_string(),
            fields: vec![DiffField::Balance, DiffField::Lender],
        }
    );
    assert!(session.get(0).unwrap().is_committed());

    let history = store.get_upload(&upload.upload.id).await.unwrap().unwrap();
    assert_eq!(history.updates_applied, 2);
}

#[test]
fn test_normalize_is_idempotent() {
    let samples = [
        "Chase Credit Card",
        "Lloyds Bank PLC",
        "Santander UK plc - Secured Loan",
        "creditcreditcardcard",
        "LTD Limited ltdltd",
        "Tesco Bank Ltd.",
        "123 Finance",
        "",
    ];
    for sample in samples {
        let once = normalize(sample);
        assert_eq!(normalize(&once), once);
    }
}

#[test]
fn test_matching_never_reuses_a_record() {
    let config = ReconcileConfig::default();
    let records: Vec<TrackedRecord> = (0..5)
        .map(|i| {
            debt(
                &format!("d{}", i),
                "Visa",
                DebtKind::CreditCard,
                Some("Barclays"),
                1000 + i * 10,
            )
        })
        .collect();
    let entries: Vec<ReportEntry> = (0..8)
        .map(|i| entry("Visa", ReportKind::CreditCard, "Barclays", 1000 + i * 7))
        .collect();

    let discrepancies = reconcile_core::match_all(&entries, &records, &config);
    let matched: Vec<&str> = discrepancies
        .iter()
        .filter_map(|d| d.matched_record())
        .map(|r| r.id.as_str())
        .collect();
    let unique: HashSet<&str> = matched.iter().copied().collect();
    assert_eq!(matched.len(), 5);
    assert_eq!(unique.len(), 5);
}

#[test]
fn test_full_score_for_equivalent_pair() {
    let config = ReconcileConfig::default();
    let e = entry("Halifax Clarity", ReportKind::CreditCard, "Halifax", 900);
    let r = debt(
        "h",
        "HALIFAX CLARITY CREDIT CARD",
        DebtKind::CreditCard,
        Some("Halifax Ltd"),
        1000,
    );
    assert_eq!(score(&e, &r, &config), 100);
}
