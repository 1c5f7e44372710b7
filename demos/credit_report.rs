//! Credit report reconciliation example

use bigdecimal::BigDecimal;
use reconcile_core::utils::{MemoryStore, StaticExtractor};
use reconcile_core::{
    DebtKind, DiffField, ProgressCallback, ReconcileConfig, ReconciliationSession, ReportEntry,
    ReportKind, TrackedRecord, UploadFile, UploadProcessor,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG overrides the default level
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    println!("Credit Report Reconciliation Example\n");

    // 1. Debts the user already tracks
    let store = MemoryStore::new();
    let mut card = TrackedRecord::new(
        "debt-card".to_string(),
        "user-1".to_string(),
        "Chase CC".to_string(),
        DebtKind::CreditCard,
        Some("Chase Bank".to_string()),
        BigDecimal::from(505),
    );
    card.minimum_payment = BigDecimal::from(25);
    store.insert_debt(card)?;

    let mut loan = TrackedRecord::new(
        "debt-loan".to_string(),
        "user-1".to_string(),
        "Motor finance".to_string(),
        DebtKind::PersonalLoan,
        None,
        BigDecimal::from(8200),
    );
    loan.starting_balance = BigDecimal::from(12000);
    loan.minimum_payment = BigDecimal::from(310);
    store.insert_debt(loan)?;

    // 2. What the extraction provider finds in the uploaded report
    let extractor = StaticExtractor::new()
        .with_entries(
            "experian-page-1.png",
            vec![ReportEntry::new(
                "Chase credit card".to_string(),
                ReportKind::CreditCard,
                "Chase".to_string(),
                BigDecimal::from(500),
            )
            .with_credit_limit(BigDecimal::from(3000))
            .with_monthly_payment(BigDecimal::from(25))],
        )
        .with_entries(
            "experian-page-2.pdf",
            vec![
                ReportEntry::new(
                    "Motor Finance Loan".to_string(),
                    ReportKind::Loan,
                    "Santander".to_string(),
                    BigDecimal::from(8150),
                )
                .with_original_borrowed(BigDecimal::from(12000))
                .with_monthly_payment(BigDecimal::from(310)),
                ReportEntry::new(
                    "Argos Card".to_string(),
                    ReportKind::CreditCard,
                    "NewDay".to_string(),
                    BigDecimal::from(120),
                ),
            ],
        );

    // 3. Upload and extract
    let files = vec![
        UploadFile::new("experian-page-1.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47]),
        UploadFile::new("experian-page-2.pdf", "application/pdf", vec![0x25, 0x50, 0x44, 0x46]),
    ];
    let progress: ProgressCallback = Box::new(|name, done, total| {
        println!("  Extracted {} ({}/{})", name, done, total);
    });

    let config = ReconcileConfig::default();
    let mut processor = UploadProcessor::new(extractor, store, config.clone());
    let upload = processor.process("user-1", &files, Some(&progress)).await?;
    println!("  Found {} accounts\n", upload.entries.len());

    // 4. Review
    let (_, store) = processor.into_parts();
    let mut session = ReconciliationSession::start(
        store,
        "user-1",
        upload.entries,
        Some(upload.upload.id.clone()),
        config,
    )
    .await?;

    for (i, discrepancy) in session.discrepancies().iter().enumerate() {
        let entry = discrepancy.report_entry();
        match discrepancy.matched_record() {
            Some(record) => {
                println!(
                    "  [{}] {} -> {} (score {})",
                    i,
                    entry.name,
                    record.name,
                    discrepancy.match_score()
                );
                for difference in discrepancy.differences() {
                    println!(
                        "      {}: report {} / tracked {}",
                        difference.field, difference.report_value, difference.tracked_value
                    );
                }
            }
            None => println!("  [{}] {} -> no match", i, entry.name),
        }
    }
    println!();

    // 5. Apply: keep our own lender name on the card, accept everything else
    session.toggle_field(0, DiffField::Lender)?;
    for index in 0..session.discrepancies().len() {
        let outcome = if session.get(index)?.matched_record().is_some() {
            session.apply_selected(index).await?
        } else {
            session.add_as_new(index).await?
        };
        println!("  [{}] {}", index, outcome.message());
    }

    let summary = session.summary();
    println!(
        "\nDone: {} linked, {} added, {} dismissed",
        summary.linked, summary.added, summary.dismissed
    );

    Ok(())
}
