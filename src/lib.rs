//! # Reconcile Core
//!
//! Reconciles the accounts found on an uploaded credit report against the
//! debts a user already tracks.
//!
//! ## Features
//!
//! - **Name normalization**: lossy canonicalization of account and lender names
//! - **Match scoring**: additive 0-100 score from names, lenders, kind, and balance
//! - **Greedy matching**: each report entry takes its best remaining debt
//! - **Field differences**: balance, lender, original amount, and monthly payment
//! - **Review sessions**: link, toggle, apply, add, and dismiss with explicit state
//! - **Uploads**: validated, sequential extraction with progress and history
//! - **Storage abstraction**: any backend through the `DebtStore` trait
//!
//! ## Quick Start
//!
//! ```rust
//! use reconcile_core::{
//!     match_all, DebtKind, ReconcileConfig, ReportEntry, ReportKind, TrackedRecord,
//! };
//! use bigdecimal::BigDecimal;
//!
//! let entries = vec![ReportEntry::new(
//!     "Chase credit card".to_string(),
//!     ReportKind::CreditCard,
//!     "Chase".to_string(),
//!     BigDecimal::from(500),
//! )];
//! let records = vec![TrackedRecord::new(
//!     "debt-1".to_string(),
//!     "user-1".to_string(),
//!     "Chase CC".to_string(),
//!     DebtKind::CreditCard,
//!     Some("Chase Bank".to_string()),
//!     BigDecimal::from(505),
//! )];
//!
//! let discrepancies = match_all(&entries, &records, &ReconcileConfig::default());
//! assert_eq!(discrepancies[0].matched_record().unwrap().id, "debt-1");
//! assert_eq!(discrepancies[0].differences().len(), 2);
//! ```

pub mod config;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod upload;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
pub use upload::*;
