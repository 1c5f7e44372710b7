//! Core types and data structures for the reconciliation system

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of account as reported by a credit report extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Revolving credit card account
    CreditCard,
    /// Any instalment loan
    Loan,
    /// Secured home loan
    Mortgage,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::CreditCard => "credit_card",
            ReportKind::Loan => "loan",
            ReportKind::Mortgage => "mortgage",
        }
    }

    /// Whether a tracked debt of the given kind can represent this report kind
    pub fn is_compatible_with(&self, kind: DebtKind) -> bool {
        matches!(
            (self, kind),
            (ReportKind::CreditCard, DebtKind::CreditCard)
                | (ReportKind::Loan, DebtKind::Loan)
                | (ReportKind::Loan, DebtKind::PersonalLoan)
                | (ReportKind::Mortgage, DebtKind::Mortgage)
        )
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a debt tracked by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtKind {
    CreditCard,
    Loan,
    PersonalLoan,
    Mortgage,
    CarLoan,
    StudentLoan,
    Other,
}

impl DebtKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtKind::CreditCard => "credit_card",
            DebtKind::Loan => "loan",
            DebtKind::PersonalLoan => "personal_loan",
            DebtKind::Mortgage => "mortgage",
            DebtKind::CarLoan => "car_loan",
            DebtKind::StudentLoan => "student_loan",
            DebtKind::Other => "other",
        }
    }
}

impl From<ReportKind> for DebtKind {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::CreditCard => DebtKind::CreditCard,
            ReportKind::Loan => DebtKind::Loan,
            ReportKind::Mortgage => DebtKind::Mortgage,
        }
    }
}

impl fmt::Display for DebtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoding of money amounts sent as JSON numbers or strings.
///
/// A JSON number arrives as `f64`. Its shortest round-trip decimal form is
/// what the sender wrote, so that text is parsed instead of the binary
/// expansion of the float.
pub mod amount {
    use bigdecimal::BigDecimal;
    use serde::de::{self, Deserializer, Visitor};
    use serde::Deserialize;
    use std::fmt;
    use std::str::FromStr;

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = BigDecimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal amount as a number or string")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<BigDecimal, E> {
            Ok(BigDecimal::from(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<BigDecimal, E> {
            Ok(BigDecimal::from(value))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<BigDecimal, E> {
            if !value.is_finite() {
                return Err(E::custom(format!("amount {} is not finite", value)));
            }
            BigDecimal::from_str(&value.to_string()).map_err(E::custom)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<BigDecimal, E> {
            BigDecimal::from_str(value.trim()).map_err(E::custom)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BigDecimal, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigDecimal>, D::Error> {
        #[derive(Deserialize)]
        struct Amount(#[serde(deserialize_with = "deserialize")] BigDecimal);

        Ok(Option::<Amount>::deserialize(deserializer)?.map(|Amount(value)| value))
    }
}

/// A single account extracted from an uploaded credit report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// Account name as printed on the report
    pub name: String,
    /// Account kind
    #[serde(rename = "type")]
    pub kind: ReportKind,
    /// Lender or issuer name, empty when the report omits it
    #[serde(default)]
    pub lender: String,
    /// Outstanding balance
    #[serde(deserialize_with = "amount::deserialize")]
    pub balance: BigDecimal,
    /// Credit limit (cards only)
    #[serde(default, deserialize_with = "amount::deserialize_option")]
    pub credit_limit: Option<BigDecimal>,
    /// Contractual monthly payment
    #[serde(default, deserialize_with = "amount::deserialize_option")]
    pub monthly_payment: Option<BigDecimal>,
    /// Amount originally borrowed (loans and mortgages)
    #[serde(default, deserialize_with = "amount::deserialize_option")]
    pub original_borrowed: Option<BigDecimal>,
}

impl ReportEntry {
    /// Create a new report entry with only the required fields set
    pub fn new(name: String, kind: ReportKind, lender: String, balance: BigDecimal) -> Self {
        Self {
            name,
            kind,
            lender,
            balance,
            credit_limit: None,
            monthly_payment: None,
            original_borrowed: None,
        }
    }

    pub fn with_monthly_payment(mut self, payment: BigDecimal) -> Self {
        self.monthly_payment = Some(payment);
        self
    }

    pub fn with_original_borrowed(mut self, amount: BigDecimal) -> Self {
        self.original_borrowed = Some(amount);
        self
    }

    pub fn with_credit_limit(mut self, limit: BigDecimal) -> Self {
        self.credit_limit = Some(limit);
        self
    }
}

/// A debt already recorded by the user in the persisted store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedRecord {
    /// Unique identifier for the debt
    pub id: String,
    /// Owner of the debt
    pub owner_id: String,
    /// Display name
    pub name: String,
    /// Kind of debt
    pub kind: DebtKind,
    /// Lender, if known
    pub lender: Option<String>,
    /// Current outstanding balance
    pub balance: BigDecimal,
    /// Balance when tracking started (original amount borrowed)
    pub starting_balance: BigDecimal,
    /// Minimum required monthly payment
    pub minimum_payment: BigDecimal,
    /// Payment the user plans to make, if different from the minimum
    pub planned_payment: Option<BigDecimal>,
    /// When the record was created
    pub created_at: NaiveDateTime,
    /// When the record was last updated
    pub updated_at: NaiveDateTime,
}

impl TrackedRecord {
    /// Create a new tracked record
    pub fn new(
        id: String,
        owner_id: String,
        name: String,
        kind: DebtKind,
        lender: Option<String>,
        balance: BigDecimal,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            owner_id,
            name,
            kind,
            lender,
            starting_balance: balance.clone(),
            balance,
            minimum_payment: BigDecimal::zero(),
            planned_payment: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The payment the user actually makes each month: the planned payment
    /// when set and non-zero, otherwise the minimum.
    pub fn effective_payment(&self) -> &BigDecimal {
        match &self.planned_payment {
            Some(planned) if !planned.is_zero() => planned,
            _ => &self.minimum_payment,
        }
    }
}

/// Partial set of fields to write onto an existing tracked record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtUpdate {
    pub balance: Option<BigDecimal>,
    pub lender: Option<String>,
    pub starting_balance: Option<BigDecimal>,
    pub minimum_payment: Option<BigDecimal>,
    pub planned_payment: Option<BigDecimal>,
}

impl DebtUpdate {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.balance.is_none()
            && self.lender.is_none()
            && self.starting_balance.is_none()
            && self.minimum_payment.is_none()
            && self.planned_payment.is_none()
    }

    /// Merge the set fields onto a record
    pub fn apply_to(&self, record: &mut TrackedRecord) {
        if let Some(balance) = &self.balance {
            record.balance = balance.clone();
        }
        if let Some(lender) = &self.lender {
            record.lender = Some(lender.clone());
        }
        if let Some(starting) = &self.starting_balance {
            record.starting_balance = starting.clone();
        }
        if let Some(minimum) = &self.minimum_payment {
            record.minimum_payment = minimum.clone();
        }
        if let Some(planned) = &self.planned_payment {
            record.planned_payment = Some(planned.clone());
        }
        record.updated_at = chrono::Utc::now().naive_utc();
    }
}

/// A debt to be created from a report entry that matched nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDebt {
    pub owner_id: String,
    pub name: String,
    pub kind: DebtKind,
    pub lender: Option<String>,
    pub balance: BigDecimal,
    pub starting_balance: BigDecimal,
    pub minimum_payment: BigDecimal,
    pub credit_limit: Option<BigDecimal>,
}

impl NewDebt {
    /// Build a new debt from a report entry's fields
    pub fn from_entry(owner_id: &str, entry: &ReportEntry) -> Self {
        let lender = entry.lender.trim();
        Self {
            owner_id: owner_id.to_string(),
            name: entry.name.clone(),
            kind: entry.kind.into(),
            lender: (!lender.is_empty()).then(|| lender.to_string()),
            balance: entry.balance.clone(),
            starting_balance: entry
                .original_borrowed
                .clone()
                .unwrap_or_else(|| entry.balance.clone()),
            minimum_payment: entry.monthly_payment.clone().unwrap_or_else(BigDecimal::zero),
            credit_limit: entry.credit_limit.clone(),
        }
    }
}

/// A file submitted for extraction
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Structured output of the extraction provider for one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub entries: Vec<ReportEntry>,
}

/// Upload history record to be persisted after a successful batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUploadRecord {
    pub owner_id: String,
    pub file_names: Vec<String>,
    pub file_count: u32,
    pub entry_count: u32,
    /// Raw provider output, kept for audit
    pub raw_result: serde_json::Value,
}

/// Persisted upload history record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: String,
    pub owner_id: String,
    pub file_names: Vec<String>,
    pub file_count: u32,
    pub entry_count: u32,
    pub raw_result: serde_json::Value,
    /// Number of field updates applied from this upload
    pub updates_applied: u32,
    pub created_at: NaiveDateTime,
}

impl UploadRecord {
    pub fn from_new(id: String, record: &NewUploadRecord) -> Self {
        Self {
            id,
            owner_id: record.owner_id.clone(),
            file_names: record.file_names.clone(),
            file_count: record.file_count,
            entry_count: record.entry_count,
            raw_result: record.raw_result.clone(),
            updates_applied: 0,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Broad error category, used by callers to choose how to surface a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input rejected before any side effect
    Validation,
    /// The extraction provider failed
    Provider,
    /// A store read or write failed
    Persistence,
    /// An operation was called in a state that does not allow it
    Transition,
    /// Invalid configuration
    Config,
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
    #[error("Extraction failed for '{file}': {message}")]
    Extraction { file: String, message: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Record not found: {0}")]
    RecordNotFound(String),
    #[error("Upload not found: {0}")]
    UploadNotFound(String),
    #[error("Discrepancy not found: {0}")]
    DiscrepancyNotFound(usize),
    #[error("Cannot {action} a discrepancy that is {status}")]
    InvalidTransition { action: &'static str, status: String },
    #[error("Discrepancy has no matched record")]
    NoMatchedRecord,
    #[error("Discrepancy already has a matched record: {0}")]
    AlreadyMatched(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::InvalidUpload(_) => ErrorKind::Validation,
            ReconcileError::Extraction { .. } | ReconcileError::Json(_) => ErrorKind::Provider,
            ReconcileError::Storage(_)
            | ReconcileError::RecordNotFound(_)
            | ReconcileError::UploadNotFound(_) => ErrorKind::Persistence,
            ReconcileError::DiscrepancyNotFound(_)
            | ReconcileError::InvalidTransition { .. }
            | ReconcileError::NoMatchedRecord
            | ReconcileError::AlreadyMatched(_) => ErrorKind::Transition,
            ReconcileError::Config(_) => ErrorKind::Config,
        }
    }

    /// True for store failures, after which the operation may be retried
    pub fn is_persistence(&self) -> bool {
        self.kind() == ErrorKind::Persistence
    }
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
