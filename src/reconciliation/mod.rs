//! Credit report reconciliation: match report entries to tracked debts,
//! compute field-level differences, and review them in a session

pub mod diff;
pub mod discrepancy;
pub mod matcher;
pub mod normalize;
pub mod scoring;
pub mod session;

pub use diff::*;
pub use discrepancy::*;
pub use matcher::*;
pub use normalize::*;
pub use scoring::*;
pub use session::*;
