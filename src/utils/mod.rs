//! Utility modules

pub mod memory_storage;
pub mod static_extractor;
pub mod validation;

pub use memory_storage::*;
pub use static_extractor::*;
pub use validation::*;
