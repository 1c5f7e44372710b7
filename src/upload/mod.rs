//! Credit report upload: validation, sequential extraction, and history

pub mod processor;

pub use processor::*;
