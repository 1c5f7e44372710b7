//! Canned extraction provider for testing

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::traits::*;
use crate::types::*;

/// Extractor that returns preset entries per file name
///
/// Files without preset entries extract to nothing. Every call is recorded,
/// so tests can check which files reached the provider.
#[derive(Debug, Clone, Default)]
pub struct StaticExtractor {
    entries: HashMap<String, Vec<ReportEntry>>,
    failing: HashSet<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StaticExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset the entries returned for `file_name`
    pub fn with_entries(mut self, file_name: &str, entries: Vec<ReportEntry>) -> Self {
        self.entries.insert(file_name.to_string(), entries);
        self
    }

    /// Make extraction of `file_name` fail
    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.failing.insert(file_name.to_string());
        self
    }

    /// Names of the files analyzed so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReportExtractor for StaticExtractor {
    async fn analyze(&self, file: &UploadFile) -> ReconcileResult<ExtractionResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(file.name.clone());
        }

        if self.failing.contains(&file.name) {
            return Err(ReconcileError::Extraction {
                file: file.name.clone(),
                message: "provider returned an error".to_string(),
            });
        }

        Ok(ExtractionResult {
            entries: self.entries.get(&file.name).cloned().unwrap_or_default(),
        })
    }
}
