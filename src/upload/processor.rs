//! Upload processing: validate a batch, extract each file in turn, and
//! record the upload in history

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ReconcileConfig;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::DefaultUploadValidator;

/// Progress callback: (file name, files completed, total files)
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Entries extracted from one file, as kept in the raw history blob
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileExtraction {
    file: String,
    entries: Vec<ReportEntry>,
}

/// Result of a successful upload
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// The persisted history record
    pub upload: UploadRecord,
    /// All extracted entries, in file order
    pub entries: Vec<ReportEntry>,
}

/// Decode an extraction provider payload of the form `{"entries": [...]}`
pub fn parse_extraction_json(payload: &str) -> ReconcileResult<ExtractionResult> {
    Ok(serde_json::from_str(payload)?)
}

/// Runs uploaded files through the extraction provider
pub struct UploadProcessor<E: ReportExtractor, S: DebtStore> {
    extractor: E,
    store: S,
    validator: Box<dyn UploadValidator>,
}

impl<E: ReportExtractor, S: DebtStore> UploadProcessor<E, S> {
    /// Create a processor validating against `config`
    pub fn new(extractor: E, store: S, config: ReconcileConfig) -> Self {
        Self {
            extractor,
            store,
            validator: Box::new(DefaultUploadValidator::new(config)),
        }
    }

    /// Create a processor with a custom validator
    pub fn with_validator(extractor: E, store: S, validator: Box<dyn UploadValidator>) -> Self {
        Self {
            extractor,
            store,
            validator,
        }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (E, S) {
        (self.extractor, self.store)
    }

    /// Validate, extract, and record one upload.
    ///
    /// Files are extracted one at a time. The first failure aborts the batch:
    /// entries from files already processed are discarded and no history is
    /// written.
    pub async fn process(
        &mut self,
        owner_id: &str,
        files: &[UploadFile],
        progress: Option<&ProgressCallback>,
    ) -> ReconcileResult<UploadOutcome> {
        if let Err(e) = self.validator.validate_upload(files) {
            warn!("Rejected upload of {} file(s): {}", files.len(), e);
            return Err(e);
        }

        let total = files.len();
        let mut extractions = Vec::with_capacity(total);

        for (i, file) in files.iter().enumerate() {
            debug!("Extracting '{}' ({} bytes)", file.name, file.size());

            let result = match self.extractor.analyze(file).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        "Extraction failed for '{}', aborting {} remaining file(s)",
                        file.name,
                        total - i - 1
                    );
                    return Err(match e {
                        ReconcileError::Extraction { .. } => e,
                        other => ReconcileError::Extraction {
                            file: file.name.clone(),
                            message: other.to_string(),
                        },
                    });
                }
            };

            debug!("'{}' yielded {} entries", file.name, result.entries.len());
            extractions.push(FileExtraction {
                file: file.name.clone(),
                entries: result.entries,
            });

            if let Some(callback) = progress {
                callback(&file.name, i + 1, total);
            }
        }

        let raw_result = serde_json::to_value(&extractions)?;
        let entries: Vec<ReportEntry> = extractions
            .into_iter()
            .flat_map(|extraction| extraction.entries)
            .collect();

        let upload = self
            .store
            .save_upload(&NewUploadRecord {
                owner_id: owner_id.to_string(),
                file_names: files.iter().map(|f| f.name.clone()).collect(),
                file_count: total as u32,
                entry_count: entries.len() as u32,
                raw_result,
            })
            .await?;

        info!(
            "Upload {} processed: {} file(s), {} entries",
            upload.id,
            total,
            entries.len()
        );

        Ok(UploadOutcome { upload, entries })
    }
}
