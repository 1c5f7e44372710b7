//! Validation utilities

use crate::config::ReconcileConfig;
use crate::traits::*;
use crate::types::*;

/// Validate the number of files in one upload
pub fn validate_file_count(count: usize, max_files: usize) -> ReconcileResult<()> {
    if count == 0 {
        return Err(ReconcileError::InvalidUpload(
            "At least one file is required".to_string(),
        ));
    }

    if count > max_files {
        return Err(ReconcileError::InvalidUpload(format!(
            "Too many files: {} (maximum {})",
            count, max_files
        )));
    }

    Ok(())
}

/// Validate a single file's type and size
pub fn validate_file(file: &UploadFile, config: &ReconcileConfig) -> ReconcileResult<()> {
    if file.name.trim().is_empty() {
        return Err(ReconcileError::InvalidUpload(
            "File name cannot be empty".to_string(),
        ));
    }

    if !config.is_mime_allowed(&file.mime_type) {
        return Err(ReconcileError::InvalidUpload(format!(
            "'{}' has unsupported type '{}' (allowed: {})",
            file.name,
            file.mime_type,
            config.allowed_mime_types.join(", ")
        )));
    }

    if file.bytes.is_empty() {
        return Err(ReconcileError::InvalidUpload(format!(
            "'{}' is empty",
            file.name
        )));
    }

    if file.size() > config.max_file_bytes {
        return Err(ReconcileError::InvalidUpload(format!(
            "'{}' is {} bytes (maximum {})",
            file.name,
            file.size(),
            config.max_file_bytes
        )));
    }

    Ok(())
}

/// Validate a whole batch: file count first, then every file
pub fn validate_upload(files: &[UploadFile], config: &ReconcileConfig) -> ReconcileResult<()> {
    validate_file_count(files.len(), config.max_files)?;
    for file in files {
        validate_file(file, config)?;
    }
    Ok(())
}

/// Upload validator driven by a [`ReconcileConfig`]
#[derive(Debug, Clone, Default)]
pub struct DefaultUploadValidator {
    config: ReconcileConfig,
}

impl DefaultUploadValidator {
    pub fn new(config: ReconcileConfig) -> Self {
        Self { config }
    }
}

impl UploadValidator for DefaultUploadValidator {
    fn validate_upload(&self, files: &[UploadFile]) -> ReconcileResult<()> {
        validate_upload(files, &self.config)
    }
}
