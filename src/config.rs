//! Tunable thresholds for matching, diffing, and upload validation

use bigdecimal::{BigDecimal, Signed};
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Default upload size limit: 10 MiB
pub const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Reconciliation configuration
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// match_threshold = 50
/// max_files = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Minimum score for an automatic match to be accepted
    pub match_threshold: u8,
    /// Absolute difference above which two amounts are considered different
    pub amount_tolerance: BigDecimal,
    /// Relative balance distance (percent) under which the proximity bonus applies
    pub balance_proximity_percent: u32,
    /// Whether two missing lenders count as a lender match
    pub score_empty_lenders: bool,
    /// Maximum number of files per upload
    pub max_files: usize,
    /// Maximum size of a single file in bytes
    pub max_file_bytes: usize,
    /// Accepted MIME types
    pub allowed_mime_types: Vec<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            match_threshold: 40,
            amount_tolerance: BigDecimal::from(1),
            balance_proximity_percent: 20,
            score_empty_lenders: true,
            max_files: 5,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            allowed_mime_types: vec![
                "image/png".to_string(),
                "image/jpeg".to_string(),
                "application/pdf".to_string(),
            ],
        }
    }
}

impl ReconcileConfig {
    /// Parse a configuration from TOML, filling unspecified keys with defaults
    pub fn from_toml_str(content: &str) -> ReconcileResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ReconcileError::Config(format!("Invalid config TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make matching or validation meaningless
    pub fn validate(&self) -> ReconcileResult<()> {
        if self.match_threshold > 100 {
            return Err(ReconcileError::Config(format!(
                "match_threshold must be between 0 and 100, got {}",
                self.match_threshold
            )));
        }

        if self.amount_tolerance.is_negative() {
            return Err(ReconcileError::Config(
                "amount_tolerance cannot be negative".to_string(),
            ));
        }

        if self.max_files == 0 {
            return Err(ReconcileError::Config(
                "max_files must be at least 1".to_string(),
            ));
        }

        if self.max_file_bytes == 0 {
            return Err(ReconcileError::Config(
                "max_file_bytes must be at least 1".to_string(),
            ));
        }

        if self.allowed_mime_types.is_empty() {
            return Err(ReconcileError::Config(
                "allowed_mime_types cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_mime_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconcileConfig::default();
        assert_eq!(config.match_threshold, 40);
        assert_eq!(config.amount_tolerance, BigDecimal::from(1));
        assert_eq!(config.max_files, 5);
        assert_eq!(config.max_file_bytes, 10_485_760);
        assert!(config.is_mime_allowed("application/pdf"));
        assert!(config.is_mime_allowed("IMAGE/PNG"));
        assert!(!config.is_mime_allowed("image/gif"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ReconcileConfig::from_toml_str(
            r#"
            match_threshold = 55
            score_empty_lenders = false
            "#,
        )
        .unwrap();

        assert_eq!(config.match_threshold, 55);
        assert!(!config.score_empty_lenders);
        assert_eq!(config.balance_proximity_percent, 20);
        assert_eq!(config.allowed_mime_types.len(), 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = ReconcileConfig::from_toml_str("match_threshold = 120").unwrap_err();
        assert!(matches!(err, ReconcileError::Config(_)));

        let err = ReconcileConfig::from_toml_str("max_files = 0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = ReconcileConfig::from_toml_str("match_threshold = \"high\"").unwrap_err();
        assert!(err.to_string().contains("Invalid config TOML"));
    }
}
