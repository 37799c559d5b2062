//! Storage and pagination configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::conversation::Representation;

/// Storage configuration: message representation, upload location, and the
/// upper bound on page sizes.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// How conversation message lists are persisted
    #[serde(default = "default_representation")]
    pub message_representation: Representation,

    /// Directory where uploaded files are stored
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Maximum page size a caller can request
    #[serde(default = "default_page_limit_cap")]
    pub page_limit_cap: u32,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.upload_dir.is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE_UPLOAD_DIR"));
        }
        if self.page_limit_cap == 0 {
            return Err(ValidationError::InvalidPageLimitCap);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            message_representation: default_representation(),
            upload_dir: default_upload_dir(),
            page_limit_cap: default_page_limit_cap(),
        }
    }
}

fn default_representation() -> Representation {
    Representation::Referenced
}

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_page_limit_cap() -> u32 {
    100
}
