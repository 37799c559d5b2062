//! CSV upload record - metadata plus the parsed row content attached to it.
//!
//! The persisted document keeps the original wire field names
//! (`originalname`, `uploadedBy`, `errorMessage`) so records written before
//! this rework stay readable.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{UploadId, UserId};

/// Processing status of an upload. The caller controls transitions; a failed
/// content read does not demote the status on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Processed,
    Error,
}

impl Default for UploadStatus {
    fn default() -> Self {
        UploadStatus::Pending
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Processed => "processed",
            UploadStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// A persisted CSV upload: ingestion metadata and, once parsing succeeded,
/// the raw parsed row content keyed to this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvUpload {
    /// Storage-assigned identifier.
    id: UploadId,

    /// Storage-assigned file name.
    filename: String,

    /// File name as uploaded by the client.
    originalname: String,

    /// Owning user.
    #[serde(rename = "uploadedBy")]
    uploaded_by: UserId,

    /// Processing status.
    #[serde(default)]
    status: UploadStatus,

    /// Caller-supplied error context, if any.
    #[serde(
        rename = "errorMessage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    error_message: Option<String>,

    /// Parsed row content, opaque to this core. Absent when the content
    /// read or parse was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rows: Option<serde_json::Value>,
}

impl CsvUpload {
    pub fn id(&self) -> &UploadId {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn originalname(&self) -> &str {
        &self.originalname
    }

    pub fn uploaded_by(&self) -> &UserId {
        &self.uploaded_by
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn rows(&self) -> Option<&serde_json::Value> {
        self.rows.as_ref()
    }

    /// Whether row content was attached during ingestion.
    pub fn has_rows(&self) -> bool {
        self.rows.is_some()
    }
}
