//! CSV upload pipeline - best-effort ingestion and outcome-based deletion.
//!
//! Ingestion stores the upload metadata unconditionally; reading and parsing
//! the file content are best-effort steps whose failure attaches a warning
//! to the outcome instead of failing the request. Deletion never errors: the
//! result of each attempt is reported as a structured outcome so a bulk
//! delete can account for every id it was given.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{error, warn};

use crate::application::{collections, decode_failure, normalizer::normalize, storage_failure};
use crate::domain::foundation::{DomainError, ErrorCode, Page, PageRequest, UploadId, UserId};
use crate::domain::upload::{CsvUpload, UploadStatus};
use crate::ports::{
    DocumentStore, FileDescriptor, FileStore, Filter, FindOptions, RowParser, Sort, SortOrder,
    INTERNAL_ID_FIELD,
};

/// Input for ingesting one uploaded CSV file.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    /// Descriptor of the stored file; ingestion fails without one.
    pub file: Option<FileDescriptor>,

    /// Initial processing status; defaults to pending.
    pub status: Option<UploadStatus>,

    /// Caller-supplied error context to record on the upload.
    pub error_message: Option<String>,
}

/// Result of an ingestion: the persisted upload plus a warning when a
/// best-effort step was skipped.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub upload: CsvUpload,
    pub warning: Option<String>,
}

/// Result of one delete attempt. Never an error; failures are reported in
/// the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: bool,
    pub message: String,
}

/// Per-id result inside a bulk delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteResult {
    pub id: UploadId,
    pub outcome: DeleteOutcome,
}

/// Result of a bulk delete over a list of ids.
#[derive(Debug, Clone)]
pub struct BulkDeleteOutcome {
    pub results: Vec<BulkDeleteResult>,
    pub deleted: usize,
    pub message: String,
}

/// Owns CSV upload records and their ingestion pipeline.
pub struct UploadPipeline {
    store: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStore>,
    parser: Arc<dyn RowParser>,
    page_limit_cap: u32,
}

impl UploadPipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        files: Arc<dyn FileStore>,
        parser: Arc<dyn RowParser>,
        page_limit_cap: u32,
    ) -> Self {
        Self {
            store,
            files,
            parser,
            page_limit_cap,
        }
    }

    /// Ingests one uploaded file for `owner`.
    ///
    /// The metadata record always commits. Content read and parse failures
    /// leave the record without rows and surface as a warning on the
    /// outcome; only validation and storage failures error.
    ///
    /// # Errors
    ///
    /// - `MissingFile` when the request carries no file descriptor
    /// - `DatabaseError` when a storage write fails
    pub async fn ingest(
        &self,
        owner: &UserId,
        request: IngestRequest,
    ) -> Result<IngestOutcome, DomainError> {
        let file = request.file.ok_or_else(|| {
            DomainError::new(ErrorCode::MissingFile, "No file was uploaded")
        })?;

        let mut metadata = Map::new();
        metadata.insert("filename".into(), json!(file.assigned_name));
        metadata.insert("originalname".into(), json!(file.original_name));
        metadata.insert("uploadedBy".into(), json!(owner.as_str()));
        metadata.insert(
            "status".into(),
            json!(request.status.unwrap_or_default()),
        );
        if let Some(message) = &request.error_message {
            metadata.insert("errorMessage".into(), json!(message));
        }

        let stored = self
            .store
            .insert(collections::CSV_UPLOADS, Value::Object(metadata))
            .await
            .map_err(|e| storage_failure("insert upload", e))?;
        let id = stored
            .get(INTERNAL_ID_FIELD)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::InternalError, "Stored upload is missing its key")
            })?;

        let mut warning = None;
        match self.read_and_parse(&file).await {
            Ok(rows) => {
                self.store
                    .update_by_id(collections::CSV_UPLOADS, &id, json!({ "rows": rows }))
                    .await
                    .map_err(|e| storage_failure("attach parsed rows", e))?;
            }
            Err(reason) => {
                warn!(
                    upload_id = %id,
                    filename = %file.assigned_name,
                    reason = %reason,
                    "upload saved without row content"
                );
                warning = Some(reason);
            }
        }

        let hydrated = self
            .store
            .find_by_id(collections::CSV_UPLOADS, &id)
            .await
            .map_err(|e| storage_failure("load upload", e))?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::InternalError,
                    "Upload disappeared during ingestion",
                )
            })?;
        let upload = decode_upload(hydrated)?;

        Ok(IngestOutcome { upload, warning })
    }

    async fn read_and_parse(&self, file: &FileDescriptor) -> Result<Value, String> {
        let content = self
            .files
            .read_to_string(&file.assigned_name)
            .await
            .map_err(|e| format!("could not read file content: {e}"))?;
        self.parser
            .parse(&content)
            .map_err(|e| format!("could not parse file content: {e}"))
    }

    /// A page of one user's uploads, most recently ingested first.
    pub async fn list_by_owner(
        &self,
        owner: &UserId,
        request: PageRequest,
    ) -> Result<Page<CsvUpload>, DomainError> {
        let request = request.capped(self.page_limit_cap);
        let filter = Filter::all().eq("uploadedBy", owner.as_str());
        let sort = Sort::by(INTERNAL_ID_FIELD, SortOrder::Desc);
        let options = FindOptions::page(sort, request.offset(), request.limit() as u64);

        let (docs, total) = tokio::try_join!(
            self.store.find(collections::CSV_UPLOADS, &filter, &options),
            self.store.count(collections::CSV_UPLOADS, &filter),
        )
        .map_err(|e| storage_failure("page uploads", e))?;

        let uploads = docs
            .into_iter()
            .map(decode_upload)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(uploads, total))
    }

    /// One upload by id. Returns `None` when absent.
    pub async fn get_one(&self, id: &UploadId) -> Result<Option<CsvUpload>, DomainError> {
        let doc = self
            .store
            .find_by_id(collections::CSV_UPLOADS, &id.to_string())
            .await
            .map_err(|e| storage_failure("load upload", e))?;
        doc.map(decode_upload).transpose()
    }

    /// Deletes one upload. Always returns an outcome; a storage failure is
    /// logged and reported in the message rather than raised.
    pub async fn delete_one(&self, id: &UploadId) -> DeleteOutcome {
        match self
            .store
            .delete_by_id(collections::CSV_UPLOADS, &id.to_string())
            .await
        {
            Ok(true) => DeleteOutcome {
                deleted: true,
                message: "CSV upload deleted successfully".to_string(),
            },
            Ok(false) => DeleteOutcome {
                deleted: false,
                message: "CSV upload not found".to_string(),
            },
            Err(err) => {
                error!(upload_id = %id, error = %err, "failed to delete upload");
                DeleteOutcome {
                    deleted: false,
                    message: format!("Failed to delete CSV upload: {err}"),
                }
            }
        }
    }

    /// Deletes a list of uploads, one attempt per id. A failed or missing
    /// id never aborts the remainder.
    pub async fn delete_many(&self, ids: &[UploadId]) -> BulkDeleteOutcome {
        let mut results = Vec::with_capacity(ids.len());
        let mut deleted = 0;
        for id in ids {
            let outcome = self.delete_one(id).await;
            if outcome.deleted {
                deleted += 1;
            }
            results.push(BulkDeleteResult { id: *id, outcome });
        }
        let message = format!("Deleted {} of {} CSV uploads", deleted, ids.len());
        BulkDeleteOutcome {
            results,
            deleted,
            message,
        }
    }
}

fn decode_upload(doc: Value) -> Result<CsvUpload, DomainError> {
    serde_json::from_value(normalize(doc)).map_err(|e| decode_failure("decode upload", e))
}
