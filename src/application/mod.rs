//! Application layer - the operations the transport layer calls into.

pub mod conversations;
pub mod messages;
pub mod normalizer;
pub mod uploads;

pub use conversations::{
    ConversationDetail, ConversationManager, CreateConversation, MessageInput, ResolvedMessage,
    UpdateConversation,
};
pub use messages::MessageStore;
pub use uploads::{
    BulkDeleteOutcome, BulkDeleteResult, DeleteOutcome, IngestOutcome, IngestRequest,
    UploadPipeline,
};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::StoreError;

/// Collection names used against the document store.
pub(crate) mod collections {
    pub const CONVERSATIONS: &str = "conversations";
    pub const MESSAGES: &str = "messages";
    pub const CSV_UPLOADS: &str = "csv_uploads";
}

/// Maps a storage failure to a domain error at the application boundary.
///
/// Raw store errors never reach callers; the failure is logged here with
/// its operation context.
pub(crate) fn storage_failure(context: &str, err: StoreError) -> DomainError {
    tracing::error!(context, error = %err, "storage operation failed");
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
}

/// Maps a document that fails to decode into an entity.
pub(crate) fn decode_failure(context: &str, err: serde_json::Error) -> DomainError {
    tracing::error!(context, error = %err, "stored document failed to decode");
    DomainError::new(ErrorCode::InternalError, format!("{}: {}", context, err))
}
